#![allow(missing_docs)]

use std::{error::Error, fmt};

use abi_data_type::DataTypeError;
use abi_layout::LayoutLookupError;

/// An error while applying a signing path to a buffer.
#[derive(Debug, Clone)]
pub enum DataError {
    Context {
        context: String,
        error: Box<DataError>,
    },
    BufferTooShort {
        offset: usize,
        len: usize,
        buffer_len: usize,
    },
    IndexOutOfBounds {
        index: i64,
        length: usize,
    },
    SliceOutOfBounds {
        start: i64,
        end: i64,
        length: usize,
    },
    OffsetOverflow {
        offset: usize,
    },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Context { context, error } => write!(f, "{}:\n  {}", context, error),
            DataError::BufferTooShort {
                offset,
                len,
                buffer_len,
            } => write!(
                f,
                "buffer too short: reading {} bytes at offset {} in buffer of length {}",
                len, offset, buffer_len
            ),
            DataError::IndexOutOfBounds { index, length } => write!(
                f,
                "out of bounds: index {} in array of length {}",
                index, length
            ),
            DataError::SliceOutOfBounds { start, end, length } => write!(
                f,
                "out of bounds: slice {}:{} in value of length {}",
                start, end, length
            ),
            DataError::OffsetOverflow { offset } => {
                write!(f, "offset or length at {} does not fit in memory", offset)
            }
        }
    }
}

impl Error for DataError {}

/// An error while building a signing path.
#[derive(Debug, Clone)]
pub enum DataPathError {
    CompileError {
        source: String,
        error: DataPathCompileError,
    },
    InvalidPath {
        reason: &'static str,
    },
    LayoutLookupError(LayoutLookupError),
}

impl fmt::Display for DataPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataPathError::CompileError { source, error } => {
                write!(f, "while compiling '{}':\n  {}", source, error)
            }
            DataPathError::InvalidPath { reason } => write!(f, "invalid signing path: {}", reason),
            DataPathError::LayoutLookupError(error) => write!(f, "{}", error),
        }
    }
}

impl Error for DataPathError {}

impl From<LayoutLookupError> for DataPathError {
    fn from(v: LayoutLookupError) -> Self {
        Self::LayoutLookupError(v)
    }
}

#[derive(Debug, Clone)]
pub enum DataPathCompileError {
    ParseError(String),
    EmptyPath,
    DataTypeError(DataTypeError),
    UndefinedField { name: String },
    NotATuple { field_name: String },
    NotAnArray,
    IndexOutOfBounds { index: i64, length: usize },
    UnexpectedDynamic,
    InvalidSlice,
    ValueOutOfRange { value: i64 },
}

impl fmt::Display for DataPathCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataPathCompileError::ParseError(message) => {
                write!(f, "syntax error: {}", message)
            }
            DataPathCompileError::EmptyPath => {
                write!(f, "path must select at least one field or element")
            }
            DataPathCompileError::DataTypeError(error) => write!(f, "{}", error),
            DataPathCompileError::UndefinedField { name } => write!(f, "undefined field {}", name),
            DataPathCompileError::NotATuple { field_name } => {
                write!(f, "accessing {} in non-tuple type", field_name)
            }
            DataPathCompileError::NotAnArray => write!(f, "indexing into non-array type"),
            DataPathCompileError::IndexOutOfBounds { index, length } => write!(
                f,
                "out of bounds: index {} in array of length {}",
                index, length
            ),
            DataPathCompileError::UnexpectedDynamic => {
                write!(f, "unexpected dynamic type in statically laid out path")
            }
            DataPathCompileError::InvalidSlice => {
                write!(f, "slice can only be applied to an array or a dynamic value")
            }
            DataPathCompileError::ValueOutOfRange { value } => {
                write!(f, "value {} does not fit in a signing path element", value)
            }
        }
    }
}

impl Error for DataPathCompileError {}

impl From<DataTypeError> for DataPathCompileError {
    fn from(v: DataTypeError) -> Self {
        Self::DataTypeError(v)
    }
}
