#![allow(missing_docs)]

use std::{borrow::Cow, error::Error, fmt};

use crate::AbiTypeRef;

#[derive(Debug, Clone)]
pub enum DataTypeError {
    ExpectedType {
        expected: Cow<'static, str>,
        actual: AbiTypeRef,
    },
    NoSuchField {
        name: String,
    },
    DynamicArrayOffset {
        name: String,
    },
    IndexOutOfBounds {
        index: i64,
        length: usize,
    },
    InvalidArraySuffix {
        type_name: String,
    },
    ZeroLengthArray {
        name: String,
    },
}

impl fmt::Display for DataTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataTypeError::ExpectedType { expected, actual } => {
                write!(f, "expected {}, found {}", expected, actual.type_name())
            }
            DataTypeError::NoSuchField { name } => write!(f, "no such field: {}", name),
            DataTypeError::DynamicArrayOffset { name } => write!(
                f,
                "cannot compute a static element offset in dynamic-length array {}",
                name
            ),
            DataTypeError::IndexOutOfBounds { index, length } => write!(
                f,
                "out of bounds: index {} in array of length {}",
                index, length
            ),
            DataTypeError::InvalidArraySuffix { type_name } => {
                write!(f, "invalid array suffix in type {}", type_name)
            }
            DataTypeError::ZeroLengthArray { name } => {
                write!(f, "fixed-length array {} has no elements", name)
            }
        }
    }
}

impl Error for DataTypeError {}
