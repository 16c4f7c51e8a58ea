#![allow(missing_docs)]

use std::{error::Error, fmt, io, sync::Arc};

use abi_data_type::DataTypeError;

#[derive(Debug, Clone)]
pub struct LayoutError {
    pub kind: LayoutErrorKind,
    pub function: Option<String>,
}

#[derive(Debug, Clone)]
pub enum LayoutErrorKind {
    FileReadError(Arc<io::Error>),
    JsonError(Arc<serde_json::Error>),
    DataTypeError(DataTypeError),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function {
            Some(function) => write!(f, "in function {}:\n  {}", function, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Error for LayoutError {}

impl fmt::Display for LayoutErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutErrorKind::FileReadError(error) => write!(f, "file error: {}", error),
            LayoutErrorKind::JsonError(error) => write!(f, "json error: {}", error),
            LayoutErrorKind::DataTypeError(error) => write!(f, "{}", error),
        }
    }
}

impl Error for LayoutErrorKind {}

impl From<io::Error> for LayoutError {
    fn from(v: io::Error) -> Self {
        LayoutError {
            kind: LayoutErrorKind::FileReadError(Arc::new(v)),
            function: None,
        }
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(v: serde_json::Error) -> Self {
        LayoutError {
            kind: LayoutErrorKind::JsonError(Arc::new(v)),
            function: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum LayoutLookupError {
    UndefinedFunction(String),
}

impl fmt::Display for LayoutLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutLookupError::UndefinedFunction(name) => {
                write!(f, "undefined function name: {}", name)
            }
        }
    }
}

impl Error for LayoutLookupError {}
