use std::{error, fmt};

/// The number of bytes of function selector that prefix call data.
pub const SELECTOR_SIZE: usize = 4;

/// An error while decoding hex call data.
#[derive(Debug, Clone, PartialEq)]
pub enum CallDataError {
    InvalidHex(hex::FromHexError),
    MissingSelector { len: usize },
}

impl fmt::Display for CallDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallDataError::InvalidHex(error) => write!(f, "invalid call data hex: {}", error),
            CallDataError::MissingSelector { len } => write!(
                f,
                "call data of {} bytes is too short to hold a {} byte selector",
                len, SELECTOR_SIZE
            ),
        }
    }
}

impl error::Error for CallDataError {}

impl From<hex::FromHexError> for CallDataError {
    fn from(v: hex::FromHexError) -> Self {
        Self::InvalidHex(v)
    }
}

/// Decode hex call data into the ABI-encoded argument buffer.
///
/// Text with a `0x` prefix is treated as a full transaction payload, and its leading
/// selector is dropped unless `keep_selector` is set.
pub fn decode_call_data(text: &str, keep_selector: bool) -> Result<Vec<u8>, CallDataError> {
    let text = text.trim();
    let (digits, prefixed) = match text.strip_prefix("0x") {
        Some(digits) => (digits, true),
        None => (text, false),
    };

    let mut bytes = hex::decode(digits)?;
    if prefixed && !keep_selector {
        if bytes.len() < SELECTOR_SIZE {
            return Err(CallDataError::MissingSelector { len: bytes.len() });
        }
        bytes.drain(..SELECTOR_SIZE);
    }
    Ok(bytes)
}
