//! Error types for the codec layer.

use crate::format::Format;

/// A codec failed to move a value across the byte boundary.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Bytes could not be decoded into a `Value`.
    #[error("decode error ({format}): {message}")]
    Decode { format: Format, message: String },

    /// A `Value` could not be encoded into bytes.
    #[error("encode error ({format}): {message}")]
    Encode { format: Format, message: String },
}

impl Error {
    pub fn decode(format: Format, message: impl Into<String>) -> Self {
        Error::Decode {
            format,
            message: message.into(),
        }
    }

    pub fn encode(format: Format, message: impl Into<String>) -> Self {
        Error::Encode {
            format,
            message: message.into(),
        }
    }
}
