//! Error types for decoding operations.

use std::fmt;

/// Errors that can occur while decoding a scene description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The glTF document could not be parsed or failed validation.
    Gltf { detail: String },
    /// Invalid data format or structure.
    InvalidFormat {
        context: &'static str,
        detail: String,
    },
    /// A buffer referenced by the document was not supplied.
    MissingBuffer { index: usize },
    /// Index out of bounds.
    IndexOutOfBounds { index: usize, len: usize },
    /// A primitive uses a compression extension with no registered decoder.
    UnsupportedCompression { extension: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gltf { detail } => write!(f, "invalid glTF document: {detail}"),
            Self::InvalidFormat { context, detail } => {
                write!(f, "invalid format in {context}: {detail}")
            }
            Self::MissingBuffer { index } => write!(f, "buffer {index} was not loaded"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::UnsupportedCompression { extension } => {
                write!(f, "no geometry decoder registered for {extension}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<gltf::Error> for DecodeError {
    fn from(e: gltf::Error) -> Self {
        Self::Gltf {
            detail: e.to_string(),
        }
    }
}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
