//! Error types for the store.

use std::io;
use std::path::PathBuf;

/// Errors surfaced by a [`Perdict`](crate::Perdict) handle.
///
/// Nothing here is retried internally. A corrupt snapshot on load is not an
/// error at all; it becomes a [`Warning`](crate::Warning).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The key is in neither the overlay nor the reloaded mirror.
    #[error("key {key:?} not in perdict")]
    KeyNotFound { key: String },

    /// The mirror holds a value the codec cannot encode. The file is left
    /// as it was and the value stays in memory.
    #[error("cannot save the dictionary because of its values: {0}")]
    Serialization(#[from] perdict_codec::Error),

    /// A stored value does not fit the requested Rust type, or a Rust value
    /// could not be turned into a `Value`.
    #[error("value for key {key:?} could not be converted: {source}")]
    Conversion {
        key: String,
        #[source]
        source: perdict_codec::Error,
    },

    /// `set_field` was given the name of one of the handle's own fields.
    #[error("field {name:?} is reserved for the store handle")]
    ReservedField { name: String },

    /// Any filesystem failure other than a missing snapshot file.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perdict_codec::Format;
    use std::error::Error as StdError;

    #[test]
    fn key_not_found_display() {
        let e = Error::KeyNotFound {
            key: "missing_key".to_string(),
        };
        assert_eq!(e.to_string(), "key \"missing_key\" not in perdict");
    }

    #[test]
    fn serialization_wraps_codec_error() {
        let codec_error = perdict_codec::Error::encode(Format::JSON, "float NaN has no JSON form");
        let e: Error = codec_error.into();
        assert!(matches!(e, Error::Serialization(_)));
        assert!(e.to_string().contains("NaN"));
        assert!(StdError::source(&e).is_some());
    }

    #[test]
    fn io_keeps_path_and_source() {
        let e = Error::io("/tmp/x.json", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(e.to_string().contains("/tmp/x.json"));
        assert!(StdError::source(&e).is_some());
    }
}
