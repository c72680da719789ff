//! Non-fatal conditions.

use std::fmt;
use std::path::PathBuf;

/// Something worth telling the caller about that did not stop the operation.
///
/// Every warning is logged at `warn` level when raised and queued on the
/// handle; see [`Perdict::take_warnings`](crate::Perdict::take_warnings).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    /// The snapshot file exists but could not be decoded; it was treated as
    /// an empty dictionary.
    CorruptSnapshot { path: PathBuf, message: String },

    /// A write-through `set` replaced an existing value.
    Overwrite { key: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::CorruptSnapshot { path, message } => write!(
                f,
                "snapshot {} could not be decoded, starting empty: {}",
                path.display(),
                message
            ),
            Warning::Overwrite { key } => write!(f, "overriding key {} with a new value", key),
        }
    }
}
