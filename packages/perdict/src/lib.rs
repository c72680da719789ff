//! Perdict: a persistent dictionary in a single file
//!
//! A `Perdict` holds a whole dictionary of string keys to [`Value`]s in
//! memory and mirrors it to one snapshot file. It suits small, long-lived
//! state used by one process; every save rewrites the whole file.
//!
//! Two write policies, picked per handle with [`Mode`]:
//! - `Deferred`: writes collect in an in-memory overlay until
//!   [`Perdict::sync`] (or the end of a scope) persists them.
//! - `WriteThrough`: every write saves before returning.
//!
//! Keys are normalized, so `"new key"` and `"new_key"` are one entry.
//!
//! # Example
//!
//! ```rust,no_run
//! use perdict::{Mode, Perdict, Value};
//!
//! let mut store = Perdict::open("state.json", Mode::Deferred)?;
//! store.scoped(|store| {
//!     store.set("last run", "2024-01-01")?;
//!     store.set("runs", 12)?;
//!     Ok::<_, perdict::Error>(())
//! })?;
//!
//! assert_eq!(store.get("last_run")?, Value::from("2024-01-01"));
//! # Ok::<(), perdict::Error>(())
//! ```

mod backing;
mod error;
mod key;
mod options;
mod overlay;
mod scope;
mod store;
mod warning;

pub use backing::{BackingStore, Snapshot};
pub use error::Error;
pub use key::{normalize, SEPARATOR};
pub use options::{
    default_path, default_path_in, Mode, Options, DEFAULT_DIR_NAME, DEFAULT_FILE_NAME,
};
pub use overlay::Overlay;
pub use scope::SyncGuard;
pub use store::{Keys, Perdict, RESERVED_FIELDS};
pub use warning::Warning;

// Re-export codec types for convenience
pub use perdict_codec::{Codec, Format, JsonCodec, Map, Value};

use std::path::PathBuf;

/// Open a store at `filename`.
pub fn dopen(filename: impl Into<PathBuf>, mode: Mode) -> Result<Perdict, Error> {
    Perdict::open(filename, mode)
}
