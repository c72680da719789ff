//! Perdict codec layer
//!
//! Everything a snapshot needs to travel between memory and disk:
//! - `Value`: codec-neutral tree holding one stored entry
//! - `Map`: the full dictionary, string keys to values
//! - `Format`: hint naming the wire format of a codec
//! - `Codec`: encodes a whole `Map` to bytes and decodes it back
//! - `JsonCodec`: the default codec
//!
//! # Example
//!
//! ```rust
//! use perdict_codec::{Codec, JsonCodec, Map, Value};
//!
//! let mut entries = Map::new();
//! entries.insert("answer".to_string(), Value::from(42i64));
//!
//! let bytes = JsonCodec.encode_snapshot(&entries).unwrap();
//! assert_eq!(JsonCodec.decode_snapshot(&bytes).unwrap(), entries);
//! ```

pub use bytes::Bytes;

mod codec;
mod convert;
mod error;
mod format;
mod value;

pub use codec::{Codec, JsonCodec};
pub use convert::{from_value, to_value};
pub use error::Error;
pub use format::Format;
pub use value::{DisplayMap, Map, Value};
