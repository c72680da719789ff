//! The snapshot file.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::{fmt, fs};

use perdict_codec::{Codec, Map};

use crate::{Error, Warning};

/// Result of reading the snapshot file.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub entries: Map,
    /// Set when the file existed but could not be decoded.
    pub warning: Option<Warning>,
}

/// Owns the path of one snapshot file and the codec used for it.
///
/// Every save rewrites the whole file. There is no append log and no locking
/// against other writers.
pub struct BackingStore {
    path: PathBuf,
    codec: Box<dyn Codec>,
}

impl BackingStore {
    pub fn new(path: PathBuf, codec: Box<dyn Codec>) -> Self {
        BackingStore { path, codec }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the whole snapshot.
    ///
    /// A missing file is an empty dictionary. A file that fails to decode is
    /// an empty dictionary plus a [`Warning::CorruptSnapshot`].
    pub fn load(&self) -> Result<Snapshot, Error> {
        log::debug!("Reading {}...", self.path.display());

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(Snapshot::default());
            }
            Err(error) => return Err(Error::io(&self.path, error)),
        };

        match self.codec.decode_snapshot(&bytes) {
            Ok(entries) => Ok(Snapshot {
                entries,
                warning: None,
            }),
            Err(error) => Ok(Snapshot {
                entries: Map::new(),
                warning: Some(Warning::CorruptSnapshot {
                    path: self.path.clone(),
                    message: error.to_string(),
                }),
            }),
        }
    }

    /// Encode `entries` and atomically replace the file with them.
    ///
    /// Encoding happens before the file is touched, so a value the codec
    /// rejects leaves the previous snapshot intact. The bytes go to a
    /// temporary file in the same directory which is then renamed over the
    /// target.
    pub fn save(&self, entries: &Map) -> Result<(), Error> {
        let bytes = self.codec.encode_snapshot(entries)?;

        log::debug!("Writing {}...", self.path.display());

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
        temp.write_all(&bytes).map_err(|e| Error::io(temp.path(), e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| Error::io(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| Error::io(&self.path, e.error))?;

        Ok(())
    }
}

impl fmt::Debug for BackingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackingStore")
            .field("path", &self.path)
            .field("format", &self.codec.format())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perdict_codec::{JsonCodec, Value};

    fn store_in(dir: &tempfile::TempDir) -> BackingStore {
        BackingStore::new(dir.path().join("globals.json"), Box::new(JsonCodec))
    }

    #[test]
    fn missing_file_is_empty_without_warning() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = store_in(&dir).load().unwrap();
        assert!(snapshot.entries.is_empty());
        assert!(snapshot.warning.is_none());
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut entries = Map::new();
        entries.insert("new_val".to_string(), Value::from(100i64));
        entries.insert("blob".to_string(), Value::from(vec![9u8, 8, 7]));
        store.save(&entries).unwrap();

        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.entries, entries);
        assert!(snapshot.warning.is_none());
    }

    #[test]
    fn corrupt_file_is_empty_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), b"\x80\x04\x95 not json").unwrap();

        let snapshot = store.load().unwrap();
        assert!(snapshot.entries.is_empty());
        assert!(matches!(
            snapshot.warning,
            Some(Warning::CorruptSnapshot { ref path, .. }) if path == store.path()
        ));
    }

    #[test]
    fn truncated_file_is_empty_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), b"{\"key\": [1, 2").unwrap();

        let snapshot = store.load().unwrap();
        assert!(snapshot.entries.is_empty());
        assert!(snapshot.warning.is_some());
    }

    #[test]
    fn failed_encode_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut entries = Map::new();
        entries.insert("good".to_string(), Value::from("kept"));
        store.save(&entries).unwrap();
        let before = fs::read(store.path()).unwrap();

        entries.insert("bad".to_string(), Value::from(f64::NAN));
        let err = store.save(&entries).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));

        assert_eq!(fs::read(store.path()).unwrap(), before);
        // No stray temporary files either.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackingStore::new(
            dir.path().join("no/such/dir/globals.json"),
            Box::new(JsonCodec),
        );
        let err = store.save(&Map::new()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn unreadable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the snapshot file should be.
        let store = BackingStore::new(dir.path().to_path_buf(), Box::new(JsonCodec));
        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
