//! Construction parameters.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use perdict_codec::{Codec, JsonCodec};

use crate::{Error, Perdict};

/// Directory under the home directory holding the default snapshot.
pub const DEFAULT_DIR_NAME: &str = ".perdict";

/// File name of the default snapshot.
pub const DEFAULT_FILE_NAME: &str = "globals.json";

/// The well-known snapshot location, `~/.perdict/globals.json`.
///
/// Falls back to the working directory when no home directory is known.
pub fn default_path() -> PathBuf {
    default_path_in(&home())
}

/// The default snapshot location under `home`.
pub fn default_path_in(home: &Path) -> PathBuf {
    home.join(DEFAULT_DIR_NAME).join(DEFAULT_FILE_NAME)
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// When writes reach the disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Writes land in an in-memory overlay until `sync`.
    #[default]
    Deferred,
    /// Every write saves the whole dictionary before returning.
    WriteThrough,
}

/// Builder for a [`Perdict`] handle.
///
/// ```rust,no_run
/// use perdict::{Mode, Options};
///
/// let store = Options::new()
///     .path("/var/lib/app/state.json")
///     .mode(Mode::WriteThrough)
///     .open()?;
/// # Ok::<(), perdict::Error>(())
/// ```
pub struct Options {
    pub(crate) path: Option<PathBuf>,
    pub(crate) mode: Mode,
    pub(crate) populate_cache_on_read: bool,
    pub(crate) codec: Box<dyn Codec>,
}

impl Options {
    pub fn new() -> Self {
        Options {
            path: None,
            mode: Mode::default(),
            populate_cache_on_read: true,
            codec: Box::new(JsonCodec),
        }
    }

    /// Snapshot file to use instead of [`default_path`].
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether a deferred `get` that falls through to the mirror copies the
    /// value into the overlay. Ignored in write-through mode.
    pub fn populate_cache_on_read(mut self, populate: bool) -> Self {
        self.populate_cache_on_read = populate;
        self
    }

    pub fn codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    /// The snapshot path, creating the default directory when no explicit
    /// path was given. Creating it again is a no-op.
    pub(crate) fn resolve_path(&mut self) -> Result<PathBuf, Error> {
        self.resolve_path_in(&home())
    }

    fn resolve_path_in(&mut self, home: &Path) -> Result<PathBuf, Error> {
        if let Some(path) = self.path.take() {
            return Ok(path);
        }

        let path = default_path_in(home);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        Ok(path)
    }

    pub fn open(self) -> Result<Perdict, Error> {
        Perdict::with_options(self)
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("populate_cache_on_read", &self.populate_cache_on_read)
            .field("format", &self.codec.format())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = Options::default();
        assert_eq!(options.mode, Mode::Deferred);
        assert!(options.populate_cache_on_read);
        assert!(options.path.is_none());
        assert_eq!(options.codec.format(), perdict_codec::Format::JSON);
    }

    #[test]
    fn default_path_shape() {
        let path = default_path();
        assert!(path.ends_with(".perdict/globals.json"));
    }

    #[test]
    fn explicit_path_is_used_as_is() {
        let home = tempfile::tempdir().unwrap();
        let mut options = Options::new().path("relative/state.json");
        assert_eq!(
            options.resolve_path_in(home.path()).unwrap(),
            PathBuf::from("relative/state.json")
        );
        assert!(!home.path().join(DEFAULT_DIR_NAME).exists());
    }

    #[test]
    fn default_directory_is_created() {
        let home = tempfile::tempdir().unwrap();
        let path = Options::new().resolve_path_in(home.path()).unwrap();

        assert_eq!(path, default_path_in(home.path()));
        assert!(home.path().join(DEFAULT_DIR_NAME).is_dir());
        assert!(!path.exists());
    }

    #[test]
    fn default_directory_creation_is_idempotent() {
        let home = tempfile::tempdir().unwrap();
        let path = Options::new().resolve_path_in(home.path()).unwrap();
        fs::write(&path, b"{\"kept\": 1}").unwrap();

        let again = Options::new().resolve_path_in(home.path()).unwrap();
        assert_eq!(again, path);
        assert_eq!(fs::read(&path).unwrap(), b"{\"kept\": 1}");
    }

    #[test]
    fn default_directory_failure_is_an_io_error() {
        let home = tempfile::tempdir().unwrap();
        // A file where the directory should go.
        fs::write(home.path().join(DEFAULT_DIR_NAME), b"").unwrap();

        let err = Options::new().resolve_path_in(home.path()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn builder_setters() {
        let options = Options::new()
            .mode(Mode::WriteThrough)
            .populate_cache_on_read(false);
        assert_eq!(options.mode, Mode::WriteThrough);
        assert!(!options.populate_cache_on_read);
        assert!(format!("{:?}", options).contains("WriteThrough"));
    }
}
