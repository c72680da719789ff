//! The store handle.

use std::collections::btree_map;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use perdict_codec::{from_value, to_value, DisplayMap, Map, Value};

use crate::backing::BackingStore;
use crate::key::normalize;
use crate::overlay::Overlay;
use crate::scope::SyncGuard;
use crate::{Error, Mode, Options, Warning};

/// Names `set_field` refuses: they are the handle's own state, not entries.
pub const RESERVED_FIELDS: [&str; 4] = ["filename", "cache_mode", "dic", "cache"];

/// A dictionary mirrored to a single file.
///
/// The handle keeps the whole dictionary in memory (the mirror) and rewrites
/// the whole file on every save. In [`Mode::Deferred`] writes collect in an
/// overlay and reach the file on [`sync`](Perdict::sync); in
/// [`Mode::WriteThrough`] every write saves before returning. Keys are
/// normalized with [`normalize`](crate::normalize) by every operation.
///
/// The handle is mutable external state, not a value: it implements none of
/// `PartialEq`, `Eq`, `PartialOrd`, `Ord` or `Hash`.
///
/// ```compile_fail
/// let a = perdict::Perdict::open("a.json", perdict::Mode::Deferred).unwrap();
/// let b = perdict::Perdict::open("b.json", perdict::Mode::Deferred).unwrap();
/// let _ = a == b;
/// ```
pub struct Perdict {
    backing: BackingStore,
    dic: Map,
    /// Present exactly when the handle is deferred.
    cache: Option<Overlay>,
    populate_cache_on_read: bool,
    /// The mirror holds changes the last save failed to persist. Reloading
    /// would throw them away, so implicit reloads are skipped until a save
    /// succeeds or the caller calls `load`.
    unsaved: bool,
    warnings: Vec<Warning>,
}

impl Perdict {
    /// Open the snapshot at `path` and load it.
    pub fn open(path: impl Into<PathBuf>, mode: Mode) -> Result<Self, Error> {
        Options::new().path(path).mode(mode).open()
    }

    pub(crate) fn with_options(mut options: Options) -> Result<Self, Error> {
        let path = options.resolve_path()?;
        let cache = match options.mode {
            Mode::Deferred => Some(Overlay::new()),
            Mode::WriteThrough => None,
        };

        let mut store = Perdict {
            backing: BackingStore::new(path, options.codec),
            dic: Map::new(),
            cache,
            populate_cache_on_read: options.populate_cache_on_read,
            unsaved: false,
            warnings: Vec::new(),
        };
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        self.backing.path()
    }

    pub fn mode(&self) -> Mode {
        if self.cache.is_some() {
            Mode::Deferred
        } else {
            Mode::WriteThrough
        }
    }

    /// Replace the mirror with the snapshot on disk.
    ///
    /// Pending overlay entries are kept and still shadow the mirror.
    pub fn load(&mut self) -> Result<(), Error> {
        let snapshot = self.backing.load()?;
        if let Some(warning) = snapshot.warning {
            self.warn(warning);
        }
        self.dic = snapshot.entries;
        self.unsaved = false;
        Ok(())
    }

    /// Persist the mirror as it is right now.
    ///
    /// Pending overlay entries are not included; use [`sync`](Perdict::sync)
    /// for that. On failure the mirror is left as it is so the offending
    /// value can be fixed or removed before retrying.
    pub fn save(&mut self) -> Result<(), Error> {
        match self.backing.save(&self.dic) {
            Ok(()) => {
                self.unsaved = false;
                Ok(())
            }
            Err(err) => {
                self.unsaved = true;
                Err(err)
            }
        }
    }

    /// Drain pending writes into the mirror and persist it.
    pub fn sync(&mut self) -> Result<(), Error> {
        if let Some(cache) = self.cache.as_mut() {
            cache.drain_into(&mut self.dic);
        }
        self.save()
    }

    /// Reload the mirror unless it holds changes a failed save left behind.
    fn refresh(&mut self) -> Result<(), Error> {
        if self.unsaved {
            log::debug!(
                "Keeping unsaved mirror for {} instead of reloading",
                self.path().display()
            );
            return Ok(());
        }
        self.load()
    }

    /// Look up `key`.
    ///
    /// Deferred handles answer from the overlay first. Otherwise the mirror
    /// is reloaded from disk and consulted; a deferred handle then copies the
    /// value into its overlay unless that was turned off in [`Options`].
    pub fn get(&mut self, key: &str) -> Result<Value, Error> {
        let key = normalize(key);

        if let Some(value) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            return Ok(value.clone());
        }

        self.refresh()?;
        let value = self
            .dic
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::KeyNotFound { key: key.clone() })?;

        if self.populate_cache_on_read {
            if let Some(cache) = self.cache.as_mut() {
                cache.put(key, value.clone());
            }
        }
        Ok(value)
    }

    /// [`get`](Perdict::get) followed by conversion into `T`.
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> Result<T, Error> {
        let value = self.get(key)?;
        from_value(value).map_err(|source| Error::Conversion {
            key: normalize(key),
            source,
        })
    }

    /// Store `value` under `key`.
    ///
    /// Deferred handles only touch the overlay. Write-through handles update
    /// the mirror, raise [`Warning::Overwrite`] when the key already existed,
    /// and save.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), Error> {
        let key = normalize(key);
        let value = value.into();

        match self.cache.as_mut() {
            Some(cache) => {
                cache.put(key, value);
                Ok(())
            }
            None => {
                if self.dic.insert(key.clone(), value).is_some() {
                    self.warn(Warning::Overwrite { key });
                }
                self.save()
            }
        }
    }

    /// Convert `data` into a [`Value`] and [`set`](Perdict::set) it.
    pub fn set_as<T: Serialize + ?Sized>(&mut self, key: &str, data: &T) -> Result<(), Error> {
        let value = to_value(data).map_err(|source| Error::Conversion {
            key: normalize(key),
            source,
        })?;
        self.set(key, value)
    }

    /// Remove `key` from the mirror and the overlay, then save.
    ///
    /// Removing a key that is not there is not an error; the save still
    /// happens.
    pub fn delete(&mut self, key: &str) -> Result<(), Error> {
        let key = normalize(key);
        self.dic.remove(&key);
        if let Some(cache) = self.cache.as_mut() {
            cache.remove(&key);
        }
        self.save()
    }

    /// Whether `key` is in the mirror or, for deferred handles, the overlay.
    pub fn contains(&self, key: &str) -> bool {
        let key = normalize(key);
        self.dic.contains_key(&key)
            || self
                .cache
                .as_ref()
                .is_some_and(|cache| cache.contains(&key))
    }

    /// Keys of the mirror, in order.
    ///
    /// Overlay entries appear only after a [`sync`](Perdict::sync).
    pub fn keys(&self) -> Keys<'_> {
        Keys {
            inner: self.dic.keys(),
        }
    }

    /// Number of entries in the mirror. Overlay entries are not counted
    /// until synced.
    pub fn len(&self) -> usize {
        self.dic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dic.is_empty()
    }

    /// Number of writes waiting for the next sync. Always zero when
    /// write-through.
    pub fn pending(&self) -> usize {
        self.cache.as_ref().map_or(0, Overlay::len)
    }

    /// Explicit form of attribute-style assignment: set `name` and persist
    /// it straight away.
    ///
    /// The handle's own field names in [`RESERVED_FIELDS`] are refused so
    /// an entry can never alias them.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> Result<(), Error> {
        let key = normalize(name);
        if RESERVED_FIELDS.contains(&key.as_str()) {
            return Err(Error::ReservedField { name: key });
        }

        self.set(&key, value)?;
        match self.mode() {
            Mode::Deferred => self.sync(),
            Mode::WriteThrough => Ok(()),
        }
    }

    /// Start a scoped use of the handle.
    ///
    /// The returned guard derefs to the handle and runs the exit step when
    /// finished or dropped, whatever the way out.
    pub fn enter(&mut self) -> SyncGuard<'_> {
        SyncGuard::new(self)
    }

    /// Run `f` against the handle, then exit the scope whether `f` failed
    /// or not.
    ///
    /// An error from `f` wins over an error from the exit step; the latter
    /// is logged.
    pub fn scoped<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Perdict) -> Result<T, E>,
        E: From<Error>,
    {
        let outcome = f(&mut *self);
        let exited = self.exit();
        match (outcome, exited) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err.into()),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(exit_err)) => {
                log::error!(
                    "Failed to sync {} while leaving scope: {}",
                    self.path().display(),
                    exit_err
                );
                Err(err)
            }
        }
    }

    /// Leave a scope: deferred handles sync. Write-through handles have
    /// already saved every write, so nothing is left to do.
    pub(crate) fn exit(&mut self) -> Result<(), Error> {
        match self.mode() {
            Mode::Deferred => self.sync(),
            Mode::WriteThrough => Ok(()),
        }
    }

    /// Warnings raised since the last call, oldest first.
    ///
    /// A corrupt file is reported once per run of reloads: every `get` miss
    /// re-reads it, and an identical `CorruptSnapshot` is not queued twice in
    /// a row.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Logs and queues `warning`. A `CorruptSnapshot` equal to the last queued
    /// warning is dropped.
    fn warn(&mut self, warning: Warning) {
        let repeat = self.warnings.last() == Some(&warning);
        if repeat && matches!(warning, Warning::CorruptSnapshot { .. }) {
            return;
        }
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Iterator over the keys of a [`Perdict`] mirror.
pub struct Keys<'a> {
    inner: btree_map::Keys<'a, String, Value>,
}

impl<'a> Iterator for Keys<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(String::as_str)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Keys<'_> {}

impl<'a> IntoIterator for &'a Perdict {
    type Item = &'a str;
    type IntoIter = Keys<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys()
    }
}

impl fmt::Display for Perdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", DisplayMap(&self.dic))
    }
}

impl fmt::Debug for Perdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Perdict")
            .field("path", &self.path())
            .field("mode", &self.mode())
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}
