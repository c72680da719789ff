//! Scoped use of a store handle.

use std::ops::{Deref, DerefMut};

use crate::{Error, Perdict};

/// Borrow of a [`Perdict`] that syncs on the way out.
///
/// Call [`finish`](SyncGuard::finish) to see the result of the final sync.
/// If the guard is dropped instead (an early `?` return, a panic), the sync
/// still runs and a failure is logged.
///
/// ```rust,no_run
/// use perdict::{Mode, Perdict};
///
/// let mut store = Perdict::open("state.json", Mode::Deferred)?;
/// let mut scope = store.enter();
/// scope.set("context key", "hello context key")?;
/// scope.finish()?;
/// # Ok::<(), perdict::Error>(())
/// ```
pub struct SyncGuard<'a> {
    store: &'a mut Perdict,
    finished: bool,
}

impl<'a> SyncGuard<'a> {
    pub(crate) fn new(store: &'a mut Perdict) -> Self {
        SyncGuard {
            store,
            finished: false,
        }
    }

    /// Leave the scope and report how the final sync went.
    pub fn finish(mut self) -> Result<(), Error> {
        self.finished = true;
        self.store.exit()
    }
}

impl Deref for SyncGuard<'_> {
    type Target = Perdict;

    fn deref(&self) -> &Self::Target {
        self.store
    }
}

impl DerefMut for SyncGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.store
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.store.exit() {
            log::error!(
                "Failed to sync {} while leaving scope: {}",
                self.store.path().display(),
                err
            );
        }
    }
}
