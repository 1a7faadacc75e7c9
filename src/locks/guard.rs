//! RAII claim guard.

use super::handle::MachineLock;
use crate::error::Result;

/// A granted claim that is released when the guard is dropped.
///
/// If the release fails during drop, a warning is logged and no panic occurs.
/// Use [`ClaimGuard::release`] to observe the error instead.
#[derive(Debug)]
pub struct ClaimGuard<'a> {
    lock: &'a MachineLock,
    exclusive: bool,
    released: bool,
}

impl<'a> ClaimGuard<'a> {
    pub(super) fn new(lock: &'a MachineLock, exclusive: bool) -> Self {
        Self {
            lock,
            exclusive,
            released: false,
        }
    }

    /// Whether the guarded claim is exclusive.
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Release the claim now. `Ok(true)` also when it was already gone.
    pub fn release(mut self) -> Result<bool> {
        self.released = true;
        self.lock.unlock_own(self.exclusive)
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.lock.unlock_own(self.exclusive)
        {
            log::warn!(
                "failed to release claim on '{}': {}",
                self.lock.resource(),
                e
            );
        }
    }
}
