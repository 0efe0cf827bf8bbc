//! Caller-scoped cancellation.
//!
//! A [`CancelToken`] bounds how long a caller waits on an output. Firing it
//! ends every wait registered through
//! [`Output::settled_with`](crate::Output::settled_with) or
//! [`Output::value_with`](crate::Output::value_with) with
//! [`Error::Cancelled`]. The outputs themselves are never touched: other
//! observers keep waiting and still receive the eventual settlement.

use crate::error::{Error, Result};
use crate::tracing_compat::debug;
use crate::types::CancelReason;
use parking_lot::Mutex;
use slab::Slab;
use std::sync::Arc;
use std::task::Waker;

/// A cloneable cancellation signal.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Mutex<CancelState>>,
}

#[derive(Default)]
struct CancelState {
    reason: Option<CancelReason>,
    waiters: Slab<Waker>,
}

impl CancelToken {
    /// Creates a token that has not fired.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the token, waking every registered wait.
    ///
    /// Returns true on the first call. A later call replaces the recorded
    /// reason only with a more urgent one.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        let waiters = {
            let mut state = self.inner.lock();
            if let Some(existing) = &mut state.reason {
                if reason.outranks(existing) {
                    *existing = reason;
                }
                return false;
            }
            debug!(reason = %reason, waiters = state.waiters.len(), "cancel token fired");
            state.reason = Some(reason);
            std::mem::take(&mut state.waiters)
        };
        for (_, waker) in waiters {
            waker.wake();
        }
        true
    }

    /// Returns true once the token has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.lock().reason.is_some()
    }

    /// Returns the reason the token fired with.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        self.inner.lock().reason.clone()
    }

    /// Returns `Err(Error::Cancelled)` once the token has fired.
    pub fn checkpoint(&self) -> Result<()> {
        self.reason().map_or(Ok(()), |reason| Err(Error::Cancelled(reason)))
    }

    /// Returns the reason if fired; otherwise registers (or refreshes)
    /// `waker` under `key`.
    pub(crate) fn poll_cancelled(&self, key: &mut Option<usize>, waker: &Waker) -> Option<CancelReason> {
        let mut state = self.inner.lock();
        if let Some(reason) = &state.reason {
            *key = None;
            return Some(reason.clone());
        }
        match key.and_then(|k| state.waiters.get_mut(k)) {
            Some(existing) => {
                if !existing.will_wake(waker) {
                    existing.clone_from(waker);
                }
            }
            None => *key = Some(state.waiters.insert(waker.clone())),
        }
        None
    }

    /// Removes a waker registered by [`poll_cancelled`](Self::poll_cancelled).
    pub(crate) fn deregister(&self, key: usize) {
        let mut state = self.inner.lock();
        if state.reason.is_none() {
            state.waiters.try_remove(key);
        }
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("CancelToken")
            .field("reason", &state.reason)
            .field("waiters", &state.waiters.len())
            .finish()
    }
}
