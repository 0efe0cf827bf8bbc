//! Settlement cell: a write-once, broadcast-to-all terminal state.
//!
//! A [`Cell`] starts pending and transitions exactly once to known, unknown
//! or failed. The transition wakes every waiting observer and runs every
//! registered subscriber; observers and subscribers that arrive after the
//! transition see the same snapshot immediately.
//!
//! # Invariants
//!
//! - The settlement is written at most once. A second write through
//!   [`Cell::settle`] is a programming error and panics; it never replaces
//!   the first settlement.
//! - A cell can be *claimed* by a producer that promises to settle it later
//!   by delegation. A claimed cell rejects direct settlement the same way a
//!   settled one does; only [`Cell::complete_claimed`] may settle it.
//! - Pending delegations never form a cycle. A claim that would make a cell
//!   wait on itself, directly or through other claimed cells, is refused.
//! - The internal lock is never held while wakers run or subscribers are
//!   invoked, so a subscriber may freely observe or settle other cells.

use crate::error::AlreadySettled;
use crate::output::Value;
use crate::registry::OutputType;
use crate::sync::{Settlement, Status};
use crate::tracing_compat::{error, trace};
use crate::types::OutputId;
use parking_lot::Mutex;
use slab::Slab;
use smallvec::SmallVec;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

/// Serializes claims so two concurrent delegations cannot close a cycle
/// that neither sees on its own.
static CLAIMS: Mutex<()> = Mutex::new(());

/// One-shot callback run with the terminal snapshot.
pub(crate) type Subscriber = Box<dyn FnOnce(Settlement<Value>) + Send>;

/// Shared settlement state of one output.
pub(crate) struct Cell {
    id: OutputId,
    /// Variant tag of the output that created the cell. Used for dispatch
    /// and diagnostics, never for validation.
    ty: OutputType,
    state: Mutex<CellState>,
}

struct CellState {
    settlement: Option<Settlement<Value>>,
    claimed: bool,
    /// Cell this one is waiting on while claimed and pending.
    source: Option<Arc<Cell>>,
    waiters: Slab<Waker>,
    subscribers: SmallVec<[Subscriber; 1]>,
}

impl Cell {
    /// Creates a pending cell.
    pub(crate) fn new(ty: OutputType) -> Self {
        Self {
            id: OutputId::next(),
            ty,
            state: Mutex::new(CellState {
                settlement: None,
                claimed: false,
                source: None,
                waiters: Slab::new(),
                subscribers: SmallVec::new(),
            }),
        }
    }

    pub(crate) fn id(&self) -> OutputId {
        self.id
    }

    pub(crate) fn output_type(&self) -> &OutputType {
        &self.ty
    }

    /// Returns the current status without waiting.
    pub(crate) fn status(&self) -> Status {
        self.state
            .lock()
            .settlement
            .as_ref()
            .map_or(Status::Pending, Settlement::status)
    }

    /// Returns the terminal snapshot if the cell has settled.
    pub(crate) fn peek(&self) -> Option<Settlement<Value>> {
        self.state.lock().settlement.clone()
    }

    /// Settles the cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell is already settled or claimed for delegation.
    pub(crate) fn settle(&self, settlement: Settlement<Value>) {
        if let Err(err) = self.try_settle(settlement) {
            error!(output = %self.id, existing = %err.existing, attempted = %err.attempted,
                "double settlement rejected");
            panic!("output {} {err}", self.id);
        }
    }

    /// Settles the cell, reporting a prior settlement or claim instead of
    /// panicking.
    pub(crate) fn try_settle(&self, settlement: Settlement<Value>) -> Result<(), AlreadySettled> {
        self.transition(settlement, false)
    }

    /// Marks the cell as owned by a delegation to `source`; direct
    /// settlement is rejected from now on.
    pub(crate) fn claim(&self, source: &Arc<Self>) -> Result<(), ClaimError> {
        let _claims = CLAIMS.lock();
        if source.waits_on(self) {
            return Err(ClaimError::Cycle);
        }
        let mut state = self.state.lock();
        if let Some(existing) = &state.settlement {
            return Err(ClaimError::Settled(AlreadySettled {
                existing: existing.status(),
                attempted: Status::Pending,
            }));
        }
        if state.claimed {
            return Err(ClaimError::Settled(AlreadySettled {
                existing: Status::Pending,
                attempted: Status::Pending,
            }));
        }
        state.claimed = true;
        state.source = Some(Arc::clone(source));
        drop(state);
        Ok(())
    }

    /// Returns true if following pending delegations from `self` reaches
    /// `target`. A cell trivially waits on itself.
    fn waits_on(self: &Arc<Self>, target: &Self) -> bool {
        let mut next = Some(Arc::clone(self));
        while let Some(cell) = next {
            if std::ptr::eq(Arc::as_ptr(&cell), target) {
                return true;
            }
            next = cell.state.lock().source.clone();
        }
        false
    }

    /// Settles a cell previously claimed with [`Cell::claim`].
    pub(crate) fn complete_claimed(&self, settlement: Settlement<Value>) {
        if let Err(err) = self.transition(settlement, true) {
            error!(output = %self.id, existing = %err.existing, attempted = %err.attempted,
                "delegated settlement found the cell already settled");
            panic!("output {} {err}", self.id);
        }
    }

    fn transition(
        &self,
        settlement: Settlement<Value>,
        via_claim: bool,
    ) -> Result<(), AlreadySettled> {
        let (waiters, subscribers) = {
            let mut state = self.state.lock();
            if let Some(existing) = &state.settlement {
                return Err(AlreadySettled {
                    existing: existing.status(),
                    attempted: settlement.status(),
                });
            }
            if state.claimed != via_claim {
                return Err(AlreadySettled {
                    existing: Status::Pending,
                    attempted: settlement.status(),
                });
            }
            state.settlement = Some(settlement.clone());
            state.source = None;
            (
                std::mem::take(&mut state.waiters),
                std::mem::take(&mut state.subscribers),
            )
        };

        trace!(
            output = %self.id,
            ty = %self.ty.name(),
            status = %settlement.status(),
            waiters = waiters.len(),
            subscribers = subscribers.len(),
            "output settled"
        );

        for (_, waker) in waiters {
            waker.wake();
        }
        for subscriber in subscribers {
            subscriber(settlement.clone());
        }
        Ok(())
    }

    /// Registers a one-shot subscriber.
    ///
    /// If the cell has already settled the subscriber runs immediately on
    /// the calling thread; otherwise it runs on the settling thread after
    /// the lock is released. Subscribers must not run user code inline;
    /// they hand work to a spawner.
    pub(crate) fn on_settled(&self, subscriber: Subscriber) {
        let settled = {
            let mut state = self.state.lock();
            match &state.settlement {
                Some(settlement) => settlement.clone(),
                None => {
                    state.subscribers.push(subscriber);
                    return;
                }
            }
        };
        subscriber(settled);
    }

    /// Returns a future resolving to the terminal snapshot.
    pub(crate) fn observe(self: &Arc<Self>) -> Observe {
        Observe {
            cell: Arc::clone(self),
            key: None,
        }
    }
}

/// Why [`Cell::claim`] was refused.
#[derive(Debug)]
pub(crate) enum ClaimError {
    /// The cell is already settled or claimed.
    Settled(AlreadySettled),
    /// The source already waits, possibly transitively, on the cell.
    Cycle,
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("id", &self.id)
            .field("ty", &self.ty.name())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Future returned by [`Cell::observe`].
///
/// Any number of observers may wait on one cell. Dropping a pending
/// observer removes its waker.
#[must_use = "futures do nothing unless polled"]
pub(crate) struct Observe {
    cell: Arc<Cell>,
    key: Option<usize>,
}

impl Future for Observe {
    type Output = Settlement<Value>;

    fn poll(self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut state = this.cell.state.lock();

        if let Some(settlement) = &state.settlement {
            let settled = settlement.clone();
            // The waiter slab was drained on settlement; a stale key is
            // simply forgotten.
            this.key = None;
            return Poll::Ready(settled);
        }

        match this.key.and_then(|key| state.waiters.get_mut(key)) {
            Some(waker) => {
                if !waker.will_wake(context.waker()) {
                    waker.clone_from(context.waker());
                }
            }
            None => {
                this.key = Some(state.waiters.insert(context.waker().clone()));
            }
        }
        Poll::Pending
    }
}

impl Drop for Observe {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            let mut state = self.cell.state.lock();
            if state.settlement.is_none() {
                state.waiters.try_remove(key);
            }
        }
    }
}
