//! Stored task type handed to spawners.
//!
//! `StoredTask` wraps a type-erased future produced by a combinator: a
//! continuation run, a delegation forward or a join waiter. Each task
//! carries a [`TaskId`] and a static label naming the combinator that
//! created it, so spawners can log or name what they run.

use crate::types::TaskId;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A type-erased unit of work.
pub struct StoredTask {
    id: TaskId,
    label: &'static str,
    /// The pinned, boxed future to poll.
    future: Pin<Box<dyn Future<Output = ()> + Send>>,
}

impl StoredTask {
    /// Creates a new stored task from a future.
    ///
    /// The future must settle its own result cell; its output is discarded.
    pub fn new<F>(label: &'static str, future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            id: TaskId::next(),
            label,
            future: Box::pin(future),
        }
    }

    /// Returns the task's id.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the label of the combinator that created the task.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Polls the stored task.
    ///
    /// Returns `Poll::Ready(())` when the task is complete, or `Poll::Pending`
    /// if it needs to be polled again.
    pub fn poll(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        self.future.as_mut().poll(cx)
    }
}

impl Future for StoredTask {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.get_mut().future.as_mut().poll(cx)
    }
}

impl std::fmt::Debug for StoredTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredTask")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
