//! Thread-per-task spawner.

use super::{Spawn, SpawnError, StoredTask};
use crate::config::RuntimeConfig;
use crate::tracing_compat::trace;
use std::sync::atomic::{AtomicU64, Ordering};

/// Runs every task on a fresh, named OS thread, blocking that thread on the
/// task with `futures_lite::future::block_on`.
///
/// Tasks in this crate are short: they wait on at most a handful of cells
/// and settle one. A dedicated thread keeps a blocked producer from ever
/// starving a continuation.
#[derive(Debug)]
pub struct ThreadSpawner {
    prefix: String,
    stack_size: Option<usize>,
    next: AtomicU64,
}

impl ThreadSpawner {
    /// Creates a spawner naming and sizing threads per `config`.
    #[must_use]
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            prefix: config.thread_name_prefix.clone(),
            stack_size: config.stack_size,
            next: AtomicU64::new(0),
        }
    }
}

impl Spawn for ThreadSpawner {
    fn spawn(&self, task: StoredTask) -> Result<(), SpawnError> {
        let name = format!("{}-{}", self.prefix, self.next.fetch_add(1, Ordering::Relaxed));
        let mut builder = std::thread::Builder::new().name(name);
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }
        let (id, label) = (task.id(), task.label());
        let _detached = builder.spawn(move || {
            futures_lite::future::block_on(task);
            trace!(task = %id, label, "task finished");
        })?;
        Ok(())
    }
}
