//! Task dispatch for combinators.
//!
//! Combinators never run user code on the thread that settles a source.
//! Every continuation run, delegation forward and join waiter is packaged
//! as a [`StoredTask`] and handed to the [`Spawn`] implementation of the
//! [`Runtime`] the source output belongs to.
//!
//! The default runtime uses [`ThreadSpawner`], which drives each task on its
//! own named thread. Embedders with an executor of their own implement
//! [`Spawn`] and install it through [`RuntimeBuilder::spawner`].

mod builder;
pub mod stored_task;
mod thread;

pub use builder::RuntimeBuilder;
pub use stored_task::StoredTask;
pub use thread::ThreadSpawner;

use crate::config::{ConfigError, RuntimeConfig};
use crate::error::{Error, Result};
use crate::tracing_compat::trace;
use std::future::Future;
use std::sync::{Arc, OnceLock};

/// Executes stored tasks to completion.
pub trait Spawn: Send + Sync + 'static {
    /// Takes ownership of `task` and arranges for it to be polled to
    /// completion. Must not poll it inline on the calling thread.
    fn spawn(&self, task: StoredTask) -> std::result::Result<(), SpawnError>;
}

/// A spawner refused a task.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct SpawnError {
    reason: String,
}

impl SpawnError {
    /// Creates a spawn error with a reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<std::io::Error> for SpawnError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// A spawner together with its configuration.
///
/// Cheap to clone; every output derived from another output inherits its
/// runtime.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

struct RuntimeInner {
    spawner: Arc<dyn Spawn>,
    config: RuntimeConfig,
}

static GLOBAL: OnceLock<Runtime> = OnceLock::new();

impl Runtime {
    /// Returns a builder for a custom runtime.
    #[must_use]
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a thread-backed runtime from a validated configuration.
    pub fn new(config: RuntimeConfig) -> std::result::Result<Self, ConfigError> {
        Self::builder().config(config).build()
    }

    fn from_parts(spawner: Arc<dyn Spawn>, config: RuntimeConfig) -> Self {
        Self {
            inner: Arc::new(RuntimeInner { spawner, config }),
        }
    }

    /// Returns the process-wide default runtime, creating a thread-backed
    /// one on first use.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL.get_or_init(Self::default).clone()
    }

    /// Installs `runtime` as the process-wide default.
    ///
    /// Fails, handing the runtime back, if the default was already created
    /// or installed.
    pub fn set_global(runtime: Self) -> std::result::Result<(), Self> {
        GLOBAL.set(runtime)
    }

    /// Returns the runtime's configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Hands `future` to the spawner as a task labelled `label`.
    pub(crate) fn spawn<F>(&self, label: &'static str, future: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = StoredTask::new(label, future);
        let id = task.id();
        trace!(task = %id, label, "dispatching task");
        self.inner.spawner.spawn(task).map_err(|err| Error::Spawn {
            task: label,
            reason: err.to_string(),
        })
    }
}

impl Default for Runtime {
    fn default() -> Self {
        let config = RuntimeConfig::default();
        Self::from_parts(Arc::new(ThreadSpawner::new(&config)), config)
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
