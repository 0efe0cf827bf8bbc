//! Builder for [`Runtime`].

use super::{Runtime, Spawn, ThreadSpawner};
use crate::config::{ConfigError, RuntimeConfig};
use std::sync::Arc;

/// Builder for creating a [`Runtime`].
///
/// ```ignore
/// let runtime = Runtime::builder()
///     .thread_name_prefix("deploy")
///     .stack_size(512 * 1024)
///     .build()?;
/// let (out, resolver) = Output::<String>::new_in(&runtime);
/// ```
#[must_use]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    spawner: Option<Arc<dyn Spawn>>,
}

impl RuntimeBuilder {
    /// Creates a builder with the default configuration and the
    /// thread-backed spawner.
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            spawner: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the prefix of task thread names.
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Set the stack size of task threads.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Use a custom spawner instead of one thread per task.
    pub fn spawner(mut self, spawner: impl Spawn) -> Self {
        self.spawner = Some(Arc::new(spawner));
        self
    }

    /// Validates the configuration and builds the runtime.
    pub fn build(self) -> Result<Runtime, ConfigError> {
        self.config.validate()?;
        let spawner = match self.spawner {
            Some(spawner) => spawner,
            None => Arc::new(ThreadSpawner::new(&self.config)),
        };
        Ok(Runtime::from_parts(spawner, self.config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuntimeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeBuilder")
            .field("config", &self.config)
            .field("custom_spawner", &self.spawner.is_some())
            .finish()
    }
}
