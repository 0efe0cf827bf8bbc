//! Runtime configuration.
//!
//! [`RuntimeConfig`] controls how the default thread-backed spawner names
//! and sizes the threads it runs continuation, delegation and join tasks
//! on. With the `config-file` feature it can be loaded from TOML:
//!
//! ```toml
//! thread_name_prefix = "deploy-task"
//! stack_size = 262144
//! ```

use serde::Deserialize;

/// Smallest stack size accepted for task threads.
pub const MIN_STACK_SIZE: usize = 64 * 1024;

/// Default prefix of task thread names.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "eventual-task";

/// Configuration of a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Prefix of task thread names; threads are named `{prefix}-{n}`.
    pub thread_name_prefix: String,
    /// Stack size of task threads. `None` uses the platform default.
    pub stack_size: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_owned(),
            stack_size: None,
        }
    }
}

impl RuntimeConfig {
    /// Checks the configuration for values the spawner cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_name_prefix.is_empty() {
            return Err(ConfigError::EmptyThreadNamePrefix);
        }
        if self.thread_name_prefix.contains('\0') {
            return Err(ConfigError::NulInThreadNamePrefix);
        }
        if let Some(size) = self.stack_size {
            if size < MIN_STACK_SIZE {
                return Err(ConfigError::StackTooSmall {
                    size,
                    min: MIN_STACK_SIZE,
                });
            }
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// Missing keys take their defaults; unknown keys are rejected.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Invalid runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The thread name prefix was empty.
    #[error("thread name prefix must not be empty")]
    EmptyThreadNamePrefix,
    /// The thread name prefix contained a NUL byte.
    #[error("thread name prefix must not contain NUL bytes")]
    NulInThreadNamePrefix,
    /// The requested stack size is below [`MIN_STACK_SIZE`].
    #[error("stack size {size} is below the minimum of {min} bytes")]
    StackTooSmall {
        /// Requested size in bytes.
        size: usize,
        /// Minimum size in bytes.
        min: usize,
    },
    /// The configuration document could not be parsed.
    #[error("invalid runtime config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = RuntimeConfig::default();
        assert_eq!(config.thread_name_prefix, "eventual-task");
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let empty = RuntimeConfig {
            thread_name_prefix: String::new(),
            ..RuntimeConfig::default()
        };
        assert_eq!(empty.validate(), Err(ConfigError::EmptyThreadNamePrefix));

        let nul = RuntimeConfig {
            thread_name_prefix: String::from("a\0b"),
            ..RuntimeConfig::default()
        };
        assert_eq!(nul.validate(), Err(ConfigError::NulInThreadNamePrefix));

        let tiny = RuntimeConfig {
            stack_size: Some(1024),
            ..RuntimeConfig::default()
        };
        assert_eq!(
            tiny.validate(),
            Err(ConfigError::StackTooSmall {
                size: 1024,
                min: MIN_STACK_SIZE
            })
        );
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn toml_fills_defaults_and_rejects_unknown_keys() {
        let config = RuntimeConfig::from_toml_str("stack_size = 131072\n").expect("valid toml");
        assert_eq!(config.stack_size, Some(131_072));
        assert_eq!(config.thread_name_prefix, DEFAULT_THREAD_NAME_PREFIX);

        let err = RuntimeConfig::from_toml_str("workers = 4\n").expect_err("unknown key");
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = RuntimeConfig::from_toml_str("thread_name_prefix = \"\"\n")
            .expect_err("empty prefix");
        assert_eq!(err, ConfigError::EmptyThreadNamePrefix);
    }
}
