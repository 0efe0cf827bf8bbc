//! Error types.
//!
//! [`Error`] is the failure cause carried by a failed output. It is `Clone`
//! because a single settlement is broadcast to every observer of the output,
//! and every observer receives the same cause.
//!
//! Unknown settlement is never represented here: an output whose value is
//! unavailable in the current execution mode settles as
//! [`Settlement::Unknown`](crate::Settlement::Unknown), which is not an error.

use crate::types::CancelReason;
use core::fmt;
use std::any::Any;
use std::sync::Arc;

/// Failure cause of an output, or of a caller-scoped await.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A failure described by a message.
    #[error("{0}")]
    Message(String),

    /// A failure wrapping an arbitrary error value.
    #[error(transparent)]
    Failed(Arc<dyn std::error::Error + Send + Sync + 'static>),

    /// A continuation panicked while computing a derived output.
    #[error("continuation panicked: {0}")]
    Panicked(PanicPayload),

    /// The caller's await was cancelled. The awaited output is unaffected.
    #[error("await cancelled: {0}")]
    Cancelled(CancelReason),

    /// The settled payload does not have the type the output view declares.
    #[error("output type mismatch: declared `{expected}`, settled with `{found}`")]
    TypeMismatch {
        /// The element type declared by the output view.
        expected: &'static str,
        /// The type of the payload actually stored.
        found: &'static str,
    },

    /// A task could not be handed to the spawner.
    #[error("failed to spawn {task} task: {reason}")]
    Spawn {
        /// The kind of task that was being spawned.
        task: &'static str,
        /// Why the spawner refused it.
        reason: String,
    },
}

impl Error {
    /// Creates a failure from an error value.
    #[must_use]
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Failed(Arc::new(error))
    }

    /// Creates a failure from a message.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Returns true if this is a caller-scoped cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns true if this failure came from a panicking continuation.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }

    /// Returns true if this failure is a declared-type mismatch.
    #[must_use]
    pub const fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Self::Message(message.to_owned())
    }
}

/// Crate result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Message extracted from a caught panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicPayload {
    message: String,
}

impl PanicPayload {
    /// Creates a payload with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Extracts a payload from the value returned by `catch_unwind`.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        if let Some(message) = payload.downcast_ref::<&'static str>() {
            Self::new(*message)
        } else if let Some(message) = payload.downcast_ref::<String>() {
            Self::new(message.clone())
        } else {
            Self::new("non-string panic payload")
        }
    }

    /// Returns the panic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Returned by the non-panicking settle path when a cell already settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("output already settled as {existing}, cannot settle as {attempted}")]
pub struct AlreadySettled {
    /// Status the cell holds.
    pub existing: crate::sync::Status,
    /// Status the rejected call tried to set.
    pub attempted: crate::sync::Status,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Status;

    #[derive(Debug, thiserror::Error)]
    #[error("disk on fire")]
    struct Fire;

    #[test]
    fn wrapped_error_display_is_transparent() {
        let err = Error::new(Fire);
        assert_eq!(err.to_string(), "disk on fire");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn message_conversions() {
        let from_str: Error = "boom".into();
        let from_string: Error = String::from("boom").into();
        assert_eq!(from_str.to_string(), from_string.to_string());
        assert_eq!(Error::msg("boom").to_string(), "boom");
    }

    #[test]
    fn panic_payload_extracts_messages() {
        let static_payload: Box<dyn Any + Send> = Box::new("static boom");
        assert_eq!(
            PanicPayload::from_panic(static_payload.as_ref()).message(),
            "static boom"
        );

        let owned_payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(
            PanicPayload::from_panic(owned_payload.as_ref()).message(),
            "owned boom"
        );

        let opaque_payload: Box<dyn Any + Send> = Box::new(17_u32);
        assert_eq!(
            PanicPayload::from_panic(opaque_payload.as_ref()).message(),
            "non-string panic payload"
        );
    }

    #[test]
    fn already_settled_names_both_states() {
        let err = AlreadySettled {
            existing: Status::Known,
            attempted: Status::Failed,
        };
        assert_eq!(
            err.to_string(),
            "output already settled as known, cannot settle as failed"
        );
    }
}
