//! Why a caller stopped waiting on an output.
//!
//! Cancellation never touches an output; a [`CancelReason`] only explains
//! why one caller's wait ended early.

use core::fmt;

/// What prompted a cancellation, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CancelKind {
    /// The awaiting program asked to stop.
    #[default]
    User,
    /// The caller's deadline passed first.
    Timeout,
    /// The embedding program is shutting down.
    Shutdown,
}

impl CancelKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Timeout => "deadline exceeded",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for CancelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cancellation kind with an optional note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelReason {
    kind: CancelKind,
    message: Option<String>,
}

impl CancelReason {
    /// Creates a reason of `kind` without a note.
    #[must_use]
    pub const fn new(kind: CancelKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// A user cancellation explained by `message`.
    #[must_use]
    pub fn user(message: impl Into<String>) -> Self {
        Self::new(CancelKind::User).with_message(message)
    }

    /// A deadline cancellation.
    #[must_use]
    pub const fn timeout() -> Self {
        Self::new(CancelKind::Timeout)
    }

    /// A shutdown cancellation.
    #[must_use]
    pub const fn shutdown() -> Self {
        Self::new(CancelKind::Shutdown)
    }

    /// Attaches a note.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> CancelKind {
        self.kind
    }

    /// Returns the note, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// True if `self` should replace `current` as a token's recorded
    /// reason.
    pub(crate) fn outranks(&self, current: &Self) -> bool {
        self.kind > current.kind
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;

    #[test]
    fn urgency_follows_declaration_order() {
        init_test_logging();
        crate::test_phase!("urgency_follows_declaration_order");
        let shutdown = CancelReason::shutdown();
        let timeout = CancelReason::timeout();
        let user = CancelReason::user("stop waiting");
        crate::assert_with_log!(
            shutdown.outranks(&timeout) && timeout.outranks(&user),
            "more urgent kinds outrank",
            true,
            (shutdown.kind(), timeout.kind(), user.kind())
        );
        assert!(!user.outranks(&CancelReason::user("another note")));
        crate::test_complete!("urgency_follows_declaration_order");
    }

    #[test]
    fn display_includes_the_note() {
        assert_eq!(CancelReason::user("operator abort").to_string(), "user: operator abort");
        assert_eq!(CancelReason::timeout().to_string(), "deadline exceeded");
        assert_eq!(
            CancelReason::shutdown().with_message("sigterm").message(),
            Some("sigterm")
        );
        assert_eq!(CancelReason::default(), CancelReason::new(CancelKind::User));
    }
}
