//! Terminal settlement states.
//!
//! An output settles exactly once into one of three terminal states. The
//! three-way split is the point: `Unknown` means the value is legitimately
//! unavailable in the current execution mode (a preview, for instance) and
//! is deliberately *not* an error.

use crate::error::{Error, Result};
use crate::output::Value;
use core::fmt;

/// Settlement status of a cell, including the non-terminal `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Not yet settled.
    Pending,
    /// Settled with a usable value.
    Known,
    /// Settled without a value, and without an error.
    Unknown,
    /// Settled with a failure cause.
    Failed,
}

impl Status {
    /// Returns true for the three terminal statuses.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns the lowercase name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Known => "known",
            Self::Unknown => "unknown",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The terminal snapshot every observer of an output receives.
#[derive(Debug, Clone)]
pub enum Settlement<T> {
    /// The output settled with a value.
    Known(T),
    /// The output's value is unavailable in this execution mode.
    Unknown,
    /// The output failed with the given cause.
    Failed(Error),
}

impl<T> Settlement<T> {
    /// Returns the status this settlement represents.
    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::Known(_) => Status::Known,
            Self::Unknown => Status::Unknown,
            Self::Failed(_) => Status::Failed,
        }
    }

    /// Returns true if the output settled with a value.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Returns true if the output settled unknown.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns true if the output failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns the value, if known.
    #[must_use]
    pub fn known(self) -> Option<T> {
        match self {
            Self::Known(value) => Some(value),
            Self::Unknown | Self::Failed(_) => None,
        }
    }

    /// Returns the failure cause, if failed.
    #[must_use]
    pub fn cause(&self) -> Option<&Error> {
        match self {
            Self::Failed(cause) => Some(cause),
            Self::Known(_) | Self::Unknown => None,
        }
    }

    /// Splits the settlement into `(value, is_known, cause)`.
    ///
    /// Exactly one of the following holds: the value is present and
    /// `is_known` is true; all three are empty/false (unknown); or only the
    /// cause is present (failed).
    #[must_use]
    pub fn into_parts(self) -> (Option<T>, bool, Option<Error>) {
        match self {
            Self::Known(value) => (Some(value), true, None),
            Self::Unknown => (None, false, None),
            Self::Failed(cause) => (None, false, Some(cause)),
        }
    }

    /// Converts into a result where unknown is `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>> {
        match self {
            Self::Known(value) => Ok(Some(value)),
            Self::Unknown => Ok(None),
            Self::Failed(cause) => Err(cause),
        }
    }

    /// Maps the known value, leaving unknown and failed untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Settlement<U> {
        match self {
            Self::Known(value) => Settlement::Known(f(value)),
            Self::Unknown => Settlement::Unknown,
            Self::Failed(cause) => Settlement::Failed(cause),
        }
    }

    /// Maps the known value through a fallible function; an error becomes
    /// a failed settlement.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Result<U>) -> Settlement<U> {
        match self {
            Self::Known(value) => match f(value) {
                Ok(mapped) => Settlement::Known(mapped),
                Err(cause) => Settlement::Failed(cause),
            },
            Self::Unknown => Settlement::Unknown,
            Self::Failed(cause) => Settlement::Failed(cause),
        }
    }
}

impl Settlement<Value> {
    /// Reads an erased settlement through a typed view.
    ///
    /// A payload that is not a `T` yields a failed settlement carrying
    /// [`Error::TypeMismatch`]; it never panics.
    pub fn downcast<T: crate::output::Element>(self) -> Settlement<T> {
        self.and_then(|value| value.read::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_are_mutually_exclusive() {
        assert!(matches!(
            Settlement::Known(1).into_parts(),
            (Some(1), true, None)
        ));
        assert!(matches!(
            Settlement::<i32>::Unknown.into_parts(),
            (None, false, None)
        ));
        let (value, known, cause) = Settlement::<i32>::Failed(Error::msg("boom")).into_parts();
        assert!(value.is_none());
        assert!(!known);
        assert_eq!(cause.map(|c| c.to_string()).as_deref(), Some("boom"));
    }

    #[test]
    fn unknown_is_not_an_error() {
        assert!(matches!(Settlement::<u8>::Unknown.into_result(), Ok(None)));
        assert!(Settlement::<u8>::Unknown.cause().is_none());
    }

    #[test]
    fn and_then_turns_errors_into_failures() {
        let settled = Settlement::Known(2).and_then(|_| -> Result<u8> { Err(Error::msg("nope")) });
        assert!(settled.is_failed());
        assert_eq!(Settlement::Known(2).map(|v| v * 2).known(), Some(4));
    }

    #[test]
    fn downcast_mismatch_is_a_failure() {
        let erased = Settlement::Known(Value::new(5_u32));
        let settled = erased.clone().downcast::<String>();
        assert!(settled.cause().is_some_and(Error::is_type_mismatch));
        assert_eq!(erased.downcast::<u32>().known(), Some(5));
    }

    #[test]
    fn status_terminality() {
        assert!(!Status::Pending.is_terminal());
        assert!(Status::Known.is_terminal());
        assert_eq!(Status::Unknown.to_string(), "unknown");
    }
}
