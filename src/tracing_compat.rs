//! Optional tracing integration.
//!
//! With the `tracing-integration` feature enabled the logging macros used
//! across the crate are the `tracing` macros. Without it they expand to
//! nothing, so call sites never need their own `cfg` guards.
//!
//! ```ignore
//! use crate::tracing_compat::{debug, trace};
//!
//! trace!(output = %id, "output settled");
//! ```

#[cfg(feature = "tracing-integration")]
pub use tracing::{Level, debug, error, info, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __eventual_tracing_noop {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "tracing-integration"))]
pub use crate::__eventual_tracing_noop as debug;
#[cfg(not(feature = "tracing-integration"))]
pub use crate::__eventual_tracing_noop as error;
#[cfg(not(feature = "tracing-integration"))]
pub use crate::__eventual_tracing_noop as info;
#[cfg(not(feature = "tracing-integration"))]
pub use crate::__eventual_tracing_noop as trace;
#[cfg(not(feature = "tracing-integration"))]
pub use crate::__eventual_tracing_noop as warn;

/// Returns true when structured logging is compiled in.
#[must_use]
pub const fn is_enabled() -> bool {
    cfg!(feature = "tracing-integration")
}
