//! Test helpers: logging setup, phase markers, and blocking awaits.
//!
//! Available to unit tests and, through the `test-internals` feature, to the
//! integration tests under `tests/`.

use std::future::Future;
use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Installs a test-friendly `tracing` subscriber once per process.
///
/// The level defaults to `debug` and can be overridden through `RUST_LOG`
/// style level names in `EVENTUAL_TEST_LOG` (for example `trace`).
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let level = std::env::var("EVENTUAL_TEST_LOG")
            .ok()
            .and_then(|raw| raw.parse::<tracing::Level>().ok())
            .unwrap_or(tracing::Level::DEBUG);
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_thread_names(true)
            .try_init();
    });
}

/// Blocks the current thread until `future` completes.
pub fn block_on<F: Future>(future: F) -> F::Output {
    futures_lite::future::block_on(future)
}

/// Marks the start of a named test phase in the log.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        $crate::tracing_compat::info!(phase = %$name, "test phase started")
    };
}

/// Marks the successful end of a named test.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        $crate::tracing_compat::info!(test = %$name, "test complete")
    };
}

/// Asserts a condition, logging the expected and actual values first.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {{
        let cond = $cond;
        if !cond {
            $crate::tracing_compat::error!(
                expected = ?$expected,
                actual = ?$actual,
                "assertion failed: {}",
                $msg
            );
        }
        assert!(
            cond,
            "{}: expected {:?}, got {:?}",
            $msg,
            $expected,
            $actual
        );
    }};
}
