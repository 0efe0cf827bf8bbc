//! Eventual: three-state deferred values for infrastructure programs.
//!
//! # Overview
//!
//! An [`Output<T>`] is a value that may not exist yet. It settles exactly
//! once, into one of three terminal states:
//!
//! - **known**: the value is available
//! - **unknown**: the value cannot be known in this execution mode (a
//!   preview that never provisions anything, for instance). This is not an
//!   error.
//! - **failed**: producing the value failed with an [`Error`]
//!
//! Programs describe whole computations over outputs before any value
//! exists. Continuations attached with [`Output::apply`],
//! [`Output::and_then`] and [`Output::map`] run only when their source
//! settles known; unknown and failed settlements flow through untouched.
//! Continuations that return outputs are flattened, at any depth. [`all`]
//! and [`all_any`] join fixed sets of outputs.
//!
//! # Core Guarantees
//!
//! - **Exactly-once settlement**: settling an output twice panics and never
//!   replaces the first settlement
//! - **Broadcast**: every observer, early or late, sees the same snapshot
//! - **No inline continuations**: user code never runs inside the call that
//!   settles its source; every continuation runs on its own task
//! - **Deterministic joins**: values in input order, lowest-index failure wins
//! - **Typed dispatch**: derived outputs get the variant registered for
//!   their declared result type (see [`registry`])
//!
//! # Module Structure
//!
//! - [`output`]: [`Output`], [`Resolver`] and the erased [`Value`]
//! - [`combinator`]: apply/flatten and join combinators
//! - [`registry`]: type-directed output variant registry
//! - [`sync`]: settlement states
//! - [`runtime`]: task dispatch ([`Runtime`], [`Spawn`](runtime::Spawn))
//! - [`cancel`]: caller-scoped cancellation of awaits
//! - [`config`]: runtime configuration
//! - [`types`]: identifiers, cancellation reasons, domain value types
//! - [`error`](mod@error): error types
//! - [`tracing_compat`]: optional tracing integration
//!
//! # Example
//!
//! ```ignore
//! use eventual::{Output, all};
//!
//! let (port, resolver) = Output::<u16>::new();
//! let host = Output::known(String::from("db.internal"));
//! let url = host
//!     .zip(&port)
//!     .map(|(host, port)| format!("postgres://{host}:{port}"));
//!
//! resolver.resolve(5432);
//! assert_eq!(url.await?.as_deref(), Some("postgres://db.internal:5432"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod cancel;
pub mod combinator;
pub mod config;
pub mod error;
pub mod output;
pub mod registry;
pub mod runtime;
pub mod sync;
pub mod tracing_compat;
pub mod types;

#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

pub use cancel::CancelToken;
pub use combinator::{all, all_any};
pub use config::{ConfigError, RuntimeConfig};
pub use error::{Error, PanicPayload, Result};
pub use output::{AnyOutput, Element, Output, Resolver, Value};
pub use registry::{OutputType, RegistryError, register_output_type};
pub use runtime::{Runtime, RuntimeBuilder};
pub use sync::{Settlement, Status};
pub use types::{Archive, Asset, AssetOrArchive, CancelKind, CancelReason, Id, Urn};
