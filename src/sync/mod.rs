//! Synchronization primitives for output settlement.
//!
//! - [`Settlement`] / [`Status`]: the terminal states an output can reach
//! - `cell`: the shared write-once cell behind every output handle

pub(crate) mod cell;
pub mod settlement;

pub(crate) use cell::{Cell, ClaimError, Observe};
pub use settlement::{Settlement, Status};
