//! Combinators deriving new outputs from existing ones.
//!
//! - [`apply`]: chain a continuation onto one output, flattening any output
//!   it returns (`Output::apply`, `Output::and_then`, `Output::map`)
//! - [`all`](mod@all): join a fixed, ordered set of outputs into one output of
//!   their ordered values (`all`, `all_any`, `Output::zip`)
//!
//! Both dispatch their work as independent tasks on the source output's
//! runtime. Neither ever runs user code inside the call that settles a
//! source.

pub mod all;
pub mod apply;

pub use all::{aggregate, all, all_any};
