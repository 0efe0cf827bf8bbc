//! Chain/flatten combinator.
//!
//! `apply` registers a continuation on a source output and returns a new,
//! pending result output. When the source settles, one task is spawned:
//!
//! ```text
//! WaitingOnSource ──unknown──────────────────────────► Settled(unknown)
//!        │        ──failed(c)────────────────────────► Settled(failed c)
//!        └─known(v)─► RunningContinuation ─err/panic─► Settled(failed)
//!                            │ value ────────────────► Settled(known)
//!                            └ output ─► WaitingOnNestedOutput ─► Settled
//! ```
//!
//! `WaitingOnNestedOutput` is a loop, not recursion: each nested output is
//! observed in turn until one settles with a plain value (or unknown, or
//! failed). Only outputs whose declared payload is the erased [`Value`]
//! unwrap nested outputs dynamically, whatever the nested output's element
//! type; typed nesting goes through [`Output::and_then`].

use crate::error::{Error, PanicPayload, Result};
use crate::output::{self, Element, Output, Value};
use crate::registry;
use crate::runtime::Runtime;
use crate::sync::{Cell, Settlement};
use crate::tracing_compat::{debug, trace, warn};
use crate::types::OutputId;
use std::any::TypeId;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// What a continuation produced.
pub(crate) enum Step {
    /// A settlement that may still erase a nested output.
    Ready(Settlement<Value>),
    /// An output whose settlement the result must mirror.
    Defer(Arc<Cell>),
}

impl Step {
    /// Returns the cell of the output erased in `value`, if any.
    pub(crate) fn nested(value: &Value) -> Option<Arc<Cell>> {
        output::erased_output(value)
    }
}

/// Drives `step` to a terminal settlement, observing nested outputs one
/// after another. `erased` enables dynamic unwrapping of outputs stored in
/// known values.
pub(crate) async fn flatten(mut step: Step, erased: bool) -> Settlement<Value> {
    let mut depth = 0_usize;
    loop {
        step = match step {
            Step::Defer(cell) => {
                depth += 1;
                trace!(nested = %cell.id(), depth, "waiting on nested output");
                Step::Ready(cell.observe().await)
            }
            Step::Ready(Settlement::Known(value)) if erased => match Step::nested(&value) {
                Some(cell) => Step::Defer(cell),
                None => return Settlement::Known(value),
            },
            Step::Ready(settled) => return settled,
        };
    }
}

/// Settles the claimed `target` as `source` eventually settles.
///
/// The claim has already ruled out `source` waiting on `target`.
pub(crate) fn forward(source: Arc<Cell>, target: Arc<Cell>, runtime: &Runtime, erased: bool) {
    trace!(source = %source.id(), target = %target.id(), "delegation registered");
    let runtime = runtime.clone();
    source.on_settled(Box::new(move |settled| {
        let task_target = Arc::clone(&target);
        let spawned = runtime.spawn("forward", async move {
            let settled = flatten(Step::Ready(settled), erased).await;
            task_target.complete_claimed(settled);
        });
        if let Err(cause) = spawned {
            target.complete_claimed(Settlement::Failed(cause));
        }
    }));
}

/// Runs a continuation against the source's settlement.
async fn run_continuation<T, F>(
    source: OutputId,
    settled: Settlement<Value>,
    f: F,
    erased: bool,
) -> Settlement<Value>
where
    T: Element,
    F: FnOnce(T) -> Result<Step>,
{
    let input = match settled.downcast::<T>() {
        Settlement::Known(input) => input,
        Settlement::Unknown => return Settlement::Unknown,
        Settlement::Failed(cause) => return Settlement::Failed(cause),
    };

    trace!(source = %source, "running continuation");
    let step = match catch_unwind(AssertUnwindSafe(|| f(input))) {
        Ok(Ok(step)) => step,
        Ok(Err(cause)) => {
            debug!(source = %source, error = %cause, "continuation failed");
            return Settlement::Failed(cause);
        }
        Err(payload) => {
            let payload = PanicPayload::from_panic(&*payload);
            warn!(source = %source, panic = %payload, "continuation panicked");
            return Settlement::Failed(Error::Panicked(payload));
        }
    };
    flatten(step, erased).await
}

impl<T: Element> Output<T> {
    /// Derives an output by applying a fallible continuation to this
    /// output's value.
    ///
    /// The continuation runs at most once, on its own task, and only if
    /// this output settles known. Unknown and failed settlements pass
    /// through unchanged. An `Err` from the continuation, or a panic,
    /// fails the result.
    ///
    /// The result's [`OutputType`](crate::registry::OutputType) is chosen
    /// from `U` now, not when the continuation runs.
    pub fn apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Element,
        F: FnOnce(T) -> Result<U> + Send + 'static,
    {
        self.chain("apply", move |input| {
            f(input).map(|value| Step::Ready(Settlement::Known(Value::new(value))))
        })
    }

    /// Derives an output by applying an infallible continuation.
    pub fn map<U, F>(&self, f: F) -> Output<U>
    where
        U: Element,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.apply(move |input| Ok(f(input)))
    }

    /// Derives an output from a continuation that itself returns an output.
    ///
    /// The result mirrors the returned output's eventual settlement,
    /// through any depth of nesting.
    pub fn and_then<U, F>(&self, f: F) -> Output<U>
    where
        U: Element,
        F: FnOnce(T) -> Result<Output<U>> + Send + 'static,
    {
        self.chain("and_then", move |input| {
            f(input).map(|output| Step::Defer(Arc::clone(output.cell())))
        })
    }

    fn chain<U, F>(&self, label: &'static str, f: F) -> Output<U>
    where
        U: Element,
        F: FnOnce(T) -> Result<Step> + Send + 'static,
    {
        let target = Arc::new(Cell::new(registry::output_type_of::<U>()));
        let result = Output::from_cell(Arc::clone(&target), self.runtime().clone());
        let runtime = self.runtime().clone();
        let source = self.id();
        let erased = TypeId::of::<U>() == TypeId::of::<Value>();

        trace!(
            source = %source,
            result = %target.id(),
            ty = %target.output_type(),
            combinator = label,
            "continuation registered"
        );

        self.cell().on_settled(Box::new(move |settled| {
            let task_target = Arc::clone(&target);
            let spawned = runtime.spawn(label, async move {
                let settled = run_continuation(source, settled, f, erased).await;
                task_target.settle(settled);
            });
            if let Err(cause) = spawned {
                target.settle(Settlement::Failed(cause));
            }
        }));
        result
    }
}
