//! Join combinator.
//!
//! Joins a fixed, ordered set of outputs into one output of their values:
//!
//! - every input failed or not, the join waits for all of them
//! - the lowest-index failure wins; its cause is the join's cause
//! - otherwise any unknown input makes the join unknown
//! - otherwise the join is known with the values in input order
//!
//! Each input reports its settlement through a subscriber; the last one to
//! arrive spawns the task that builds the result. The order in which inputs
//! settle never affects the result.

use crate::error::{Error, Result};
use crate::output::{AnyOutput, Element, Output, Value};
use crate::registry;
use crate::runtime::Runtime;
use crate::sync::{Cell, Settlement};
use crate::tracing_compat::trace;
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Collects input settlements by index until the last one arrives.
struct Countdown<R, F> {
    target: Arc<Cell>,
    runtime: Runtime,
    slots: Mutex<Vec<Option<Settlement<Value>>>>,
    remaining: AtomicUsize,
    finish: Mutex<Option<F>>,
    _result: PhantomData<fn() -> R>,
}

impl<R, F> Countdown<R, F>
where
    R: Element,
    F: FnOnce(Vec<Value>) -> Result<R> + Send + 'static,
{
    fn record(self: Arc<Self>, index: usize, settled: Settlement<Value>) {
        self.slots.lock()[index] = Some(settled);
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.complete();
        }
    }

    fn complete(self: Arc<Self>) {
        let target = Arc::clone(&self.target);
        let runtime = self.runtime.clone();
        trace!(result = %target.id(), "join inputs settled");
        let spawned = runtime.spawn("all", async move {
            let settlements: Vec<_> = std::mem::take(&mut *self.slots.lock())
                .into_iter()
                .flatten()
                .collect();
            let finish = self.finish.lock().take();
            let settled = match finish {
                Some(finish) => aggregate(settlements).and_then(finish),
                None => Settlement::Failed(Error::msg("join completed twice")),
            };
            self.target.settle(settled.map(Value::new));
        });
        if let Err(cause) = spawned {
            target.settle(Settlement::Failed(cause));
        }
    }
}

/// Folds ordered input settlements into the join's settlement.
///
/// The first failure in input order wins. Otherwise any unknown input
/// makes the result unknown. Otherwise the result holds every value in
/// input order.
pub fn aggregate<T>(settlements: impl IntoIterator<Item = Settlement<T>>) -> Settlement<Vec<T>> {
    let settlements = settlements.into_iter();
    let mut values = Vec::with_capacity(settlements.size_hint().0);
    let mut unknown = false;
    for settled in settlements {
        match settled {
            Settlement::Known(value) => values.push(value),
            Settlement::Unknown => unknown = true,
            Settlement::Failed(cause) => return Settlement::Failed(cause),
        }
    }
    if unknown {
        Settlement::Unknown
    } else {
        Settlement::Known(values)
    }
}

/// Joins `cells` into an output of `R`, built from the ordered known
/// values by `finish`.
///
/// Nothing runs until the last input settles; the join then spawns one
/// task that folds the settlements.
fn join<R, F>(cells: Vec<Arc<Cell>>, runtime: Runtime, finish: F) -> Output<R>
where
    R: Element,
    F: FnOnce(Vec<Value>) -> Result<R> + Send + 'static,
{
    if cells.is_empty() {
        return Output::settled_in(&runtime, Settlement::Known(Vec::new()).and_then(finish));
    }

    let target = Arc::new(Cell::new(registry::output_type_of::<R>()));
    let result = Output::from_cell(Arc::clone(&target), runtime.clone());
    trace!(result = %target.id(), inputs = cells.len(), "join registered");

    let countdown = Arc::new(Countdown {
        target,
        runtime,
        slots: Mutex::new((0..cells.len()).map(|_| None).collect()),
        remaining: AtomicUsize::new(cells.len()),
        finish: Mutex::new(Some(finish)),
        _result: PhantomData,
    });
    for (index, cell) in cells.iter().enumerate() {
        let countdown = Arc::clone(&countdown);
        cell.on_settled(Box::new(move |settled| countdown.record(index, settled)));
    }
    result
}

fn runtime_of<T: Element>(outputs: &[Output<T>]) -> Runtime {
    outputs
        .first()
        .map_or_else(Runtime::global, |output| output.runtime().clone())
}

/// Joins outputs of one element type into an output of their ordered
/// values.
///
/// The result's variant is the array variant of `T`, e.g.
/// `IntArrayOutput` for `isize` inputs. Joining nothing yields an output
/// already known with an empty vector.
///
/// ```ignore
/// let sum = all([a, b, c]).map(|values: Vec<i64>| values.iter().sum::<i64>());
/// ```
pub fn all<T: Element>(outputs: impl IntoIterator<Item = Output<T>>) -> Output<Vec<T>> {
    let outputs: Vec<_> = outputs.into_iter().collect();
    let runtime = runtime_of(&outputs);
    let cells = outputs.iter().map(|output| Arc::clone(output.cell())).collect();
    join(cells, runtime, |values| {
        values.iter().map(Value::read::<T>).collect()
    })
}

/// Joins outputs of any element types into an `AnyArrayOutput` of their
/// erased, ordered values.
pub fn all_any(outputs: impl IntoIterator<Item = AnyOutput>) -> Output<Vec<Value>> {
    let outputs: Vec<_> = outputs.into_iter().collect();
    let runtime = runtime_of(&outputs);
    let cells = outputs.iter().map(|output| Arc::clone(output.cell())).collect();
    join(cells, runtime, Ok)
}

impl<T: Element> Output<T> {
    /// Joins this output with `other` into an output of the pair.
    pub fn zip<U: Element>(&self, other: &Output<U>) -> Output<(T, U)> {
        let cells = vec![Arc::clone(self.cell()), Arc::clone(other.cell())];
        join(cells, self.runtime().clone(), |values| {
            match <[Value; 2]>::try_from(values) {
                Ok([left, right]) => Ok((left.read::<T>()?, right.read::<U>()?)),
                Err(values) => Err(Error::msg(format!(
                    "zip joined {} values instead of 2",
                    values.len()
                ))),
            }
        })
    }
}
