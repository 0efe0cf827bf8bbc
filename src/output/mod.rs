//! Output handles and their producer capabilities.
//!
//! An [`Output<T>`] is a typed view over a shared settlement cell. Creating
//! one yields a [`Resolver<T>`] at the same time; the resolver is the only
//! way to settle the cell directly. Everything observable about an output
//! (its value, whether it is known, its failure cause) comes from the cell.
//!
//! ```ignore
//! let (out, resolver) = Output::<i32>::new();
//! std::thread::spawn(move || resolver.resolve(42));
//! assert_eq!(out.await?, Some(42));
//! ```

mod value;

pub use value::{Element, Value};

use crate::cancel::CancelToken;
use crate::combinator::apply::{Step, forward};
use crate::error::{Error, Result};
use crate::registry::{self, OutputType};
use crate::runtime::Runtime;
use crate::sync::{Cell, ClaimError, Observe, Settlement, Status};
use crate::tracing_compat::error;
use crate::types::OutputId;
use core::fmt;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::future::{Future, IntoFuture};
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};
use std::task::{Context, Poll};

/// An output whose payload type is erased.
///
/// `AnyOutput` is the generic fallback variant the result registry hands out
/// for unregistered types, and the element type of heterogeneous joins.
pub type AnyOutput = Output<Value>;

/// A handle to a value that settles at most once as known, unknown or
/// failed.
///
/// Handles are cheap to clone; all clones observe the same settlement.
pub struct Output<T> {
    cell: Arc<Cell>,
    runtime: Runtime,
    ty: OutputType,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Element> Output<T> {
    /// Creates a pending output on the default runtime, together with its
    /// producer capabilities.
    #[allow(clippy::new_ret_no_self)]
    #[must_use]
    pub fn new() -> (Self, Resolver<T>) {
        Self::new_in(&Runtime::global())
    }

    /// Creates a pending output whose derived outputs dispatch their work on
    /// `runtime`.
    #[must_use]
    pub fn new_in(runtime: &Runtime) -> (Self, Resolver<T>) {
        let ty = registry::output_type_of::<T>();
        let cell = Arc::new(Cell::new(ty));
        let resolver = Resolver {
            cell: Arc::clone(&cell),
            runtime: runtime.clone(),
            _marker: PhantomData,
        };
        (Self::from_cell(cell, runtime.clone()), resolver)
    }

    /// Creates an output that is already settled, on the given runtime.
    ///
    /// The settlement goes through [`Resolver::settle`], so a known erased
    /// value holding another output is unwrapped exactly as a resolver
    /// would unwrap it.
    #[must_use]
    pub fn settled_in(runtime: &Runtime, settlement: Settlement<T>) -> Self {
        let (output, resolver) = Self::new_in(runtime);
        resolver.settle(settlement);
        output
    }

    /// Creates an output already settled with a known value.
    #[must_use]
    pub fn known(value: T) -> Self {
        Self::settled_in(&Runtime::global(), Settlement::Known(value))
    }

    /// Creates an output already settled unknown.
    #[must_use]
    pub fn unknown() -> Self {
        Self::settled_in(&Runtime::global(), Settlement::Unknown)
    }

    /// Creates an output already failed with `cause`.
    #[must_use]
    pub fn failed(cause: impl Into<Error>) -> Self {
        Self::settled_in(&Runtime::global(), Settlement::Failed(cause.into()))
    }

    pub(crate) fn from_cell(cell: Arc<Cell>, runtime: Runtime) -> Self {
        let kind = TypeId::of::<Self>();
        if !OUTPUT_KINDS.read().contains_key(&kind) {
            OUTPUT_KINDS.write().entry(kind).or_insert(erased_cell::<T>);
        }
        Self {
            cell,
            runtime,
            ty: registry::output_type_of::<T>(),
            _marker: PhantomData,
        }
    }

    pub(crate) fn cell(&self) -> &Arc<Cell> {
        &self.cell
    }

    /// Returns the id of the underlying cell.
    #[must_use]
    pub fn id(&self) -> OutputId {
        self.cell.id()
    }

    /// Returns the output variant this handle was given by the result
    /// registry.
    #[must_use]
    pub fn output_type(&self) -> &OutputType {
        &self.ty
    }

    /// Returns the runtime derived outputs dispatch on.
    #[must_use]
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Returns the settlement status without waiting.
    #[must_use]
    pub fn status(&self) -> Status {
        self.cell.status()
    }

    /// Returns true once the output has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.status().is_terminal()
    }

    /// Returns the settlement if the output has already settled.
    #[must_use]
    pub fn try_settled(&self) -> Option<Settlement<T>> {
        self.cell.peek().map(Settlement::downcast)
    }

    /// Waits for the output to settle.
    ///
    /// Any number of callers may wait concurrently, before or after the
    /// output settles; all of them receive the same settlement.
    pub fn settled(&self) -> Settled<'static, T> {
        Settled::new(self.cell.observe(), None)
    }

    /// Waits for the output to settle, or for `cancel` to fire.
    ///
    /// Cancellation ends only this wait: it yields
    /// `Settlement::Failed(Error::Cancelled(..))` to this caller and leaves
    /// the output and its other observers untouched. A settlement that is
    /// already available wins over a concurrent cancellation.
    pub fn settled_with<'a>(&self, cancel: &'a CancelToken) -> Settled<'a, T> {
        Settled::new(self.cell.observe(), Some(cancel))
    }

    /// Waits for the value: `Ok(Some(v))` when known, `Ok(None)` when
    /// unknown, `Err(cause)` when failed.
    pub async fn value(&self) -> Result<Option<T>> {
        self.settled().await.into_result()
    }

    /// Like [`value`](Self::value), bounded by a cancellation token.
    pub async fn value_with(&self, cancel: &CancelToken) -> Result<Option<T>> {
        self.settled_with(cancel).await.into_result()
    }

    /// Erases the payload type. The result views the same cell.
    #[must_use]
    pub fn into_any(self) -> AnyOutput {
        Output::from_cell(self.cell, self.runtime)
    }
}

impl AnyOutput {
    /// Views the same cell with a declared payload type.
    ///
    /// Awaiting the returned output fails with [`Error::TypeMismatch`] if
    /// the cell settles with a payload that is not a `T`.
    #[must_use]
    pub fn downcast<T: Element>(self) -> Output<T> {
        Output::from_cell(self.cell, self.runtime)
    }
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            runtime: self.runtime.clone(),
            ty: self.ty.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Output<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("id", &self.cell.id())
            .field("type", &self.ty.name())
            .field("status", &self.cell.status())
            .finish()
    }
}

impl<T: Element> IntoFuture for Output<T> {
    type Output = Result<Option<T>>;
    type IntoFuture = IntoValue<T>;

    fn into_future(self) -> Self::IntoFuture {
        IntoValue {
            settled: self.settled(),
        }
    }
}

/// Future returned by [`Output::settled`] and [`Output::settled_with`].
#[must_use = "futures do nothing unless polled"]
pub struct Settled<'a, T> {
    observe: Observe,
    cancel: Option<&'a CancelToken>,
    cancel_key: Option<usize>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> Settled<'a, T> {
    fn new(observe: Observe, cancel: Option<&'a CancelToken>) -> Self {
        Self {
            observe,
            cancel,
            cancel_key: None,
            _marker: PhantomData,
        }
    }
}

impl<T: Element> Future for Settled<'_, T> {
    type Output = Settlement<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Poll::Ready(settled) = Pin::new(&mut this.observe).poll(cx) {
            return Poll::Ready(settled.downcast());
        }
        if let Some(token) = this.cancel {
            if let Some(reason) = token.poll_cancelled(&mut this.cancel_key, cx.waker()) {
                return Poll::Ready(Settlement::Failed(Error::Cancelled(reason)));
            }
        }
        Poll::Pending
    }
}

impl<T> Drop for Settled<'_, T> {
    fn drop(&mut self) {
        if let (Some(token), Some(key)) = (self.cancel, self.cancel_key.take()) {
            token.deregister(key);
        }
    }
}

/// Future returned by awaiting an [`Output`] directly.
#[must_use = "futures do nothing unless polled"]
pub struct IntoValue<T> {
    settled: Settled<'static, T>,
}

impl<T: Element> Future for IntoValue<T> {
    type Output = Result<Option<T>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().settled)
            .poll(cx)
            .map(Settlement::into_result)
    }
}

/// Producer capabilities for one output.
///
/// A resolver settles its output exactly once. Settling twice (through any
/// clone) is a programming error and panics without altering the first
/// settlement.
pub struct Resolver<T> {
    cell: Arc<Cell>,
    runtime: Runtime,
    _marker: PhantomData<fn(T)>,
}

impl<T: Element> Resolver<T> {
    /// Settles the output as known with `value`.
    ///
    /// For `Resolver<Value>`, a value that erases any [`Output`] is not
    /// stored: the output instead settles as that output eventually does.
    ///
    /// # Panics
    ///
    /// Panics if the output has already been settled.
    pub fn resolve(&self, value: T) {
        let value = Value::new(value);
        match nested_output::<T>(&value) {
            Some(nested) => self.delegate(nested),
            None => self.cell.settle(Settlement::Known(value)),
        }
    }

    /// Settles the output as failed with `cause`.
    ///
    /// # Panics
    ///
    /// Panics if the output has already been settled.
    pub fn reject(&self, cause: impl Into<Error>) {
        self.cell.settle(Settlement::Failed(cause.into()));
    }

    /// Settles the output as unknown: its value is unavailable in this
    /// execution mode.
    ///
    /// # Panics
    ///
    /// Panics if the output has already been settled.
    pub fn resolve_unknown(&self) {
        self.cell.settle(Settlement::Unknown);
    }

    /// Settles as known with `value` when `known` is true, otherwise as
    /// unknown (discarding `value`).
    ///
    /// # Panics
    ///
    /// Panics if the output has already been settled.
    pub fn resolve_with_known(&self, value: T, known: bool) {
        if known {
            self.resolve(value);
        } else {
            self.resolve_unknown();
        }
    }

    /// Settles with an arbitrary settlement.
    ///
    /// # Panics
    ///
    /// Panics if the output has already been settled.
    pub fn settle(&self, settlement: Settlement<T>) {
        match settlement {
            Settlement::Known(value) => self.resolve(value),
            Settlement::Unknown => self.resolve_unknown(),
            Settlement::Failed(cause) => self.reject(cause),
        }
    }

    /// Settles the output as `other` eventually settles.
    ///
    /// The output is committed immediately: any later direct settlement
    /// panics, even before `other` has settled.
    ///
    /// # Panics
    ///
    /// Panics if the output has already been settled.
    pub fn resolve_output(&self, other: &Output<T>) {
        self.delegate(Arc::clone(other.cell()));
    }

    /// Returns true once the output has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.cell.status().is_terminal()
    }

    fn delegate(&self, source: Arc<Cell>) {
        match self.cell.claim(&source) {
            Ok(()) => {}
            Err(ClaimError::Settled(err)) => {
                error!(output = %self.cell.id(), "delegating an output that is already settled");
                panic!("output {} {err}", self.cell.id());
            }
            Err(ClaimError::Cycle) => {
                error!(output = %self.cell.id(), source = %source.id(), "delegation cycle rejected");
                panic!(
                    "output {} cannot settle through output {}: delegation cycle",
                    self.cell.id(),
                    source.id()
                );
            }
        }
        forward(
            source,
            Arc::clone(&self.cell),
            &self.runtime,
            TypeId::of::<T>() == TypeId::of::<Value>(),
        );
    }
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            runtime: self.runtime.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("output", &self.cell.id())
            .field("status", &self.cell.status())
            .finish()
    }
}

/// Reads the cell out of a `Value` known to hold one `Output` type.
type CellReader = fn(&Value) -> Option<Arc<Cell>>;

/// Readers for every `Output<T>` type instantiated so far, keyed by the
/// `TypeId` of `Output<T>`. Any output erased in a `Value` was created
/// through [`Output::from_cell`], so its type is always present.
static OUTPUT_KINDS: LazyLock<RwLock<HashMap<TypeId, CellReader>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

fn erased_cell<T: Element>(value: &Value) -> Option<Arc<Cell>> {
    value
        .downcast_ref::<Output<T>>()
        .map(|output| Arc::clone(output.cell()))
}

/// Returns the cell of the output erased in `value`, whatever its element
/// type.
pub(crate) fn erased_output(value: &Value) -> Option<Arc<Cell>> {
    let reader = OUTPUT_KINDS.read().get(&value.payload_type_id()).copied()?;
    reader(value)
}

/// Returns the cell of an output nested in `value`, when the declared
/// payload type is `Value`.
pub(crate) fn nested_output<T: 'static>(value: &Value) -> Option<Arc<Cell>> {
    if TypeId::of::<T>() != TypeId::of::<Value>() {
        return None;
    }
    Step::nested(value)
}
