//! Type-erased output payloads.

use crate::error::{Error, Result};
use core::fmt;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Bound satisfied by every type an output can carry.
///
/// Payloads are shared by all observers of an output, so each observer
/// receives its own clone.
pub trait Element: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Element for T {}

/// A type-erased payload.
///
/// Every settlement cell stores its known value as a `Value`; typed output
/// views read it back by downcasting. A `Value` is also a payload in its own
/// right: `Output<Value>` is the "any" output that accepts whatever a cell
/// holds.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// Erases a payload.
    ///
    /// Erasing a `Value` returns it unchanged rather than nesting it.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        let boxed: Box<dyn Any + Send + Sync> = Box::new(payload);
        match boxed.downcast::<Self>() {
            Ok(value) => *value,
            Err(boxed) => Self {
                inner: Arc::from(boxed),
                type_name: std::any::type_name::<T>(),
            },
        }
    }

    /// Returns the name of the erased payload's type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if the payload is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        (*self.inner).is::<T>()
    }

    /// Borrows the payload as a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.inner).downcast_ref::<T>()
    }

    /// Returns the `TypeId` of the erased payload, not of `Value`.
    pub(crate) fn payload_type_id(&self) -> TypeId {
        let payload: &dyn Any = &*self.inner;
        payload.type_id()
    }

    /// Reads the payload through a typed view.
    ///
    /// Reading as `Value` itself always succeeds and yields the erased
    /// value unchanged.
    pub(crate) fn read<T: super::Element>(&self) -> Result<T> {
        if let Some(erased) = (self as &dyn Any).downcast_ref::<T>() {
            return Ok(erased.clone());
        }
        self.downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| Error::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found: self.type_name,
            })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&self.type_name).finish()
    }
}
