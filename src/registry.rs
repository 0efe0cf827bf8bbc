//! Type-directed result registry.
//!
//! Every output carries an [`OutputType`]: the concrete output variant its
//! declared element type maps to (`IntOutput`, `StringArrayOutput`,
//! `URNMapOutput`, ...). The mapping is looked up by [`TypeId`] whenever an
//! output is created, so a derived output's variant follows the declared
//! result type of the continuation that produces it. Types nobody registered
//! fall back to [`OutputType::any`].
//!
//! Registering an element type registers its whole family at once:
//!
//! | Declared type               | Variant name       | Shape    |
//! |-----------------------------|--------------------|----------|
//! | `T`                         | `{E}Output`        | `Single` |
//! | `Vec<T>`                    | `{E}ArrayOutput`   | `Array`  |
//! | `HashMap<String, T>`        | `{E}MapOutput`     | `Map`    |
//! | `BTreeMap<String, T>`       | `{E}MapOutput`     | `Map`    |
//!
//! The registry is append-only. Registering a type again under the same
//! element name is a no-op; registering it under a different name fails
//! with [`RegistryError::Conflict`] and leaves the registry unchanged.

use crate::output::{Element, Value};
use crate::tracing_compat::debug;
use crate::types::{Archive, Asset, AssetOrArchive, Id, Urn};
use core::fmt;
use parking_lot::RwLock;
use std::any::{TypeId, type_name};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

/// Structural shape of an output variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A single element.
    Single,
    /// An ordered sequence of elements.
    Array,
    /// A string-keyed map of elements.
    Map,
}

/// Descriptor of a concrete output variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputType {
    name: Arc<str>,
    element: Arc<str>,
    shape: Shape,
}

impl OutputType {
    fn new(element: &str, shape: Shape) -> Self {
        let name = match shape {
            Shape::Single => format!("{element}Output"),
            Shape::Array => format!("{element}ArrayOutput"),
            Shape::Map => format!("{element}MapOutput"),
        };
        Self {
            name: name.into(),
            element: element.into(),
            shape,
        }
    }

    /// The fallback variant for unregistered types.
    #[must_use]
    pub fn any() -> Self {
        static ANY: LazyLock<OutputType> = LazyLock::new(|| OutputType::new("Any", Shape::Single));
        ANY.clone()
    }

    /// Returns the variant name, e.g. `IntArrayOutput`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the element name, e.g. `Int`.
    #[must_use]
    pub fn element(&self) -> &str {
        &self.element
    }

    /// Returns the variant's shape.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns true for the fallback variant.
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.shape == Shape::Single && &*self.element == "Any"
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Error returned when registering an output type fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The type is already registered under another variant.
    #[error("`{type_name}` is already registered as {existing}, cannot register it as {requested}")]
    Conflict {
        /// Rust name of the conflicting type.
        type_name: &'static str,
        /// Variant name already registered.
        existing: String,
        /// Variant name that was requested.
        requested: String,
    },
    /// The element name was empty.
    #[error("output element name must not be empty")]
    EmptyName,
}

/// Thread-safe, append-only map from declared types to output variants.
#[derive(Debug, Default)]
pub struct OutputTypeRegistry {
    types: RwLock<HashMap<TypeId, OutputType>>,
}

impl OutputTypeRegistry {
    /// Creates an empty registry. Every lookup falls back to `AnyOutput`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the builtin scalar, erased and domain
    /// value families.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_builtins();
        registry
    }

    fn register_builtins(&self) {
        let builtins: [(&str, fn(&Self, &str) -> Result<(), RegistryError>); 20] = [
            ("Bool", Self::register::<bool>),
            ("Int8", Self::register::<i8>),
            ("Int16", Self::register::<i16>),
            ("Int32", Self::register::<i32>),
            ("Int64", Self::register::<i64>),
            ("Int", Self::register::<isize>),
            ("Uint8", Self::register::<u8>),
            ("Uint16", Self::register::<u16>),
            ("Uint32", Self::register::<u32>),
            ("Uint64", Self::register::<u64>),
            ("Uint", Self::register::<usize>),
            ("Float32", Self::register::<f32>),
            ("Float64", Self::register::<f64>),
            ("String", Self::register::<String>),
            ("Any", Self::register::<Value>),
            ("ID", Self::register::<Id>),
            ("URN", Self::register::<Urn>),
            ("Asset", Self::register::<Asset>),
            ("Archive", Self::register::<Archive>),
            ("AssetOrArchive", Self::register::<AssetOrArchive>),
        ];
        for (element, register) in builtins {
            if let Err(err) = register(self, element) {
                debug!(error = %err, "builtin output type skipped");
            }
        }
    }

    /// Registers `T` and its collection family under `element`.
    ///
    /// Either all four entries are added or none is.
    pub fn register<T: Element>(&self, element: &str) -> Result<(), RegistryError> {
        if element.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let family = [
            (
                TypeId::of::<T>(),
                type_name::<T>(),
                OutputType::new(element, Shape::Single),
            ),
            (
                TypeId::of::<Vec<T>>(),
                type_name::<Vec<T>>(),
                OutputType::new(element, Shape::Array),
            ),
            (
                TypeId::of::<HashMap<String, T>>(),
                type_name::<HashMap<String, T>>(),
                OutputType::new(element, Shape::Map),
            ),
            (
                TypeId::of::<BTreeMap<String, T>>(),
                type_name::<BTreeMap<String, T>>(),
                OutputType::new(element, Shape::Map),
            ),
        ];

        let mut types = self.types.write();
        for (id, rust_name, requested) in &family {
            if let Some(existing) = types.get(id) {
                if existing != requested {
                    return Err(RegistryError::Conflict {
                        type_name: *rust_name,
                        existing: existing.name().to_owned(),
                        requested: requested.name().to_owned(),
                    });
                }
            }
        }
        let mut added = 0_usize;
        for (id, _, ty) in family {
            if types.insert(id, ty).is_none() {
                added += 1;
            }
        }
        drop(types);

        if added > 0 {
            debug!(element, ty = type_name::<T>(), "output type registered");
        }
        Ok(())
    }

    /// Returns the registered variant for `T`, if any.
    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<OutputType> {
        self.types.read().get(&TypeId::of::<T>()).cloned()
    }

    /// Returns the variant for `T`, falling back to `AnyOutput`.
    #[must_use]
    pub fn lookup<T: 'static>(&self) -> OutputType {
        self.get::<T>().unwrap_or_else(OutputType::any)
    }

    /// Returns the number of registered declared types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

static GLOBAL: LazyLock<OutputTypeRegistry> = LazyLock::new(OutputTypeRegistry::with_builtins);

/// Returns the process-wide registry, populated with the builtins on first
/// use.
#[must_use]
pub fn global() -> &'static OutputTypeRegistry {
    &GLOBAL
}

/// Returns the variant the process-wide registry assigns to `T`.
#[must_use]
pub fn output_type_of<T: 'static>() -> OutputType {
    GLOBAL.lookup::<T>()
}

/// Registers `T` and its collection family in the process-wide registry.
///
/// ```ignore
/// #[derive(Clone)]
/// struct Bucket { name: String }
///
/// register_output_type::<Bucket>("Bucket")?;
/// assert_eq!(output_type_of::<Vec<Bucket>>().name(), "BucketArrayOutput");
/// ```
pub fn register_output_type<T: Element>(element: &str) -> Result<(), RegistryError> {
    GLOBAL.register::<T>(element)
}
