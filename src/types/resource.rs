//! Resource identity values.
//!
//! Provider-assigned identifiers and stack-unique resource names flow through
//! outputs as opaque strings. The engine never interprets them; they exist as
//! distinct types so the result registry can give them dedicated output
//! variants.

use core::fmt;
use serde::{Deserialize, Serialize};

/// A provider-assigned resource identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// Creates an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Id {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A uniform resource name identifying a resource within a stack.
///
/// URNs have the form `urn:pulumi:<stack>::<project>::<type>::<name>`; the
/// accessors split on `::` without validating the leading segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urn(String);

impl Urn {
    /// Creates a URN from its text.
    #[must_use]
    pub fn new(urn: impl Into<String>) -> Self {
        Self(urn.into())
    }

    /// Returns the URN text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the trailing name segment, if the URN has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.rsplit_once("::").map(|(_, name)| name)
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Urn {
    fn from(urn: &str) -> Self {
        Self::new(urn)
    }
}
