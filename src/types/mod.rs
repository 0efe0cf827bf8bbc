//! Core types shared across the engine.
//!
//! - [`id`]: Identifier types (`OutputId`, `TaskId`)
//! - [`cancel`]: Cancellation reason and kind types
//! - [`resource`]: Opaque resource identity values (`Id`, `Urn`)
//! - [`asset`]: Opaque blob references (`Asset`, `Archive`, `AssetOrArchive`)

pub mod asset;
pub mod cancel;
pub mod id;
pub mod resource;

pub use asset::{Archive, Asset, AssetOrArchive};
pub use cancel::{CancelKind, CancelReason};
pub use id::{OutputId, TaskId};
pub use resource::{Id, Urn};
