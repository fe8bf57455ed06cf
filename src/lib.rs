//! Lazily resolved key/value registries.
//!
//! Values are registered either directly or as `"location:member"` references
//! that a [`Resolver`] turns into values the first time they are read. Registries
//! are grouped by name in a [`Namespace`], and an [`AutoDispatch`] picks a
//! registered variant from a discriminator field in persisted configuration.

pub mod config;
pub mod container;
pub mod dispatch;
pub mod error;
pub mod global;
pub mod namespace;
pub mod pretrained;
pub mod reference;
pub mod registry;
pub mod resolver;

// Re-exports
pub use container::{Entry, EntryState, Key, LazyContainer, Target};
pub use dispatch::{
    AutoDispatch, ConfigFormat, FnVariant, JsonFormat, PretrainedVariant, Source, Variant,
    VariantRef,
};
pub use error::{BoxError, Origin, RegistryError, RegistryResult, ResolveError};
pub use namespace::Namespace;
pub use pretrained::Pretrained;
pub use reference::Reference;
pub use registry::Registry;
pub use resolver::{Module, ModuleResolver, NoResolver, Resolver};
