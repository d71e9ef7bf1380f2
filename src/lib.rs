//! depmeta - component metadata for dependency resolution engines
//!
//! This crate models a single buildable unit's internal dependency structure
//! as seen by a dependency-resolution engine: the named configurations the
//! unit exposes, the variants derived from them, and the dependencies,
//! exclusions and artifacts each carries - together with the machinery that
//! resolves and caches that information exactly once, safely, under
//! concurrent and repeated access.
//!
//! # Architecture Overview
//!
//! The model has a strict two-phase lifecycle:
//!
//! 1. **Population** - a single logical owner registers configurations and
//!    variants on a [`ComponentMetadata`] and appends raw declarations,
//!    either directly or through a deferred one-shot
//!    [`DeclarationSource`](metadata::DeclarationSource) callback.
//! 2. **Resolution** - any number of threads read the derived views:
//!    hierarchy-aggregated dependency/exclude/file lists, lazily realized
//!    artifact lists, and the consumable-variants view. Every derivation is
//!    computed at most once and then shared; the first read seals the
//!    component against further registration.
//!
//! All expensive derivations route through one primitive:
//! [`LazyValue`](lazy::LazyValue), a compute-once memoization cell that
//! serves the same outcome - value or captured failure - to every caller.
//!
//! # Core Modules
//!
//! - [`core`] - typed errors, shared failures, and the model-lock execution
//!   boundary
//! - [`lazy`] - the compute-once memoization cell
//! - [`metadata`] - components, configurations, variants, artifacts and the
//!   copy-with-transform operation
//! - [`collection`] - lenient/strict resolution of a selected artifact set
//!
//! # Example
//!
//! ```rust
//! use depmeta::metadata::{
//!     Attributes, ComponentIdentifier, ComponentMetadata, ConfigurationDescriptor,
//!     DependencyMetadata, ModuleSelector, ModuleVersionIdentifier,
//! };
//!
//! # fn main() -> anyhow::Result<()> {
//! let component = ComponentMetadata::standalone(
//!     ModuleVersionIdentifier::new("org.example", "engine", "1.0"),
//!     ComponentIdentifier::new("project :engine"),
//!     "integration",
//! );
//!
//! let api = component.add_configuration(ConfigurationDescriptor::new("api"))?;
//! let runtime =
//!     component.add_configuration(ConfigurationDescriptor::new("runtime").extends("api"))?;
//! api.add_dependency(DependencyMetadata::new(ModuleSelector::new(
//!     "org.example",
//!     "parser",
//!     "2.1",
//! )));
//!
//! // "api" is included by both configurations, so it aggregates both raw
//! // lists; the result is computed once and cached.
//! assert_eq!(api.dependencies().len(), 1);
//! assert_eq!(runtime.hierarchy(), ["runtime", "api"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency Model
//!
//! There is no scheduler: all work happens on calling threads. Registration
//! is single-writer and must complete before the first derived read; after
//! that, every structure is either immutable or guarded by a compute-once
//! cell, and the whole component is freely shared across threads. Artifact
//! realization runs under an external, re-entrant
//! [`ModelLock`](core::ModelLock) boundary owned by the wider build model;
//! this crate calls it but never implements that locking itself.

pub mod collection;
pub mod core;
pub mod lazy;
pub mod metadata;

pub use crate::core::{MetadataError, SharedFailure};
pub use crate::lazy::LazyValue;
pub use crate::metadata::ComponentMetadata;
