//! The component metadata model.
//!
//! A *component* is a single buildable unit seen by the resolution engine:
//! it exposes named [`ConfigurationMetadata`] nodes arranged in an extension
//! hierarchy, each carrying raw dependency/exclude/file/artifact
//! declarations and zero or more attributed [`VariantMetadata`] leaves.
//!
//! The model has two phases. During **population**, a single logical owner
//! registers configurations and variants and appends raw declarations -
//! directly or through a deferred [`DeclarationSource`]. Afterwards, during
//! **resolution**, any number of threads read the derived views: hierarchy
//! aggregations, realized artifact lists and the consumable-variants view.
//! Every derived view is computed at most once; the first read seals the
//! component against further registration.
//!
//! Module map:
//!
//! - [`ids`] - identity value types (component, module version, variant,
//!   artifact name)
//! - [`attributes`] - attribute sets, capabilities, the schema handle
//! - [`dependency`] - raw dependency/exclude/file declarations
//! - [`artifact`] - declared artifacts and their realized component-bound
//!   form
//! - [`variant`] - attributed artifact sets for variant-aware matching
//! - [`configuration`] - hierarchy nodes and their aggregation/realization
//! - [`component`] - the aggregate root and the copy-with-transform
//!   operation

pub mod artifact;
pub mod attributes;
pub mod component;
pub mod configuration;
pub mod dependency;
pub mod ids;
pub mod variant;

pub use artifact::{ComponentArtifact, DeclaredArtifact};
pub use attributes::{Attributes, AttributesSchema, Capability, EmptySchema, category};
pub use component::ComponentMetadata;
pub use configuration::{ConfigurationDescriptor, ConfigurationMetadata, DeclarationSource};
pub use dependency::{DependencyMetadata, ExcludeMetadata, FileDependencyMetadata, ModuleSelector};
pub use ids::{ArtifactName, ComponentIdentifier, ModuleVersionIdentifier, VariantIdentifier};
pub use variant::VariantMetadata;
