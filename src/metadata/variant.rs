//! Variants: attributed, capability-bearing artifact sets within a
//! configuration.

use std::fmt;
use std::sync::Arc;

use crate::core::{ModelLock, SharedFailure, run_under_model_lock};
use crate::lazy::LazyValue;
use crate::metadata::artifact::{ComponentArtifact, DeclaredArtifact};
use crate::metadata::attributes::{Attributes, Capability};
use crate::metadata::ids::{ComponentIdentifier, VariantIdentifier};

/// A variant exposed by a configuration for attribute-based matching.
///
/// Variants are registered during population through
/// [`ConfigurationMetadata::add_variant`] and own a lazily realized artifact
/// list: the declared artifacts are converted into [`ComponentArtifact`]
/// records, bound to the owning component, on first read - under the model
/// lock, exactly once.
///
/// [`ConfigurationMetadata::add_variant`]: crate::metadata::ConfigurationMetadata::add_variant
#[derive(Debug)]
pub struct VariantMetadata {
    name: String,
    identifier: Option<VariantIdentifier>,
    display_name: String,
    attributes: Attributes,
    capabilities: Vec<Capability>,
    artifacts: LazyValue<Vec<Arc<ComponentArtifact>>>,
}

impl VariantMetadata {
    /// Creates a variant whose artifacts are realized on first read.
    pub(crate) fn deferred(
        name: String,
        identifier: Option<VariantIdentifier>,
        display_name: String,
        attributes: Attributes,
        capabilities: Vec<Capability>,
        component_id: ComponentIdentifier,
        model: Arc<dyn ModelLock>,
        declared: Vec<DeclaredArtifact>,
    ) -> Self {
        let description = format!("artifacts of {display_name}");
        let artifacts = LazyValue::deferred(description, move || {
            if declared.is_empty() {
                return Ok(Vec::new());
            }
            Ok(run_under_model_lock(model.as_ref(), || {
                declared
                    .iter()
                    .map(|artifact| {
                        Arc::new(ComponentArtifact::from_declaration(component_id.clone(), artifact))
                    })
                    .collect()
            }))
        });
        Self {
            name,
            identifier,
            display_name,
            attributes,
            capabilities,
            artifacts,
        }
    }

    /// Creates a variant around an already-realized artifact list; used by
    /// the copy operation, where artifacts have been transformed eagerly.
    pub(crate) fn resolved(
        name: String,
        identifier: Option<VariantIdentifier>,
        display_name: String,
        attributes: Attributes,
        capabilities: Vec<Capability>,
        artifacts: Vec<Arc<ComponentArtifact>>,
    ) -> Self {
        let description = format!("artifacts of {display_name}");
        Self {
            name,
            identifier,
            display_name,
            attributes,
            capabilities,
            artifacts: LazyValue::finalized(description, artifacts),
        }
    }

    /// The variant name, unique within its owning configuration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The opaque identifier assigned at registration, if any.
    pub fn identifier(&self) -> Option<&VariantIdentifier> {
        self.identifier.as_ref()
    }

    /// The human-readable name used in diagnostics.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The attribute set consumers match against.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// The capabilities this variant provides.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Realizes the artifact list if necessary without reading it.
    pub fn prepare_to_resolve_artifacts(&self) -> Result<(), SharedFailure> {
        self.artifacts.finalize_if_not_already()
    }

    /// The realized artifact list, computing it on first call.
    pub fn artifacts(&self) -> Result<&[Arc<ComponentArtifact>], SharedFailure> {
        self.artifacts.force().map(Vec::as_slice)
    }
}

impl fmt::Display for VariantMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DirectModelLock;
    use crate::metadata::ids::ArtifactName;

    fn variant_with(declared: Vec<DeclaredArtifact>) -> VariantMetadata {
        VariantMetadata::deferred(
            "api-elements".to_string(),
            Some(VariantIdentifier::new("v1")),
            "variant 'api-elements'".to_string(),
            Attributes::new().with("usage", "api"),
            vec![Capability::new("org.example", "engine", "1.0")],
            ComponentIdentifier::new("project :engine"),
            Arc::new(DirectModelLock),
            declared,
        )
    }

    #[test]
    fn test_empty_declarations_realize_to_empty_list() {
        let variant = variant_with(Vec::new());
        assert_eq!(variant.artifacts().unwrap().len(), 0);
    }

    #[test]
    fn test_declared_artifacts_bound_to_component() {
        let declared = DeclaredArtifact::new(ArtifactName::new("engine", "archive"))
            .with_file("/build/engine.zip");
        let variant = variant_with(vec![declared]);

        let artifacts = variant.artifacts().unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].component_id().display_name(), "project :engine");
        assert!(!artifacts[0].is_missing());
    }

    #[test]
    fn test_prepare_then_read_returns_same_list() {
        let declared = DeclaredArtifact::new(ArtifactName::new("engine", "archive"));
        let variant = variant_with(vec![declared]);

        variant.prepare_to_resolve_artifacts().unwrap();
        let first: Vec<_> = variant.artifacts().unwrap().to_vec();
        let second: Vec<_> = variant.artifacts().unwrap().to_vec();
        assert_eq!(first.len(), 1);
        // Same Arc, not a recomputed list.
        assert!(Arc::ptr_eq(&first[0], &second[0]));
    }
}
