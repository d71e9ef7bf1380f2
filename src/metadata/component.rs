//! The component: aggregate root of the metadata model.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

use crate::core::{DirectModelLock, MetadataError, ModelLock};
use crate::metadata::artifact::ComponentArtifact;
use crate::metadata::attributes::{AttributesSchema, EmptySchema};
use crate::metadata::configuration::{
    ArtifactsInit, ConfigurationDescriptor, ConfigurationMetadata,
};
use crate::metadata::ids::{ComponentIdentifier, ModuleVersionIdentifier};
use crate::metadata::variant::VariantMetadata;

/// Insertion-ordered configuration registry: an arena plus a name index.
#[derive(Default)]
struct Registry {
    entries: Vec<Arc<ConfigurationMetadata>>,
    index: HashMap<String, usize>,
}

/// Shared state behind a [`ComponentMetadata`].
///
/// Configurations hold a [`Weak`](std::sync::Weak) handle to this state and
/// resolve their owning registry through it at read time, so the component
/// and its configurations form no ownership cycle.
pub(crate) struct ComponentState {
    component_id: ComponentIdentifier,
    module_version_id: ModuleVersionIdentifier,
    status: String,
    schema: Arc<dyn AttributesSchema>,
    model: Arc<dyn ModelLock>,
    registry: RwLock<Registry>,
    variants: RwLock<Vec<(String, Arc<VariantMetadata>)>>,
    consumable_variants: OnceLock<Option<Vec<Arc<ConfigurationMetadata>>>>,
    sealed: AtomicBool,
}

impl ComponentState {
    /// Looks up a configuration by name.
    pub(crate) fn configuration(&self, name: &str) -> Option<Arc<ConfigurationMetadata>> {
        let registry = self.registry.read().unwrap();
        registry.index.get(name).map(|&position| Arc::clone(&registry.entries[position]))
    }

    /// Snapshot of all configurations in registration order. The lock is
    /// released before returning so callers can recurse freely.
    pub(crate) fn configurations_in_order(&self) -> Vec<Arc<ConfigurationMetadata>> {
        self.registry.read().unwrap().entries.clone()
    }

    /// Marks the population phase over; registration afterwards panics.
    pub(crate) fn seal(&self) {
        self.sealed.store(true, Ordering::SeqCst);
    }

    /// Panics when registration happens after a derived view was computed;
    /// silently-stale caches would be the alternative.
    pub(crate) fn assert_unsealed(&self, what: &str) {
        assert!(
            !self.sealed.load(Ordering::SeqCst),
            "cannot add {what} to {}: metadata views have already been computed",
            self.component_id
        );
    }

    pub(crate) fn push_variant(&self, owning: String, variant: Arc<VariantMetadata>) {
        self.variants.write().unwrap().push((owning, variant));
    }

    /// Variants registered under the given configuration, in order.
    pub(crate) fn variants_of(&self, configuration: &str) -> Vec<Arc<VariantMetadata>> {
        self.variants
            .read()
            .unwrap()
            .iter()
            .filter(|(owning, _)| owning == configuration)
            .map(|(_, variant)| Arc::clone(variant))
            .collect()
    }

    /// Snapshot of every variant entry with its owning configuration name.
    pub(crate) fn variant_entries(&self) -> Vec<(String, Arc<VariantMetadata>)> {
        self.variants.read().unwrap().clone()
    }

    pub(crate) fn model(&self) -> &dyn ModelLock {
        self.model.as_ref()
    }

    pub(crate) fn model_handle(&self) -> Arc<dyn ModelLock> {
        Arc::clone(&self.model)
    }
}

/// Metadata of a single buildable unit: its identity, configurations,
/// variants and their lazily realized views.
///
/// Built once during a single-writer population phase
/// ([`add_configuration`](Self::add_configuration), raw declaration appends,
/// [`add_variant`](ConfigurationMetadata::add_variant)); afterwards every
/// derived view is computed at most once and shared freely across threads.
/// The first derived-view read seals the component - registering more
/// configurations or variants after that point panics.
pub struct ComponentMetadata {
    state: Arc<ComponentState>,
}

impl ComponentMetadata {
    /// Creates an empty component.
    ///
    /// `schema` is carried for graph-level attribute matching and never
    /// evaluated here; `model` serializes artifact realization with the
    /// wider build model.
    pub fn new(
        module_version_id: ModuleVersionIdentifier,
        component_id: ComponentIdentifier,
        status: impl Into<String>,
        schema: Arc<dyn AttributesSchema>,
        model: Arc<dyn ModelLock>,
    ) -> Self {
        Self {
            state: Arc::new(ComponentState {
                component_id,
                module_version_id,
                status: status.into(),
                schema,
                model,
                registry: RwLock::new(Registry::default()),
                variants: RwLock::new(Vec::new()),
                consumable_variants: OnceLock::new(),
                sealed: AtomicBool::new(false),
            }),
        }
    }

    /// Creates a component with an empty schema and no model lock; suitable
    /// when the component is not shared with a mutating build model.
    pub fn standalone(
        module_version_id: ModuleVersionIdentifier,
        component_id: ComponentIdentifier,
        status: impl Into<String>,
    ) -> Self {
        Self::new(
            module_version_id,
            component_id,
            status,
            Arc::new(EmptySchema),
            Arc::new(DirectModelLock),
        )
    }

    /// The component's identity.
    pub fn id(&self) -> &ComponentIdentifier {
        &self.state.component_id
    }

    /// The module coordinates this component publishes as.
    pub fn module_version_id(&self) -> &ModuleVersionIdentifier {
        &self.state.module_version_id
    }

    /// The component status (for example `integration` or `release`).
    pub fn status(&self) -> &str {
        &self.state.status
    }

    /// The attribute schema carried for graph-level matching.
    pub fn attributes_schema(&self) -> &Arc<dyn AttributesSchema> {
        &self.state.schema
    }

    /// Registers a configuration described by `descriptor`.
    ///
    /// An empty `descriptor.hierarchy` is derived as the configuration plus
    /// the hierarchies of its already-registered parents; an explicit one is
    /// validated (`name ∈ hierarchy`, `extends_from ⊆ hierarchy`).
    ///
    /// # Panics
    ///
    /// Panics if the component is already sealed by a derived-view read.
    pub fn add_configuration(
        &self,
        descriptor: ConfigurationDescriptor,
    ) -> Result<Arc<ConfigurationMetadata>, MetadataError> {
        self.state.assert_unsealed("configuration");
        self.register_configuration(descriptor, ArtifactsInit::Deferred)
    }

    /// Looks up a configuration by name.
    pub fn configuration(&self, name: &str) -> Option<Arc<ConfigurationMetadata>> {
        self.state.configuration(name)
    }

    /// All configuration names, in registration order.
    pub fn configuration_names(&self) -> Vec<String> {
        self.state
            .configurations_in_order()
            .iter()
            .map(|configuration| configuration.name().to_string())
            .collect()
    }

    /// The configurations participating in variant-aware graph traversal:
    /// those that are consumable and carry at least one attribute.
    ///
    /// Returns `None` - an explicit no-variants marker, distinct from an
    /// empty list - when nothing qualifies, signaling consumers to fall back
    /// to resolving by configuration name. Computed once and cached; the
    /// first call seals the component.
    pub fn variants_for_graph_traversal(&self) -> Option<&[Arc<ConfigurationMetadata>]> {
        self.state
            .consumable_variants
            .get_or_init(|| {
                self.state.seal();
                let qualifying: Vec<_> = self
                    .state
                    .configurations_in_order()
                    .into_iter()
                    .filter(|configuration| {
                        configuration.can_be_consumed() && !configuration.attributes().is_empty()
                    })
                    .collect();
                tracing::debug!(
                    component = %self.state.component_id,
                    count = qualifying.len(),
                    "computed consumable variants"
                );
                if qualifying.is_empty() { None } else { Some(qualifying) }
            })
            .as_deref()
    }

    /// Creates an independent copy of this component under a new identity,
    /// passing every realized artifact through `transform`.
    ///
    /// Forces realization of every configuration and variant of the source.
    /// `transform` runs at most once per distinct source artifact - the memo
    /// is keyed on artifact identity - so an artifact referenced by several
    /// variants and configurations maps to one shared transformed result,
    /// and transform side effects are bounded by the number of distinct
    /// artifacts. Raw dependency/exclude/file declarations are copied
    /// verbatim.
    pub fn copy(
        &self,
        component_id: ComponentIdentifier,
        mut transform: impl FnMut(&Arc<ComponentArtifact>) -> Arc<ComponentArtifact>,
    ) -> anyhow::Result<ComponentMetadata> {
        self.state.seal();
        let copy = ComponentMetadata::new(
            self.state.module_version_id.clone(),
            component_id,
            self.state.status.clone(),
            Arc::clone(&self.state.schema),
            Arc::clone(&self.state.model),
        );

        // A given artifact may appear in several variants and
        // configurations; transform each distinct artifact once and reuse
        // the result everywhere it is referenced.
        let mut transformed: HashMap<Arc<ComponentArtifact>, Arc<ComponentArtifact>> =
            HashMap::new();

        for (owning, variant) in self.state.variant_entries() {
            let artifacts =
                copy_artifacts(variant.artifacts()?, &mut transform, &mut transformed);
            let copied = VariantMetadata::resolved(
                variant.name().to_string(),
                variant.identifier().cloned(),
                variant.display_name().to_string(),
                variant.attributes().clone(),
                variant.capabilities().to_vec(),
                artifacts,
            );
            copy.state.push_variant(owning, Arc::new(copied));
        }

        for configuration in self.state.configurations_in_order() {
            configuration.realize_dependencies();
            let artifacts =
                copy_artifacts(configuration.artifacts()?, &mut transform, &mut transformed);
            let registered = copy
                .register_configuration(configuration.descriptor(), ArtifactsInit::Resolved(artifacts))?;
            registered.clone_declarations_from(&configuration);
        }

        Ok(copy)
    }

    fn register_configuration(
        &self,
        mut descriptor: ConfigurationDescriptor,
        artifacts: ArtifactsInit,
    ) -> Result<Arc<ConfigurationMetadata>, MetadataError> {
        let name = descriptor.name.clone();
        if self.state.configuration(&name).is_some() {
            return Err(MetadataError::DuplicateConfiguration {
                name,
                component: self.state.component_id.to_string(),
            });
        }

        descriptor.hierarchy = self.resolve_hierarchy(&descriptor)?;

        let configuration = ConfigurationMetadata::new(
            descriptor,
            Arc::downgrade(&self.state),
            self.state.component_id.clone(),
            artifacts,
        );
        let mut registry = self.state.registry.write().unwrap();
        let position = registry.entries.len();
        registry.index.insert(name, position);
        registry.entries.push(Arc::clone(&configuration));
        Ok(configuration)
    }

    /// Derives or validates a descriptor's hierarchy set, deduplicated with
    /// insertion order preserved.
    fn resolve_hierarchy(
        &self,
        descriptor: &ConfigurationDescriptor,
    ) -> Result<Vec<String>, MetadataError> {
        let name = &descriptor.name;
        if descriptor.hierarchy.is_empty() {
            let mut hierarchy = vec![name.clone()];
            for parent in &descriptor.extends_from {
                let parent_configuration = self.state.configuration(parent).ok_or_else(|| {
                    MetadataError::UnknownConfiguration {
                        name: parent.clone(),
                        component: self.state.component_id.to_string(),
                    }
                })?;
                for entry in parent_configuration.hierarchy() {
                    if !hierarchy.contains(entry) {
                        hierarchy.push(entry.clone());
                    }
                }
            }
            return Ok(hierarchy);
        }

        let mut hierarchy = Vec::with_capacity(descriptor.hierarchy.len());
        for entry in &descriptor.hierarchy {
            if !hierarchy.contains(entry) {
                hierarchy.push(entry.clone());
            }
        }
        if !hierarchy.contains(name) {
            return Err(MetadataError::HierarchyMissingSelf { name: name.clone() });
        }
        for parent in &descriptor.extends_from {
            if !hierarchy.contains(parent) {
                return Err(MetadataError::ParentOutsideHierarchy {
                    name: name.clone(),
                    parent: parent.clone(),
                });
            }
        }
        Ok(hierarchy)
    }
}

impl fmt::Display for ComponentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.state.component_id, f)
    }
}

impl fmt::Debug for ComponentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentMetadata")
            .field("id", &self.state.component_id.display_name())
            .field("module_version", &self.state.module_version_id.to_string())
            .field("status", &self.state.status)
            .field("configurations", &self.configuration_names())
            .finish_non_exhaustive()
    }
}

/// Maps `artifacts` through `transform`, reusing earlier results for
/// artifacts already seen in this copy operation.
fn copy_artifacts(
    artifacts: &[Arc<ComponentArtifact>],
    transform: &mut impl FnMut(&Arc<ComponentArtifact>) -> Arc<ComponentArtifact>,
    transformed: &mut HashMap<Arc<ComponentArtifact>, Arc<ComponentArtifact>>,
) -> Vec<Arc<ComponentArtifact>> {
    artifacts
        .iter()
        .map(|artifact| {
            Arc::clone(
                transformed
                    .entry(Arc::clone(artifact))
                    .or_insert_with(|| transform(artifact)),
            )
        })
        .collect()
}
