//! Configurations: named, hierarchical buckets of declarations within a
//! component.
//!
//! A configuration accumulates raw dependency/exclude/file/artifact
//! declarations during the single-writer population phase. Afterwards it
//! serves three aggregated views - [`dependencies`], [`excludes`],
//! [`files`] - computed by walking the owning component's registry, and a
//! lazily realized artifact list that unions its own declarations with its
//! ancestors'. All derived state is computed at most once and is then
//! immutable and safe for unsynchronized concurrent reads.
//!
//! [`dependencies`]: ConfigurationMetadata::dependencies
//! [`excludes`]: ConfigurationMetadata::excludes
//! [`files`]: ConfigurationMetadata::files

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, Once, OnceLock, Weak};

use anyhow::anyhow;

use crate::core::{MetadataError, SharedFailure, run_under_model_lock};
use crate::lazy::LazyValue;
use crate::metadata::artifact::{ComponentArtifact, DeclaredArtifact};
use crate::metadata::attributes::{Attributes, Capability};
use crate::metadata::component::ComponentState;
use crate::metadata::dependency::{DependencyMetadata, ExcludeMetadata, FileDependencyMetadata};
use crate::metadata::ids::{ArtifactName, ComponentIdentifier, VariantIdentifier};
use crate::metadata::variant::VariantMetadata;

/// The shape of a configuration to register on a component.
///
/// Only `name` is required. `hierarchy` may be left empty, in which case it
/// is derived at registration time as the configuration itself plus the
/// hierarchies of its (already registered) direct parents; when supplied
/// explicitly it must contain the configuration's own name and every entry
/// of `extends_from`.
#[derive(Debug, Clone)]
pub struct ConfigurationDescriptor {
    /// Unique name within the owning component.
    pub name: String,
    /// Human-readable description used in diagnostics.
    pub description: String,
    /// Whether the configuration is visible outside its project.
    pub visible: bool,
    /// Whether dependency resolution follows transitive dependencies.
    pub transitive: bool,
    /// Whether the configuration can be selected by consumers.
    pub can_be_consumed: bool,
    /// Whether the configuration can itself be resolved.
    pub can_be_resolved: bool,
    /// Deprecation message shown when consumers select this configuration.
    pub consumption_deprecation: Option<String>,
    /// Names of the directly extended configurations.
    pub extends_from: Vec<String>,
    /// Names reachable by transitive extension, including this
    /// configuration's own name. Empty means "derive from `extends_from`".
    pub hierarchy: Vec<String>,
    /// Attributes consumers match against.
    pub attributes: Attributes,
    /// Capabilities this configuration provides.
    pub capabilities: Vec<Capability>,
}

impl ConfigurationDescriptor {
    /// Creates a descriptor with defaults: visible, transitive, consumable,
    /// resolvable, no parents, no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: format!("configuration '{name}'"),
            name,
            visible: true,
            transitive: true,
            can_be_consumed: true,
            can_be_resolved: true,
            consumption_deprecation: None,
            extends_from: Vec::new(),
            hierarchy: Vec::new(),
            attributes: Attributes::new(),
            capabilities: Vec::new(),
        }
    }

    /// Adds a direct parent.
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends_from.push(parent.into());
        self
    }

    /// Appends a name to the explicit hierarchy set.
    #[must_use]
    pub fn with_hierarchy_entry(mut self, name: impl Into<String>) -> Self {
        self.hierarchy.push(name.into());
        self
    }

    /// Replaces the attribute set.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Adds a capability.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }
}

/// One-shot supplier of deferred declarations for a configuration.
///
/// Instead of appending dependencies directly, a caller may link a source to
/// the configuration; the first aggregation read applies it exactly once,
/// then discards the link. The source must only append raw declarations
/// (`add_dependency`, `add_exclude`, `add_files`) - reading an aggregated
/// view from inside the callback is a contract violation.
pub trait DeclarationSource: Send {
    /// Applies the pending declarations to `configuration`.
    fn apply_to(self: Box<Self>, configuration: &ConfigurationMetadata);
}

impl<F> DeclarationSource for F
where
    F: FnOnce(&ConfigurationMetadata) + Send,
{
    fn apply_to(self: Box<Self>, configuration: &ConfigurationMetadata) {
        (*self)(configuration)
    }
}

/// How a newly registered configuration obtains its artifact list.
pub(crate) enum ArtifactsInit {
    /// Realize from declarations and the hierarchy on first read.
    Deferred,
    /// Already realized; used by the copy operation.
    Resolved(Vec<Arc<ComponentArtifact>>),
}

/// A named node in a component's configuration hierarchy.
///
/// Obtained from [`ComponentMetadata::add_configuration`]; always handled
/// through an [`Arc`] registered on the owning component.
///
/// [`ComponentMetadata::add_configuration`]: crate::metadata::ComponentMetadata::add_configuration
pub struct ConfigurationMetadata {
    name: String,
    description: String,
    visible: bool,
    transitive: bool,
    can_be_consumed: bool,
    can_be_resolved: bool,
    consumption_deprecation: Option<String>,
    extends_from: Vec<String>,
    hierarchy: Vec<String>,
    attributes: Attributes,
    capabilities: Vec<Capability>,
    component_id: ComponentIdentifier,
    component: Weak<ComponentState>,

    declared_dependencies: Mutex<Vec<DependencyMetadata>>,
    declared_excludes: Mutex<Vec<ExcludeMetadata>>,
    declared_files: Mutex<Vec<FileDependencyMetadata>>,
    declared_artifacts: Mutex<Vec<DeclaredArtifact>>,

    pending_declarations: Mutex<Option<Box<dyn DeclarationSource>>>,
    realize_guard: Once,

    dependencies_cache: OnceLock<Vec<DependencyMetadata>>,
    excludes_cache: OnceLock<Vec<ExcludeMetadata>>,
    files_cache: OnceLock<Vec<FileDependencyMetadata>>,

    artifacts: LazyValue<Vec<Arc<ComponentArtifact>>>,
}

impl ConfigurationMetadata {
    /// Builds a configuration whose descriptor has already been validated
    /// and whose `hierarchy` is final.
    pub(crate) fn new(
        descriptor: ConfigurationDescriptor,
        component: Weak<ComponentState>,
        component_id: ComponentIdentifier,
        artifacts: ArtifactsInit,
    ) -> Arc<Self> {
        let display = format!("configuration '{}' of {component_id}", descriptor.name);
        let description = format!("artifacts of {display}");
        let artifacts = match artifacts {
            ArtifactsInit::Resolved(list) => LazyValue::finalized(description, list),
            ArtifactsInit::Deferred => {
                let component = Weak::clone(&component);
                let name = descriptor.name.clone();
                LazyValue::deferred(description, move || {
                    let component = component
                        .upgrade()
                        .ok_or_else(|| anyhow!("owning component of '{name}' has been released"))?;
                    let configuration = component
                        .configuration(&name)
                        .ok_or_else(|| anyhow!("configuration '{name}' vanished from its registry"))?;
                    configuration.realize_artifacts(&component)
                })
            }
        };
        Arc::new(Self {
            name: descriptor.name,
            description: descriptor.description,
            visible: descriptor.visible,
            transitive: descriptor.transitive,
            can_be_consumed: descriptor.can_be_consumed,
            can_be_resolved: descriptor.can_be_resolved,
            consumption_deprecation: descriptor.consumption_deprecation,
            extends_from: descriptor.extends_from,
            hierarchy: descriptor.hierarchy,
            attributes: descriptor.attributes,
            capabilities: descriptor.capabilities,
            component_id,
            component,
            declared_dependencies: Mutex::new(Vec::new()),
            declared_excludes: Mutex::new(Vec::new()),
            declared_files: Mutex::new(Vec::new()),
            declared_artifacts: Mutex::new(Vec::new()),
            pending_declarations: Mutex::new(None),
            realize_guard: Once::new(),
            dependencies_cache: OnceLock::new(),
            excludes_cache: OnceLock::new(),
            files_cache: OnceLock::new(),
            artifacts,
        })
    }

    /// The configuration name, unique within the owning component.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the configuration is visible outside its project.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether resolution follows transitive dependencies.
    pub fn is_transitive(&self) -> bool {
        self.transitive
    }

    /// Whether consumers can select this configuration.
    pub fn can_be_consumed(&self) -> bool {
        self.can_be_consumed
    }

    /// Whether this configuration can itself be resolved.
    pub fn can_be_resolved(&self) -> bool {
        self.can_be_resolved
    }

    /// Deprecation message for consumption, if any.
    pub fn consumption_deprecation(&self) -> Option<&str> {
        self.consumption_deprecation.as_deref()
    }

    /// Names of the directly extended configurations.
    pub fn extends_from(&self) -> &[String] {
        &self.extends_from
    }

    /// Names reachable by transitive extension, including this
    /// configuration's own name.
    pub fn hierarchy(&self) -> &[String] {
        &self.hierarchy
    }

    /// Whether `name` is part of this configuration's hierarchy.
    pub fn hierarchy_contains(&self, name: &str) -> bool {
        self.hierarchy.iter().any(|entry| entry == name)
    }

    /// The attribute set consumers match against.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// The capabilities this configuration provides.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// The owning component's identity.
    pub fn component_id(&self) -> &ComponentIdentifier {
        &self.component_id
    }

    /// Appends a raw dependency declaration.
    pub fn add_dependency(&self, dependency: DependencyMetadata) {
        self.declared_dependencies.lock().unwrap().push(dependency);
    }

    /// Appends a raw exclusion declaration.
    pub fn add_exclude(&self, exclude: ExcludeMetadata) {
        self.declared_excludes.lock().unwrap().push(exclude);
    }

    /// Appends a raw file-dependency declaration.
    pub fn add_files(&self, files: FileDependencyMetadata) {
        self.declared_files.lock().unwrap().push(files);
    }

    /// Appends a raw artifact declaration.
    pub fn add_artifact(&self, artifact: DeclaredArtifact) {
        self.declared_artifacts.lock().unwrap().push(artifact);
    }

    /// Links a deferred declaration source, replacing any previous link.
    ///
    /// The source runs exactly once, on the first aggregation read or an
    /// explicit [`realize_dependencies`](Self::realize_dependencies) call.
    pub fn defer_declarations(&self, source: impl DeclarationSource + 'static) {
        *self.pending_declarations.lock().unwrap() = Some(Box::new(source));
    }

    /// Registers a variant under this configuration.
    ///
    /// # Panics
    ///
    /// Panics if the owning component is already sealed by a derived-view
    /// read.
    pub fn add_variant(
        &self,
        name: impl Into<String>,
        identifier: Option<VariantIdentifier>,
        display_name: impl Into<String>,
        attributes: Attributes,
        capabilities: Vec<Capability>,
        artifacts: Vec<DeclaredArtifact>,
    ) {
        let component = self.component();
        component.assert_unsealed("variant");
        let variant = VariantMetadata::deferred(
            name.into(),
            identifier,
            display_name.into(),
            attributes,
            capabilities,
            self.component_id.clone(),
            component.model_handle(),
            artifacts,
        );
        component.push_variant(self.name.clone(), Arc::new(variant));
    }

    /// The variants registered under this configuration, in registration
    /// order.
    pub fn variants(&self) -> Vec<Arc<VariantMetadata>> {
        self.component().variants_of(&self.name)
    }

    /// Applies the linked declaration source, if any, exactly once.
    ///
    /// Concurrent first calls are serialized: one caller applies the source,
    /// the others wait for it to finish. Later calls are no-ops.
    pub fn realize_dependencies(&self) {
        self.realize_guard.call_once(|| {
            if let Some(source) = self.pending_declarations.lock().unwrap().take() {
                tracing::trace!(configuration = %self.name, "applying deferred declarations");
                source.apply_to(self);
            }
        });
    }

    /// The aggregated dependency view: the raw dependencies of every
    /// registered configuration whose hierarchy contains this one, in
    /// registry order, realized first.
    ///
    /// If this configuration's category attribute marks an enforced
    /// platform, every aggregated dependency is returned in its forced form.
    /// The result is computed once and cached; the first call seals the
    /// owning component against further registration.
    pub fn dependencies(&self) -> &[DependencyMetadata] {
        self.dependencies_cache.get_or_init(|| {
            let component = self.component();
            component.seal();
            let mut aggregated = Vec::new();
            for configuration in component.configurations_in_order() {
                if configuration.hierarchy_contains(&self.name) {
                    configuration.realize_dependencies();
                    aggregated
                        .extend(configuration.declared_dependencies.lock().unwrap().iter().cloned());
                }
            }
            if self.attributes.is_enforced_platform() {
                aggregated = aggregated.iter().map(DependencyMetadata::forced).collect();
            }
            tracing::debug!(
                configuration = %self.name,
                count = aggregated.len(),
                "aggregated dependencies"
            );
            aggregated
        })
    }

    /// The aggregated exclusion view; same walk as
    /// [`dependencies`](Self::dependencies), without the enforced-platform
    /// rule.
    pub fn excludes(&self) -> &[ExcludeMetadata] {
        self.excludes_cache.get_or_init(|| {
            let component = self.component();
            component.seal();
            let mut aggregated = Vec::new();
            for configuration in component.configurations_in_order() {
                if configuration.hierarchy_contains(&self.name) {
                    configuration.realize_dependencies();
                    aggregated
                        .extend(configuration.declared_excludes.lock().unwrap().iter().cloned());
                }
            }
            aggregated
        })
    }

    /// The aggregated file-dependency view; same walk as
    /// [`dependencies`](Self::dependencies), without the enforced-platform
    /// rule.
    pub fn files(&self) -> &[FileDependencyMetadata] {
        self.files_cache.get_or_init(|| {
            let component = self.component();
            component.seal();
            let mut aggregated = Vec::new();
            for configuration in component.configurations_in_order() {
                if configuration.hierarchy_contains(&self.name) {
                    configuration.realize_dependencies();
                    aggregated.extend(configuration.declared_files.lock().unwrap().iter().cloned());
                }
            }
            aggregated
        })
    }

    /// Realizes this configuration's artifact list and those of its
    /// variants, without reading them.
    pub fn prepare_to_resolve_artifacts(&self) -> Result<(), SharedFailure> {
        self.artifacts.finalize_if_not_already()?;
        for variant in self.variants() {
            variant.prepare_to_resolve_artifacts()?;
        }
        Ok(())
    }

    /// The realized artifact list: own declarations bound to the component,
    /// unioned with every ancestor's realized list, duplicates coalesced by
    /// artifact equality. Computed once, under the model lock.
    pub fn artifacts(&self) -> Result<&[Arc<ComponentArtifact>], SharedFailure> {
        self.artifacts.force().map(Vec::as_slice)
    }

    /// Looks up a realized artifact by structural name.
    ///
    /// A missing name is not an error: the result is a sentinel record
    /// carrying the requested name and this component's id, and the absence
    /// surfaces only when something later consumes the sentinel.
    pub fn artifact(&self, name: &ArtifactName) -> Result<Arc<ComponentArtifact>, SharedFailure> {
        for candidate in self.artifacts()? {
            if candidate.name() == name {
                return Ok(Arc::clone(candidate));
            }
        }
        Ok(Arc::new(ComponentArtifact::missing(self.component_id.clone(), name.clone())))
    }

    /// Copies the raw declaration lists of `source` into this configuration.
    /// The declarations are immutable values; sharing them is fine.
    pub(crate) fn clone_declarations_from(&self, source: &ConfigurationMetadata) {
        self.declared_dependencies
            .lock()
            .unwrap()
            .extend(source.declared_dependencies.lock().unwrap().iter().cloned());
        self.declared_excludes
            .lock()
            .unwrap()
            .extend(source.declared_excludes.lock().unwrap().iter().cloned());
        self.declared_files
            .lock()
            .unwrap()
            .extend(source.declared_files.lock().unwrap().iter().cloned());
    }

    /// Rebuilds the descriptor this configuration was registered with.
    pub(crate) fn descriptor(&self) -> ConfigurationDescriptor {
        ConfigurationDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            visible: self.visible,
            transitive: self.transitive,
            can_be_consumed: self.can_be_consumed,
            can_be_resolved: self.can_be_resolved,
            consumption_deprecation: self.consumption_deprecation.clone(),
            extends_from: self.extends_from.clone(),
            hierarchy: self.hierarchy.clone(),
            attributes: self.attributes.clone(),
            capabilities: self.capabilities.clone(),
        }
    }

    /// Production function of the artifact cell.
    fn realize_artifacts(
        &self,
        component: &Arc<ComponentState>,
    ) -> anyhow::Result<Vec<Arc<ComponentArtifact>>> {
        // Declarations are consumed here; the realized list is the only
        // artifact state from now on.
        let declared = std::mem::take(&mut *self.declared_artifacts.lock().unwrap());
        if declared.is_empty() && self.hierarchy.len() <= 1 {
            return Ok(Vec::new());
        }
        component.seal();
        run_under_model_lock(component.model(), || {
            let mut seen = HashSet::new();
            let mut artifacts: Vec<Arc<ComponentArtifact>> = Vec::new();
            for declaration in &declared {
                let artifact = Arc::new(ComponentArtifact::from_declaration(
                    self.component_id.clone(),
                    declaration,
                ));
                if seen.insert(Arc::clone(&artifact)) {
                    artifacts.push(artifact);
                }
            }
            for ancestor in &self.hierarchy {
                if *ancestor == self.name {
                    continue;
                }
                let parent = component.configuration(ancestor).ok_or_else(|| {
                    MetadataError::UnknownConfiguration {
                        name: ancestor.clone(),
                        component: self.component_id.to_string(),
                    }
                })?;
                for artifact in parent.artifacts()? {
                    if seen.insert(Arc::clone(artifact)) {
                        artifacts.push(Arc::clone(artifact));
                    }
                }
            }
            tracing::debug!(
                configuration = %self.name,
                count = artifacts.len(),
                "realized artifacts"
            );
            Ok(artifacts)
        })
    }

    fn component(&self) -> Arc<ComponentState> {
        self.component.upgrade().unwrap_or_else(|| {
            panic!("owning component of configuration '{}' has been released", self.name)
        })
    }
}

impl fmt::Display for ConfigurationMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration '{}' of {}", self.name, self.component_id)
    }
}

impl fmt::Debug for ConfigurationMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationMetadata")
            .field("name", &self.name)
            .field("component", &self.component_id.display_name())
            .field("hierarchy", &self.hierarchy)
            .field("can_be_consumed", &self.can_be_consumed)
            .field("can_be_resolved", &self.can_be_resolved)
            .finish_non_exhaustive()
    }
}
