//! Artifact collection resolving the realized artifacts of a component's
//! configuration, under both leniency policies.

mod common;

use std::sync::Arc;

use anyhow::anyhow;
use depmeta::collection::{
    ArtifactCollection, ArtifactVisitor, ResolvedArtifact, SelectedArtifacts, SimpleResolutionHost,
};
use depmeta::metadata::{
    ArtifactName, ComponentIdentifier, ComponentMetadata, ConfigurationDescriptor,
    ConfigurationMetadata, DeclaredArtifact, ModuleVersionIdentifier,
};

/// Selects the realized artifacts of one configuration; an artifact without
/// a backing file is reported as a failure.
struct ConfigurationSelection {
    configuration: Arc<ConfigurationMetadata>,
}

impl SelectedArtifacts for ConfigurationSelection {
    fn visit(&self, visitor: &mut dyn ArtifactVisitor, _lenient: bool) {
        match self.configuration.artifacts() {
            Ok(artifacts) => {
                for artifact in artifacts {
                    match artifact.file() {
                        Some(file) => visitor.visit_artifact(ResolvedArtifact::new(
                            artifact.component_id().clone(),
                            artifact.name().clone(),
                            file,
                        )),
                        None => visitor.visit_failure(anyhow!("no file produced for {artifact}")),
                    }
                }
            }
            Err(failure) => visitor.visit_failure(failure.into()),
        }
    }
}

fn component_with_artifacts() -> ComponentMetadata {
    let component = ComponentMetadata::standalone(
        ModuleVersionIdentifier::new("org.example", "engine", "1.0"),
        ComponentIdentifier::new("project :engine"),
        "integration",
    );
    let outputs = component.add_configuration(ConfigurationDescriptor::new("outputs")).unwrap();
    outputs.add_artifact(
        DeclaredArtifact::new(ArtifactName::new("engine", "archive").with_extension("zip"))
            .with_file("/build/engine.zip"),
    );
    outputs.add_artifact(
        DeclaredArtifact::new(ArtifactName::new("docs", "archive").with_extension("zip"))
            .with_file("/build/docs.zip"),
    );
    // Declared but never produced; resolves to a failure.
    outputs.add_artifact(DeclaredArtifact::new(
        ArtifactName::new("reports", "archive").with_extension("zip"),
    ));
    component
}

fn collection_over(component: &ComponentMetadata, lenient: bool) -> ArtifactCollection {
    let configuration = component.configuration("outputs").unwrap();
    ArtifactCollection::new(
        Arc::new(ConfigurationSelection {
            configuration,
        }),
        Arc::new(SimpleResolutionHost::new("configuration 'outputs'")),
        lenient,
    )
}

#[test]
fn test_lenient_collection_splits_successes_and_failures() {
    common::init_tracing();
    let component = component_with_artifacts();
    let collection = collection_over(&component, true);

    let names: Vec<_> = collection
        .iter()
        .unwrap()
        .map(|artifact| artifact.name.name().to_string())
        .collect();
    assert_eq!(names, ["engine", "docs"]);

    let failures = collection.failures().unwrap();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].to_string().contains("reports"));
}

#[test]
fn test_strict_collection_fails_as_one_aggregate() {
    common::init_tracing();
    let component = component_with_artifacts();
    let collection = collection_over(&component, false);

    let failure = collection.artifacts().unwrap_err();
    assert!(failure.to_string().contains("configuration 'outputs'"));
    assert!(failure.to_string().contains("reports"));

    // The aggregate is memoized; a second read re-raises it unchanged.
    assert_eq!(collection.artifacts().unwrap_err().to_string(), failure.to_string());
}

#[test]
fn test_realization_failure_surfaces_as_collection_failure() {
    common::init_tracing();
    let component = ComponentMetadata::standalone(
        ModuleVersionIdentifier::new("org.example", "engine", "1.0"),
        ComponentIdentifier::new("project :engine"),
        "integration",
    );
    let broken = component
        .add_configuration(
            ConfigurationDescriptor::new("outputs")
                .with_hierarchy_entry("outputs")
                .with_hierarchy_entry("ghost"),
        )
        .unwrap();
    broken.add_artifact(
        DeclaredArtifact::new(ArtifactName::new("engine", "archive")).with_file("/build/engine.zip"),
    );

    let collection = collection_over(&component, true);
    assert!(collection.artifacts().unwrap().is_empty());
    let failures = collection.failures().unwrap();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].to_string().contains("ghost"));
}
