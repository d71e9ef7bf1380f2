//! Shared helpers for the integration suites.

// Not every suite uses every helper.
#![allow(dead_code)]

use depmeta::metadata::{
    ArtifactName, ComponentIdentifier, ComponentMetadata, ConfigurationDescriptor,
    DeclaredArtifact, DependencyMetadata, ModuleSelector, ModuleVersionIdentifier,
};

/// Installs the env-filtered tracing subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A component with the usual three-level chain: base <- api <- runtime,
/// one dependency and one artifact declared per level.
pub fn chained_component() -> ComponentMetadata {
    let component = ComponentMetadata::standalone(
        ModuleVersionIdentifier::new("org.example", "engine", "1.0"),
        ComponentIdentifier::new("project :engine"),
        "integration",
    );
    for (name, parent) in [("base", None), ("api", Some("base")), ("runtime", Some("api"))] {
        let mut descriptor = ConfigurationDescriptor::new(name);
        if let Some(parent) = parent {
            descriptor = descriptor.extends(parent);
        }
        let configuration = component.add_configuration(descriptor).expect("fresh name");
        configuration.add_dependency(DependencyMetadata::new(ModuleSelector::new(
            "org.example",
            format!("{name}-dep"),
            "1.0",
        )));
        configuration.add_artifact(
            DeclaredArtifact::new(ArtifactName::new(name, "archive").with_extension("zip"))
                .with_file(format!("/build/{name}.zip")),
        );
    }
    component
}
