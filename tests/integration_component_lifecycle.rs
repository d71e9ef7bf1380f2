//! End-to-end lifecycle: populate a component, resolve its views from many
//! threads, then derive a transformed copy.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use depmeta::metadata::{
    Attributes, Capability, ComponentIdentifier, ConfigurationMetadata, DependencyMetadata,
    ExcludeMetadata, VariantIdentifier,
};

#[test]
fn test_views_are_stable_across_threads() {
    common::init_tracing();
    let component = Arc::new(common::chained_component());

    // Deferred declarations land before the first aggregation read, even
    // when that read happens on a different thread.
    let applications = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&applications);
    component.configuration("base").unwrap().defer_declarations(
        move |target: &ConfigurationMetadata| {
            counter.fetch_add(1, Ordering::SeqCst);
            target.add_exclude(ExcludeMetadata::new("org.example", "legacy"));
        },
    );

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let component = Arc::clone(&component);
            scope.spawn(move || {
                let base = component.configuration("base").unwrap();
                let names: Vec<_> = base
                    .dependencies()
                    .iter()
                    .map(|dependency| dependency.selector().name().to_string())
                    .collect();
                assert_eq!(names, ["base-dep", "api-dep", "runtime-dep"]);
                assert_eq!(base.excludes().len(), 1);

                let runtime = component.configuration("runtime").unwrap();
                let artifacts = runtime.artifacts().unwrap();
                let artifact_names: Vec<_> =
                    artifacts.iter().map(|artifact| artifact.name().name().to_string()).collect();
                assert_eq!(artifact_names, ["runtime", "api", "base"]);
            });
        }
    });

    assert_eq!(applications.load(Ordering::SeqCst), 1);
}

#[test]
fn test_variant_views_and_copy_share_transformed_artifacts() {
    common::init_tracing();
    let component = common::chained_component();
    let api = component.configuration("api").unwrap();
    api.add_variant(
        "api-elements",
        Some(VariantIdentifier::new("api-elements")),
        "variant 'api-elements' of project :engine",
        Attributes::new().with("usage", "api"),
        vec![Capability::new("org.example", "engine", "1.0")],
        Vec::new(),
    );

    // Only attributed consumable configurations participate in traversal,
    // and none were registered with attributes.
    assert!(component.variants_for_graph_traversal().is_none());

    let transforms = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&transforms);
    let copy = component
        .copy(ComponentIdentifier::new("project :engine (relocated)"), move |artifact| {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(artifact.with_file(format!("/relocated/{}.zip", artifact.name().name())))
        })
        .unwrap();

    // Three distinct artifacts across the whole hierarchy, transformed once
    // each no matter how many configurations reference them.
    assert_eq!(transforms.load(Ordering::SeqCst), 3);

    let runtime = copy.configuration("runtime").unwrap();
    let base = copy.configuration("base").unwrap();
    let runtime_artifacts = runtime.artifacts().unwrap();
    let base_artifacts = base.artifacts().unwrap();
    let shared_base = runtime_artifacts
        .iter()
        .find(|artifact| artifact.name().name() == "base")
        .expect("base artifact inherited");
    assert!(Arc::ptr_eq(shared_base, &base_artifacts[0]));
    assert_eq!(shared_base.file().unwrap().to_str(), Some("/relocated/base.zip"));

    // The copied variant kept its shape.
    let variants = copy.configuration("api").unwrap().variants();
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0].name(), "api-elements");
    assert!(variants[0].artifacts().unwrap().is_empty());

    // The copy aggregates dependencies from its own registry.
    let names: Vec<_> = copy
        .configuration("base")
        .unwrap()
        .dependencies()
        .iter()
        .map(DependencyMetadata::to_string)
        .collect();
    assert_eq!(
        names,
        [
            "org.example:base-dep:1.0",
            "org.example:api-dep:1.0",
            "org.example:runtime-dep:1.0"
        ]
    );
}
