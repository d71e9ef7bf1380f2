//! Artifact collection: the memoized front-end over a selected artifact set.
//!
//! An [`ArtifactCollection`] wraps an external [`SelectedArtifacts`] source
//! and a leniency flag. The first read visits the selection once, splitting
//! the outcome into resolved artifacts and failures:
//!
//! - **lenient** - failures are data: both sets are exposed independently
//!   and nothing is thrown;
//! - **strict** - any failure aborts the resolution with a single aggregate
//!   error built by the [`ResolutionHost`]; callers never observe a partial
//!   result.
//!
//! The split is memoized behind a [`LazyValue`], so repeated and concurrent
//! reads resolve the selection exactly once. [`ArtifactCollection::visit`]
//! replays the raw selection for callers that need different failure
//! semantics than the cached pass.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::{AggregateFailure, SharedFailure};
use crate::lazy::LazyValue;
use crate::metadata::ids::{ArtifactName, ComponentIdentifier};

/// A successfully resolved artifact: its provenance and the file it resolved
/// to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedArtifact {
    /// The component the artifact belongs to.
    pub component_id: ComponentIdentifier,
    /// The artifact's structural name.
    pub name: ArtifactName,
    /// The resolved file.
    pub file: PathBuf,
}

impl ResolvedArtifact {
    /// Creates a resolved artifact record.
    pub fn new(component_id: ComponentIdentifier, name: ArtifactName, file: impl Into<PathBuf>) -> Self {
        Self {
            component_id,
            name,
            file: file.into(),
        }
    }
}

impl fmt::Display for ResolvedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.name, self.component_id)
    }
}

/// Receives the outcome of visiting a selected artifact set.
pub trait ArtifactVisitor {
    /// Called for each artifact that resolved successfully.
    fn visit_artifact(&mut self, artifact: ResolvedArtifact);

    /// Called for each artifact that failed to resolve.
    fn visit_failure(&mut self, failure: anyhow::Error);
}

/// The external selection source driving a collection.
///
/// `lenient` is a hint for the source's own error handling; the source
/// reports outcomes through the visitor either way.
pub trait SelectedArtifacts: Send + Sync {
    /// Visits every selected artifact, reporting successes and failures.
    fn visit(&self, visitor: &mut dyn ArtifactVisitor, lenient: bool);
}

/// Decides how a strict-mode resolution reports its combined failure.
pub trait ResolutionHost: Send + Sync {
    /// Names the resolution for diagnostics, e.g. `configuration ':compile'`.
    fn display_name(&self) -> String;

    /// Combines `failures` into the single error raised for `operation`.
    fn aggregate_failure(&self, operation: &str, failures: &[SharedFailure]) -> anyhow::Error {
        AggregateFailure::new(
            format!("{operation} of {}", self.display_name()),
            failures.to_vec(),
        )
        .into()
    }
}

/// A resolution host that only carries a display name and uses the default
/// aggregation.
#[derive(Debug, Clone)]
pub struct SimpleResolutionHost {
    display_name: String,
}

impl SimpleResolutionHost {
    /// Creates a host naming the resolution `display_name`.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }
}

impl ResolutionHost for SimpleResolutionHost {
    fn display_name(&self) -> String {
        self.display_name.clone()
    }
}

/// The memoized outcome of one pass over the selection.
struct CollectionResult {
    artifacts: Vec<ResolvedArtifact>,
    failures: Vec<SharedFailure>,
}

/// Visitor of the cached pass: coalesces duplicate artifacts, keeps every
/// failure.
#[derive(Default)]
struct CollectingVisitor {
    artifacts: Vec<ResolvedArtifact>,
    seen: HashSet<ResolvedArtifact>,
    failures: Vec<SharedFailure>,
}

impl ArtifactVisitor for CollectingVisitor {
    fn visit_artifact(&mut self, artifact: ResolvedArtifact) {
        if self.seen.insert(artifact.clone()) {
            self.artifacts.push(artifact);
        }
    }

    fn visit_failure(&mut self, failure: anyhow::Error) {
        self.failures.push(SharedFailure::new(failure));
    }
}

/// A lazily resolved view of a selected artifact set, split into successes
/// and failures under a lenient/strict policy.
pub struct ArtifactCollection {
    selection: Arc<dyn SelectedArtifacts>,
    host: Arc<dyn ResolutionHost>,
    lenient: bool,
    result: LazyValue<CollectionResult>,
}

impl ArtifactCollection {
    /// Creates a collection over `selection`.
    pub fn new(
        selection: Arc<dyn SelectedArtifacts>,
        host: Arc<dyn ResolutionHost>,
        lenient: bool,
    ) -> Self {
        let description = format!("artifacts of {}", host.display_name());
        let visited = Arc::clone(&selection);
        let failure_host = Arc::clone(&host);
        let result = LazyValue::deferred(description, move || {
            let mut visitor = CollectingVisitor::default();
            visited.visit(&mut visitor, lenient);
            let CollectingVisitor {
                artifacts, failures, ..
            } = visitor;
            tracing::debug!(
                resolved = artifacts.len(),
                failed = failures.len(),
                lenient,
                "collected artifacts"
            );
            if !lenient && !failures.is_empty() {
                return Err(failure_host.aggregate_failure("artifacts", &failures));
            }
            Ok(CollectionResult {
                artifacts,
                failures,
            })
        });
        Self {
            selection,
            host,
            lenient,
            result,
        }
    }

    /// Whether failures are reported as data rather than thrown.
    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    /// The host deciding strict-mode failure reporting.
    pub fn resolution_host(&self) -> &Arc<dyn ResolutionHost> {
        &self.host
    }

    /// Resolves the selection if it has not been resolved yet.
    ///
    /// In strict mode this is where the aggregate failure surfaces; the same
    /// failure is re-raised to every later caller without revisiting the
    /// selection.
    pub fn ensure_resolved(&self) -> Result<(), SharedFailure> {
        self.result.finalize_if_not_already()
    }

    /// The resolved artifacts, duplicates coalesced, in visit order.
    pub fn artifacts(&self) -> Result<&[ResolvedArtifact], SharedFailure> {
        self.result.force().map(|result| result.artifacts.as_slice())
    }

    /// Iterates the resolved artifacts.
    pub fn iter(&self) -> Result<std::slice::Iter<'_, ResolvedArtifact>, SharedFailure> {
        self.artifacts().map(<[ResolvedArtifact]>::iter)
    }

    /// The failures observed by the cached pass. Non-empty only in lenient
    /// mode; in strict mode the read itself fails instead.
    pub fn failures(&self) -> Result<&[SharedFailure], SharedFailure> {
        self.result.force().map(|result| result.failures.as_slice())
    }

    /// Replays the underlying selection with a caller-supplied visitor,
    /// bypassing the cached result.
    pub fn visit(&self, visitor: &mut dyn ArtifactVisitor) {
        self.selection.visit(visitor, self.lenient);
    }
}

impl fmt::Debug for ArtifactCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactCollection")
            .field("host", &self.host.display_name())
            .field("lenient", &self.lenient)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A selection yielding fixed artifacts and failures, counting visits.
    struct FakeSelection {
        artifacts: Vec<ResolvedArtifact>,
        failure_messages: Vec<String>,
        visits: AtomicUsize,
    }

    impl FakeSelection {
        fn new(artifacts: Vec<ResolvedArtifact>, failure_messages: Vec<&str>) -> Self {
            Self {
                artifacts,
                failure_messages: failure_messages.into_iter().map(String::from).collect(),
                visits: AtomicUsize::new(0),
            }
        }
    }

    impl SelectedArtifacts for FakeSelection {
        fn visit(&self, visitor: &mut dyn ArtifactVisitor, _lenient: bool) {
            self.visits.fetch_add(1, Ordering::SeqCst);
            for artifact in &self.artifacts {
                visitor.visit_artifact(artifact.clone());
            }
            for message in &self.failure_messages {
                visitor.visit_failure(anyhow!("{message}"));
            }
        }
    }

    fn artifact(name: &str) -> ResolvedArtifact {
        ResolvedArtifact::new(
            ComponentIdentifier::new("project :engine"),
            ArtifactName::new(name, "archive").with_extension("zip"),
            format!("/cache/{name}.zip"),
        )
    }

    fn collection(
        artifacts: Vec<ResolvedArtifact>,
        failures: Vec<&str>,
        lenient: bool,
    ) -> (Arc<FakeSelection>, ArtifactCollection) {
        let selection = Arc::new(FakeSelection::new(artifacts, failures));
        let collection = ArtifactCollection::new(
            Arc::clone(&selection) as Arc<dyn SelectedArtifacts>,
            Arc::new(SimpleResolutionHost::new("configuration ':compile'")),
            lenient,
        );
        (selection, collection)
    }

    #[test]
    fn test_lenient_mode_exposes_successes_and_failures() {
        let (_, collection) = collection(
            vec![artifact("app"), artifact("lib")],
            vec!["server unreachable"],
            true,
        );

        let artifacts = collection.artifacts().unwrap();
        assert_eq!(artifacts.len(), 2);
        let failures = collection.failures().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].to_string(), "server unreachable");
    }

    #[test]
    fn test_strict_mode_raises_aggregate_and_hides_successes() {
        let (_, collection) = collection(
            vec![artifact("app"), artifact("lib")],
            vec!["server unreachable"],
            false,
        );

        let failure = collection.artifacts().unwrap_err();
        assert!(failure.to_string().contains("configuration ':compile'"));
        assert!(failure.to_string().contains("server unreachable"));
        // Every accessor observes the same captured failure.
        assert!(collection.failures().is_err());
        assert!(collection.iter().is_err());
    }

    #[test]
    fn test_strict_mode_without_failures_succeeds() {
        let (_, collection) = collection(vec![artifact("app")], vec![], false);
        assert_eq!(collection.artifacts().unwrap().len(), 1);
        assert!(collection.failures().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_artifacts_are_coalesced() {
        let (_, collection) =
            collection(vec![artifact("app"), artifact("app"), artifact("lib")], vec![], true);
        let names: Vec<_> = collection
            .iter()
            .unwrap()
            .map(|resolved| resolved.name.name().to_string())
            .collect();
        assert_eq!(names, ["app", "lib"]);
    }

    #[test]
    fn test_selection_visited_once_across_reads() {
        let (selection, collection) = collection(vec![artifact("app")], vec!["broken"], true);

        collection.ensure_resolved().unwrap();
        let _ = collection.artifacts().unwrap();
        let _ = collection.failures().unwrap();
        let _ = collection.iter().unwrap();
        assert_eq!(selection.visits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_raw_visit_bypasses_the_cache() {
        let (selection, collection) = collection(vec![artifact("app")], vec![], true);
        collection.ensure_resolved().unwrap();

        #[derive(Default)]
        struct Counting {
            artifacts: usize,
        }
        impl ArtifactVisitor for Counting {
            fn visit_artifact(&mut self, _artifact: ResolvedArtifact) {
                self.artifacts += 1;
            }
            fn visit_failure(&mut self, _failure: anyhow::Error) {}
        }

        let mut visitor = Counting::default();
        collection.visit(&mut visitor);
        assert_eq!(visitor.artifacts, 1);
        // The cached pass plus the raw replay.
        assert_eq!(selection.visits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_reads_resolve_once() {
        let (selection, collection) = collection(vec![artifact("app")], vec![], true);
        let collection = Arc::new(collection);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let collection = Arc::clone(&collection);
                scope.spawn(move || {
                    assert_eq!(collection.artifacts().unwrap().len(), 1);
                });
            }
        });
        assert_eq!(selection.visits.load(Ordering::SeqCst), 1);
    }
}
