//! Error handling for the metadata core.
//!
//! The error system is split along the two ways a failure can reach a caller:
//!
//! 1. **Typed population errors** ([`MetadataError`]) - returned while a
//!    component is being built (duplicate configuration names, broken
//!    hierarchy invariants, lookups of unregistered configurations). These
//!    are ordinary `Result` values and are never cached.
//! 2. **Captured realization failures** ([`SharedFailure`]) - produced when a
//!    lazy computation fails. The memoization layer stores the failure once
//!    and re-raises a clone of it to every current and future caller, so the
//!    wrapper must be cheaply clonable while preserving the full error chain.
//!
//! Strict-mode artifact collection additionally combines every underlying
//! failure into a single [`AggregateFailure`] so callers see one error for
//! the whole resolution rather than a list.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Typed errors raised while populating or querying a component.
///
/// These cover the single-writer population phase; failures during lazy
/// realization travel as [`SharedFailure`] instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MetadataError {
    /// A configuration with the same name is already registered.
    #[error("configuration '{name}' is already registered on {component}")]
    DuplicateConfiguration {
        /// The conflicting configuration name.
        name: String,
        /// Display name of the owning component.
        component: String,
    },

    /// A configuration's hierarchy set does not include the configuration itself.
    #[error("hierarchy of configuration '{name}' must contain the configuration itself")]
    HierarchyMissingSelf {
        /// The offending configuration name.
        name: String,
    },

    /// A direct parent is not part of the declared hierarchy.
    #[error("configuration '{name}' extends '{parent}' which is missing from its hierarchy")]
    ParentOutsideHierarchy {
        /// The offending configuration name.
        name: String,
        /// The parent name absent from the hierarchy set.
        parent: String,
    },

    /// A configuration name was looked up but never registered.
    #[error("configuration '{name}' is not registered on {component}")]
    UnknownConfiguration {
        /// The requested configuration name.
        name: String,
        /// Display name of the owning component.
        component: String,
    },
}

/// A realization failure captured by a memoization cell.
///
/// Wraps the original [`anyhow::Error`] in an [`Arc`] so the same failure can
/// be handed to every caller of [`LazyValue`](crate::lazy::LazyValue) -
/// concurrent or later - without re-running the computation. Cloning is
/// cheap and the full error chain is preserved through [`source`].
///
/// [`source`]: std::error::Error::source
#[derive(Clone)]
pub struct SharedFailure {
    inner: Arc<anyhow::Error>,
}

impl SharedFailure {
    /// Captures an error for shared re-raising.
    pub fn new(error: anyhow::Error) -> Self {
        Self {
            inner: Arc::new(error),
        }
    }

    /// The originally captured error.
    pub fn error(&self) -> &anyhow::Error {
        &self.inner
    }
}

impl fmt::Display for SharedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl fmt::Debug for SharedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl std::error::Error for SharedFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source: &(dyn std::error::Error + 'static) = (*self.inner).as_ref();
        Some(source)
    }
}

/// A single error combining every failure of a strict-mode resolution.
///
/// Built by a [`ResolutionHost`](crate::collection::ResolutionHost) when a
/// non-lenient artifact collection encounters failures: the individual
/// failures are not separately retriable, so they are reported as one.
#[derive(Debug)]
pub struct AggregateFailure {
    description: String,
    failures: Vec<SharedFailure>,
}

impl AggregateFailure {
    /// Combines `failures` into one error describing `description`.
    pub fn new(description: impl Into<String>, failures: Vec<SharedFailure>) -> Self {
        Self {
            description: description.into(),
            failures,
        }
    }

    /// The individual failures folded into this error.
    pub fn failures(&self) -> &[SharedFailure] {
        &self.failures
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.len() == 1 {
            write!(f, "could not resolve {}: {}", self.description, self.failures[0])
        } else {
            write!(
                f,
                "could not resolve {} ({} failures)",
                self.description,
                self.failures.len()
            )?;
            for failure in &self.failures {
                write!(f, "\n  - {failure}")?;
            }
            Ok(())
        }
    }
}

impl std::error::Error for AggregateFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures.first().map(|f| f as &(dyn std::error::Error + 'static))
    }
}
