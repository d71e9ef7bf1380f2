//! Artifact declarations and their realized, component-bound form.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::metadata::ids::{ArtifactName, ComponentIdentifier};

/// A raw artifact declaration, as appended during population.
///
/// Declarations are not yet bound to a component; realization converts each
/// into a [`ComponentArtifact`] owned by the declaring component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclaredArtifact {
    name: ArtifactName,
    file: Option<PathBuf>,
}

impl DeclaredArtifact {
    /// Declares an artifact with the given structural name.
    pub fn new(name: ArtifactName) -> Self {
        Self {
            name,
            file: None,
        }
    }

    /// Sets the file this declaration will produce.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// The structural name.
    pub fn name(&self) -> &ArtifactName {
        &self.name
    }

    /// The declared file location, if known at declaration time.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

/// An immutable artifact record bound to its owning component.
///
/// Produced by realizing a configuration's or variant's declared artifacts,
/// or as a *missing* sentinel when a lookup by name finds no match: the
/// sentinel carries the requested name and owning id, and the absence only
/// surfaces when something later consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentArtifact {
    component_id: ComponentIdentifier,
    name: ArtifactName,
    file: Option<PathBuf>,
    missing: bool,
}

impl ComponentArtifact {
    /// Binds a declaration to its owning component.
    pub fn from_declaration(component_id: ComponentIdentifier, declared: &DeclaredArtifact) -> Self {
        Self {
            component_id,
            name: declared.name.clone(),
            file: declared.file.clone(),
            missing: false,
        }
    }

    /// Creates the sentinel for a requested-but-absent artifact.
    pub fn missing(component_id: ComponentIdentifier, name: ArtifactName) -> Self {
        Self {
            component_id,
            name,
            file: None,
            missing: true,
        }
    }

    /// The owning component.
    pub fn component_id(&self) -> &ComponentIdentifier {
        &self.component_id
    }

    /// The structural name.
    pub fn name(&self) -> &ArtifactName {
        &self.name
    }

    /// The file backing this artifact, if any.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Returns a copy of this artifact backed by `file`.
    #[must_use]
    pub fn with_file(&self, file: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(file.into()),
            ..self.clone()
        }
    }

    /// Whether this record is the sentinel for an absent artifact.
    pub fn is_missing(&self) -> bool {
        self.missing
    }
}

impl fmt::Display for ComponentArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.missing {
            write!(f, "{} (missing) of {}", self.name, self.component_id)
        } else {
            write!(f, "{} of {}", self.name, self.component_id)
        }
    }
}
