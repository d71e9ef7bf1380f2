//! Identity types for components, modules, variants and artifacts.
//!
//! All identifiers are small immutable value types: cheap to clone, usable
//! as map keys, and rendered through [`Display`](std::fmt::Display) for
//! diagnostics.

use std::fmt;

/// Opaque identity of a component instance.
///
/// Carries only a display name; the resolution engine that owns the graph
/// decides what the name encodes (a project path, a module coordinate, a
/// synthetic id for a derived view).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentIdentifier {
    display_name: String,
}

impl ComponentIdentifier {
    /// Creates an identifier with the given display name.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }

    /// The human-readable name of the component.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl fmt::Display for ComponentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// `group:name:version` coordinates of the module a component publishes as.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleVersionIdentifier {
    group: String,
    name: String,
    version: String,
}

impl ModuleVersionIdentifier {
    /// Creates coordinates from group, name and version.
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// The module group.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module version.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for ModuleVersionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// Opaque identity of a variant, assigned by whoever registers it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantIdentifier(String);

impl VariantIdentifier {
    /// Creates a variant identifier from an opaque key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The opaque key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structural name of an artifact: base name, kind, extension and classifier.
///
/// Two artifacts match when all four parts are equal; this is the key used by
/// [`ConfigurationMetadata::artifact`](crate::metadata::ConfigurationMetadata::artifact)
/// lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactName {
    name: String,
    kind: String,
    extension: Option<String>,
    classifier: Option<String>,
}

impl ArtifactName {
    /// Creates a name with the given base name and kind, no extension or
    /// classifier.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            extension: None,
            classifier: None,
        }
    }

    /// Sets the file extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Sets the classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    /// The base name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The artifact kind (for example `archive` or `sources`).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The file extension, if any.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// The classifier, if any.
    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(classifier) = &self.classifier {
            write!(f, "-{classifier}")?;
        }
        if let Some(extension) = &self.extension {
            write!(f, ".{extension}")?;
        }
        write!(f, " ({})", self.kind)
    }
}
