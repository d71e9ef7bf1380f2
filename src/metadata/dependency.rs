//! Raw dependency, exclude and file-dependency declarations.
//!
//! These are the records appended to a configuration during population and
//! concatenated by the hierarchy walk. They are plain immutable values; the
//! external graph resolver interprets them.

use std::fmt;
use std::path::PathBuf;

/// `group:name` coordinates plus a version requirement for a declared
/// dependency target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleSelector {
    group: String,
    name: String,
    version: String,
}

impl ModuleSelector {
    /// Creates a selector from group, name and a version requirement.
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

    /// The target group.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The target name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The requested version.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for ModuleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// A single declared dependency of a configuration.
///
/// The `force` flag is what the enforced-platform wrapping rule flips: a
/// forced dependency overrides version conflict resolution in the external
/// engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyMetadata {
    selector: ModuleSelector,
    requested_configuration: Option<String>,
    transitive: bool,
    force: bool,
}

impl DependencyMetadata {
    /// Creates a transitive, non-forced dependency on `selector`.
    pub fn new(selector: ModuleSelector) -> Self {
        Self {
            selector,
            requested_configuration: None,
            transitive: true,
            force: false,
        }
    }

    /// Requests a specific configuration of the target.
    #[must_use]
    pub fn with_requested_configuration(mut self, configuration: impl Into<String>) -> Self {
        self.requested_configuration = Some(configuration.into());
        self
    }

    /// Marks the dependency non-transitive.
    #[must_use]
    pub fn non_transitive(mut self) -> Self {
        self.transitive = false;
        self
    }

    /// Returns a copy of this dependency with the force flag set.
    #[must_use]
    pub fn forced(&self) -> Self {
        Self {
            force: true,
            ..self.clone()
        }
    }

    /// The dependency target.
    pub fn selector(&self) -> &ModuleSelector {
        &self.selector
    }

    /// The requested target configuration, if any.
    pub fn requested_configuration(&self) -> Option<&str> {
        self.requested_configuration.as_deref()
    }

    /// Whether transitive dependencies of the target are included.
    pub fn is_transitive(&self) -> bool {
        self.transitive
    }

    /// Whether the requested version overrides conflict resolution.
    pub fn is_force(&self) -> bool {
        self.force
    }
}

impl fmt::Display for DependencyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector)?;
        if self.force {
            write!(f, " (forced)")?;
        }
        Ok(())
    }
}

/// A declared exclusion: transitive dependencies matching `group:module` are
/// dropped from the resolution result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExcludeMetadata {
    group: String,
    module: String,
}

impl ExcludeMetadata {
    /// Creates an exclusion for `group:module`.
    pub fn new(group: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            module: module.into(),
        }
    }

    /// The excluded group.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The excluded module name.
    pub fn module(&self) -> &str {
        &self.module
    }
}

impl fmt::Display for ExcludeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.module)
    }
}

/// A declared dependency on local files, outside the module namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileDependencyMetadata {
    files: Vec<PathBuf>,
}

impl FileDependencyMetadata {
    /// Creates a file dependency over the given paths.
    pub fn new(files: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            files: files.into_iter().collect(),
        }
    }

    /// The declared file paths.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl fmt::Display for FileDependencyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "files [")?;
        for (index, file) in self.files.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", file.display())?;
        }
        write!(f, "]")
    }
}
