//! Attributes, capabilities and the external attribute schema handle.
//!
//! Attributes describe what a configuration or variant *is* (its category,
//! usage, target environment); the external resolution engine matches them
//! against a consumer's requested attributes. This crate never evaluates
//! compatibility - it only stores attribute sets and reads the single
//! well-known [`category`] entry that triggers the enforced-platform
//! dependency wrapping rule.

use std::fmt;

/// Well-known attribute names and values consulted by this crate.
pub mod category {
    /// The attribute naming a configuration's category.
    pub const ATTRIBUTE: &str = "category";
    /// Category of a regular library configuration.
    pub const LIBRARY: &str = "library";
    /// Category of a platform (dependency-constraint) configuration.
    pub const PLATFORM: &str = "platform";
    /// Category of a platform whose constraints are forced on consumers.
    pub const ENFORCED_PLATFORM: &str = "enforced-platform";
}

/// An insertion-ordered set of string attributes.
///
/// Writing an existing key replaces its value in place, preserving the
/// original position. Lookup is linear; attribute sets are tiny.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Creates an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing any existing entry.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Looks up the value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the set holds no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of attributes in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Whether the category attribute marks an enforced platform.
    pub fn is_enforced_platform(&self) -> bool {
        self.get(category::ATTRIBUTE) == Some(category::ENFORCED_PLATFORM)
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, (name, value)) in self.entries.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, String)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            attributes.set(name, value);
        }
        attributes
    }
}

/// A capability a configuration or variant provides to consumers.
///
/// Capabilities disambiguate variants that would otherwise satisfy the same
/// request; their semantics live entirely in the external resolution engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capability {
    group: String,
    name: String,
    version: String,
}

impl Capability {
    /// Creates a capability from group, name and version.
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

    /// The capability group.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The capability name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The capability version.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// Opaque handle to the attribute-compatibility schema owned by the
/// resolution engine.
///
/// The component carries the schema so graph-level matching can retrieve it;
/// nothing in this crate calls into it.
pub trait AttributesSchema: fmt::Debug + Send + Sync {}

/// A schema with no compatibility or disambiguation rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySchema;

impl AttributesSchema for EmptySchema {}
