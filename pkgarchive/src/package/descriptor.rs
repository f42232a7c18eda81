//! Package descriptor types.
//!
//! A [`PackageDescriptor`] is the metadata extracted from one package file:
//! the identity (name and version), its requirements, a one-line summary and
//! the [`PackageKind`] telling clients how to install it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::version::Version;

/// How a package is distributed.
///
/// The kind is decided once, from the file extension, before any metadata
/// is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// A single source file.
    Single,
    /// A tar archive containing a package directory.
    #[serde(rename = "tar")]
    Archive,
}

impl PackageKind {
    /// All kinds, in extension lookup order.
    pub const ALL: [PackageKind; 2] = [PackageKind::Single, PackageKind::Archive];

    /// The symbol used for this kind in archive contents.
    ///
    /// # Example
    ///
    /// ```
    /// use pkgarchive::package::PackageKind;
    ///
    /// assert_eq!(PackageKind::Single.wire_name(), "single");
    /// assert_eq!(PackageKind::Archive.wire_name(), "tar");
    /// ```
    pub fn wire_name(&self) -> &'static str {
        match self {
            PackageKind::Single => "single",
            PackageKind::Archive => "tar",
        }
    }

    /// Parse a kind from its archive contents symbol.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "single" => Some(PackageKind::Single),
            "tar" => Some(PackageKind::Archive),
            _ => None,
        }
    }

    /// File extension (without the dot) of packages of this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            PackageKind::Single => "el",
            PackageKind::Archive => "tar",
        }
    }

    /// Detect the kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.extension() == ext)
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for PackageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire_name(s).ok_or_else(|| format!("unknown package kind '{}'", s))
    }
}

/// A dependency on another package at a minimum version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    /// Name of the required package.
    pub name: String,

    /// Minimum acceptable version.
    pub version: Version,
}

impl Requirement {
    /// Create a new requirement.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} >= {}", self.name, self.version)
    }
}

/// Metadata for one package file.
///
/// # Example
///
/// ```
/// use pkgarchive::package::{PackageDescriptor, PackageKind, Requirement, Version};
///
/// let desc = PackageDescriptor::new("foo", Version::from_slice(&[1, 2]), PackageKind::Single)
///     .with_summary("Foo mode")
///     .with_requirement(Requirement::new("bar", Version::from_slice(&[0, 3])));
///
/// assert_eq!(desc.to_string(), "foo 1.2 (single)");
/// assert_eq!(desc.requirements.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Unique package name.
    pub name: String,

    /// Package version.
    pub version: Version,

    /// Requirements in declaration order.
    pub requirements: Vec<Requirement>,

    /// One-line description.
    pub summary: String,

    /// Distribution kind.
    pub kind: PackageKind,
}

impl PackageDescriptor {
    /// Create a descriptor with no requirements and an empty summary.
    pub fn new(name: impl Into<String>, version: Version, kind: PackageKind) -> Self {
        Self {
            name: name.into(),
            version,
            requirements: Vec::new(),
            summary: String::new(),
            kind,
        }
    }

    /// Set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Append a requirement.
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Replace the requirement list.
    pub fn with_requirements(mut self, requirements: Vec<Requirement>) -> Self {
        self.requirements = requirements;
        self
    }
}

impl fmt::Display for PackageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.name, self.version, self.kind)
    }
}
