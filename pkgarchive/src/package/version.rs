//! Package version numbers.
//!
//! Archive versions are plain sequences of non-negative integers such as
//! `1.2` or `20240105.1`. They are not semantic versions: any number of
//! components is allowed and a shorter version compares as if it were padded
//! with zeros, so `1.0` and `1` are the same version.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing or constructing a [`Version`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The version has no components.
    #[error("version must have at least one component")]
    Empty,

    /// A component is not a non-negative integer.
    #[error("invalid version component '{component}' in '{input}'")]
    InvalidComponent { input: String, component: String },
}

/// A package version: a non-empty list of integer components.
///
/// Equality, ordering and hashing ignore trailing zero components while
/// [`Version::components`] preserves the components exactly as given, so
/// that a version written to a snapshot reads back unchanged.
///
/// # Example
///
/// ```
/// use pkgarchive::package::Version;
///
/// let a: Version = "1.2".parse().unwrap();
/// let b: Version = "1.2.0".parse().unwrap();
/// let c: Version = "1.10".parse().unwrap();
///
/// assert_eq!(a, b);
/// assert!(c > a);
/// assert_eq!(b.to_string(), "1.2.0");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct Version {
    components: Vec<u64>,
}

impl Version {
    /// Create a version from its components.
    pub fn new(components: Vec<u64>) -> Result<Self, VersionError> {
        if components.is_empty() {
            return Err(VersionError::Empty);
        }
        Ok(Self { components })
    }

    /// Create a version from a non-empty slice.
    ///
    /// # Panics
    ///
    /// Panics if `components` is empty. Intended for literals in tests and
    /// examples.
    pub fn from_slice(components: &[u64]) -> Self {
        assert!(!components.is_empty(), "version must not be empty");
        Self {
            components: components.to_vec(),
        }
    }

    /// The components as written.
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Components with trailing zeros removed; the basis for comparisons.
    fn significant(&self) -> &[u64] {
        let len = self
            .components
            .iter()
            .rposition(|&c| c != 0)
            .map_or(0, |i| i + 1);
        &self.components[..len]
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let components = trimmed
            .split('.')
            .map(|part| {
                part.parse::<u64>()
                    .map_err(|_| VersionError::InvalidComponent {
                        input: trimmed.to_string(),
                        component: part.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(components)
    }
}

impl TryFrom<Vec<u64>> for Version {
    type Error = VersionError;

    fn try_from(components: Vec<u64>) -> Result<Self, Self::Error> {
        Self::new(components)
    }
}

impl From<Version> for Vec<u64> {
    fn from(version: Version) -> Self {
        version.components
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // Slice ordering treats a strict prefix as smaller, which matches
        // zero padding once trailing zeros are gone.
        self.significant().cmp(other.significant())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_simple() {
        assert_eq!(v("1.2.3").components(), &[1, 2, 3]);
        assert_eq!(v("20240105").components(), &[20240105]);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(v("  0.3 ").components(), &[0, 3]);
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!("".parse::<Version>(), Err(VersionError::Empty));
        assert_eq!("   ".parse::<Version>(), Err(VersionError::Empty));
    }

    #[test]
    fn test_parse_rejects_bad_components() {
        assert!(matches!(
            "1..2".parse::<Version>(),
            Err(VersionError::InvalidComponent { .. })
        ));
        assert!(matches!(
            "1.2-beta".parse::<Version>(),
            Err(VersionError::InvalidComponent { .. })
        ));
        assert!(matches!(
            "-1".parse::<Version>(),
            Err(VersionError::InvalidComponent { .. })
        ));
    }

    #[test]
    fn test_new_rejects_empty() {
        assert_eq!(Version::new(vec![]), Err(VersionError::Empty));
    }

    #[test]
    fn test_zero_padding_equality() {
        assert_eq!(v("1"), v("1.0"));
        assert_eq!(v("1.0.0"), v("1"));
        assert_eq!(v("0"), v("0.0"));
    }

    #[test]
    fn test_ordering() {
        assert!(v("1.2") > v("1.1"));
        assert!(v("1.10") > v("1.9"));
        assert!(v("1.0.1") > v("1"));
        assert!(v("2") > v("1.99.99"));
        assert!(v("0.1") < v("1"));
    }

    #[test]
    fn test_display_preserves_components() {
        assert_eq!(v("1.0.0").to_string(), "1.0.0");
        assert_eq!(v("7").to_string(), "7");
    }

    #[test]
    fn test_hash_consistent_with_eq() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(v("1.0"));
        assert!(set.contains(&v("1")));
    }

    #[test]
    fn test_serde_as_list() {
        let json = serde_json::to_string(&v("1.2")).unwrap();
        assert_eq!(json, "[1,2]");

        let back: Version = serde_json::from_str("[3,0,1]").unwrap();
        assert_eq!(back.components(), &[3, 0, 1]);

        assert!(serde_json::from_str::<Version>("[]").is_err());
    }

    proptest! {
        /// Appending zeros never changes a version's position in the order
        #[test]
        fn prop_trailing_zeros_are_insignificant(
            components in prop::collection::vec(0u64..50, 1..5),
            zeros in 0usize..3
        ) {
            let base = Version::new(components.clone()).unwrap();
            let mut padded = components;
            padded.extend(std::iter::repeat(0).take(zeros));
            let padded = Version::new(padded).unwrap();

            prop_assert_eq!(base.cmp(&padded), Ordering::Equal);
        }

        /// Ordering is antisymmetric
        #[test]
        fn prop_ordering_antisymmetric(
            a in prop::collection::vec(0u64..10, 1..4),
            b in prop::collection::vec(0u64..10, 1..4)
        ) {
            let a = Version::new(a).unwrap();
            let b = Version::new(b).unwrap();
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        }
    }
}
