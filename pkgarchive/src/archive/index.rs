//! The in-memory archive index.
//!
//! [`ArchiveIndex`] maps each package name to the best descriptor known for
//! it. Scan results are folded in with [`ArchiveIndex::merge`], which only
//! ever moves a name to a strictly greater version. Authoritative publishes
//! use [`ArchiveIndex::upsert`] instead and may move a name downward.

use std::collections::btree_map::{self, BTreeMap};

use crate::package::PackageDescriptor;

/// What [`ArchiveIndex::merge`] did with a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No entry existed for the name.
    Inserted,
    /// The descriptor's version was strictly greater and replaced the entry.
    Replaced { previous: PackageDescriptor },
    /// The stored version was equal or greater; the descriptor was dropped.
    Kept,
}

impl MergeOutcome {
    /// Whether the index changed.
    pub fn changed(&self) -> bool {
        !matches!(self, MergeOutcome::Kept)
    }
}

/// Counters for a batch merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Names seen for the first time.
    pub inserted: usize,
    /// Entries replaced by a greater version.
    pub replaced: usize,
    /// Descriptors discarded as equal or older.
    pub kept: usize,
}

impl MergeStats {
    pub(crate) fn record(&mut self, outcome: &MergeOutcome) {
        match outcome {
            MergeOutcome::Inserted => self.inserted += 1,
            MergeOutcome::Replaced { .. } => self.replaced += 1,
            MergeOutcome::Kept => self.kept += 1,
        }
    }

    /// Total descriptors processed.
    pub fn total(&self) -> usize {
        self.inserted + self.replaced + self.kept
    }
}

/// Name-deduplicated mapping of package name to descriptor.
///
/// Entries iterate in byte-wise name order, which is also the order they are
/// written to a snapshot.
///
/// # Example
///
/// ```
/// use pkgarchive::archive::{ArchiveIndex, MergeOutcome};
/// use pkgarchive::package::{PackageDescriptor, PackageKind, Version};
///
/// let mut index = ArchiveIndex::new();
/// let old = PackageDescriptor::new("foo", Version::from_slice(&[1, 0]), PackageKind::Single);
/// let new = PackageDescriptor::new("foo", Version::from_slice(&[1, 2]), PackageKind::Single);
///
/// assert_eq!(index.merge(new.clone()), MergeOutcome::Inserted);
/// assert_eq!(index.merge(old), MergeOutcome::Kept);
/// assert_eq!(index.get("foo"), Some(&new));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveIndex {
    entries: BTreeMap<String, PackageDescriptor>,
}

impl ArchiveIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a scan-sourced descriptor into the index.
    ///
    /// The entry is replaced only when the new version is strictly greater.
    /// With equal versions the descriptor already stored wins, so the result
    /// for ties depends on the order descriptors arrive in.
    pub fn merge(&mut self, descriptor: PackageDescriptor) -> MergeOutcome {
        match self.entries.entry(descriptor.name.clone()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(descriptor);
                MergeOutcome::Inserted
            }
            btree_map::Entry::Occupied(mut slot) => {
                if descriptor.version > slot.get().version {
                    let previous = slot.insert(descriptor);
                    MergeOutcome::Replaced { previous }
                } else {
                    MergeOutcome::Kept
                }
            }
        }
    }

    /// Merge every descriptor in order.
    pub fn merge_all<I>(&mut self, descriptors: I) -> MergeStats
    where
        I: IntoIterator<Item = PackageDescriptor>,
    {
        let mut stats = MergeStats::default();
        for descriptor in descriptors {
            let outcome = self.merge(descriptor);
            stats.record(&outcome);
        }
        stats
    }

    /// Insert or overwrite the entry for the descriptor's name regardless of
    /// version. Returns the previous entry.
    pub fn upsert(&mut self, descriptor: PackageDescriptor) -> Option<PackageDescriptor> {
        self.entries.insert(descriptor.name.clone(), descriptor)
    }

    /// Remove the entry for `name`.
    pub fn remove(&mut self, name: &str) -> Option<PackageDescriptor> {
        self.entries.remove(name)
    }

    /// Look up the entry for `name`.
    pub fn get(&self, name: &str) -> Option<&PackageDescriptor> {
        self.entries.get(name)
    }

    /// Check whether `name` has an entry.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate descriptors in name order.
    pub fn iter(&self) -> impl Iterator<Item = &PackageDescriptor> {
        self.entries.values()
    }

    /// Iterate names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<PackageDescriptor> for ArchiveIndex {
    fn from_iter<I: IntoIterator<Item = PackageDescriptor>>(iter: I) -> Self {
        let mut index = ArchiveIndex::new();
        index.merge_all(iter);
        index
    }
}

impl<'a> IntoIterator for &'a ArchiveIndex {
    type Item = &'a PackageDescriptor;
    type IntoIter = btree_map::Values<'a, String, PackageDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{PackageKind, Version};
    use proptest::prelude::*;

    fn desc(name: &str, version: &[u64]) -> PackageDescriptor {
        PackageDescriptor::new(name, Version::from_slice(version), PackageKind::Single)
    }

    #[test]
    fn test_merge_inserts_new_name() {
        let mut index = ArchiveIndex::new();
        assert_eq!(index.merge(desc("foo", &[1])), MergeOutcome::Inserted);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_merge_replaces_greater() {
        let mut index = ArchiveIndex::new();
        index.merge(desc("foo", &[1, 0]));

        let outcome = index.merge(desc("foo", &[1, 2]));
        assert_eq!(
            outcome,
            MergeOutcome::Replaced {
                previous: desc("foo", &[1, 0])
            }
        );
        assert_eq!(index.get("foo").unwrap().version, Version::from_slice(&[1, 2]));
    }

    #[test]
    fn test_merge_discards_lesser() {
        let mut index = ArchiveIndex::new();
        index.merge(desc("foo", &[2]));

        assert_eq!(index.merge(desc("foo", &[1, 9])), MergeOutcome::Kept);
        assert_eq!(index.get("foo").unwrap().version, Version::from_slice(&[2]));
    }

    #[test]
    fn test_merge_tie_keeps_first_seen() {
        let mut index = ArchiveIndex::new();
        let first = desc("foo", &[1, 0]).with_summary("first");
        let second = desc("foo", &[1]).with_summary("second");

        index.merge(first.clone());
        assert_eq!(index.merge(second), MergeOutcome::Kept);
        assert_eq!(index.get("foo"), Some(&first));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let d = desc("foo", &[1, 2]).with_summary("x");

        let mut once = ArchiveIndex::new();
        once.merge(d.clone());

        let mut twice = ArchiveIndex::new();
        twice.merge(d.clone());
        assert!(!twice.merge(d).changed());

        assert_eq!(once, twice);
    }

    #[test]
    fn test_upsert_overrides_downward() {
        let mut index = ArchiveIndex::new();
        index.merge(desc("foo", &[1, 2]));

        let previous = index.upsert(desc("foo", &[1, 1]));
        assert_eq!(previous.unwrap().version, Version::from_slice(&[1, 2]));
        assert_eq!(index.get("foo").unwrap().version, Version::from_slice(&[1, 1]));
    }

    #[test]
    fn test_remove() {
        let mut index: ArchiveIndex = vec![desc("a", &[1]), desc("b", &[1])]
            .into_iter()
            .collect();

        assert!(index.remove("a").is_some());
        assert!(index.remove("a").is_none());
        assert!(!index.contains("a"));
        assert!(index.contains("b"));
    }

    #[test]
    fn test_iteration_is_name_ordered() {
        let index: ArchiveIndex = vec![desc("zeta", &[1]), desc("alpha", &[1]), desc("mid", &[1])]
            .into_iter()
            .collect();

        let names: Vec<&str> = index.names().collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_merge_all_stats() {
        let mut index = ArchiveIndex::new();
        let stats = index.merge_all(vec![
            desc("a", &[1]),
            desc("a", &[2]),
            desc("a", &[1, 5]),
            desc("b", &[1]),
        ]);

        assert_eq!(stats.inserted, 2);
        assert_eq!(stats.replaced, 1);
        assert_eq!(stats.kept, 1);
        assert_eq!(stats.total(), 4);
    }

    #[test]
    fn test_empty_index() {
        let index = ArchiveIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.iter().count(), 0);
    }

    fn versions_strategy() -> impl Strategy<Value = Vec<Vec<u64>>> {
        prop::collection::vec(prop::collection::vec(0u64..6, 1..4), 1..12)
    }

    proptest! {
        /// The stored version is the maximum regardless of input order
        #[test]
        fn prop_merge_keeps_maximum(
            versions in versions_strategy(),
            seed in any::<u64>()
        ) {
            let descriptors: Vec<_> = versions.iter().map(|v| desc("foo", v)).collect();
            let max = descriptors.iter().map(|d| d.version.clone()).max().unwrap();

            let mut shuffled = descriptors.clone();
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
            shuffled.reverse();

            let forward: ArchiveIndex = descriptors.into_iter().collect();
            let other: ArchiveIndex = shuffled.into_iter().collect();

            prop_assert_eq!(&forward.get("foo").unwrap().version, &max);
            prop_assert_eq!(&other.get("foo").unwrap().version, &max);
        }

        /// Merging a batch a second time never changes the index
        #[test]
        fn prop_merge_batch_idempotent(versions in versions_strategy()) {
            let descriptors: Vec<_> = versions
                .iter()
                .enumerate()
                .map(|(i, v)| desc(&format!("pkg{}", i % 3), v))
                .collect();

            let mut index = ArchiveIndex::new();
            index.merge_all(descriptors.clone());
            let snapshot = index.clone();

            let stats = index.merge_all(descriptors);
            prop_assert_eq!(stats.inserted + stats.replaced, 0);
            prop_assert_eq!(index, snapshot);
        }
    }
}
