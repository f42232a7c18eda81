//! Building an index from scan candidates.

use rayon::prelude::*;

use super::{ArchiveIndex, MergeStats};
use crate::extract::{ExtractionError, MetadataExtractor};
use crate::scanner::Candidate;

/// Outcome counters for [`build_index`].
#[derive(Debug, Default)]
pub struct BuildStats {
    /// Merge counters for successfully extracted candidates.
    pub merge: MergeStats,

    /// Candidates dropped because extraction failed.
    pub failures: Vec<ExtractionError>,
}

impl BuildStats {
    /// Number of candidates processed.
    pub fn candidates(&self) -> usize {
        self.merge.total() + self.failures.len()
    }
}

/// Extract every candidate and merge the results into `index`.
///
/// Extraction runs in parallel; merging is sequential and follows candidate
/// order, so equal-version ties resolve the same way on every run. Failed
/// candidates are logged and skipped.
pub fn merge_candidates(
    index: &mut ArchiveIndex,
    candidates: &[Candidate],
    extractor: &dyn MetadataExtractor,
) -> BuildStats {
    let results: Vec<_> = candidates
        .par_iter()
        .map(|candidate| extractor.extract(candidate))
        .collect();

    let mut stats = BuildStats::default();
    for result in results {
        match result {
            Ok(descriptor) => {
                let outcome = index.merge(descriptor);
                stats.merge.record(&outcome);
            }
            Err(e) => {
                tracing::warn!(path = %e.path().display(), error = %e, "Skipping package");
                stats.failures.push(e);
            }
        }
    }
    stats
}

/// Build a fresh index from scan candidates.
pub fn build_index(
    candidates: &[Candidate],
    extractor: &dyn MetadataExtractor,
) -> (ArchiveIndex, BuildStats) {
    let mut index = ArchiveIndex::new();
    let stats = merge_candidates(&mut index, candidates, extractor);
    tracing::info!(
        packages = index.len(),
        candidates = stats.candidates(),
        failed = stats.failures.len(),
        "Archive index built"
    );
    (index, stats)
}
