//! Snapshot identifiers.
//!
//! A [`SnapshotId`] is a UTC timestamp with nanosecond resolution written as
//! 23 zero-padded digits (`YYYYMMDDhhmmss` followed by nine fractional
//! digits). Because the width is fixed, lexicographic order of file names is
//! the same as chronological order.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Timelike, Utc};

/// File name prefix shared by every snapshot.
pub const SNAPSHOT_PREFIX: &str = "archive-contents.";

/// Number of digits in a snapshot id.
pub const SNAPSHOT_ID_WIDTH: usize = 23;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

const MAX_ID: u128 = 99_999_999_999_999_999_999_999;

/// Identifier of one snapshot in the timeline.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use pkgarchive::snapshot::SnapshotId;
///
/// let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 5).unwrap();
/// let id = SnapshotId::from_datetime(at);
///
/// assert_eq!(id.to_string(), "20261019083005000000000");
/// assert_eq!(id.file_name(), "archive-contents.20261019083005000000000");
/// assert!(id.next().unwrap() > id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotId(u128);

impl SnapshotId {
    /// The largest id that fits in [`SNAPSHOT_ID_WIDTH`] digits.
    pub const MAX: SnapshotId = SnapshotId(MAX_ID);

    /// Build an id from a timestamp.
    ///
    /// Years before 0 clamp to 0 and years after 9999 to [`SnapshotId::MAX`];
    /// leap-second nanoseconds clamp to the end of the second.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let year = at.year().max(0) as u128;
        let date = (year * 100 + at.month() as u128) * 100 + at.day() as u128;
        let time = (at.hour() as u128 * 100 + at.minute() as u128) * 100 + at.second() as u128;
        let nanos = (at.nanosecond() as u128).min(NANOS_PER_SECOND - 1);

        Self(((date * 1_000_000 + time) * NANOS_PER_SECOND + nanos).min(MAX_ID))
    }

    /// The smallest id greater than this one, or `None` after
    /// [`SnapshotId::MAX`].
    ///
    /// The successor of an id may not correspond to a valid calendar time;
    /// it only needs to sort after its predecessor.
    pub fn next(self) -> Option<Self> {
        (self.0 < MAX_ID).then(|| Self(self.0 + 1))
    }

    /// The file name of the snapshot with this id.
    pub fn file_name(&self) -> String {
        format!("{}{}", SNAPSHOT_PREFIX, self)
    }

    /// Parse a snapshot file name.
    ///
    /// Returns `None` for temporary files and anything else that is not
    /// `archive-contents.` followed by exactly 23 digits.
    pub fn from_file_name(name: &str) -> Option<Self> {
        name.strip_prefix(SNAPSHOT_PREFIX)?.parse().ok()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = SNAPSHOT_ID_WIDTH)
    }
}

impl FromStr for SnapshotId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != SNAPSHOT_ID_WIDTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!(
                "snapshot id must be {} digits: '{}'",
                SNAPSHOT_ID_WIDTH, s
            ));
        }
        s.parse::<u128>().map(Self).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_from_datetime_layout() {
        let at = Utc
            .with_ymd_and_hms(2024, 1, 5, 23, 59, 58)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();
        assert_eq!(
            SnapshotId::from_datetime(at).to_string(),
            "20240105235958123456789"
        );
    }

    #[test]
    fn test_fixed_width() {
        let at = Utc.with_ymd_and_hms(999, 1, 1, 0, 0, 0).unwrap();
        let id = SnapshotId::from_datetime(at);
        assert_eq!(id.to_string().len(), SNAPSHOT_ID_WIDTH);
        assert!(id.to_string().starts_with("0999"));
    }

    #[test]
    fn test_lexicographic_matches_chronological() {
        let earlier = SnapshotId::from_datetime(Utc.with_ymd_and_hms(2025, 9, 30, 23, 0, 0).unwrap());
        let later = SnapshotId::from_datetime(Utc.with_ymd_and_hms(2025, 10, 1, 1, 0, 0).unwrap());

        assert!(earlier < later);
        assert!(earlier.file_name() < later.file_name());
    }

    #[test]
    fn test_next_carries_and_keeps_width() {
        let id: SnapshotId = "20240105235959999999999".parse().unwrap();
        let next = id.next().unwrap();
        assert_eq!(next.to_string(), "20240105235960000000000");
        assert!(next.file_name() > id.file_name());
    }

    #[test]
    fn test_next_stops_at_width() {
        let max: SnapshotId = "99999999999999999999999".parse().unwrap();
        assert_eq!(max, SnapshotId::MAX);
        assert_eq!(max.next(), None);

        let before: SnapshotId = "99999999999999999999998".parse().unwrap();
        assert_eq!(before.next(), Some(SnapshotId::MAX));
    }

    #[test]
    fn test_far_future_clamps_to_max() {
        let at = Utc.with_ymd_and_hms(12345, 6, 7, 8, 9, 10).unwrap();
        let id = SnapshotId::from_datetime(at);
        assert_eq!(id, SnapshotId::MAX);
        assert_eq!(SnapshotId::from_file_name(&id.file_name()), Some(id));
    }

    #[test]
    fn test_file_name_roundtrip() {
        let id: SnapshotId = "20261019083005000000001".parse().unwrap();
        assert_eq!(SnapshotId::from_file_name(&id.file_name()), Some(id));
    }

    #[test]
    fn test_from_file_name_rejects_others() {
        assert!(SnapshotId::from_file_name("archive-contents").is_none());
        assert!(SnapshotId::from_file_name("archive-contents.123").is_none());
        assert!(SnapshotId::from_file_name("archive-contents.2026101908300500000000x").is_none());
        assert!(SnapshotId::from_file_name(".tmpA1b2C3").is_none());
        assert!(SnapshotId::from_file_name("other.20261019083005000000001").is_none());
    }
}
