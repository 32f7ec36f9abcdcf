use serde::{Deserialize, Serialize};

use super::capture::ClasspathFingerprint;

/// Outcome of checking one archive layer against the live classpath.
/// Exactly one rejection reason is surfaced per layer; when several
/// apply, the most specific one wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationVerdict {
    Valid,
    PathListMismatch,
    ContentChanged { path: String },
    TimestampChanged { path: String },
    MissingEntry { path: String },
    BaseRejected,
}

impl ValidationVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationVerdict::Valid)
    }

    pub fn is_rejection(&self) -> bool {
        !self.is_valid()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationVerdict::Valid => "valid",
            ValidationVerdict::PathListMismatch => "path_list_mismatch",
            ValidationVerdict::ContentChanged { .. } => "content_changed",
            ValidationVerdict::TimestampChanged { .. } => "timestamp_changed",
            ValidationVerdict::MissingEntry { .. } => "missing_entry",
            ValidationVerdict::BaseRejected => "base_rejected",
        }
    }

    pub fn offending_path(&self) -> Option<&str> {
        match self {
            ValidationVerdict::ContentChanged { path }
            | ValidationVerdict::TimestampChanged { path }
            | ValidationVerdict::MissingEntry { path } => Some(path),
            _ => None,
        }
    }
}

impl std::fmt::Display for ValidationVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.offending_path() {
            Some(path) => write!(f, "{} ({})", self.as_str(), path),
            None => write!(f, "{}", self.as_str()),
        }
    }
}

/// Compare a recorded fingerprint against the live classpath.
///
/// The whole list is scanned and the first diverging entry of each
/// kind is remembered; the verdict is then chosen by severity:
/// a missing entry outranks a reshaped path list, which outranks a
/// content change, which outranks a bare timestamp change. Entries at
/// positions where the paths already disagree are not inspected
/// further, that disagreement is the path list mismatch itself.
pub fn compare(recorded: &ClasspathFingerprint, live: &ClasspathFingerprint) -> ValidationVerdict {
    let mut missing: Option<&str> = None;
    let mut content: Option<&str> = None;
    let mut timestamp: Option<&str> = None;
    let mut path_mismatch = recorded.entries.len() != live.entries.len();

    for (rec, cur) in recorded.entries.iter().zip(live.entries.iter()) {
        if rec.path != cur.path {
            path_mismatch = true;
            continue;
        }

        if cur.is_missing() && !rec.is_missing() {
            missing.get_or_insert(rec.path.as_str());
            continue;
        }

        match (&rec.checksum, &cur.checksum) {
            (Some(a), Some(b)) if a != b => {
                content.get_or_insert(rec.path.as_str());
                continue;
            }
            (Some(_), None) | (None, Some(_)) => {
                // A directory became a file or vice versa.
                content.get_or_insert(rec.path.as_str());
                continue;
            }
            _ => {}
        }

        if rec.timestamp != cur.timestamp {
            timestamp.get_or_insert(rec.path.as_str());
        }
    }

    if let Some(path) = missing {
        return ValidationVerdict::MissingEntry { path: path.to_string() };
    }
    if path_mismatch {
        return ValidationVerdict::PathListMismatch;
    }
    if let Some(path) = content {
        return ValidationVerdict::ContentChanged { path: path.to_string() };
    }
    if let Some(path) = timestamp {
        return ValidationVerdict::TimestampChanged { path: path.to_string() };
    }

    ValidationVerdict::Valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::ClasspathEntry;
    use chrono::{TimeZone, Utc};

    fn entry(path: &str, checksum: &str, ts: i64) -> ClasspathEntry {
        ClasspathEntry {
            path: path.to_string(),
            checksum: Some(checksum.to_string()),
            timestamp: Some(Utc.timestamp_opt(ts, 0).unwrap()),
            is_directory: false,
        }
    }

    fn fingerprint(entries: Vec<ClasspathEntry>) -> ClasspathFingerprint {
        ClasspathFingerprint::from_entries(entries)
    }

    #[test]
    fn test_identical_fingerprints_are_valid() {
        let recorded = fingerprint(vec![entry("a.jar", "c1", 100), entry("b.jar", "c2", 200)]);
        let live = fingerprint(vec![entry("a.jar", "c1", 100), entry("b.jar", "c2", 200)]);
        assert_eq!(compare(&recorded, &live), ValidationVerdict::Valid);
    }

    #[test]
    fn test_reordered_entries_mismatch() {
        let recorded = fingerprint(vec![entry("a.jar", "c1", 100), entry("b.jar", "c2", 200)]);
        let live = fingerprint(vec![entry("b.jar", "c2", 200), entry("a.jar", "c1", 100)]);
        assert_eq!(compare(&recorded, &live), ValidationVerdict::PathListMismatch);
    }

    #[test]
    fn test_shorter_live_list_mismatch() {
        let recorded = fingerprint(vec![entry("a.jar", "c1", 100), entry("b.jar", "c2", 200)]);
        let live = fingerprint(vec![entry("a.jar", "c1", 100)]);
        assert_eq!(compare(&recorded, &live), ValidationVerdict::PathListMismatch);
    }

    #[test]
    fn test_extra_live_entry_mismatch() {
        let recorded = fingerprint(vec![entry("a.jar", "c1", 100)]);
        let live = fingerprint(vec![entry("a.jar", "c1", 100), entry("b.jar", "c2", 200)]);
        assert_eq!(compare(&recorded, &live), ValidationVerdict::PathListMismatch);
    }

    #[test]
    fn test_content_change_names_entry() {
        let recorded = fingerprint(vec![entry("a.jar", "c1", 100), entry("b.jar", "c2", 200)]);
        let live = fingerprint(vec![entry("a.jar", "c1", 100), entry("b.jar", "other", 200)]);
        assert_eq!(
            compare(&recorded, &live),
            ValidationVerdict::ContentChanged { path: "b.jar".to_string() }
        );
    }

    #[test]
    fn test_timestamp_only_change() {
        let recorded = fingerprint(vec![entry("a.jar", "c1", 100)]);
        let live = fingerprint(vec![entry("a.jar", "c1", 999)]);
        assert_eq!(
            compare(&recorded, &live),
            ValidationVerdict::TimestampChanged { path: "a.jar".to_string() }
        );
    }

    #[test]
    fn test_missing_entry_named() {
        let recorded = fingerprint(vec![entry("a.jar", "c1", 100), entry("b.jar", "c2", 200)]);
        let live = fingerprint(vec![entry("a.jar", "c1", 100), ClasspathEntry::missing("b.jar")]);
        assert_eq!(
            compare(&recorded, &live),
            ValidationVerdict::MissingEntry { path: "b.jar".to_string() }
        );
    }

    #[test]
    fn test_missing_outranks_path_mismatch() {
        let recorded = fingerprint(vec![entry("a.jar", "c1", 100), entry("b.jar", "c2", 200)]);
        let live = fingerprint(vec![
            ClasspathEntry::missing("a.jar"),
            entry("b.jar", "c2", 200),
            entry("extra.jar", "c3", 300),
        ]);
        assert_eq!(
            compare(&recorded, &live),
            ValidationVerdict::MissingEntry { path: "a.jar".to_string() }
        );
    }

    #[test]
    fn test_content_outranks_timestamp() {
        let recorded = fingerprint(vec![entry("a.jar", "c1", 100), entry("b.jar", "c2", 200)]);
        let live = fingerprint(vec![entry("a.jar", "c1", 999), entry("b.jar", "other", 200)]);
        assert_eq!(
            compare(&recorded, &live),
            ValidationVerdict::ContentChanged { path: "b.jar".to_string() }
        );
    }

    #[test]
    fn test_first_diverging_entry_wins_within_class() {
        let recorded = fingerprint(vec![
            entry("a.jar", "c1", 100),
            entry("b.jar", "c2", 200),
            entry("c.jar", "c3", 300),
        ]);
        let live = fingerprint(vec![
            entry("a.jar", "c1", 100),
            entry("b.jar", "x", 200),
            entry("c.jar", "y", 300),
        ]);
        assert_eq!(
            compare(&recorded, &live),
            ValidationVerdict::ContentChanged { path: "b.jar".to_string() }
        );
    }

    #[test]
    fn test_directory_to_file_flip_is_content_change() {
        let dir_entry = ClasspathEntry {
            path: "classes".to_string(),
            checksum: None,
            timestamp: Some(Utc.timestamp_opt(100, 0).unwrap()),
            is_directory: true,
        };
        let recorded = fingerprint(vec![dir_entry]);
        let live = fingerprint(vec![entry("classes", "c1", 100)]);
        assert_eq!(
            compare(&recorded, &live),
            ValidationVerdict::ContentChanged { path: "classes".to_string() }
        );
    }

    #[test]
    fn test_directory_timestamp_change() {
        let old = ClasspathEntry {
            path: "classes".to_string(),
            checksum: None,
            timestamp: Some(Utc.timestamp_opt(100, 0).unwrap()),
            is_directory: true,
        };
        let new = ClasspathEntry {
            path: "classes".to_string(),
            checksum: None,
            timestamp: Some(Utc.timestamp_opt(500, 0).unwrap()),
            is_directory: true,
        };
        let recorded = fingerprint(vec![old]);
        let live = fingerprint(vec![new]);
        assert_eq!(
            compare(&recorded, &live),
            ValidationVerdict::TimestampChanged { path: "classes".to_string() }
        );
    }

    #[test]
    fn test_empty_fingerprints_are_valid() {
        let recorded = fingerprint(vec![]);
        let live = fingerprint(vec![]);
        assert_eq!(compare(&recorded, &live), ValidationVerdict::Valid);
    }

    #[test]
    fn test_verdict_accessors() {
        assert!(ValidationVerdict::Valid.is_valid());
        assert!(ValidationVerdict::BaseRejected.is_rejection());
        assert_eq!(ValidationVerdict::PathListMismatch.as_str(), "path_list_mismatch");
        let verdict = ValidationVerdict::ContentChanged { path: "a.jar".to_string() };
        assert_eq!(verdict.offending_path(), Some("a.jar"));
        assert_eq!(verdict.to_string(), "content_changed (a.jar)");
    }
}
