use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use crate::fingerprint::{compare, ClasspathEntry, ClasspathFingerprint};

/// Render a fingerprint one entry per line so two fingerprints can be
/// diffed textually.
pub fn render_entries(fingerprint: &ClasspathFingerprint) -> String {
    fingerprint
        .entries
        .iter()
        .map(render_entry)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_entry(entry: &ClasspathEntry) -> String {
    if entry.is_missing() {
        return format!("{}  absent", entry.path);
    }

    let checksum = match &entry.checksum {
        Some(c) => c.chars().take(12).collect::<String>(),
        None => "dir".to_string(),
    };
    let timestamp = entry
        .timestamp
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();

    format!("{}  {}  {}", entry.path, checksum, timestamp)
}

pub fn format_classpath_diff(
    recorded: &ClasspathFingerprint,
    live: &ClasspathFingerprint,
) -> String {
    let old = render_entries(recorded);
    let new = render_entries(live);

    let diff = TextDiff::from_lines(&old, &new);
    let mut output = String::new();

    output.push_str(&"───────────────────────────────────────\n".dimmed().to_string());

    for change in diff.iter_all_changes() {
        let line = change.to_string();
        let formatted = match change.tag() {
            ChangeTag::Delete => format!("- {}", line.trim_end()).red().to_string(),
            ChangeTag::Insert => format!("+ {}", line.trim_end()).green().to_string(),
            ChangeTag::Equal => format!("  {}", line.trim_end()).to_string(),
        };
        output.push_str(&formatted);
        output.push('\n');
    }

    output.push_str(&"───────────────────────────────────────".dimmed().to_string());

    output
}

pub fn has_changes(recorded: &ClasspathFingerprint, live: &ClasspathFingerprint) -> bool {
    compare(recorded, live).is_rejection()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(path: &str, checksum: &str) -> ClasspathEntry {
        ClasspathEntry {
            path: path.to_string(),
            checksum: Some(checksum.to_string()),
            timestamp: Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap()),
            is_directory: false,
        }
    }

    #[test]
    fn test_render_shows_each_entry() {
        let fp = ClasspathFingerprint::from_entries(vec![
            entry("lib/a.jar", "aaaaaaaaaaaaaaaa"),
            entry("lib/b.jar", "bbbbbbbbbbbbbbbb"),
        ]);

        let rendered = render_entries(&fp);
        assert!(rendered.contains("lib/a.jar"));
        assert!(rendered.contains("lib/b.jar"));
        assert!(rendered.contains("aaaaaaaaaaaa"));
        assert_eq!(rendered.lines().count(), 2);
    }

    #[test]
    fn test_render_marks_missing_entries() {
        let fp = ClasspathFingerprint::from_entries(vec![ClasspathEntry::missing("gone.jar")]);
        assert!(render_entries(&fp).contains("absent"));
    }

    #[test]
    fn test_diff_shows_replaced_jar() {
        let recorded = ClasspathFingerprint::from_entries(vec![entry("lib/a.jar", "c1")]);
        let live = ClasspathFingerprint::from_entries(vec![entry("lib/b.jar", "c2")]);

        let diff = format_classpath_diff(&recorded, &live);
        assert!(diff.contains("lib/a.jar"));
        assert!(diff.contains("lib/b.jar"));
    }

    #[test]
    fn test_has_changes_true_on_content_change() {
        let recorded = ClasspathFingerprint::from_entries(vec![entry("a.jar", "c1")]);
        let live = ClasspathFingerprint::from_entries(vec![entry("a.jar", "c2")]);
        assert!(has_changes(&recorded, &live));
    }

    #[test]
    fn test_has_changes_false_when_identical() {
        let recorded = ClasspathFingerprint::from_entries(vec![entry("a.jar", "c1")]);
        let live = ClasspathFingerprint::from_entries(vec![entry("a.jar", "c1")]);
        assert!(!has_changes(&recorded, &live));
    }
}
