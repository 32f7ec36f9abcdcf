use chrono::{DateTime, Utc};
use glob::glob;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{MetashareError, Result};
use super::entry::{sha256_file, ClasspathEntry};

/// Ordered snapshot of a classpath. Equality of two fingerprints is
/// positional: the same entries in a different order do not match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClasspathFingerprint {
    pub entries: Vec<ClasspathEntry>,
    pub captured_at: DateTime<Utc>,
}

impl ClasspathFingerprint {
    /// Capture for archive creation. Every element must be readable;
    /// an unreadable or absent element fails the whole capture.
    pub fn capture(paths: &[String]) -> Result<Self> {
        let entries = paths
            .iter()
            .map(|p| capture_entry_strict(p))
            .collect::<Result<Vec<_>>>()?;

        debug!("Captured fingerprint with {} entries", entries.len());

        Ok(Self {
            entries,
            captured_at: Utc::now(),
        })
    }

    /// Capture at load time. Absent elements are recorded as missing
    /// instead of failing, so validation can name them.
    pub fn capture_live(paths: &[String]) -> Self {
        let entries = paths.iter().map(|p| capture_entry_lenient(p)).collect();

        Self {
            entries,
            captured_at: Utc::now(),
        }
    }

    pub fn from_entries(entries: Vec<ClasspathEntry>) -> Self {
        Self {
            entries,
            captured_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }
}

/// Expand `dir/*` elements into the sorted list of jars in that
/// directory. Elements without a wildcard pass through unchanged.
pub fn expand_classpath(raw: &[String]) -> Vec<String> {
    let mut expanded = Vec::new();

    for element in raw {
        let dir = if element == "*" {
            Some(".".to_string())
        } else {
            element
                .strip_suffix("/*")
                .map(|prefix| if prefix.is_empty() { "/".to_string() } else { prefix.to_string() })
        };

        match dir {
            Some(dir) => {
                let pattern = format!("{}/*.jar", dir.trim_end_matches('/'));
                match glob(&pattern) {
                    Ok(matches) => {
                        let mut jars: Vec<String> = matches
                            .filter_map(|r| r.ok())
                            .map(|p| p.display().to_string())
                            .collect();
                        jars.sort();
                        debug!("Expanded '{}' to {} jars", element, jars.len());
                        expanded.extend(jars);
                    }
                    Err(_) => expanded.push(element.clone()),
                }
            }
            None => expanded.push(element.clone()),
        }
    }

    expanded
}

fn resolve_path(raw: &str) -> String {
    match fs::canonicalize(raw) {
        Ok(p) => p.display().to_string(),
        Err(_) => {
            let p = Path::new(raw);
            if p.is_absolute() {
                raw.to_string()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(p).display().to_string())
                    .unwrap_or_else(|_| raw.to_string())
            }
        }
    }
}

fn capture_entry_strict(raw: &str) -> Result<ClasspathEntry> {
    let path = resolve_path(raw);

    let metadata = fs::metadata(&path).map_err(|e| MetashareError::ClasspathIo {
        path: path.clone(),
        source: e,
    })?;

    let timestamp = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .map_err(|e| MetashareError::ClasspathIo {
            path: path.clone(),
            source: e,
        })?;

    let is_directory = metadata.is_dir();
    let checksum = if is_directory {
        None
    } else {
        Some(sha256_file(&path).map_err(|e| MetashareError::ClasspathIo {
            path: path.clone(),
            source: e,
        })?)
    };

    Ok(ClasspathEntry {
        path,
        checksum,
        timestamp: Some(timestamp),
        is_directory,
    })
}

fn capture_entry_lenient(raw: &str) -> ClasspathEntry {
    let path = resolve_path(raw);

    let metadata = match fs::metadata(&path) {
        Ok(m) => m,
        Err(_) => return ClasspathEntry::missing(path),
    };

    let timestamp = match metadata.modified() {
        Ok(t) => DateTime::<Utc>::from(t),
        Err(_) => return ClasspathEntry::missing(path),
    };

    let is_directory = metadata.is_dir();
    let checksum = if is_directory {
        None
    } else {
        match sha256_file(&path) {
            Ok(c) => Some(c),
            Err(_) => return ClasspathEntry::missing(path),
        }
    };

    ClasspathEntry {
        path,
        checksum,
        timestamp: Some(timestamp),
        is_directory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn write_jar(dir: &Path, name: &str, content: &[u8]) -> String {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_capture_strict_hashes_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let jar = write_jar(&root, "app.jar", b"class data");

        let fp = ClasspathFingerprint::capture(&[jar]).unwrap();
        assert_eq!(fp.len(), 1);
        assert!(fp.entries[0].checksum.is_some());
        assert!(fp.entries[0].timestamp.is_some());
        assert!(!fp.entries[0].is_directory);
    }

    #[test]
    fn test_capture_strict_fails_on_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.jar").display().to_string();

        let result = ClasspathFingerprint::capture(&[missing]);
        assert!(matches!(
            result,
            Err(crate::error::MetashareError::ClasspathIo { .. })
        ));
    }

    #[test]
    fn test_capture_live_marks_missing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let jar = write_jar(&root, "app.jar", b"class data");
        let missing = root.join("gone.jar").display().to_string();

        let fp = ClasspathFingerprint::capture_live(&[jar, missing]);
        assert_eq!(fp.len(), 2);
        assert!(!fp.entries[0].is_missing());
        assert!(fp.entries[1].is_missing());
    }

    #[test]
    fn test_capture_directory_has_no_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let classes = root.join("classes");
        fs::create_dir(&classes).unwrap();

        let fp = ClasspathFingerprint::capture(&[classes.display().to_string()]).unwrap();
        assert!(fp.entries[0].is_directory);
        assert!(fp.entries[0].checksum.is_none());
        assert!(fp.entries[0].timestamp.is_some());
    }

    #[test]
    fn test_capture_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let jar = write_jar(&root, "app.jar", b"class data");

        let first = ClasspathFingerprint::capture(&[jar.clone()]).unwrap();
        let second = ClasspathFingerprint::capture(&[jar]).unwrap();
        assert_eq!(first.entries[0].checksum, second.entries[0].checksum);
        assert_eq!(first.entries[0].path, second.entries[0].path);
    }

    #[test]
    fn test_expand_classpath_wildcard() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        write_jar(&root, "b.jar", b"b");
        write_jar(&root, "a.jar", b"a");
        write_jar(&root, "notes.txt", b"not a jar");

        let expanded = expand_classpath(&[format!("{}/*", root.display())]);
        assert_eq!(expanded.len(), 2);
        assert!(expanded[0].ends_with("a.jar"));
        assert!(expanded[1].ends_with("b.jar"));
    }

    #[test]
    fn test_expand_classpath_passthrough() {
        let raw = vec!["lib/app.jar".to_string(), "build/classes".to_string()];
        let expanded = expand_classpath(&raw);
        assert_eq!(expanded, raw);
    }
}
