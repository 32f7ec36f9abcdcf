use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One recorded classpath element. Directories carry no checksum;
/// entries that were absent when observed carry no timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClasspathEntry {
    pub path: String,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_directory: bool,
}

impl ClasspathEntry {
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            checksum: None,
            timestamp: None,
            is_directory: false,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.timestamp.is_none()
    }
}

pub fn sha256_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    format!("{:x}", result)
}

pub fn sha256_file(path: impl AsRef<Path>) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sha256_deterministic() {
        let checksum1 = sha256_bytes(b"hello world");
        let checksum2 = sha256_bytes(b"hello world");
        assert_eq!(checksum1, checksum2);
    }

    #[test]
    fn test_sha256_different_input() {
        let checksum1 = sha256_bytes(b"hello");
        let checksum2 = sha256_bytes(b"world");
        assert_ne!(checksum1, checksum2);
    }

    #[test]
    fn test_sha256_file_matches_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.jar");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"class bytes").unwrap();

        let from_file = sha256_file(&path).unwrap();
        let from_bytes = sha256_bytes(b"class bytes");
        assert_eq!(from_file, from_bytes);
    }

    #[test]
    fn test_sha256_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = sha256_file(dir.path().join("no-such.jar"));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_entry() {
        let entry = ClasspathEntry::missing("/opt/app/gone.jar");
        assert!(entry.is_missing());
        assert!(entry.checksum.is_none());
        assert_eq!(entry.path, "/opt/app/gone.jar");
    }
}
