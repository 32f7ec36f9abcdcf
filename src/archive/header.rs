use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::ClasspathFingerprint;
use super::layer::{LayerId, LayerKind};

pub const ARCHIVE_MAGIC: [u8; 4] = *b"MSA1";
pub const FORMAT_VERSION: u32 = 1;

/// Upper bound on the serialized header, to reject garbage length
/// fields before allocating.
pub const MAX_HEADER_LEN: usize = 16 * 1024 * 1024;

/// On-disk archive header. Serialized as JSON after the magic and a
/// little-endian u32 length prefix; the payload follows, gzipped.
/// `payload_len` and `payload_sha256` describe the stored (compressed)
/// payload bytes so corruption is caught before decompression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveHeader {
    pub format_version: u32,
    pub id: LayerId,
    pub kind: LayerKind,
    #[serde(default)]
    pub base_ref: Option<LayerId>,
    #[serde(default)]
    pub base_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub fingerprint: ClasspathFingerprint,
    pub payload_len: u64,
    pub payload_sha256: String,
}

impl ArchiveHeader {
    pub fn entry_count(&self) -> usize {
        self.fingerprint.entries.len()
    }
}
