use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{MetashareError, Result};
use crate::fingerprint::sha256_bytes;
use super::header::{ArchiveHeader, ARCHIVE_MAGIC, FORMAT_VERSION, MAX_HEADER_LEN};
use super::layer::{ArchiveLayer, LayerKind};

/// How archives were named on the command line: either one file, or
/// `base:top` with the base first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSpec {
    Single(PathBuf),
    Pair { base: PathBuf, top: PathBuf },
}

impl ArchiveSpec {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(MetashareError::ArchivePath(
                "Archive path is empty".to_string(),
            ));
        }

        if !raw.contains(':') {
            return Ok(ArchiveSpec::Single(PathBuf::from(raw)));
        }

        let parts: Vec<&str> = raw.split(':').collect();
        if parts.len() > 2 {
            return Err(MetashareError::ArchivePath(
                "Cannot have more than 2 archive files specified in the archive path".to_string(),
            ));
        }
        if parts[0].is_empty() {
            return Err(MetashareError::ArchivePath(
                "Base archive was not specified".to_string(),
            ));
        }
        if parts[1].is_empty() {
            return Err(MetashareError::ArchivePath(
                "Top archive was not specified".to_string(),
            ));
        }

        Ok(ArchiveSpec::Pair {
            base: PathBuf::from(parts[0]),
            top: PathBuf::from(parts[1]),
        })
    }
}

/// An archive read back from disk, payload already decompressed and
/// verified against the header digest.
#[derive(Debug, Clone)]
pub struct ArchiveFile {
    pub path: PathBuf,
    pub header: ArchiveHeader,
    pub payload: Vec<u8>,
}

impl ArchiveFile {
    pub fn into_layer(self) -> ArchiveLayer {
        let ArchiveFile { header, payload, .. } = self;
        ArchiveLayer {
            id: header.id,
            kind: header.kind,
            base_ref: header.base_ref,
            fingerprint: header.fingerprint,
            created_at: header.created_at,
            payload,
        }
    }
}

pub fn default_archive_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("metashare")
        .join("classes.msa")
}

pub fn write_archive(
    path: impl AsRef<Path>,
    layer: &ArchiveLayer,
    base_path: Option<&Path>,
) -> Result<()> {
    let path = path.as_ref();

    match (layer.kind, base_path) {
        (LayerKind::Top, None) => {
            return Err(MetashareError::ArchivePath(
                "Top archive requires the path of its base archive".to_string(),
            ));
        }
        (LayerKind::Base, Some(_)) => {
            return Err(MetashareError::ArchivePath(
                "Base archive cannot reference another archive".to_string(),
            ));
        }
        _ => {}
    }

    let compressed = compress_payload(&layer.payload)?;
    let header = ArchiveHeader {
        format_version: FORMAT_VERSION,
        id: layer.id,
        kind: layer.kind,
        base_ref: layer.base_ref,
        base_path: base_path.map(|p| p.display().to_string()),
        created_at: layer.created_at,
        fingerprint: layer.fingerprint.clone(),
        payload_len: compressed.len() as u64,
        payload_sha256: sha256_bytes(&compressed),
    };
    let header_bytes = serde_json::to_vec(&header)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(path)?;
    file.write_all(&ARCHIVE_MAGIC)?;
    file.write_all(&(header_bytes.len() as u32).to_le_bytes())?;
    file.write_all(&header_bytes)?;
    file.write_all(&compressed)?;

    debug!(
        "Wrote {} archive to {} ({} entries, {} payload bytes)",
        layer.kind,
        path.display(),
        layer.entry_count(),
        layer.payload.len()
    );

    Ok(())
}

pub fn read_archive_header(path: impl AsRef<Path>) -> Result<ArchiveHeader> {
    let path = path.as_ref();
    let mut file = open_archive(path)?;
    read_header_from(&mut file, path)
}

pub fn read_archive(path: impl AsRef<Path>) -> Result<ArchiveFile> {
    let path = path.as_ref();
    let mut file = open_archive(path)?;
    let header = read_header_from(&mut file, path)?;

    let mut compressed = Vec::new();
    file.read_to_end(&mut compressed)
        .map_err(|e| archive_io(path, e))?;

    if compressed.len() as u64 != header.payload_len {
        return Err(MetashareError::bad_archive(
            path,
            format!(
                "payload length mismatch: header records {}, file carries {}",
                header.payload_len,
                compressed.len()
            ),
        ));
    }

    if sha256_bytes(&compressed) != header.payload_sha256 {
        return Err(MetashareError::bad_archive(
            path,
            "payload checksum verification failed",
        ));
    }

    let payload = decompress_payload(path, &compressed)?;

    debug!(
        "Read {} archive from {} ({} entries, {} payload bytes)",
        header.kind,
        path.display(),
        header.entry_count(),
        payload.len()
    );

    Ok(ArchiveFile {
        path: path.to_path_buf(),
        header,
        payload,
    })
}

/// Turn an archive spec into the ordered chain of archive files,
/// base first. A single top archive is resolved through the base
/// path recorded in its header.
pub fn resolve_chain(spec: &ArchiveSpec) -> Result<Vec<ArchiveFile>> {
    match spec {
        ArchiveSpec::Single(path) => {
            let file = read_archive(path)?;
            match file.header.kind {
                LayerKind::Base => Ok(vec![file]),
                LayerKind::Top => {
                    let base_path = file.header.base_path.clone().ok_or_else(|| {
                        MetashareError::bad_archive(
                            path,
                            "top archive does not record the path of its base archive",
                        )
                    })?;

                    info!("Resolving base archive {} named by top archive", base_path);
                    let base = read_archive(Path::new(&base_path))?;
                    if base.header.kind != LayerKind::Base {
                        return Err(MetashareError::bad_archive(
                            &base_path,
                            "expected a base archive",
                        ));
                    }
                    Ok(vec![base, file])
                }
            }
        }
        ArchiveSpec::Pair { base, top } => {
            let base_file = read_archive(base)?;
            if base_file.header.kind != LayerKind::Base {
                return Err(MetashareError::bad_archive(base, "expected a base archive"));
            }

            let top_file = read_archive(top)?;
            if top_file.header.kind != LayerKind::Top {
                return Err(MetashareError::bad_archive(top, "expected a top archive"));
            }

            Ok(vec![base_file, top_file])
        }
    }
}

pub fn payload_preview(payload: &[u8], max_bytes: usize) -> String {
    let end = payload.len().min(max_bytes);
    STANDARD.encode(&payload[..end])
}

fn open_archive(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| archive_io(path, e))
}

fn archive_io(path: &Path, source: std::io::Error) -> MetashareError {
    MetashareError::ArchiveIo {
        path: path.display().to_string(),
        source,
    }
}

fn read_header_from(file: &mut File, path: &Path) -> Result<ArchiveHeader> {
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)
        .map_err(|_| MetashareError::bad_archive(path, "file too short for magic number"))?;
    if magic != ARCHIVE_MAGIC {
        return Err(MetashareError::bad_archive(path, "bad magic number"));
    }

    let mut len_bytes = [0u8; 4];
    file.read_exact(&mut len_bytes)
        .map_err(|_| MetashareError::bad_archive(path, "file too short for header length"))?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    if header_len == 0 || header_len > MAX_HEADER_LEN {
        return Err(MetashareError::bad_archive(
            path,
            format!("unreasonable header length {}", header_len),
        ));
    }

    let mut header_bytes = vec![0u8; header_len];
    file.read_exact(&mut header_bytes)
        .map_err(|_| MetashareError::bad_archive(path, "truncated header"))?;

    let header: ArchiveHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| MetashareError::bad_archive(path, format!("malformed header: {}", e)))?;

    if header.format_version != FORMAT_VERSION {
        return Err(MetashareError::bad_archive(
            path,
            format!("unsupported format version {}", header.format_version),
        ));
    }

    match (header.kind, header.base_ref) {
        (LayerKind::Top, None) => {
            return Err(MetashareError::bad_archive(
                path,
                "top archive missing its base reference",
            ));
        }
        (LayerKind::Base, Some(_)) => {
            return Err(MetashareError::bad_archive(
                path,
                "base archive cannot carry a base reference",
            ));
        }
        _ => {}
    }

    Ok(header)
}

fn compress_payload(payload: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload)?;
    Ok(encoder.finish()?)
}

fn decompress_payload(path: &Path, compressed: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(compressed);
    let mut payload = Vec::new();
    decoder.read_to_end(&mut payload).map_err(|e| {
        MetashareError::bad_archive(path, format!("payload decompression failed: {}", e))
    })?;
    Ok(payload)
}
