mod header;
mod layer;
mod store;

pub use header::{ArchiveHeader, ARCHIVE_MAGIC, FORMAT_VERSION};
pub use layer::{ArchiveLayer, LayerId, LayerKind};
pub use store::{
    default_archive_path, payload_preview, read_archive, read_archive_header, resolve_chain,
    write_archive, ArchiveFile, ArchiveSpec,
};
