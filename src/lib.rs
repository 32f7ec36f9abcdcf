pub mod archive;
pub mod config;
pub mod diag;
pub mod diff;
pub mod error;
pub mod fingerprint;
pub mod runtime;

pub use error::{MetashareError, Result};
pub use fingerprint::{compare, expand_classpath, ClasspathEntry, ClasspathFingerprint, ValidationVerdict};
pub use archive::{default_archive_path, payload_preview, read_archive, read_archive_header, resolve_chain, write_archive, ArchiveFile, ArchiveHeader, ArchiveLayer, ArchiveSpec, LayerId, LayerKind};
pub use runtime::{ArchiveLoader, LayerOutcome, LayerValidator, LoadReport, PolicyConfig, PolicyDecision, PolicyEngine, ShareMode, SharingOutcome};
pub use runtime::{msg_missing_entry, msg_not_the_one, msg_timestamp_changed, MSG_ARCHIVE_ERROR, MSG_BASE_FAILED, MSG_BASE_REJECTED, MSG_PATHS_HINT, MSG_PATHS_MISMATCH, MSG_TOP_FAILED};
pub use diag::{CollectingReporter, ConsoleReporter, DiagCategory, DiagEvent, DiagSeverity, DiagnosticsReporter};
pub use diff::{format_classpath_diff, has_changes, render_entries};
pub use config::{LogLevel, LogSpec, ShareSettings};
