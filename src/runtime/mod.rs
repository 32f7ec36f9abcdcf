mod loader;
mod policy;
mod validator;

pub use loader::{ArchiveLoader, LayerOutcome, LoadReport};
pub use policy::{
    msg_missing_entry, msg_not_the_one, msg_timestamp_changed, PolicyConfig, PolicyDecision,
    PolicyEngine, ShareMode, SharingOutcome, MSG_ARCHIVE_ERROR, MSG_BASE_FAILED,
    MSG_BASE_REJECTED, MSG_PATHS_HINT, MSG_PATHS_MISMATCH, MSG_TOP_FAILED,
};
pub use validator::LayerValidator;
