use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetashareError {
    #[error("Classpath entry unreadable: {path}: {source}")]
    ClasspathIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a valid shared archive file: {path}: {reason}")]
    BadArchive { path: String, reason: String },

    #[error("Cannot read archive file: {path}: {source}")]
    ArchiveIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive path error: {0}")]
    ArchivePath(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Settings file not found: {0}")]
    SettingsFileNotFound(String),

    #[error("Invalid log selector: {0}")]
    LogSelector(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MetashareError {
    pub fn bad_archive(path: impl AsRef<std::path::Path>, reason: impl Into<String>) -> Self {
        MetashareError::BadArchive {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetashareError>;
