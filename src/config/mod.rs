use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::diag::DiagCategory;
use crate::error::{MetashareError, Result};
use crate::runtime::ShareMode;

/// Settings file contents. Everything here can also be given on the
/// command line, which wins over the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShareSettings {
    #[serde(default)]
    pub mode: ShareMode,

    /// Archive path, `base.msa` or `base.msa:top.msa`.
    #[serde(default)]
    pub archive: Option<String>,

    #[serde(default)]
    pub classpath: Vec<String>,

    /// Log selectors, e.g. `paths=info` or `all=debug`.
    #[serde(default)]
    pub log: Vec<String>,
}

impl ShareSettings {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|_| MetashareError::SettingsFileNotFound(path.display().to_string()))?;

        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let settings: ShareSettings = serde_yaml::from_str(&contents)?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
struct LogSelector {
    /// `None` selects every category (`all`).
    category: Option<DiagCategory>,
    level: LogLevel,
}

/// Parsed log selectors. Later selectors override earlier ones for
/// the categories they touch; untouched categories sit at `warn`.
/// Warnings and errors are never suppressible, so levels below
/// `info` only withhold informational output.
#[derive(Debug, Clone, Default)]
pub struct LogSpec {
    selectors: Vec<LogSelector>,
}

impl LogSpec {
    /// Accepts `category` (implying `info`) or `category=level`, with
    /// category one of `paths`, `archive`, `general`, `all`.
    pub fn parse(specs: &[String]) -> Result<Self> {
        let pattern = Regex::new(r"^(paths|archive|general|all)(=(error|warn|info|debug))?$")
            .unwrap();

        let mut selectors = Vec::new();
        for spec in specs {
            let captures = pattern
                .captures(spec)
                .ok_or_else(|| MetashareError::LogSelector(spec.clone()))?;

            let category = match &captures[1] {
                "all" => None,
                name => DiagCategory::parse(name),
            };
            let level = captures
                .get(3)
                .and_then(|m| LogLevel::parse(m.as_str()))
                .unwrap_or(LogLevel::Info);

            selectors.push(LogSelector { category, level });
        }

        Ok(Self { selectors })
    }

    pub fn level_for(&self, category: DiagCategory) -> LogLevel {
        let mut level = LogLevel::Warn;
        for selector in &self.selectors {
            match selector.category {
                None => level = selector.level,
                Some(c) if c == category => level = selector.level,
                Some(_) => {}
            }
        }
        level
    }

    /// True when the operator already asked for per-path detail, in
    /// which case the hint pointing at it is redundant.
    pub fn path_diag_enabled(&self) -> bool {
        self.level_for(DiagCategory::Paths) >= LogLevel::Info
    }

    pub fn info_categories(&self) -> Vec<DiagCategory> {
        DiagCategory::all()
            .into_iter()
            .filter(|c| self.level_for(*c) >= LogLevel::Info)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_full_settings() {
        let yaml = r#"
mode: "on"
archive: base.msa:top.msa
classpath:
  - lib/a.jar
  - lib/*
log:
  - paths=info
"#;
        let settings: ShareSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.mode, ShareMode::On);
        assert_eq!(settings.archive.as_deref(), Some("base.msa:top.msa"));
        assert_eq!(settings.classpath.len(), 2);
        assert_eq!(settings.log, vec!["paths=info"]);
    }

    #[test]
    fn test_settings_default_mode_is_auto() {
        let settings: ShareSettings = serde_yaml::from_str("classpath: []").unwrap();
        assert_eq!(settings.mode, ShareMode::Auto);
        assert!(settings.archive.is_none());
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = ShareSettings::from_file(dir.path().join("absent.yaml"));
        assert!(matches!(
            result,
            Err(MetashareError::SettingsFileNotFound(_))
        ));
    }

    #[test]
    fn test_from_file_empty_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "\n").unwrap();

        let settings = ShareSettings::from_file(&path).unwrap();
        assert_eq!(settings.mode, ShareMode::Auto);
    }

    #[test]
    fn test_selector_bare_category_implies_info() {
        let spec = LogSpec::parse(&specs(&["paths"])).unwrap();
        assert_eq!(spec.level_for(DiagCategory::Paths), LogLevel::Info);
        assert_eq!(spec.level_for(DiagCategory::Archive), LogLevel::Warn);
    }

    #[test]
    fn test_selector_with_level() {
        let spec = LogSpec::parse(&specs(&["archive=debug"])).unwrap();
        assert_eq!(spec.level_for(DiagCategory::Archive), LogLevel::Debug);
    }

    #[test]
    fn test_all_selector_covers_every_category() {
        let spec = LogSpec::parse(&specs(&["all=info"])).unwrap();
        assert_eq!(spec.info_categories().len(), 3);
    }

    #[test]
    fn test_later_selector_wins() {
        let spec = LogSpec::parse(&specs(&["all=info", "paths=warn"])).unwrap();
        assert_eq!(spec.level_for(DiagCategory::Paths), LogLevel::Warn);
        assert_eq!(spec.level_for(DiagCategory::Archive), LogLevel::Info);
        assert!(!spec.path_diag_enabled());
    }

    #[test]
    fn test_path_diag_enabled() {
        assert!(LogSpec::parse(&specs(&["paths=info"])).unwrap().path_diag_enabled());
        assert!(LogSpec::parse(&specs(&["paths=debug"])).unwrap().path_diag_enabled());
        assert!(LogSpec::parse(&specs(&["all=info"])).unwrap().path_diag_enabled());
        assert!(!LogSpec::parse(&specs(&[])).unwrap().path_diag_enabled());
        assert!(!LogSpec::parse(&specs(&["archive=info"])).unwrap().path_diag_enabled());
    }

    #[test]
    fn test_invalid_selectors_rejected() {
        assert!(LogSpec::parse(&specs(&["bogus"])).is_err());
        assert!(LogSpec::parse(&specs(&["paths=loud"])).is_err());
        assert!(LogSpec::parse(&specs(&["paths=info=extra"])).is_err());
        assert!(LogSpec::parse(&specs(&[""])).is_err());
    }
}
