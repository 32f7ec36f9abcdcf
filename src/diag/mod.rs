use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagCategory {
    Paths,
    Archive,
    General,
}

impl DiagCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagCategory::Paths => "paths",
            DiagCategory::Archive => "archive",
            DiagCategory::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "paths" => Some(DiagCategory::Paths),
            "archive" => Some(DiagCategory::Archive),
            "general" => Some(DiagCategory::General),
            _ => None,
        }
    }

    pub fn all() -> [DiagCategory; 3] {
        [DiagCategory::Paths, DiagCategory::Archive, DiagCategory::General]
    }
}

impl std::fmt::Display for DiagCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagSeverity {
    Info,
    Warning,
    Error,
}

impl DiagSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagSeverity::Info => "info",
            DiagSeverity::Warning => "warning",
            DiagSeverity::Error => "error",
        }
    }
}

impl std::fmt::Display for DiagSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One diagnostic line produced while deciding whether archives can
/// be used. The optional hint is a follow-up line telling the
/// operator how to get more detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagEvent {
    pub category: DiagCategory,
    pub severity: DiagSeverity,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl DiagEvent {
    pub fn info(category: DiagCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            severity: DiagSeverity::Info,
            text: text.into(),
            hint: None,
        }
    }

    pub fn warning(category: DiagCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            severity: DiagSeverity::Warning,
            text: text.into(),
            hint: None,
        }
    }

    pub fn error(category: DiagCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            severity: DiagSeverity::Error,
            text: text.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

pub trait DiagnosticsReporter {
    fn report(&mut self, event: &DiagEvent);
}

/// Collects events instead of printing them. Used by tests and by the
/// JSON output path.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub events: Vec<DiagEvent>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.events.iter().any(|e| e.text.contains(needle))
    }

    pub fn has_hint(&self, needle: &str) -> bool {
        self.events
            .iter()
            .any(|e| e.hint.as_deref().is_some_and(|h| h.contains(needle)))
    }

    pub fn count_severity(&self, severity: DiagSeverity) -> usize {
        self.events.iter().filter(|e| e.severity == severity).count()
    }
}

impl DiagnosticsReporter for CollectingReporter {
    fn report(&mut self, event: &DiagEvent) {
        self.events.push(event.clone());
    }
}

/// Prints events to stderr in `[severity][category]` form. Warnings
/// and errors always print; info lines print only for categories the
/// operator turned on.
pub struct ConsoleReporter {
    info_categories: Vec<DiagCategory>,
}

impl ConsoleReporter {
    pub fn new(info_categories: Vec<DiagCategory>) -> Self {
        Self { info_categories }
    }

    pub fn should_print(&self, event: &DiagEvent) -> bool {
        match event.severity {
            DiagSeverity::Info => self.info_categories.contains(&event.category),
            _ => true,
        }
    }
}

impl DiagnosticsReporter for ConsoleReporter {
    fn report(&mut self, event: &DiagEvent) {
        if !self.should_print(event) {
            return;
        }

        eprintln!("[{}][{}] {}", event.severity, event.category, event.text);
        if let Some(hint) = &event.hint {
            eprintln!("{}", hint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_reporter_records_events() {
        let mut reporter = CollectingReporter::new();
        reporter.report(&DiagEvent::warning(DiagCategory::Paths, "shared class paths mismatch"));
        reporter.report(&DiagEvent::error(DiagCategory::Archive, "cannot use archive"));

        assert_eq!(reporter.events.len(), 2);
        assert!(reporter.contains("paths mismatch"));
        assert_eq!(reporter.count_severity(DiagSeverity::Error), 1);
    }

    #[test]
    fn test_hint_lookup() {
        let mut reporter = CollectingReporter::new();
        let event = DiagEvent::warning(DiagCategory::Paths, "mismatch")
            .with_hint("(hint: enable --log paths=info to diagnose the failure)");
        reporter.report(&event);

        assert!(reporter.has_hint("--log paths=info"));
        assert!(!reporter.has_hint("no such hint"));
    }

    #[test]
    fn test_console_reporter_filters_info_by_category() {
        let reporter = ConsoleReporter::new(vec![DiagCategory::Paths]);

        let paths_info = DiagEvent::info(DiagCategory::Paths, "checking classpath");
        let archive_info = DiagEvent::info(DiagCategory::Archive, "mapping payload");
        let archive_warning = DiagEvent::warning(DiagCategory::Archive, "rejected");

        assert!(reporter.should_print(&paths_info));
        assert!(!reporter.should_print(&archive_info));
        assert!(reporter.should_print(&archive_warning));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(DiagCategory::parse("paths"), Some(DiagCategory::Paths));
        assert_eq!(DiagCategory::parse("archive"), Some(DiagCategory::Archive));
        assert_eq!(DiagCategory::parse("bogus"), None);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(DiagSeverity::Info < DiagSeverity::Warning);
        assert!(DiagSeverity::Warning < DiagSeverity::Error);
    }
}
