use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::archive::LayerKind;
use crate::diag::{DiagCategory, DiagEvent};
use crate::error::MetashareError;
use crate::fingerprint::ValidationVerdict;
use super::loader::{LayerOutcome, LoadReport};

pub const MSG_BASE_FAILED: &str = "The base archive failed to load";
pub const MSG_TOP_FAILED: &str = "The top archive failed to load";
pub const MSG_PATHS_MISMATCH: &str = "shared class paths mismatch";
pub const MSG_PATHS_HINT: &str = "(hint: enable --log paths=info to diagnose the failure)";
pub const MSG_BASE_REJECTED: &str = "The base archive was rejected; the top archive cannot be used";
pub const MSG_ARCHIVE_ERROR: &str =
    "An error has occurred while processing the shared archive file.";

pub fn msg_not_the_one(path: &str) -> String {
    format!(
        "This file is not the one used while building the shared archive file: {}",
        path
    )
}

pub fn msg_timestamp_changed(path: &str) -> String {
    format!("{} timestamp has changed", path)
}

pub fn msg_missing_entry(path: &str) -> String {
    format!("Required classpath entry does not exist: {}", path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareMode {
    Off,
    #[default]
    Auto,
    On,
}

impl ShareMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareMode::Off => "off",
            ShareMode::Auto => "auto",
            ShareMode::On => "on",
        }
    }

    /// Off never rejects anything because it never validates; On is
    /// the only mode that can abort the process.
    pub fn strictness(&self) -> u8 {
        match self {
            ShareMode::Off => 0,
            ShareMode::Auto => 1,
            ShareMode::On => 2,
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, ShareMode::On)
    }
}

impl std::fmt::Display for ShareMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShareMode {
    type Err = MetashareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(ShareMode::Off),
            "auto" => Ok(ShareMode::Auto),
            "on" => Ok(ShareMode::On),
            other => Err(MetashareError::Settings(format!(
                "Unknown share mode '{}' (expected off, auto, or on)",
                other
            ))),
        }
    }
}

/// Policy inputs beyond the verdicts themselves. Whether path
/// diagnostics are already enabled is passed in explicitly so hint
/// suppression stays testable without touching global state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyConfig {
    pub mode: ShareMode,
    pub path_diag_enabled: bool,
}

impl PolicyConfig {
    pub fn new(mode: ShareMode) -> Self {
        Self {
            mode,
            path_diag_enabled: false,
        }
    }

    pub fn with_path_diag(mut self, enabled: bool) -> Self {
        self.path_diag_enabled = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SharingOutcome {
    Full,
    Partial,
    Unshared,
}

impl SharingOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharingOutcome::Full => "full",
            SharingOutcome::Partial => "partial",
            SharingOutcome::Unshared => "unshared",
        }
    }
}

impl std::fmt::Display for SharingOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub outcome: SharingOutcome,
    pub fatal: bool,
    pub events: Vec<DiagEvent>,
}

impl PolicyDecision {
    fn unshared_silent() -> Self {
        Self {
            outcome: SharingOutcome::Unshared,
            fatal: false,
            events: Vec::new(),
        }
    }
}

/// Maps verdicts and the share mode to the process-level outcome and
/// the diagnostics that must accompany it.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    config: PolicyConfig,
}

impl PolicyEngine {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    pub fn mode(&self) -> ShareMode {
        self.config.mode
    }

    pub fn decide(&self, report: &LoadReport) -> PolicyDecision {
        if self.config.mode == ShareMode::Off {
            return PolicyDecision::unshared_silent();
        }

        let mut events = Vec::new();
        for outcome in report.rejected() {
            self.events_for(outcome, &mut events);
        }

        let outcome = sharing_outcome(report);
        let fatal = self.config.mode == ShareMode::On && outcome != SharingOutcome::Full;

        if fatal {
            events.push(DiagEvent::error(DiagCategory::Archive, MSG_ARCHIVE_ERROR));
        } else if outcome != SharingOutcome::Full {
            events.push(DiagEvent::info(
                DiagCategory::General,
                "continuing with classes loaded without the rejected archive layers",
            ));
        }

        debug!(
            "Policy decision under mode {}: {} ({} accepted, {} rejected)",
            self.config.mode,
            outcome,
            report.accepted_count(),
            report.rejected_count()
        );

        PolicyDecision {
            outcome,
            fatal,
            events,
        }
    }

    fn events_for(&self, outcome: &LayerOutcome, events: &mut Vec<DiagEvent>) {
        if outcome.accepted() {
            return;
        }

        let lead = match outcome.kind {
            LayerKind::Base => MSG_BASE_FAILED,
            LayerKind::Top => MSG_TOP_FAILED,
        };
        events.push(DiagEvent::warning(DiagCategory::Archive, lead));

        match &outcome.verdict {
            ValidationVerdict::PathListMismatch => {
                events.push(self.paths_mismatch_warning());
            }
            ValidationVerdict::ContentChanged { path } => {
                events.push(DiagEvent::warning(DiagCategory::Paths, msg_not_the_one(path)));
            }
            ValidationVerdict::TimestampChanged { path } => {
                events.push(DiagEvent::warning(
                    DiagCategory::Paths,
                    msg_timestamp_changed(path),
                ));
            }
            ValidationVerdict::MissingEntry { path } => {
                events.push(DiagEvent::warning(
                    DiagCategory::Paths,
                    msg_missing_entry(path),
                ));
            }
            ValidationVerdict::BaseRejected => {
                events.push(DiagEvent::warning(DiagCategory::Archive, MSG_BASE_REJECTED));
            }
            ValidationVerdict::Valid => {}
        }
    }

    fn paths_mismatch_warning(&self) -> DiagEvent {
        let event = DiagEvent::warning(DiagCategory::Paths, MSG_PATHS_MISMATCH);
        if self.config.path_diag_enabled {
            event
        } else {
            event.with_hint(MSG_PATHS_HINT)
        }
    }
}

fn sharing_outcome(report: &LoadReport) -> SharingOutcome {
    if report.is_empty() {
        return SharingOutcome::Unshared;
    }
    if report.rejected_count() == 0 {
        return SharingOutcome::Full;
    }
    if report.base_accepted() {
        SharingOutcome::Partial
    } else {
        SharingOutcome::Unshared
    }
}
