use serde::Serialize;
use tracing::debug;

use crate::archive::{ArchiveLayer, LayerId, LayerKind};
use crate::fingerprint::{ClasspathFingerprint, ValidationVerdict};
use super::validator::LayerValidator;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerOutcome {
    pub layer_id: LayerId,
    pub kind: LayerKind,
    pub verdict: ValidationVerdict,
}

impl LayerOutcome {
    pub fn accepted(&self) -> bool {
        self.verdict.is_valid()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub outcomes: Vec<LayerOutcome>,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn accepted(&self) -> Vec<&LayerOutcome> {
        self.outcomes.iter().filter(|o| o.accepted()).collect()
    }

    pub fn rejected(&self) -> Vec<&LayerOutcome> {
        self.outcomes.iter().filter(|o| !o.accepted()).collect()
    }

    pub fn accepted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.accepted()).count()
    }

    pub fn rejected_count(&self) -> usize {
        self.outcomes.len() - self.accepted_count()
    }

    pub fn base_accepted(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.kind == LayerKind::Base && o.accepted())
    }

    pub fn outcome_for(&self, layer_id: &LayerId) -> Option<&LayerOutcome> {
        self.outcomes.iter().find(|o| &o.layer_id == layer_id)
    }
}

/// Walks an archive chain in dependency order, validating each layer
/// against the live classpath. The live fingerprint is produced by a
/// supplier that is invoked lazily and at most once, so a chain that
/// never needs a comparison never touches the filesystem.
#[derive(Debug, Default)]
pub struct ArchiveLoader {
    validator: LayerValidator,
}

impl ArchiveLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<F>(&mut self, layers: &[ArchiveLayer], mut live: F) -> LoadReport
    where
        F: FnMut() -> ClasspathFingerprint,
    {
        let mut report = LoadReport::new();
        let mut fingerprint: Option<ClasspathFingerprint> = None;

        // Bases are judged before any top, whatever order the chain
        // was handed over in.
        let ordered = layers
            .iter()
            .filter(|l| l.is_base())
            .chain(layers.iter().filter(|l| l.is_top()));

        for layer in ordered {
            let verdict = match layer.kind {
                LayerKind::Base => {
                    let fp = fingerprint.get_or_insert_with(&mut live);
                    self.validator.validate(layer, fp)
                }
                LayerKind::Top => self.validate_top(layer, &mut fingerprint, &mut live),
            };

            debug!("Layer {} ({}): {}", layer.id.short(), layer.kind, verdict);

            report.outcomes.push(LayerOutcome {
                layer_id: layer.id,
                kind: layer.kind,
                verdict,
            });
        }

        report
    }

    pub fn validator(&self) -> &LayerValidator {
        &self.validator
    }

    fn validate_top<F>(
        &mut self,
        layer: &ArchiveLayer,
        fingerprint: &mut Option<ClasspathFingerprint>,
        live: &mut F,
    ) -> ValidationVerdict
    where
        F: FnMut() -> ClasspathFingerprint,
    {
        let base_ok = match layer.base_ref {
            Some(base_id) => self
                .validator
                .verdict_for(&base_id)
                .map(|v| v.is_valid())
                .unwrap_or(false),
            None => false,
        };

        if !base_ok {
            // The top is rejected before its own fingerprint is looked at.
            return self.validator.reject(layer.id, ValidationVerdict::BaseRejected);
        }

        let fp = fingerprint.get_or_insert_with(&mut *live);
        self.validator.validate(layer, fp)
    }
}
