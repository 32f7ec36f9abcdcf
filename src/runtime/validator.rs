use std::collections::HashMap;
use tracing::debug;

use crate::archive::{ArchiveLayer, LayerId};
use crate::fingerprint::{compare, ClasspathFingerprint, ValidationVerdict};

/// Validates layers against the live classpath and remembers every
/// verdict. A layer is judged at most once; later calls return the
/// recorded verdict no matter what fingerprint they bring.
#[derive(Debug, Default)]
pub struct LayerValidator {
    verdicts: HashMap<LayerId, ValidationVerdict>,
}

impl LayerValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(
        &mut self,
        layer: &ArchiveLayer,
        live: &ClasspathFingerprint,
    ) -> ValidationVerdict {
        if let Some(verdict) = self.verdicts.get(&layer.id) {
            return verdict.clone();
        }

        let verdict = compare(&layer.fingerprint, live);
        debug!("Validated {} layer {}: {}", layer.kind, layer.id.short(), verdict);
        self.verdicts.insert(layer.id, verdict.clone());
        verdict
    }

    /// Record a verdict decided outside fingerprint comparison, such
    /// as a cascading rejection. An already recorded verdict wins.
    pub fn reject(&mut self, layer_id: LayerId, verdict: ValidationVerdict) -> ValidationVerdict {
        self.verdicts.entry(layer_id).or_insert(verdict).clone()
    }

    pub fn verdict_for(&self, layer_id: &LayerId) -> Option<&ValidationVerdict> {
        self.verdicts.get(layer_id)
    }

    pub fn is_rejected(&self, layer_id: &LayerId) -> bool {
        self.verdicts
            .get(layer_id)
            .map(|v| v.is_rejection())
            .unwrap_or(false)
    }
}
