use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fingerprint::ClasspathFingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn short(&self) -> String {
        let full = self.0.to_string();
        full[..8].to_string()
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Base,
    Top,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Base => "base",
            LayerKind::Top => "top",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One archive in a chain. A base layer stands alone; a top layer
/// names the base it was built against and is unusable without it.
#[derive(Debug, Clone)]
pub struct ArchiveLayer {
    pub id: LayerId,
    pub kind: LayerKind,
    pub base_ref: Option<LayerId>,
    pub fingerprint: ClasspathFingerprint,
    pub created_at: DateTime<Utc>,
    pub payload: Vec<u8>,
}

impl ArchiveLayer {
    pub fn base(fingerprint: ClasspathFingerprint, payload: Vec<u8>) -> Self {
        Self {
            id: LayerId::new(),
            kind: LayerKind::Base,
            base_ref: None,
            fingerprint,
            created_at: Utc::now(),
            payload,
        }
    }

    pub fn top(fingerprint: ClasspathFingerprint, payload: Vec<u8>, base: &ArchiveLayer) -> Self {
        Self {
            id: LayerId::new(),
            kind: LayerKind::Top,
            base_ref: Some(base.id),
            fingerprint,
            created_at: Utc::now(),
            payload,
        }
    }

    pub fn is_base(&self) -> bool {
        self.kind == LayerKind::Base
    }

    pub fn is_top(&self) -> bool {
        self.kind == LayerKind::Top
    }

    pub fn entry_count(&self) -> usize {
        self.fingerprint.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_fingerprint() -> ClasspathFingerprint {
        ClasspathFingerprint::from_entries(vec![])
    }

    #[test]
    fn test_base_layer_has_no_base_ref() {
        let layer = ArchiveLayer::base(empty_fingerprint(), vec![1, 2, 3]);
        assert!(layer.is_base());
        assert!(layer.base_ref.is_none());
        assert_eq!(layer.payload, vec![1, 2, 3]);
    }

    #[test]
    fn test_top_layer_references_base() {
        let base = ArchiveLayer::base(empty_fingerprint(), vec![]);
        let top = ArchiveLayer::top(empty_fingerprint(), vec![], &base);
        assert!(top.is_top());
        assert_eq!(top.base_ref, Some(base.id));
        assert_ne!(top.id, base.id);
    }

    #[test]
    fn test_layer_ids_are_unique() {
        let a = LayerId::new();
        let b = LayerId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_layer_id_short_form() {
        let id = LayerId::new();
        assert_eq!(id.short().len(), 8);
        assert!(id.to_string().starts_with(&id.short()));
    }
}
