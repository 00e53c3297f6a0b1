use egui::Color32;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::element::ElementType;
use crate::error::HistoryError;
use crate::overlay::{SpotlightHole, SpotlightParams};
use crate::presets::HISTORY_LIMIT;

/// Everything needed to rebuild the canvas at one point in time.
///
/// Hole geometry is stored explicitly instead of relying on the serialized
/// spotlight overlay, which is left out of `objects` and re-derived on restore.
/// The crop rectangle travels inside its crop mask object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub objects: Vec<ElementType>,
    #[serde(default)]
    pub holes: Vec<SpotlightHole>,
    pub spotlight_color: Color32,
    pub spotlight_darkness: f32,
}

impl SceneSnapshot {
    pub fn empty(params: &SpotlightParams) -> Self {
        Self {
            objects: Vec::new(),
            holes: Vec::new(),
            spotlight_color: params.color,
            spotlight_darkness: params.darkness,
        }
    }

    pub fn spotlight_params(&self) -> SpotlightParams {
        SpotlightParams {
            color: self.spotlight_color,
            darkness: self.spotlight_darkness,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Persisted form of the history: every entry plus the current index
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub entries: Vec<String>,
    pub index: usize,
}

/// Linear undo/redo over serialized snapshots.
///
/// `entries[index]` is always the current state. The list is never empty.
#[derive(Clone, Debug)]
pub struct History {
    entries: Vec<String>,
    index: usize,
    limit: usize,
}

impl History {
    /// History holding only `initial`
    pub fn new(initial: String) -> Self {
        Self::with_limit(initial, HISTORY_LIMIT)
    }

    pub fn with_limit(initial: String, limit: usize) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
            limit: limit.max(1),
        }
    }

    /// Rebuild from a persisted record. Returns `None` for an inconsistent record.
    pub fn from_record(record: HistoryRecord) -> Option<Self> {
        if record.entries.is_empty() || record.index >= record.entries.len() {
            return None;
        }
        let mut history = Self {
            entries: record.entries,
            index: record.index,
            limit: HISTORY_LIMIT,
        };
        history.evict_overflow();
        Some(history)
    }

    pub fn record(&self) -> HistoryRecord {
        HistoryRecord {
            entries: self.entries.clone(),
            index: self.index,
        }
    }

    /// Push a snapshot. Returns false when it equals the current head.
    pub fn push(&mut self, snapshot: String) -> bool {
        if self.entries.get(self.index) == Some(&snapshot) {
            return false;
        }
        self.entries.truncate(self.index + 1);
        self.entries.push(snapshot);
        self.index = self.entries.len() - 1;
        self.evict_overflow();
        debug!("History: {} entries, index {}", self.entries.len(), self.index);
        true
    }

    fn evict_overflow(&mut self) {
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
            self.index = self.index.saturating_sub(excess);
        }
    }

    pub fn undo(&mut self) -> Result<&str, HistoryError> {
        if self.index == 0 {
            return Err(HistoryError::NothingToUndo);
        }
        self.index -= 1;
        Ok(&self.entries[self.index])
    }

    pub fn redo(&mut self) -> Result<&str, HistoryError> {
        if self.index + 1 >= self.entries.len() {
            return Err(HistoryError::NothingToRedo);
        }
        self.index += 1;
        Ok(&self.entries[self.index])
    }

    /// Drop everything and start over from `initial`
    pub fn clear(&mut self, initial: String) {
        self.entries.clear();
        self.entries.push(initial);
        self.index = 0;
    }

    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inconsistent_record() {
        assert!(History::from_record(HistoryRecord { entries: vec![], index: 0 }).is_none());
        assert!(History::from_record(HistoryRecord { entries: vec!["a".into()], index: 1 }).is_none());
        let restored = History::from_record(HistoryRecord { entries: vec!["a".into(), "b".into()], index: 0 }).unwrap();
        assert!(restored.can_redo());
    }

    #[test]
    fn small_limit_evicts_oldest() {
        let mut history = History::with_limit("0".into(), 3);
        for i in 1..=4 {
            history.push(i.to_string());
        }
        assert_eq!(history.entries(), ["2", "3", "4"]);
        assert_eq!(history.index(), 2);
    }
}
