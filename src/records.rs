//! Run records and cosmetic unlocks
//!
//! The scene only talks to a [`RecordSink`]: fire-and-forget calls, nothing
//! read back. [`RecordBook`] is the stock sink, persisted to LocalStorage on
//! wasm, keeping the best runs and the unlocked cosmetics.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::sim::state::{Rank, RunSummary};
use crate::sim::stats::Character;
use crate::sim::world::Stage;

/// Maximum number of runs to keep
pub const MAX_RECORDS: usize = 10;
/// Best multi-kill needed for the combo cosmetic
pub const COMBO_MASTER_THRESHOLD: u32 = 10;

/// Persistence collaborator. Calls never fail from the caller's view.
pub trait RecordSink {
    fn record_result(&mut self, record: &RunRecord);
    fn unlock(&mut self, item_id: &str);
}

/// One finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub character: Character,
    pub stage: Stage,
    pub survived_secs: f32,
    pub level: u32,
    pub kills: u32,
    pub score: u64,
    pub rank: Rank,
    pub victory: bool,
    /// Unix timestamp (ms)
    pub timestamp: f64,
}

impl RunRecord {
    pub fn from_summary(summary: &RunSummary, timestamp: f64) -> Self {
        Self {
            character: summary.character,
            stage: summary.stage,
            survived_secs: summary.survived_secs,
            level: summary.level,
            kills: summary.kills,
            score: summary.score,
            rank: summary.rank,
            victory: summary.victory,
            timestamp,
        }
    }
}

/// Cosmetic ids earned by a run
pub fn unlocks_for(summary: &RunSummary) -> Vec<String> {
    let mut items = Vec::new();
    if summary.victory {
        items.push(format!("victory-skin-{}", summary.character.as_str()));
    }
    if summary.boss_defeated {
        items.push("boss-trophy".to_string());
    }
    if summary.best_combo >= COMBO_MASTER_THRESHOLD {
        items.push("combo-master".to_string());
    }
    items
}

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Best runs (by score, descending) plus unlocked cosmetics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordBook {
    pub entries: Vec<RunRecord>,
    pub unlocked: BTreeSet<String>,
    pub runs_played: u32,
    /// Whether to write through to storage on every change
    #[serde(skip)]
    persist: bool,
}

impl RecordBook {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "physics_survivor_records";

    /// In-memory book that never touches storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a run; returns its 1-indexed place, or `None` if it missed the table
    pub fn add(&mut self, record: RunRecord) -> Option<usize> {
        let pos = self.entries.iter().position(|e| record.score > e.score);
        let place = match pos {
            Some(i) => {
                self.entries.insert(i, record);
                i + 1
            }
            None if self.entries.len() < MAX_RECORDS => {
                self.entries.push(record);
                self.entries.len()
            }
            None => return None,
        };
        self.entries.truncate(MAX_RECORDS);
        Some(place)
    }

    pub fn is_unlocked(&self, item_id: &str) -> bool {
        self.unlocked.contains(item_id)
    }

    pub fn best(&self) -> Option<&RunRecord> {
        self.entries.first()
    }

    /// Best rank reached with a character
    pub fn best_rank(&self, character: Character) -> Option<Rank> {
        self.entries
            .iter()
            .filter(|e| e.character == character)
            .map(|e| e.rank)
            .min()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Load the book from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        let mut book = match storage.and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten()) {
            Some(json) => match Self::from_json(&json) {
                Ok(book) => {
                    log::info!("Loaded {} run records", book.entries.len());
                    book
                }
                Err(e) => {
                    log::warn!("Discarding unreadable records: {}", e);
                    Self::new()
                }
            },
            None => {
                log::info!("No run records found, starting fresh");
                Self::new()
            }
        };
        book.persist = true;
        book
    }

    /// Save the book to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Run records saved ({} entries)", self.entries.len());
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

impl RecordSink for RecordBook {
    fn record_result(&mut self, record: &RunRecord) {
        self.runs_played += 1;
        if let Some(place) = self.add(record.clone()) {
            log::info!("Run placed #{} (score {})", place, record.score);
        }
        if self.persist {
            self.save();
        }
    }

    fn unlock(&mut self, item_id: &str) {
        if self.unlocked.insert(item_id.to_string()) {
            log::info!("Unlocked {}", item_id);
            if self.persist {
                self.save();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: u64) -> RunRecord {
        RunRecord {
            character: Character::Newton,
            stage: Stage::EventHorizon,
            survived_secs: 60.0,
            level: 3,
            kills: 20,
            score,
            rank: Rank::C,
            victory: false,
            timestamp: 0.0,
        }
    }

    fn summary() -> RunSummary {
        RunSummary {
            character: Character::Tesla,
            stage: Stage::CrusherPit,
            survived_secs: 600.0,
            level: 20,
            kills: 500,
            score: 9000,
            best_combo: 12,
            boss_defeated: true,
            victory: true,
            rank: Rank::S,
        }
    }

    #[test]
    fn test_table_is_sorted_and_capped() {
        let mut book = RecordBook::new();
        for score in [50, 300, 10, 200] {
            book.add(record(score));
        }
        let scores: Vec<u64> = book.entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![300, 200, 50, 10]);

        for score in 0..20 {
            book.add(record(1000 + score));
        }
        assert_eq!(book.entries.len(), MAX_RECORDS);
        assert_eq!(book.add(record(1)), None);
    }

    #[test]
    fn test_unlocks_from_summary() {
        let items = unlocks_for(&summary());
        assert_eq!(
            items,
            vec!["victory-skin-tesla", "boss-trophy", "combo-master"]
        );

        let plain = RunSummary {
            victory: false,
            boss_defeated: false,
            best_combo: 3,
            ..summary()
        };
        assert!(unlocks_for(&plain).is_empty());
    }

    #[test]
    fn test_sink_counts_runs_and_dedupes_unlocks() {
        let mut book = RecordBook::new();
        book.record_result(&RunRecord::from_summary(&summary(), 1.0));
        book.unlock("boss-trophy");
        book.unlock("boss-trophy");
        assert_eq!(book.runs_played, 1);
        assert_eq!(book.unlocked.len(), 1);
        assert_eq!(book.best_rank(Character::Tesla), Some(Rank::S));
        assert_eq!(book.best_rank(Character::Curie), None);
    }

    #[test]
    fn test_json_round_trip_keeps_unlocks() {
        let mut book = RecordBook::new();
        book.unlock("combo-master");
        let json = book.to_json().unwrap();
        let loaded = RecordBook::from_json(&json).unwrap();
        assert!(loaded.is_unlocked("combo-master"));
    }
}
