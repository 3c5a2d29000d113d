//! Game events for the host (sound cues, UI screens, announcements)
//!
//! The scene pushes events while it updates; the host drains the queue once
//! per frame. Each event is delivered exactly once.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::combo::ComboTier;
use super::enemy::EnemyTier;
use super::skills::SkillId;
use super::state::{RunSummary, ScenePhase};
use super::world::Stage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged { from: ScenePhase, to: ScenePhase },
    RunStarted { stage: Stage },
    EnemyHit { pos: Vec2, damage: f32, critical: bool },
    EnemyKilled { id: u32, pos: Vec2, tier: EnemyTier },
    EnemiesMerged { id: u32, pos: Vec2, tier: EnemyTier },
    Explosion { pos: Vec2, radius: f32 },
    PlayerHurt { amount: f32, health: f32 },
    XpCollected { amount: u32 },
    LevelUp { level: u32 },
    /// One skill choice screen; shown once per pending level-up
    SkillOffer { options: Vec<SkillId> },
    SkillChosen { id: SkillId, level: u32 },
    MultiKill { count: u32, tier: ComboTier },
    BossIncoming,
    BossSpawned { id: u32 },
    BossDefeated,
    WorldRecentered { offset: Vec2 },
    RunEnded { summary: RunSummary },
}

#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take everything queued since the last drain
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_delivers_once() {
        let mut queue = EventQueue::new();
        queue.push(GameEvent::BossIncoming);
        queue.push(GameEvent::LevelUp { level: 2 });
        assert_eq!(queue.len(), 2);
        let drained = queue.drain();
        assert_eq!(drained[0], GameEvent::BossIncoming);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }
}
