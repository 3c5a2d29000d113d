//! Experience and leveling
//!
//! `level` is always derived from `xp`. Level-ups queue in `pending_level_ups`
//! and are only drained one at a time by the skill selection flow.

use serde::{Deserialize, Serialize};

/// XP needed to go from `level` to `level + 1`
pub fn xp_to_next(level: u32) -> u32 {
    5 + 5 * level
}

/// Total XP required to reach `level` (level 1 needs 0)
pub fn xp_threshold(level: u32) -> u32 {
    (1..level).map(xp_to_next).sum()
}

/// Level for a given total XP
pub fn level_from_xp(xp: u32) -> u32 {
    let mut level = 1;
    let mut needed = xp_to_next(level);
    let mut remaining = xp;
    while remaining >= needed {
        remaining -= needed;
        level += 1;
        needed = xp_to_next(level);
    }
    level
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProgress {
    pub xp: u32,
    pub level: u32,
    pending_level_ups: u32,
}

impl Default for PlayerProgress {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            pending_level_ups: 0,
        }
    }
}

impl PlayerProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at `level` with the exact XP for it (debug start level)
    pub fn at_level(level: u32) -> Self {
        let level = level.max(1);
        Self {
            xp: xp_threshold(level),
            level,
            pending_level_ups: 0,
        }
    }

    /// Add XP and return how many levels were crossed
    pub fn add_xp(&mut self, amount: u32) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        let new_level = level_from_xp(self.xp);
        let gained = new_level.saturating_sub(self.level);
        self.level = new_level;
        self.pending_level_ups += gained;
        gained
    }

    pub fn pending_level_ups(&self) -> u32 {
        self.pending_level_ups
    }

    /// Consume one pending level-up. Only the skill selection flow calls this.
    pub(crate) fn resolve_level_up(&mut self) -> bool {
        if self.pending_level_ups == 0 {
            return false;
        }
        self.pending_level_ups -= 1;
        true
    }

    /// Progress toward the next level (0-1) for the XP bar
    pub fn level_fraction(&self) -> f32 {
        let base = xp_threshold(self.level);
        let span = xp_to_next(self.level);
        (self.xp - base) as f32 / span as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_threshold_curve() {
        assert_eq!(xp_threshold(1), 0);
        assert_eq!(xp_threshold(2), 10);
        assert_eq!(xp_threshold(3), 25);
        assert_eq!(level_from_xp(9), 1);
        assert_eq!(level_from_xp(10), 2);
        assert_eq!(level_from_xp(25), 3);
    }

    #[test]
    fn test_multi_level_gain_queues_each_level() {
        let mut progress = PlayerProgress::new();
        let gained = progress.add_xp(xp_threshold(4));
        assert_eq!(gained, 3);
        assert_eq!(progress.level, 4);
        assert_eq!(progress.pending_level_ups(), 3);

        assert!(progress.resolve_level_up());
        assert_eq!(progress.pending_level_ups(), 2);
    }

    #[test]
    fn test_resolve_without_pending_is_noop() {
        let mut progress = PlayerProgress::new();
        assert!(!progress.resolve_level_up());
        assert_eq!(progress.pending_level_ups(), 0);
    }

    #[test]
    fn test_at_level_has_no_pending() {
        let progress = PlayerProgress::at_level(5);
        assert_eq!(progress.level, 5);
        assert_eq!(level_from_xp(progress.xp), 5);
        assert_eq!(progress.pending_level_ups(), 0);
        assert_eq!(progress.level_fraction(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_level_matches_xp(gains in prop::collection::vec(0u32..200, 0..30)) {
            let mut progress = PlayerProgress::new();
            let mut total = 0;
            for gain in gains {
                total += progress.add_xp(gain);
                prop_assert_eq!(progress.level, level_from_xp(progress.xp));
            }
            prop_assert_eq!(progress.pending_level_ups(), total);
            prop_assert_eq!(progress.level, 1 + total);
        }
    }
}
