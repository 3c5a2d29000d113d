//! Multi-kill tracker
//!
//! Each kill restarts a sliding window. When the window runs out with two or
//! more kills counted, one multi-kill is reported with the peak count.

use serde::{Deserialize, Serialize};

/// Celebration tier for a reported multi-kill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComboTier {
    /// 2 kills
    Double,
    /// 3-4 kills
    Multi,
    /// 5 or more kills
    Rampage,
}

impl ComboTier {
    pub fn for_count(count: u32) -> Option<Self> {
        match count {
            0 | 1 => None,
            2 => Some(ComboTier::Double),
            3 | 4 => Some(ComboTier::Multi),
            _ => Some(ComboTier::Rampage),
        }
    }

    /// (shake intensity, shake duration)
    pub fn shake(&self) -> (f32, f32) {
        match self {
            ComboTier::Double => (2.0, 0.1),
            ComboTier::Multi => (5.0, 0.2),
            ComboTier::Rampage => (10.0, 0.35),
        }
    }

    /// Slow-motion (scale, recovery seconds) for the top tier only
    pub fn slow_motion(&self) -> Option<(f32, f32)> {
        match self {
            ComboTier::Rampage => Some((0.3, 0.8)),
            _ => None,
        }
    }
}

/// A multi-kill reported on window expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiKill {
    pub count: u32,
    pub tier: ComboTier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboTracker {
    window: f32,
    timer: f32,
    count: u32,
    best: u32,
}

impl ComboTracker {
    pub fn new(window: f32) -> Self {
        Self {
            window,
            timer: 0.0,
            count: 0,
            best: 0,
        }
    }

    pub fn register_kill(&mut self) {
        self.count += 1;
        self.timer = self.window;
    }

    /// Advance the window; returns a multi-kill when a window with 2+ kills closes
    pub fn update(&mut self, dt: f32) -> Option<MultiKill> {
        if self.count == 0 {
            return None;
        }
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }

        let count = self.count;
        self.count = 0;
        self.timer = 0.0;
        let tier = ComboTier::for_count(count)?;
        self.best = self.best.max(count);
        Some(MultiKill { count, tier })
    }

    /// Kills in the currently open window
    pub fn current(&self) -> u32 {
        self.count
    }

    /// Largest multi-kill reported this run
    pub fn best(&self) -> u32 {
        self.best
    }

    pub fn reset(&mut self) {
        self.timer = 0.0;
        self.count = 0;
        self.best = 0;
    }
}
