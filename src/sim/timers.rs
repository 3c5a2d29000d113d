//! Deferred actions counted down on the frame clock
//!
//! Nothing here reads a wall clock. The owner advances the queue with the
//! delta it wants the delays measured in, and a torn-down owner gets nothing
//! back.

use serde::{Deserialize, Serialize};

/// What to do when a timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledAction {
    /// Boss arrives after its announcement
    SpawnBoss,
    /// Move from game over / victory to the result screen
    ShowResult,
    /// Remove an explosion ring record
    ExpireExplosion(u32),
    /// Opening sequence done, start playing
    EndOpening,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct DeferredTimer {
    remaining: f32,
    action: ScheduledAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerQueue {
    timers: Vec<DeferredTimer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, delay: f32, action: ScheduledAction) {
        self.timers.push(DeferredTimer {
            remaining: delay.max(0.0),
            action,
        });
    }

    /// Count down and return due actions in scheduling order.
    /// With `destroyed` set, pending timers are dropped without firing.
    pub fn update(&mut self, dt: f32, destroyed: bool) -> Vec<ScheduledAction> {
        if destroyed {
            if !self.timers.is_empty() {
                log::warn!("Dropping {} timers on a torn-down scene", self.timers.len());
                self.timers.clear();
            }
            return Vec::new();
        }

        let mut due = Vec::new();
        for timer in &mut self.timers {
            timer.remaining -= dt;
            if timer.remaining <= 0.0 {
                due.push(timer.action);
            }
        }
        self.timers.retain(|t| t.remaining > 0.0);
        due
    }

    pub fn is_pending(&self, action: ScheduledAction) -> bool {
        self.timers.iter().any(|t| t.action == action)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }
}
