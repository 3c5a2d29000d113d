//! Black hole: inverse-square pull with a damaging event horizon

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{GravitySource, WorldEntity};

/// Gravitational parameter (G * M) in px^3/s^2
const STRENGTH: f32 = 9.0e6;
/// Softening term so the pull stays finite near the core
const SOFTENING: f32 = 2500.0;
/// Pull is capped so the player can always out-run it at base speed
const MAX_PULL: f32 = 160.0;
const INFLUENCE_RADIUS: f32 = 800.0;
const HORIZON_RADIUS: f32 = 48.0;
/// Player damage per second inside the horizon
const HORIZON_DPS: f32 = 30.0;
/// The hole drifts after the player so it never gets left behind
const DRIFT_SPEED: f32 = 18.0;
/// Spawn offset from the activation origin
const SPAWN_OFFSET: Vec2 = Vec2::new(0.0, -360.0);
/// Mass reported to the distortion filter
const FILTER_MASS: f32 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlackHole {
    pub pos: Vec2,
    active: bool,
}

impl BlackHole {
    pub fn new() -> Self {
        Self {
            pos: Vec2::ZERO,
            active: false,
        }
    }

    /// Acceleration toward the core at `pos` (zero outside the influence radius)
    pub fn pull(&self, pos: Vec2) -> Vec2 {
        if !self.active {
            return Vec2::ZERO;
        }
        let to_core = self.pos - pos;
        let dist_sq = to_core.length_squared();
        if dist_sq > INFLUENCE_RADIUS * INFLUENCE_RADIUS || dist_sq < 1e-6 {
            return Vec2::ZERO;
        }
        let magnitude = (STRENGTH / (dist_sq + SOFTENING)).min(MAX_PULL);
        to_core / dist_sq.sqrt() * magnitude
    }

    /// Damage per second for a body of `radius` at `pos`
    pub fn horizon_damage(&self, pos: Vec2, radius: f32) -> f32 {
        if self.consumes(pos, radius) {
            HORIZON_DPS
        } else {
            0.0
        }
    }

    /// True if a body touches the event horizon
    pub fn consumes(&self, pos: Vec2, radius: f32) -> bool {
        self.active && pos.distance(self.pos) < HORIZON_RADIUS + radius
    }

    pub fn horizon_radius(&self) -> f32 {
        HORIZON_RADIUS
    }
}

impl Default for BlackHole {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldEntity for BlackHole {
    fn activate(&mut self, origin: Vec2) {
        self.pos = origin + SPAWN_OFFSET;
        self.active = true;
    }

    fn deactivate(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn update(&mut self, dt: f32, player_pos: Vec2) {
        if !self.active {
            return;
        }
        let to_player = player_pos - self.pos;
        let dist = to_player.length();
        if dist > HORIZON_RADIUS {
            self.pos += to_player / dist * (DRIFT_SPEED * dt).min(dist - HORIZON_RADIUS);
        }
    }

    fn player_proximity_effect(&self, pos: Vec2) -> f32 {
        if !self.active {
            return 0.0;
        }
        (1.0 - pos.distance(self.pos) / INFLUENCE_RADIUS).clamp(0.0, 1.0)
    }

    fn shift(&mut self, offset: Vec2) {
        self.pos += offset;
    }

    fn gravity_sources(&self) -> Vec<GravitySource> {
        if !self.active {
            return Vec::new();
        }
        vec![GravitySource {
            pos: self.pos,
            mass: FILTER_MASS,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_at(pos: Vec2) -> BlackHole {
        let mut hole = BlackHole::new();
        hole.activate(pos - SPAWN_OFFSET);
        hole
    }

    #[test]
    fn test_pull_points_at_core_and_is_capped() {
        let hole = active_at(Vec2::ZERO);
        let far = hole.pull(Vec2::new(600.0, 0.0));
        assert!(far.x < 0.0 && far.y.abs() < 1e-5);
        let near = hole.pull(Vec2::new(60.0, 0.0));
        assert!(near.length() <= MAX_PULL + 1e-3);
        assert!(near.length() > far.length());
        assert_eq!(hole.pull(Vec2::new(2000.0, 0.0)), Vec2::ZERO);
    }

    #[test]
    fn test_horizon_damage_only_inside() {
        let hole = active_at(Vec2::ZERO);
        assert_eq!(hole.horizon_damage(Vec2::new(40.0, 0.0), 16.0), HORIZON_DPS);
        assert_eq!(hole.horizon_damage(Vec2::new(100.0, 0.0), 16.0), 0.0);
    }

    #[test]
    fn test_inactive_does_nothing() {
        let mut hole = active_at(Vec2::ZERO);
        hole.deactivate();
        assert_eq!(hole.pull(Vec2::new(100.0, 0.0)), Vec2::ZERO);
        assert!(!hole.consumes(Vec2::ZERO, 10.0));
        assert_eq!(hole.player_proximity_effect(Vec2::ZERO), 0.0);
        assert!(hole.gravity_sources().is_empty());
    }

    #[test]
    fn test_drifts_toward_player() {
        let mut hole = active_at(Vec2::ZERO);
        hole.update(1.0, Vec2::new(500.0, 0.0));
        assert!((hole.pos.x - DRIFT_SPEED).abs() < 1e-4);
    }
}
