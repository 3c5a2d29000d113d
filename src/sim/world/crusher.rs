//! Crusher: two rotating arc jaws that close in on the spot the player stood
//! on when the cycle started
//!
//! Jaws are thick arc bands around the crusher center. A body overlapping a
//! band is pushed out on whichever side it is on, and takes damage while the
//! jaws are closing or holding.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{GravitySource, WorldEntity};
use crate::normalize_angle;

const OPEN_RADIUS: f32 = 340.0;
const CLOSED_RADIUS: f32 = 70.0;
const JAW_THICKNESS: f32 = 28.0;
/// Angular span of each jaw (radians)
const JAW_SPAN: f32 = 1.9;
/// Jaw rotation speed (rad/s)
const SPIN: f32 = 0.6;
/// Damage per second to a body caught by a closing jaw
const JAW_DPS: f32 = 40.0;
/// Enemies take more than the player
pub const ENEMY_DAMAGE_FACTOR: f32 = 2.5;

const OPEN_SECS: f32 = 2.5;
const CLOSING_SECS: f32 = 1.5;
const HOLD_SECS: f32 = 0.5;
const RETRACT_SECS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrusherPhase {
    Open,
    Closing,
    Hold,
    Retract,
}

impl CrusherPhase {
    fn duration(self) -> f32 {
        match self {
            CrusherPhase::Open => OPEN_SECS,
            CrusherPhase::Closing => CLOSING_SECS,
            CrusherPhase::Hold => HOLD_SECS,
            CrusherPhase::Retract => RETRACT_SECS,
        }
    }

    fn next(self) -> Self {
        match self {
            CrusherPhase::Open => CrusherPhase::Closing,
            CrusherPhase::Closing => CrusherPhase::Hold,
            CrusherPhase::Hold => CrusherPhase::Retract,
            CrusherPhase::Retract => CrusherPhase::Open,
        }
    }

    /// Jaws hurt only while pressing in
    pub fn is_dangerous(self) -> bool {
        matches!(self, CrusherPhase::Closing | CrusherPhase::Hold)
    }
}

/// Angular extent of one jaw; handles wraparound at ±π
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JawArc {
    pub theta_start: f32,
    pub span: f32,
}

impl JawArc {
    pub fn contains_angle(&self, theta: f32) -> bool {
        let mut offset = normalize_angle(theta - self.theta_start);
        if offset < 0.0 {
            offset += std::f32::consts::TAU;
        }
        offset <= self.span
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crusher {
    pub center: Vec2,
    phase: CrusherPhase,
    phase_timer: f32,
    rotation: f32,
    active: bool,
}

impl Crusher {
    pub fn new() -> Self {
        Self {
            center: Vec2::ZERO,
            phase: CrusherPhase::Open,
            phase_timer: 0.0,
            rotation: 0.0,
            active: false,
        }
    }

    pub fn phase(&self) -> CrusherPhase {
        self.phase
    }

    /// Current centerline radius of both jaws
    pub fn radius(&self) -> f32 {
        let t = (self.phase_timer / self.phase.duration()).clamp(0.0, 1.0);
        match self.phase {
            CrusherPhase::Open => OPEN_RADIUS,
            CrusherPhase::Closing => OPEN_RADIUS + (CLOSED_RADIUS - OPEN_RADIUS) * t,
            CrusherPhase::Hold => CLOSED_RADIUS,
            CrusherPhase::Retract => CLOSED_RADIUS + (OPEN_RADIUS - CLOSED_RADIUS) * t,
        }
    }

    pub fn jaws(&self) -> [JawArc; 2] {
        let first = normalize_angle(self.rotation);
        let second = normalize_angle(self.rotation + std::f32::consts::PI);
        [
            JawArc {
                theta_start: first,
                span: JAW_SPAN,
            },
            JawArc {
                theta_start: second,
                span: JAW_SPAN,
            },
        ]
    }

    /// Push-out vector and damage per second for a body caught by a jaw
    pub fn press(&self, pos: Vec2, radius: f32) -> Option<(Vec2, f32)> {
        if !self.active {
            return None;
        }
        let local = pos - self.center;
        let r = local.length();
        let theta = local.y.atan2(local.x);
        if !self.jaws().iter().any(|jaw| jaw.contains_angle(theta)) {
            return None;
        }

        let band = self.radius();
        let half = JAW_THICKNESS / 2.0;
        let gap = (r - band).abs() - half;
        if gap >= radius {
            return None;
        }

        let outward = if r > 1e-4 { local / r } else { Vec2::X };
        let penetration = radius - gap;
        // Push to the side of the band the body is on
        let push = if r >= band {
            outward * penetration
        } else {
            -outward * penetration
        };
        let dps = if self.phase.is_dangerous() { JAW_DPS } else { 0.0 };
        Some((push, dps))
    }
}

impl Default for Crusher {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldEntity for Crusher {
    fn activate(&mut self, origin: Vec2) {
        self.center = origin;
        self.phase = CrusherPhase::Open;
        self.phase_timer = 0.0;
        self.rotation = 0.0;
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
        self.rotation = normalize_angle(self.rotation + SPIN * dt);
        self.phase_timer += dt;
        while self.phase_timer >= self.phase.duration() {
            self.phase_timer -= self.phase.duration();
            self.phase = self.phase.next();
            if self.phase == CrusherPhase::Open {
                // New cycle closes on wherever the player is now
                self.center = player_pos;
            }
        }
    }

    fn player_proximity_effect(&self, pos: Vec2) -> f32 {
        if !self.active || !self.phase.is_dangerous() {
            return 0.0;
        }
        let gap = ((pos - self.center).length() - self.radius()).abs();
        (1.0 - gap / OPEN_RADIUS).clamp(0.0, 1.0)
    }

    fn shift(&mut self, offset: Vec2) {
        self.center += offset;
    }

    fn gravity_sources(&self) -> Vec<GravitySource> {
        Vec::new()
    }
}
