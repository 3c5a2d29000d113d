//! Gravity well field: short-lived wells that open around the player and
//! drag everything nearby

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::{GravitySource, WorldEntity};
use crate::direction;

const SPAWN_INTERVAL: f32 = 5.0;
const WELL_LIFETIME: f32 = 8.0;
const MAX_WELLS: usize = 4;
const WELL_RADIUS: f32 = 260.0;
/// Peak drift acceleration at the well's center
const WELL_STRENGTH: f32 = 140.0;
const SPAWN_MIN_DIST: f32 = 120.0;
const SPAWN_MAX_DIST: f32 = 360.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GravityWell {
    pub pos: Vec2,
    pub age: f32,
    pub lifetime: f32,
}

impl GravityWell {
    /// Fades in and out over its lifetime
    pub fn envelope(&self) -> f32 {
        let t = (self.age / self.lifetime).clamp(0.0, 1.0);
        (t * std::f32::consts::PI).sin()
    }

    pub fn drift(&self, pos: Vec2) -> Vec2 {
        let to_center = self.pos - pos;
        let dist = to_center.length();
        if dist >= WELL_RADIUS || dist < 1e-4 {
            return Vec2::ZERO;
        }
        let falloff = 1.0 - dist / WELL_RADIUS;
        to_center / dist * WELL_STRENGTH * falloff * self.envelope()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GravityWellField {
    wells: Vec<GravityWell>,
    spawn_timer: f32,
    rng: Pcg32,
    active: bool,
}

impl GravityWellField {
    pub fn new(seed: u64) -> Self {
        Self {
            wells: Vec::new(),
            spawn_timer: 0.0,
            rng: Pcg32::seed_from_u64(seed),
            active: false,
        }
    }

    /// Summed drift acceleration from every open well
    pub fn drift(&self, pos: Vec2) -> Vec2 {
        if !self.active {
            return Vec2::ZERO;
        }
        self.wells.iter().map(|w| w.drift(pos)).sum()
    }

    pub fn wells(&self) -> &[GravityWell] {
        &self.wells
    }

    fn open_well(&mut self, around: Vec2) {
        let theta = self.rng.random_range(0.0..std::f32::consts::TAU);
        let dist = self.rng.random_range(SPAWN_MIN_DIST..SPAWN_MAX_DIST);
        self.wells.push(GravityWell {
            pos: around + direction(theta) * dist,
            age: 0.0,
            lifetime: WELL_LIFETIME,
        });
    }
}

impl WorldEntity for GravityWellField {
    fn activate(&mut self, origin: Vec2) {
        self.wells.clear();
        self.active = true;
        self.spawn_timer = SPAWN_INTERVAL;
        self.open_well(origin);
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.wells.clear();
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn update(&mut self, dt: f32, player_pos: Vec2) {
        if !self.active {
            return;
        }
        for well in &mut self.wells {
            well.age += dt;
        }
        self.wells.retain(|w| w.age < w.lifetime);

        self.spawn_timer -= dt;
        if self.spawn_timer <= 0.0 {
            self.spawn_timer += SPAWN_INTERVAL;
            if self.wells.len() < MAX_WELLS {
                self.open_well(player_pos);
            }
        }
    }

    fn player_proximity_effect(&self, pos: Vec2) -> f32 {
        if !self.active {
            return 0.0;
        }
        self.wells
            .iter()
            .map(|w| (1.0 - w.pos.distance(pos) / WELL_RADIUS).max(0.0) * w.envelope())
            .fold(0.0, f32::max)
    }

    fn shift(&mut self, offset: Vec2) {
        for well in &mut self.wells {
            well.pos += offset;
        }
    }

    fn gravity_sources(&self) -> Vec<GravitySource> {
        self.wells
            .iter()
            .map(|w| GravitySource {
                pos: w.pos,
                mass: 0.5 * w.envelope(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_opens_a_well() {
        let mut field = GravityWellField::new(9);
        field.activate(Vec2::ZERO);
        assert_eq!(field.wells().len(), 1);
        let d = field.wells()[0].pos.length();
        assert!((SPAWN_MIN_DIST..SPAWN_MAX_DIST).contains(&d));
    }

    #[test]
    fn test_wells_expire_and_respawn_up_to_cap() {
        let mut field = GravityWellField::new(9);
        field.activate(Vec2::ZERO);
        for _ in 0..600 {
            field.update(0.1, Vec2::ZERO);
            assert!(field.wells().len() <= MAX_WELLS);
            assert!(field.wells().iter().all(|w| w.age < w.lifetime));
        }
        assert!(!field.wells().is_empty());
    }

    #[test]
    fn test_drift_points_into_well() {
        let well = GravityWell {
            pos: Vec2::new(100.0, 0.0),
            age: WELL_LIFETIME / 2.0,
            lifetime: WELL_LIFETIME,
        };
        let drift = well.drift(Vec2::ZERO);
        assert!(drift.x > 0.0 && drift.y.abs() < 1e-5);
        assert_eq!(well.drift(Vec2::new(1000.0, 0.0)), Vec2::ZERO);
    }

    #[test]
    fn test_deactivate_clears_wells() {
        let mut field = GravityWellField::new(9);
        field.activate(Vec2::ZERO);
        field.deactivate();
        assert!(field.wells().is_empty());
        assert_eq!(field.drift(Vec2::ZERO), Vec2::ZERO);
    }
}
