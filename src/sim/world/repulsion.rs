//! Repulsion barriers: solid circular fields that bounce bodies away
//!
//! Collision is an SDF query against a union of circles; the normal comes
//! from the distance gradient.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::{GravitySource, WorldEntity};
use crate::direction;

const BARRIER_COUNT: usize = 6;
const BARRIER_MIN_RADIUS: f32 = 40.0;
const BARRIER_MAX_RADIUS: f32 = 90.0;
/// Barriers further than this from the player are moved back in front of them
const RELOCATE_DIST: f32 = 950.0;
const PLACE_MIN_DIST: f32 = 260.0;
const PLACE_MAX_DIST: f32 = 760.0;
/// Outward speed given to a body that touches a barrier
const BOUNCE_SPEED: f32 = 260.0;
/// Proximity effect range outside a barrier's surface
const PROXIMITY_RANGE: f32 = 120.0;
/// Pulse period for the barrier glow
const PULSE_SECS: f32 = 1.6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Barrier {
    pub center: Vec2,
    pub radius: f32,
}

impl Barrier {
    #[inline]
    pub fn sd(&self, p: Vec2) -> f32 {
        (p - self.center).length() - self.radius
    }
}

/// Contact with a barrier surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrierContact {
    /// Points out of the barrier
    pub normal: Vec2,
    pub penetration: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepulsionField {
    barriers: Vec<Barrier>,
    rng: Pcg32,
    pulse: f32,
    active: bool,
}

impl RepulsionField {
    pub fn new(seed: u64) -> Self {
        Self {
            barriers: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            pulse: 0.0,
            active: false,
        }
    }

    pub fn barriers(&self) -> &[Barrier] {
        &self.barriers
    }

    pub fn bounce_speed(&self) -> f32 {
        BOUNCE_SPEED
    }

    /// Glow pulse (0-1), visual only
    pub fn pulse(&self) -> f32 {
        0.5 + 0.5 * (self.pulse / PULSE_SECS * std::f32::consts::TAU).sin()
    }

    fn sd_field(&self, p: Vec2) -> f32 {
        self.barriers
            .iter()
            .map(|b| b.sd(p))
            .fold(f32::MAX, f32::min)
    }

    fn gradient(&self, p: Vec2) -> Vec2 {
        let eps = 0.5;
        let dx = self.sd_field(p + Vec2::new(eps, 0.0)) - self.sd_field(p - Vec2::new(eps, 0.0));
        let dy = self.sd_field(p + Vec2::new(0.0, eps)) - self.sd_field(p - Vec2::new(0.0, eps));
        Vec2::new(dx, dy).normalize_or_zero()
    }

    /// Contact for a body of `radius` at `pos`, if it touches any barrier
    pub fn collide(&self, pos: Vec2, radius: f32) -> Option<BarrierContact> {
        if !self.active || self.barriers.is_empty() {
            return None;
        }
        let dist = self.sd_field(pos);
        if dist >= radius {
            return None;
        }
        let mut normal = self.gradient(pos);
        if normal == Vec2::ZERO {
            // Dead center: push along +x
            normal = Vec2::X;
        }
        Some(BarrierContact {
            normal,
            penetration: radius - dist,
        })
    }

    fn place(&mut self, around: Vec2, min_dist: f32) -> Barrier {
        let theta = self.rng.random_range(0.0..std::f32::consts::TAU);
        let dist = self.rng.random_range(min_dist..PLACE_MAX_DIST);
        Barrier {
            center: around + direction(theta) * dist,
            radius: self.rng.random_range(BARRIER_MIN_RADIUS..BARRIER_MAX_RADIUS),
        }
    }
}

impl WorldEntity for RepulsionField {
    fn activate(&mut self, origin: Vec2) {
        self.barriers.clear();
        for _ in 0..BARRIER_COUNT {
            let barrier = self.place(origin, PLACE_MIN_DIST);
            self.barriers.push(barrier);
        }
        self.pulse = 0.0;
        self.active = true;
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.barriers.clear();
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn update(&mut self, dt: f32, player_pos: Vec2) {
        if !self.active {
            return;
        }
        self.pulse = (self.pulse + dt) % PULSE_SECS;
        for i in 0..self.barriers.len() {
            if self.barriers[i].center.distance(player_pos) > RELOCATE_DIST {
                self.barriers[i] = self.place(player_pos, PLACE_MIN_DIST);
            }
        }
    }

    fn player_proximity_effect(&self, pos: Vec2) -> f32 {
        if !self.active || self.barriers.is_empty() {
            return 0.0;
        }
        (1.0 - self.sd_field(pos).max(0.0) / PROXIMITY_RANGE).clamp(0.0, 1.0)
    }

    fn shift(&mut self, offset: Vec2) {
        for barrier in &mut self.barriers {
            barrier.center += offset;
        }
    }

    fn gravity_sources(&self) -> Vec<GravitySource> {
        self.barriers
            .iter()
            .map(|b| GravitySource {
                pos: b.center,
                mass: -b.radius / BARRIER_MAX_RADIUS,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_with(barriers: &[Barrier]) -> RepulsionField {
        let mut field = RepulsionField::new(1);
        field.activate(Vec2::ZERO);
        field.barriers = barriers.to_vec();
        field
    }

    #[test]
    fn test_activation_places_barriers_clear_of_origin() {
        let mut field = RepulsionField::new(4);
        field.activate(Vec2::ZERO);
        assert_eq!(field.barriers().len(), BARRIER_COUNT);
        for b in field.barriers() {
            assert!(b.sd(Vec2::ZERO) > PLACE_MIN_DIST - BARRIER_MAX_RADIUS - 1.0);
        }
    }

    #[test]
    fn test_contact_normal_points_out() {
        let field = field_with(&[Barrier {
            center: Vec2::ZERO,
            radius: 50.0,
        }]);
        let contact = field.collide(Vec2::new(60.0, 0.0), 16.0).unwrap();
        assert!((contact.normal - Vec2::X).length() < 1e-3);
        assert!((contact.penetration - 6.0).abs() < 1e-3);
        assert!(field.collide(Vec2::new(80.0, 0.0), 16.0).is_none());
    }

    #[test]
    fn test_far_barriers_relocate() {
        let mut field = field_with(&[Barrier {
            center: Vec2::ZERO,
            radius: 50.0,
        }]);
        let player = Vec2::new(3000.0, 0.0);
        field.update(0.016, player);
        assert!(field.barriers()[0].center.distance(player) <= PLACE_MAX_DIST + 1.0);
    }

    #[test]
    fn test_sources_are_repulsive() {
        let mut field = RepulsionField::new(2);
        field.activate(Vec2::ZERO);
        assert!(field.gravity_sources().iter().all(|s| s.mass < 0.0));
    }
}
