//! Pooled visual emitters: floating damage numbers and impact particles
//!
//! Pure presentation state. Nothing here feeds back into gameplay.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::pool::{Pool, PoolHandle, Pooled};
use crate::{direction, ease_out_cubic, tail_fade};

/// How far a damage number floats up over its lifetime (pixels)
pub const DAMAGE_TEXT_RISE: f32 = 42.0;
pub const DAMAGE_TEXT_DURATION: f32 = 0.8;
/// Particle velocity keeps this fraction per second
const PARTICLE_DRAG_PER_SEC: f32 = 0.02;

/// A floating damage number
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DamageText {
    pub origin: Vec2,
    pub value: f32,
    pub critical: bool,
    pub timer: f32,
    pub duration: f32,
}

impl DamageText {
    /// Normalized lifetime progress (0-1)
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.timer / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Current position: rises with an ease-out curve (screen y points down)
    pub fn position(&self) -> Vec2 {
        self.origin - Vec2::new(0.0, DAMAGE_TEXT_RISE * ease_out_cubic(self.progress()))
    }

    pub fn alpha(&self) -> f32 {
        tail_fade(self.progress())
    }

    /// Crits pop larger and settle back
    pub fn scale(&self) -> f32 {
        let base = if self.critical { 1.5 } else { 1.0 };
        let punch = 0.4 * (1.0 - ease_out_cubic(self.progress() * 4.0));
        base * (1.0 + punch)
    }

    /// Display string (damage is shown rounded)
    pub fn label(&self) -> String {
        let n = self.value.round().max(1.0) as u32;
        if self.critical {
            format!("{}!", n)
        } else {
            n.to_string()
        }
    }
}

impl Pooled for DamageText {
    fn advance(&mut self, dt: f32) -> bool {
        self.timer += dt;
        self.timer < self.duration
    }
}

/// Pool of floating damage numbers
#[derive(Debug, Clone)]
pub struct FloatingDamageText {
    pool: Pool<DamageText>,
    enabled: bool,
}

impl FloatingDamageText {
    pub fn new(capacity: usize, enabled: bool) -> Self {
        Self {
            pool: Pool::new(capacity),
            enabled,
        }
    }

    pub fn spawn(&mut self, pos: Vec2, value: f32, critical: bool) -> Option<PoolHandle> {
        if !self.enabled {
            return None;
        }
        self.pool.acquire(DamageText {
            origin: pos,
            value,
            critical,
            timer: 0.0,
            duration: DAMAGE_TEXT_DURATION,
        })
    }

    pub fn update(&mut self, dt: f32) {
        self.pool.update(dt);
    }

    pub fn reset(&mut self) {
        self.pool.reset();
    }

    pub fn shift(&mut self, offset: Vec2) {
        self.pool.for_each_active_mut(|text| text.origin += offset);
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &DamageText)> {
        self.pool.iter()
    }

    pub fn pool(&self) -> &Pool<DamageText> {
        &self.pool
    }
}

/// A single impact spark
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub color: u32,
    pub timer: f32,
    pub duration: f32,
}

impl Particle {
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.timer / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn alpha(&self) -> f32 {
        tail_fade(self.progress())
    }

    /// Sparks shrink as they age
    pub fn current_size(&self) -> f32 {
        self.size * (1.0 - 0.6 * ease_out_cubic(self.progress()))
    }
}

impl Pooled for Particle {
    fn advance(&mut self, dt: f32) -> bool {
        self.pos += self.vel * dt;
        self.vel *= PARTICLE_DRAG_PER_SEC.powf(dt);
        self.timer += dt;
        self.timer < self.duration
    }
}

/// Parameters for one radial burst
#[derive(Debug, Clone, Copy)]
pub struct Burst {
    pub count: u32,
    pub speed: f32,
    pub size: f32,
    pub color: u32,
    pub duration: f32,
}

/// Pool of impact particles
#[derive(Debug, Clone)]
pub struct ImpactParticles {
    pool: Pool<Particle>,
}

impl ImpactParticles {
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: Pool::new(capacity),
        }
    }

    /// Spray `burst.count` sparks evenly around `pos` with jittered speed and angle
    pub fn burst(&mut self, pos: Vec2, burst: Burst, rng: &mut impl Rng) {
        if burst.count == 0 {
            return;
        }
        let step = std::f32::consts::TAU / burst.count as f32;
        for i in 0..burst.count {
            let theta = i as f32 * step + rng.random_range(-0.3f32..0.3) * step;
            let speed = burst.speed * rng.random_range(0.6f32..1.2);
            self.pool.acquire(Particle {
                pos,
                vel: direction(theta) * speed,
                size: burst.size * rng.random_range(0.7f32..1.3),
                color: burst.color,
                timer: 0.0,
                duration: burst.duration * rng.random_range(0.8f32..1.2),
            });
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.pool.update(dt);
    }

    pub fn reset(&mut self) {
        self.pool.reset();
    }

    pub fn shift(&mut self, offset: Vec2) {
        self.pool.for_each_active_mut(|p| p.pos += offset);
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &Particle)> {
        self.pool.iter()
    }

    pub fn pool(&self) -> &Pool<Particle> {
        &self.pool
    }
}
