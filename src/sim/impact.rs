//! Hit-stop, time scale and impact feedback
//!
//! Every frame the raw delta goes through [`ImpactController::update`], which
//! returns the delta the gameplay systems are allowed to consume. Cosmetic
//! feedback (flash, shake, scale punch, particles) always runs on the raw delta
//! so it keeps animating while gameplay is frozen.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::effects::{Burst, ImpactParticles};

/// Kinds of impact, each a single bundled audiovisual event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImpactKind {
    Hit,
    CriticalHit,
    Kill,
    Explosion,
    Merge,
    PlayerHurt,
    LevelUp,
    BossSpawn,
    BossKill,
}

/// Per-kind feedback table entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactConfig {
    pub hitstop_frames: u32,
    pub flash_color: u32,
    pub flash_alpha: f32,
    pub flash_duration: f32,
    pub particle_count: u32,
    pub particle_speed: f32,
    pub particle_size: f32,
    pub shake_intensity: f32,
    pub shake_duration: f32,
}

impl ImpactKind {
    pub fn config(self) -> ImpactConfig {
        match self {
            ImpactKind::Hit => ImpactConfig {
                hitstop_frames: 0,
                flash_color: 0xffffff,
                flash_alpha: 0.0,
                flash_duration: 0.0,
                particle_count: 4,
                particle_speed: 120.0,
                particle_size: 3.0,
                shake_intensity: 0.0,
                shake_duration: 0.0,
            },
            ImpactKind::CriticalHit => ImpactConfig {
                hitstop_frames: 2,
                flash_color: 0xffe066,
                flash_alpha: 0.08,
                flash_duration: 0.08,
                particle_count: 8,
                particle_speed: 180.0,
                particle_size: 4.0,
                shake_intensity: 2.0,
                shake_duration: 0.1,
            },
            ImpactKind::Kill => ImpactConfig {
                hitstop_frames: 1,
                flash_color: 0xffffff,
                flash_alpha: 0.0,
                flash_duration: 0.0,
                particle_count: 10,
                particle_speed: 200.0,
                particle_size: 4.0,
                shake_intensity: 1.5,
                shake_duration: 0.1,
            },
            ImpactKind::Explosion => ImpactConfig {
                hitstop_frames: 3,
                flash_color: 0xff8844,
                flash_alpha: 0.15,
                flash_duration: 0.15,
                particle_count: 18,
                particle_speed: 320.0,
                particle_size: 5.0,
                shake_intensity: 5.0,
                shake_duration: 0.2,
            },
            ImpactKind::Merge => ImpactConfig {
                hitstop_frames: 0,
                flash_color: 0xaa66ff,
                flash_alpha: 0.0,
                flash_duration: 0.0,
                particle_count: 12,
                particle_speed: 160.0,
                particle_size: 4.0,
                shake_intensity: 1.0,
                shake_duration: 0.1,
            },
            ImpactKind::PlayerHurt => ImpactConfig {
                hitstop_frames: 4,
                flash_color: 0xff2222,
                flash_alpha: 0.3,
                flash_duration: 0.25,
                particle_count: 8,
                particle_speed: 150.0,
                particle_size: 4.0,
                shake_intensity: 6.0,
                shake_duration: 0.25,
            },
            ImpactKind::LevelUp => ImpactConfig {
                hitstop_frames: 0,
                flash_color: 0x66ffcc,
                flash_alpha: 0.25,
                flash_duration: 0.4,
                particle_count: 24,
                particle_speed: 260.0,
                particle_size: 5.0,
                shake_intensity: 0.0,
                shake_duration: 0.0,
            },
            ImpactKind::BossSpawn => ImpactConfig {
                hitstop_frames: 6,
                flash_color: 0xff0044,
                flash_alpha: 0.35,
                flash_duration: 0.6,
                particle_count: 32,
                particle_speed: 360.0,
                particle_size: 6.0,
                shake_intensity: 12.0,
                shake_duration: 0.6,
            },
            ImpactKind::BossKill => ImpactConfig {
                hitstop_frames: 10,
                flash_color: 0xffffff,
                flash_alpha: 0.6,
                flash_duration: 0.8,
                particle_count: 48,
                particle_speed: 420.0,
                particle_size: 7.0,
                shake_intensity: 16.0,
                shake_duration: 0.8,
            },
        }
    }
}

/// Full-screen color flash
#[derive(Debug, Clone, Copy, Default)]
pub struct Flash {
    pub color: u32,
    peak_alpha: f32,
    remaining: f32,
    duration: f32,
}

impl Flash {
    pub fn alpha(&self) -> f32 {
        if self.duration <= 0.0 {
            0.0
        } else {
            self.peak_alpha * (self.remaining / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Never weakens a flash already in flight
    pub fn trigger(&mut self, color: u32, alpha: f32, duration: f32) {
        if alpha <= 0.0 || duration <= 0.0 {
            return;
        }
        let current = self.alpha();
        if alpha >= current {
            self.color = color;
        }
        self.peak_alpha = alpha.max(current);
        self.duration = duration.max(self.remaining);
        self.remaining = self.duration;
    }

    pub fn update(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }
}

/// Camera shake with a max-of-in-flight policy
#[derive(Debug, Clone, Copy, Default)]
pub struct ScreenShake {
    intensity: f32,
    remaining: f32,
    duration: f32,
    time: f32,
}

impl ScreenShake {
    /// Current shake amplitude (pixels), decaying linearly
    pub fn magnitude(&self) -> f32 {
        if self.duration <= 0.0 {
            0.0
        } else {
            self.intensity * (self.remaining / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn add(&mut self, intensity: f32, duration: f32) {
        if intensity <= 0.0 || duration <= 0.0 {
            return;
        }
        self.intensity = intensity.max(self.magnitude());
        self.duration = duration.max(self.remaining);
        self.remaining = self.duration;
    }

    pub fn update(&mut self, dt: f32) {
        self.time += dt;
        self.remaining = (self.remaining - dt).max(0.0);
    }

    /// Camera offset for this frame
    pub fn offset(&self) -> Vec2 {
        let m = self.magnitude();
        if m <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new((self.time * 83.0).sin(), (self.time * 67.0).cos()) * m
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }
}

/// Time scale with an optional linear transition toward a target
#[derive(Debug, Clone, Copy)]
pub struct TimeScale {
    current: f32,
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

impl Default for TimeScale {
    fn default() -> Self {
        Self {
            current: 1.0,
            from: 1.0,
            to: 1.0,
            elapsed: 0.0,
            duration: 0.0,
        }
    }
}

impl TimeScale {
    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn is_transitioning(&self) -> bool {
        self.elapsed < self.duration
    }

    /// Drop to `scale` at once and recover to 1.0 over `recover_secs`.
    /// A deeper or longer slow-motion in flight is kept.
    pub fn slow_motion(&mut self, scale: f32, recover_secs: f32) {
        let remaining = (self.duration - self.elapsed).max(0.0);
        self.current = self.current.min(scale);
        self.from = self.current;
        self.to = 1.0;
        self.elapsed = 0.0;
        self.duration = recover_secs.max(remaining);
    }

    pub fn update(&mut self, dt: f32) {
        if !self.is_transitioning() {
            return;
        }
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = if self.duration > 0.0 {
            self.elapsed / self.duration
        } else {
            1.0
        };
        self.current = self.from + (self.to - self.from) * t;
    }
}

/// Converts raw frame delta into gameplay delta and owns the impact feedback
#[derive(Debug, Clone)]
pub struct ImpactController {
    hitstop_frames: u32,
    time_scale: TimeScale,
    flash: Flash,
    shake: ScreenShake,
    /// Player sprite scale punch (0 = rest)
    punch: f32,
    particles: ImpactParticles,
    shake_enabled: bool,
    rng: Pcg32,
}

impl ImpactController {
    pub fn new(particle_capacity: usize, shake_enabled: bool, seed: u64) -> Self {
        Self {
            hitstop_frames: 0,
            time_scale: TimeScale::default(),
            flash: Flash::default(),
            shake: ScreenShake::default(),
            punch: 0.0,
            particles: ImpactParticles::new(particle_capacity),
            shake_enabled,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Advance one frame. Returns the gameplay delta: 0 while hit-stop is
    /// active, otherwise `raw_dt` scaled by the current time scale.
    pub fn update(&mut self, raw_dt: f32) -> f32 {
        self.update_cosmetic(raw_dt);

        if self.hitstop_frames > 0 {
            self.hitstop_frames -= 1;
            return 0.0;
        }

        self.time_scale.update(raw_dt);
        raw_dt * self.time_scale.current()
    }

    /// Cosmetic-only advance (used on screens where gameplay is not running)
    pub fn update_cosmetic(&mut self, raw_dt: f32) {
        self.particles.update(raw_dt);
        self.flash.update(raw_dt);
        self.shake.update(raw_dt);
        self.punch = (self.punch - raw_dt * 4.0).max(0.0);
    }

    /// Apply the whole feedback bundle for `kind` at `pos`
    pub fn trigger(&mut self, kind: ImpactKind, pos: Vec2) {
        let cfg = kind.config();
        self.hitstop_frames = self.hitstop_frames.max(cfg.hitstop_frames);
        self.flash
            .trigger(cfg.flash_color, cfg.flash_alpha, cfg.flash_duration);
        self.particles.burst(
            pos,
            Burst {
                count: cfg.particle_count,
                speed: cfg.particle_speed,
                size: cfg.particle_size,
                color: cfg.flash_color,
                duration: 0.45,
            },
            &mut self.rng,
        );
        self.shake(cfg.shake_intensity, cfg.shake_duration);
        if matches!(kind, ImpactKind::PlayerHurt | ImpactKind::LevelUp) {
            self.punch = self.punch.max(1.0);
        }
    }

    pub fn shake(&mut self, intensity: f32, duration: f32) {
        if self.shake_enabled {
            self.shake.add(intensity, duration);
        }
    }

    pub fn slow_motion(&mut self, scale: f32, recover_secs: f32) {
        self.time_scale.slow_motion(scale, recover_secs);
    }

    /// Clear all in-flight feedback (restart)
    pub fn reset(&mut self) {
        self.hitstop_frames = 0;
        self.time_scale = TimeScale::default();
        self.flash = Flash::default();
        self.shake = ScreenShake::default();
        self.punch = 0.0;
        self.particles.reset();
    }

    pub fn shift(&mut self, offset: Vec2) {
        self.particles.shift(offset);
    }

    pub fn hitstop_frames(&self) -> u32 {
        self.hitstop_frames
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale.current()
    }

    pub fn flash(&self) -> &Flash {
        &self.flash
    }

    pub fn shake_offset(&self) -> Vec2 {
        self.shake.offset()
    }

    pub fn shake_magnitude(&self) -> f32 {
        self.shake.magnitude()
    }

    /// Player sprite scale multiplier
    pub fn punch_scale(&self) -> f32 {
        1.0 + 0.25 * self.punch
    }

    pub fn particles(&self) -> &ImpactParticles {
        &self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_hitstop_freezes_gameplay_delta() {
        let mut ctl = ImpactController::new(64, true, 1);
        ctl.trigger(ImpactKind::Explosion, Vec2::ZERO);
        let frames = ImpactKind::Explosion.config().hitstop_frames;

        for _ in 0..frames {
            assert_eq!(ctl.update(DT), 0.0);
        }
        assert_eq!(ctl.update(DT), DT);
    }

    #[test]
    fn test_cosmetics_advance_during_hitstop() {
        let mut ctl = ImpactController::new(64, true, 1);
        ctl.trigger(ImpactKind::BossKill, Vec2::ZERO);
        let alpha_before = ctl.flash().alpha();
        let shake_before = ctl.shake_magnitude();

        assert_eq!(ctl.update(DT), 0.0);
        assert!(ctl.flash().alpha() < alpha_before);
        assert!(ctl.shake_magnitude() < shake_before);
    }

    #[test]
    fn test_retrigger_takes_max() {
        let mut ctl = ImpactController::new(64, true, 1);
        ctl.trigger(ImpactKind::BossKill, Vec2::ZERO);
        let big = ctl.hitstop_frames();
        let shake = ctl.shake_magnitude();

        ctl.trigger(ImpactKind::Hit, Vec2::ZERO);
        assert_eq!(ctl.hitstop_frames(), big);
        assert_eq!(ctl.shake_magnitude(), shake);
        assert!(ctl.flash().alpha() > 0.5);
    }

    #[test]
    fn test_shake_disabled_by_settings() {
        let mut ctl = ImpactController::new(64, false, 1);
        ctl.trigger(ImpactKind::Explosion, Vec2::ZERO);
        assert_eq!(ctl.shake_magnitude(), 0.0);
        assert_eq!(ctl.shake_offset(), Vec2::ZERO);
    }

    #[test]
    fn test_slow_motion_recovers_linearly() {
        let mut ctl = ImpactController::new(8, true, 1);
        ctl.slow_motion(0.2, 1.0);

        let first = ctl.update(0.5);
        // Half way through recovery: 0.2 + (1.0 - 0.2) * 0.5
        assert!((first - 0.5 * 0.6).abs() < 1e-5);

        ctl.update(0.5);
        assert!((ctl.time_scale() - 1.0).abs() < 1e-6);
        assert_eq!(ctl.update(DT), DT);
    }

    #[test]
    fn test_slow_motion_keeps_deeper_scale() {
        let mut scale = TimeScale::default();
        scale.slow_motion(0.2, 2.0);
        scale.slow_motion(0.5, 0.5);
        assert_eq!(scale.current(), 0.2);
        assert!(scale.is_transitioning());
    }

    #[test]
    fn test_reset_clears_feedback() {
        let mut ctl = ImpactController::new(64, true, 1);
        ctl.trigger(ImpactKind::PlayerHurt, Vec2::ZERO);
        ctl.reset();
        assert_eq!(ctl.hitstop_frames(), 0);
        assert_eq!(ctl.flash().alpha(), 0.0);
        assert_eq!(ctl.particles().pool().active_len(), 0);
    }
}
