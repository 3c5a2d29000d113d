//! Physics Survivor - a top-down wave survival shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player, enemies, projectiles, stage gimmicks, leveling)
//! - `render`: Visual handle seam and shader filter uniforms
//! - `settings`: Player preferences and the explicit debug configuration
//! - `records`: Persistence sink for run results and cosmetic unlocks

pub mod records;
pub mod render;
pub mod settings;
pub mod sim;

pub use records::{RecordBook, RecordSink, RunRecord};
pub use settings::{DebugConfig, QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Reference frame time the tuning values were authored against (60 Hz)
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Largest raw frame delta accepted (tab switches, debugger pauses)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 16.0;
    pub const PLAYER_BASE_SPEED: f32 = 220.0;
    pub const PLAYER_BASE_HEALTH: f32 = 100.0;
    /// Invulnerability after taking contact damage (seconds)
    pub const PLAYER_INVULN_SECS: f32 = 0.5;
    /// External velocity keeps this fraction per second (exponential decay)
    pub const EXTERNAL_VELOCITY_RETAIN_PER_SEC: f32 = 0.05;

    /// When |x| or |y| of the player passes this, the whole world is re-centered
    pub const WORLD_RESET_THRESHOLD: f32 = 5000.0;

    /// Projectile defaults
    pub const PROJECTILE_BASE_DAMAGE: f32 = 10.0;
    pub const PROJECTILE_BASE_SPEED: f32 = 480.0;
    pub const PROJECTILE_RADIUS: f32 = 6.0;
    pub const PROJECTILE_MAX_RANGE: f32 = 900.0;
    /// Seconds between volleys at fire rate multiplier 1.0
    pub const FIRE_INTERVAL_SECS: f32 = 0.6;
    /// Projectiles further than this from the camera are dropped
    pub const PROJECTILE_WORLD_BOUNDS: f32 = 1400.0;
    /// Base knockback impulse applied to a unit-mass enemy
    pub const KNOCKBACK_BASE: f32 = 160.0;

    /// Enemies spawn on this ring around the player
    pub const SPAWN_RADIUS: f32 = 620.0;
    /// Enemies further than this from the camera are forgotten
    pub const DESPAWN_RADIUS: f32 = 1400.0;
    /// Seconds between spawn batches at t = 0
    pub const SPAWN_INTERVAL_START: f32 = 1.2;
    /// Lower bound for the spawn interval
    pub const SPAWN_INTERVAL_MIN: f32 = 0.25;
    /// Soft cap on live enemies
    pub const MAX_ENEMIES: usize = 300;

    /// Center distance under which two eligible enemies merge
    pub const MERGE_RADIUS: f32 = 14.0;
    /// Enemies younger than this never merge, so a fresh spawn batch landing
    /// in a clump does not fuse into a large enemy on its first frame
    pub const MERGE_GRACE_SECS: f32 = 0.75;
    /// Fraction of overlap resolved per separation pass
    pub const SEPARATION_STRENGTH: f32 = 0.5;

    /// XP orbs
    pub const ORB_RADIUS: f32 = 6.0;
    pub const ORB_BASE_MAGNET_RADIUS: f32 = 80.0;
    pub const ORB_ATTRACT_SPEED: f32 = 420.0;

    /// Combo window (seconds)
    pub const COMBO_WINDOW_SECS: f32 = 1.0;

    /// Run timeline (seconds of adjusted game time)
    pub const BOSS_SPAWN_TIME: f32 = 300.0;
    pub const BOSS_ANNOUNCE_DELAY: f32 = 3.0;
    pub const VICTORY_TIME: f32 = 600.0;
    /// Opening sequence length before play starts
    pub const OPENING_SECS: f32 = 2.0;
    /// Delay between game over / victory and the result screen
    pub const RESULT_DELAY_SECS: f32 = 2.0;

    /// Pool capacities
    pub const DAMAGE_TEXT_CAPACITY: usize = 64;
    pub const PARTICLE_CAPACITY: usize = 256;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector pointing at `theta`
#[inline]
pub fn direction(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Angle of a vector (radians)
#[inline]
pub fn heading(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Ease-out cubic: `1 - (1 - t)^3`
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

/// Alpha that stays at 1 and fades linearly over the last 30% of a lifetime
#[inline]
pub fn tail_fade(t: f32) -> f32 {
    const FADE_START: f32 = 0.7;
    if t <= FADE_START {
        1.0
    } else {
        (1.0 - (t - FADE_START) / (1.0 - FADE_START)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_angle_wraps() {
        use std::f32::consts::PI;
        assert!((normalize_angle(3.0 * PI) - (-PI)).abs() < 1e-4);
        assert!((normalize_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_ease_and_fade_curves() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!(ease_out_cubic(0.5) > 0.5);

        assert_eq!(tail_fade(0.5), 1.0);
        assert!((tail_fade(0.85) - 0.5).abs() < 1e-4);
        assert_eq!(tail_fade(1.0), 0.0);
    }
}
