//! Run state and scene phases
//!
//! `RunState` holds everything one run owns. It is rebuilt from scratch on
//! every new run; nothing carries over except what the scene hands in.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::combo::ComboTracker;
use super::effects::FloatingDamageText;
use super::enemy::{EnemySystem, MergeRules};
use super::impact::ImpactController;
use super::orbs::OrbField;
use super::progress::PlayerProgress;
use super::projectile::ProjectileSystem;
use super::skills::SkillBook;
use super::stats::{Character, PlayerStats, recalculate_stats};
use super::timers::TimerQueue;
use super::world::{Stage, StageWorld};
use crate::consts::*;
use crate::settings::{DebugConfig, Settings};

/// Top-level scene phase. `Paused` is only entered from and left to `Playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenePhase {
    CharacterSelect,
    StageSelect,
    /// Stage intro before control is handed over
    Opening,
    Playing,
    /// Waiting for the player to pick a skill
    SkillSelection,
    Paused,
    GameOver,
    Victory,
    /// Result screen, waiting for retry
    Result,
}

impl ScenePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenePhase::CharacterSelect => "character-select",
            ScenePhase::StageSelect => "stage-select",
            ScenePhase::Opening => "opening",
            ScenePhase::Playing => "playing",
            ScenePhase::SkillSelection => "skill-selection",
            ScenePhase::Paused => "paused",
            ScenePhase::GameOver => "game-over",
            ScenePhase::Victory => "victory",
            ScenePhase::Result => "result",
        }
    }

    /// Only `Playing` runs the simulation pipeline
    pub fn is_simulating(&self) -> bool {
        matches!(self, ScenePhase::Playing)
    }

    /// Phases that belong to an in-progress run
    pub fn in_run(&self) -> bool {
        matches!(
            self,
            ScenePhase::Opening
                | ScenePhase::Playing
                | ScenePhase::SkillSelection
                | ScenePhase::Paused
                | ScenePhase::GameOver
                | ScenePhase::Victory
        )
    }
}

/// Normalized joystick sample, polled once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Joystick {
    /// Direction, components in [-1, 1]
    pub dir: Vec2,
    /// Deflection in [0, 1]
    pub magnitude: f32,
    pub active: bool,
}

impl Joystick {
    pub fn toward(dir: Vec2) -> Self {
        Self {
            dir: dir.normalize_or_zero(),
            magnitude: 1.0,
            active: dir != Vec2::ZERO,
        }
    }

    /// Velocity requested at `speed`
    pub fn velocity(&self, speed: f32) -> Vec2 {
        if !self.active {
            return Vec2::ZERO;
        }
        self.dir.clamp_length_max(1.0) * self.magnitude.clamp(0.0, 1.0) * speed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Joystick-driven velocity this frame
    pub input_vel: Vec2,
    /// Velocity from stage forces and bounces; decays exponentially
    pub external_vel: Vec2,
    /// Last movement direction (aim fallback)
    pub facing: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub invuln_timer: f32,
    pub fire_cooldown: f32,
}

impl Player {
    pub fn new(max_health: f32) -> Self {
        Self {
            pos: Vec2::ZERO,
            input_vel: Vec2::ZERO,
            external_vel: Vec2::ZERO,
            facing: Vec2::X,
            health: max_health,
            max_health,
            invuln_timer: 0.0,
            fire_cooldown: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invuln_timer > 0.0
    }

    /// Joystick + external velocity integration
    pub fn step(&mut self, dt: f32, joystick: &Joystick, speed: f32) {
        self.input_vel = joystick.velocity(speed);
        if self.input_vel != Vec2::ZERO {
            self.facing = self.input_vel.normalize();
        }
        self.pos += (self.input_vel + self.external_vel) * dt;
        self.external_vel *= EXTERNAL_VELOCITY_RETAIN_PER_SEC.powf(dt);
        self.invuln_timer = (self.invuln_timer - dt).max(0.0);
    }

    /// Apply damage after reduction; returns the amount taken
    pub fn take_damage(&mut self, raw: f32, reduction: f32) -> f32 {
        let amount = raw * (1.0 - reduction.clamp(0.0, 1.0));
        self.health = (self.health - amount).max(0.0);
        amount
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Raise or lower max health; a raise also heals by the difference
    pub fn set_max_health(&mut self, max_health: f32) {
        let gained = max_health - self.max_health;
        self.max_health = max_health.max(1.0);
        if gained > 0.0 {
            self.health += gained;
        }
        self.health = self.health.min(self.max_health);
    }
}

/// Expanding explosion ring, removed by a deferred timer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub age: f32,
}

/// Lifetime of an explosion ring record
pub const EXPLOSION_RING_SECS: f32 = 0.35;

/// Run rank shown on the result screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    S,
    A,
    B,
    C,
}

impl Rank {
    pub fn evaluate(survived_secs: f32, kills: u32, victory: bool) -> Self {
        if victory && kills >= 400 {
            Rank::S
        } else if victory || survived_secs >= 450.0 {
            Rank::A
        } else if survived_secs >= 180.0 || kills >= 200 {
            Rank::B
        } else {
            Rank::C
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::S => "S",
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
        }
    }
}

/// End-of-run numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub character: Character,
    pub stage: Stage,
    pub survived_secs: f32,
    pub level: u32,
    pub kills: u32,
    pub score: u64,
    pub best_combo: u32,
    pub boss_defeated: bool,
    pub victory: bool,
    pub rank: Rank,
}

/// Everything one run owns
#[derive(Debug, Clone)]
pub struct RunState {
    pub character: Character,
    pub stage: Stage,
    pub rng: Pcg32,
    pub player: Player,
    /// Mirrors the player every frame
    pub camera: Vec2,
    pub stats: PlayerStats,
    pub skills: SkillBook,
    pub progress: PlayerProgress,
    pub enemies: EnemySystem,
    pub projectiles: ProjectileSystem,
    pub orbs: OrbField,
    pub world: StageWorld,
    pub combo: ComboTracker,
    pub impact: ImpactController,
    pub damage_text: FloatingDamageText,
    /// Timers on the gameplay clock
    pub timers: TimerQueue,
    pub explosions: Vec<Explosion>,
    next_explosion_id: u32,
    /// Adjusted gameplay seconds
    pub game_time: f32,
    /// Raw seconds, drives idle animation only
    pub anim_time: f32,
    pub spawn_timer: f32,
    pub kills: u32,
    pub score: u64,
    pub boss_announced: bool,
    pub boss_id: Option<u32>,
    pub boss_defeated: bool,
    pub recenter_count: u32,
    /// Stage distortion strength for the filters
    pub proximity: f32,
}

impl RunState {
    pub fn new(
        character: Character,
        stage: Stage,
        settings: &Settings,
        debug: &DebugConfig,
    ) -> Self {
        let seed = debug.seed;
        let progress = PlayerProgress::at_level(debug.start_level);
        let stats = recalculate_stats(character, &[], progress.level);
        let mut world = StageWorld::new(seed ^ 0x5747);
        world.select(stage, Vec2::ZERO);

        Self {
            character,
            stage,
            rng: Pcg32::seed_from_u64(seed),
            player: Player::new(PLAYER_BASE_HEALTH + stats.max_health_bonus),
            camera: Vec2::ZERO,
            stats,
            skills: SkillBook::new(),
            progress,
            enemies: EnemySystem::new(MergeRules::default()),
            projectiles: ProjectileSystem::new(),
            orbs: OrbField::new(),
            world,
            combo: ComboTracker::new(COMBO_WINDOW_SECS),
            impact: ImpactController::new(
                settings.particle_capacity(),
                settings.effective_screen_shake(),
                seed.wrapping_add(17),
            ),
            damage_text: FloatingDamageText::new(DAMAGE_TEXT_CAPACITY, settings.damage_numbers),
            timers: TimerQueue::new(),
            explosions: Vec::new(),
            next_explosion_id: 1,
            game_time: 0.0,
            anim_time: 0.0,
            spawn_timer: 0.0,
            kills: 0,
            score: 0,
            boss_announced: false,
            boss_id: None,
            boss_defeated: false,
            recenter_count: 0,
            proximity: 0.0,
        }
    }

    /// Full stat rebuild after any skill or level change
    pub fn recalculate_stats(&mut self) {
        self.stats = recalculate_stats(self.character, self.skills.skills(), self.progress.level);
        self.player
            .set_max_health(PLAYER_BASE_HEALTH + self.stats.max_health_bonus);
    }

    pub fn magnet_radius(&self) -> f32 {
        ORB_BASE_MAGNET_RADIUS + self.stats.magnet_radius_bonus
    }

    pub fn add_explosion(&mut self, pos: Vec2, radius: f32) -> u32 {
        let id = self.next_explosion_id;
        self.next_explosion_id += 1;
        self.explosions.push(Explosion {
            id,
            pos,
            radius,
            age: 0.0,
        });
        id
    }

    /// Move every positioned thing by `offset`
    pub fn shift(&mut self, offset: Vec2) {
        self.player.pos += offset;
        self.camera += offset;
        self.enemies.shift(offset);
        self.projectiles.shift(offset);
        self.orbs.shift(offset);
        self.world.shift(offset);
        self.impact.shift(offset);
        self.damage_text.shift(offset);
        for explosion in &mut self.explosions {
            explosion.pos += offset;
        }
    }

    /// Re-center on the origin once the player passes the threshold.
    /// Returns the applied offset.
    pub fn recenter_if_needed(&mut self) -> Option<Vec2> {
        let pos = self.player.pos;
        if pos.x.abs() <= WORLD_RESET_THRESHOLD && pos.y.abs() <= WORLD_RESET_THRESHOLD {
            return None;
        }
        let offset = -pos;
        self.shift(offset);
        // Exactly the origin, regardless of rounding in the shift
        self.player.pos = Vec2::ZERO;
        self.camera = Vec2::ZERO;
        self.recenter_count += 1;
        log::info!("World re-centered by {:?}", offset);
        Some(offset)
    }

    pub fn summary(&self, victory: bool) -> RunSummary {
        RunSummary {
            character: self.character,
            stage: self.stage,
            survived_secs: self.game_time,
            level: self.progress.level,
            kills: self.kills,
            score: self.score,
            best_combo: self.combo.best(),
            boss_defeated: self.boss_defeated,
            victory,
            rank: Rank::evaluate(self.game_time, self.kills, victory),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_velocity_decays() {
        let mut player = Player::new(100.0);
        player.external_vel = Vec2::new(100.0, 0.0);
        player.step(1.0, &Joystick::default(), 200.0);
        assert!((player.external_vel.x - 100.0 * EXTERNAL_VELOCITY_RETAIN_PER_SEC).abs() < 1e-3);
        assert!((player.pos.x - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_joystick_blends_with_external() {
        let mut player = Player::new(100.0);
        player.external_vel = Vec2::new(0.0, 50.0);
        player.step(0.5, &Joystick::toward(Vec2::X), 200.0);
        assert_eq!(player.pos, Vec2::new(100.0, 25.0));
        assert_eq!(player.facing, Vec2::X);
    }

    #[test]
    fn test_damage_reduction_and_heal() {
        let mut player = Player::new(100.0);
        assert_eq!(player.take_damage(20.0, 0.25), 15.0);
        assert_eq!(player.health, 85.0);
        player.heal(50.0);
        assert_eq!(player.health, 100.0);
        player.set_max_health(120.0);
        assert_eq!(player.health, 120.0);
    }

    #[test]
    fn test_rank_thresholds() {
        assert_eq!(Rank::evaluate(600.0, 450, true), Rank::S);
        assert_eq!(Rank::evaluate(600.0, 100, true), Rank::A);
        assert_eq!(Rank::evaluate(200.0, 50, false), Rank::B);
        assert_eq!(Rank::evaluate(30.0, 10, false), Rank::C);
    }

    #[test]
    fn test_pause_phase_flags() {
        assert!(ScenePhase::Playing.is_simulating());
        assert!(!ScenePhase::Paused.is_simulating());
        assert!(!ScenePhase::SkillSelection.is_simulating());
        assert!(ScenePhase::Paused.in_run());
        assert!(!ScenePhase::Result.in_run());
    }
}
