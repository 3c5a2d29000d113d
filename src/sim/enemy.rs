//! Enemy spawning, steering, separation, merging and death bookkeeping

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::direction;

/// Knockback velocity keeps this fraction per second
const KNOCKBACK_RETAIN_PER_SEC: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnemyTier {
    Small,
    Medium,
    Large,
    Boss,
}

impl EnemyTier {
    pub fn base_health(&self) -> f32 {
        match self {
            EnemyTier::Small => 20.0,
            EnemyTier::Medium => 60.0,
            EnemyTier::Large => 160.0,
            EnemyTier::Boss => 2500.0,
        }
    }

    pub fn mass(&self) -> f32 {
        match self {
            EnemyTier::Small => 1.0,
            EnemyTier::Medium => 2.0,
            EnemyTier::Large => 4.0,
            EnemyTier::Boss => 20.0,
        }
    }

    pub fn speed(&self) -> f32 {
        match self {
            EnemyTier::Small => 90.0,
            EnemyTier::Medium => 72.0,
            EnemyTier::Large => 56.0,
            EnemyTier::Boss => 48.0,
        }
    }

    pub fn radius(&self) -> f32 {
        match self {
            EnemyTier::Small => 12.0,
            EnemyTier::Medium => 18.0,
            EnemyTier::Large => 26.0,
            EnemyTier::Boss => 48.0,
        }
    }

    pub fn score(&self) -> u64 {
        match self {
            EnemyTier::Small => 10,
            EnemyTier::Medium => 30,
            EnemyTier::Large => 80,
            EnemyTier::Boss => 1000,
        }
    }

    pub fn xp(&self) -> u32 {
        match self {
            EnemyTier::Small => 1,
            EnemyTier::Medium => 3,
            EnemyTier::Large => 8,
            EnemyTier::Boss => 50,
        }
    }

    pub fn contact_damage(&self) -> f32 {
        match self {
            EnemyTier::Small => 8.0,
            EnemyTier::Medium => 12.0,
            EnemyTier::Large => 18.0,
            EnemyTier::Boss => 30.0,
        }
    }

    pub fn color(&self) -> u32 {
        match self {
            EnemyTier::Small => 0x66ccff,
            EnemyTier::Medium => 0xffcc33,
            EnemyTier::Large => 0xff6633,
            EnemyTier::Boss => 0xcc33ff,
        }
    }

    /// (intensity, duration) of the camera shake on death
    pub fn death_shake(&self) -> (f32, f32) {
        match self {
            EnemyTier::Small => (1.0, 0.08),
            EnemyTier::Medium => (2.5, 0.12),
            EnemyTier::Large => (5.0, 0.2),
            EnemyTier::Boss => (14.0, 0.7),
        }
    }

    /// Tier produced by a merge, `None` for tiers that never merge upward
    pub fn merged(&self) -> Option<EnemyTier> {
        match self {
            EnemyTier::Small => Some(EnemyTier::Medium),
            EnemyTier::Medium => Some(EnemyTier::Large),
            EnemyTier::Large | EnemyTier::Boss => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    /// Knockback / external velocity (steering is added on top)
    pub vel: Vec2,
    pub mass: f32,
    pub health: f32,
    pub max_health: f32,
    pub tier: EnemyTier,
    /// Seconds since spawn or merge
    pub age: f32,
    /// Idle wobble phase, visual only
    pub wobble_phase: f32,
    /// Hit flash (0-1), visual only
    pub hit_flash: f32,
}

impl Enemy {
    pub fn radius(&self) -> f32 {
        self.tier.radius()
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Apply damage; true if this hit killed it
    pub fn damage(&mut self, amount: f32) -> bool {
        if self.is_dead() {
            return false;
        }
        self.health -= amount;
        self.hit_flash = 1.0;
        self.is_dead()
    }

    /// Heavier enemies resist: velocity change ∝ 1/√mass
    pub fn apply_knockback(&mut self, dir: Vec2, impulse: f32) {
        self.vel += dir.normalize_or_zero() * impulse / self.mass.max(0.01).sqrt();
    }
}

/// Snapshot of an enemy about to be removed by `cleanup_dead`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadEnemy {
    pub id: u32,
    pub pos: Vec2,
    pub tier: EnemyTier,
}

/// A merge that happened this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeEvent {
    pub id: u32,
    pub pos: Vec2,
    pub tier: EnemyTier,
}

/// Tunable merge thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeRules {
    pub radius: f32,
    pub grace_secs: f32,
}

impl Default for MergeRules {
    fn default() -> Self {
        Self {
            radius: MERGE_RADIUS,
            grace_secs: MERGE_GRACE_SECS,
        }
    }
}

/// Health multiplier for enemies spawned at `game_time`
pub fn difficulty_scale(game_time: f32) -> f32 {
    1.0 + game_time.max(0.0) / 120.0 * 0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemySystem {
    enemies: Vec<Enemy>,
    next_id: u32,
    pub merge_rules: MergeRules,
}

impl EnemySystem {
    pub fn new(merge_rules: MergeRules) -> Self {
        Self {
            enemies: Vec::new(),
            next_id: 1,
            merge_rules,
        }
    }

    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Pick a tier for a regular spawn; larger tiers unlock over time
    fn roll_tier(game_time: f32, rng: &mut impl Rng) -> EnemyTier {
        let large_chance = if game_time >= 180.0 {
            ((game_time - 180.0) / 600.0 + 0.03).min(0.15)
        } else {
            0.0
        };
        let medium_chance = if game_time >= 60.0 {
            (0.1 + (game_time - 60.0) / 400.0).min(0.35)
        } else {
            0.0
        };

        let roll: f32 = rng.random();
        if roll < large_chance {
            EnemyTier::Large
        } else if roll < large_chance + medium_chance {
            EnemyTier::Medium
        } else {
            EnemyTier::Small
        }
    }

    /// Spawn one enemy on the ring around the player
    pub fn spawn_at_edge(&mut self, game_time: f32, player_pos: Vec2, rng: &mut impl Rng) -> u32 {
        let theta = rng.random_range(0.0..std::f32::consts::TAU);
        let pos = player_pos + direction(theta) * SPAWN_RADIUS;
        let tier = Self::roll_tier(game_time, rng);
        self.spawn_at_tier(tier, pos, difficulty_scale(game_time))
    }

    /// Spawn a specific tier at a specific position
    pub fn spawn_at_tier(&mut self, tier: EnemyTier, pos: Vec2, health_scale: f32) -> u32 {
        let id = self.next_entity_id();
        let health = tier.base_health() * health_scale.max(0.1);
        self.enemies.push(Enemy {
            id,
            pos,
            vel: Vec2::ZERO,
            mass: tier.mass(),
            health,
            max_health: health,
            tier,
            age: 0.0,
            wobble_phase: 0.0,
            hit_flash: 0.0,
        });
        id
    }

    /// Steer every live enemy toward the player
    pub fn update(&mut self, dt: f32, player_pos: Vec2, anim_phase: f32) {
        let retain = KNOCKBACK_RETAIN_PER_SEC.powf(dt);
        for enemy in &mut self.enemies {
            enemy.wobble_phase = anim_phase + enemy.id as f32 * 0.37;
            enemy.hit_flash = (enemy.hit_flash - dt * 6.0).max(0.0);
            if enemy.is_dead() {
                continue;
            }
            enemy.age += dt;
            let seek = (player_pos - enemy.pos).normalize_or_zero() * enemy.tier.speed();
            enemy.pos += (seek + enemy.vel) * dt;
            enemy.vel *= retain;
        }
    }

    /// Soft push-apart so enemies don't stack on one spot
    pub fn check_collisions(&mut self) {
        let n = self.enemies.len();
        for i in 0..n {
            if self.enemies[i].is_dead() {
                continue;
            }
            for j in (i + 1)..n {
                if self.enemies[j].is_dead() {
                    continue;
                }
                let (a, b) = (&self.enemies[i], &self.enemies[j]);
                let delta = b.pos - a.pos;
                let min_dist = a.radius() + b.radius();
                let dist_sq = delta.length_squared();
                if dist_sq >= min_dist * min_dist {
                    continue;
                }

                let dist = dist_sq.sqrt();
                // Coincident centers: separate along an id-derived axis
                let normal = if dist > 1e-4 {
                    delta / dist
                } else {
                    direction(a.id as f32 * 2.399)
                };
                let overlap = (min_dist - dist) * SEPARATION_STRENGTH;
                let total_mass = a.mass + b.mass;
                let push_a = overlap * b.mass / total_mass;
                let push_b = overlap * a.mass / total_mass;

                self.enemies[i].pos -= normal * push_a;
                self.enemies[j].pos += normal * push_b;
            }
        }
    }

    /// Highest contact damage among live enemies touching the player
    pub fn check_player_collision(&self, player_pos: Vec2, player_radius: f32) -> Option<f32> {
        self.enemies
            .iter()
            .filter(|e| !e.is_dead())
            .filter(|e| e.pos.distance(player_pos) < e.radius() + player_radius)
            .map(|e| e.tier.contact_damage())
            .reduce(f32::max)
    }

    fn can_merge(&self, enemy: &Enemy) -> bool {
        !enemy.is_dead()
            && enemy.tier.merged().is_some()
            && enemy.age >= self.merge_rules.grace_secs
    }

    /// Fuse close pairs of same/adjacent tier into one higher-tier enemy.
    /// Mass and health add up, position and velocity average.
    pub fn update_merges(&mut self) -> Vec<MergeEvent> {
        let n = self.enemies.len();
        let mut consumed = vec![false; n];
        let mut pairs = Vec::new();

        for i in 0..n {
            if consumed[i] || !self.can_merge(&self.enemies[i]) {
                continue;
            }
            for j in (i + 1)..n {
                if consumed[j] || !self.can_merge(&self.enemies[j]) {
                    continue;
                }
                let (a, b) = (&self.enemies[i], &self.enemies[j]);
                let tier_gap = (a.tier as i32 - b.tier as i32).abs();
                if tier_gap <= 1 && a.pos.distance(b.pos) <= self.merge_rules.radius {
                    consumed[i] = true;
                    consumed[j] = true;
                    pairs.push((i, j));
                    break;
                }
            }
        }

        if pairs.is_empty() {
            return Vec::new();
        }

        let mut merged = Vec::with_capacity(pairs.len());
        let mut events = Vec::with_capacity(pairs.len());
        for (i, j) in pairs {
            let (a, b) = (&self.enemies[i], &self.enemies[j]);
            let Some(tier) = a.tier.max(b.tier).merged() else {
                continue;
            };
            let pos = (a.pos + b.pos) * 0.5;
            let enemy = Enemy {
                id: 0,
                pos,
                vel: (a.vel + b.vel) * 0.5,
                mass: a.mass + b.mass,
                health: a.health + b.health,
                max_health: a.max_health + b.max_health,
                tier,
                age: 0.0,
                wobble_phase: a.wobble_phase,
                hit_flash: 1.0,
            };
            merged.push(enemy);
        }

        let mut idx = 0;
        self.enemies.retain(|_| {
            let keep = !consumed[idx];
            idx += 1;
            keep
        });

        for mut enemy in merged {
            enemy.id = self.next_entity_id();
            log::debug!("Merge -> {:?} #{} at {:?}", enemy.tier, enemy.id, enemy.pos);
            events.push(MergeEvent {
                id: enemy.id,
                pos: enemy.pos,
                tier: enemy.tier,
            });
            self.enemies.push(enemy);
        }

        events
    }

    /// Enemies that `cleanup_dead` is about to remove. Read this first.
    pub fn get_dead_enemies(&self) -> Vec<DeadEnemy> {
        self.enemies
            .iter()
            .filter(|e| e.is_dead())
            .map(|e| DeadEnemy {
                id: e.id,
                pos: e.pos,
                tier: e.tier,
            })
            .collect()
    }

    /// Remove dead enemies and return their score
    pub fn cleanup_dead(&mut self) -> u64 {
        let mut score = 0;
        self.enemies.retain(|e| {
            if e.is_dead() {
                score += e.tier.score();
                false
            } else {
                true
            }
        });
        score
    }

    /// Forget enemies too far from the camera (bosses are kept)
    pub fn cleanup_off_screen(&mut self, camera_pos: Vec2) -> usize {
        let before = self.enemies.len();
        self.enemies.retain(|e| {
            e.tier == EnemyTier::Boss || e.pos.distance(camera_pos) <= DESPAWN_RADIUS
        });
        before - self.enemies.len()
    }

    /// Damage every live enemy within `radius` with linear falloff.
    /// Returns (id, pos, damage, killed) per enemy hit.
    pub fn apply_area_damage(
        &mut self,
        center: Vec2,
        radius: f32,
        damage: f32,
        falloff: bool,
    ) -> Vec<(u32, Vec2, f32, bool)> {
        let mut hits = Vec::new();
        if radius <= 0.0 {
            return hits;
        }
        for enemy in &mut self.enemies {
            if enemy.is_dead() {
                continue;
            }
            let dist = enemy.pos.distance(center);
            if dist > radius + enemy.radius() {
                continue;
            }
            let amount = if falloff {
                damage * (1.0 - (dist / radius).min(1.0) * 0.5)
            } else {
                damage
            };
            let killed = enemy.damage(amount);
            hits.push((enemy.id, enemy.pos, amount, killed));
        }
        hits
    }

    /// Nearest live enemy to `pos` within `max_range`, skipping `exclude`
    pub fn nearest(&self, pos: Vec2, max_range: f32, exclude: &[u32]) -> Option<&Enemy> {
        self.enemies
            .iter()
            .filter(|e| !e.is_dead() && !exclude.contains(&e.id))
            .map(|e| (e, e.pos.distance_squared(pos)))
            .filter(|(_, d)| *d <= max_range * max_range)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(e, _)| e)
    }

    pub fn find(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn find_mut(&mut self, id: u32) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemies_mut(&mut self) -> &mut [Enemy] {
        &mut self.enemies
    }

    pub fn live_count(&self) -> usize {
        self.enemies.iter().filter(|e| !e.is_dead()).count()
    }

    pub fn has_boss(&self) -> bool {
        self.enemies
            .iter()
            .any(|e| e.tier == EnemyTier::Boss && !e.is_dead())
    }

    pub fn shift(&mut self, offset: Vec2) {
        for enemy in &mut self.enemies {
            enemy.pos += offset;
        }
    }

    pub fn clear(&mut self) {
        self.enemies.clear();
    }
}
