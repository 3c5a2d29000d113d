//! Player projectiles: firing, kinematics, homing and enemy collision

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::{EnemySystem, EnemyTier};
use super::stats::PlayerStats;
use crate::consts::*;
use crate::{direction, heading, normalize_angle};

/// Explosion damage as a fraction of the projectile's hit damage
const EXPLOSION_DAMAGE_FACTOR: f32 = 0.75;
/// How far a bouncing shot looks for its next target
const BOUNCE_SEEK_RANGE: f32 = 320.0;
/// How far a homing shot looks for a replacement target
const HOMING_SEEK_RANGE: f32 = 420.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Damage before the stat multiplier and pierce decay
    pub base_damage: f32,
    pub pierce_remaining: u32,
    pub bounce_remaining: u32,
    /// Enemies pierced so far (drives damage decay)
    pub pierce_hits: u32,
    /// Fraction of damage lost per pierce
    pub damage_decay: f32,
    /// Enemy id; re-validated every frame
    pub homing_target: Option<u32>,
    pub traveled: f32,
    pub max_range: f32,
    /// Turn-backs left at the end of the range
    pub returns_remaining: u32,
    /// Flying back to the player after a turn-back
    pub homeward: bool,
    /// Enemies already hit (no double hits while overlapping)
    pub hit_ids: Vec<u32>,
    alive: bool,
}

impl Projectile {
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Damage multiplier after `pierce_hits` pierces
    pub fn decay_factor(&self) -> f32 {
        (1.0 - self.damage_decay).powi(self.pierce_hits as i32)
    }
}

/// Outcome of collision resolution, delivered once per projectile-enemy contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatEvent {
    Hit {
        enemy_id: u32,
        pos: Vec2,
        damage: f32,
        critical: bool,
    },
    Kill {
        enemy_id: u32,
        pos: Vec2,
        tier: EnemyTier,
    },
    Explosion {
        pos: Vec2,
        radius: f32,
        damage: f32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSystem {
    projectiles: Vec<Projectile>,
    next_id: u32,
}

impl Default for ProjectileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectileSystem {
    pub fn new() -> Self {
        Self {
            projectiles: Vec::new(),
            next_id: 1,
        }
    }

    /// Fire one volley from `origin`: `spread_count + 1` shots fanned over
    /// `spread_angle`, aimed at the nearest enemy (or `fallback_dir`).
    /// Returns the number of projectiles spawned.
    pub fn fire(
        &mut self,
        origin: Vec2,
        enemies: &EnemySystem,
        stats: &PlayerStats,
        fallback_dir: Vec2,
    ) -> usize {
        let target = enemies.nearest(origin, PROJECTILE_MAX_RANGE, &[]);
        let aim = match target {
            Some(enemy) if enemy.pos != origin => heading(enemy.pos - origin),
            _ if fallback_dir != Vec2::ZERO => heading(fallback_dir),
            _ => 0.0,
        };
        let homing_target = if stats.homing_turn_rate > 0.0 {
            target.map(|e| e.id)
        } else {
            None
        };

        let count = stats.spread_count + 1;
        let speed = PROJECTILE_BASE_SPEED * stats.projectile_speed_multiplier;
        let radius = PROJECTILE_RADIUS * stats.projectile_size_multiplier;

        for i in 0..count {
            let theta = if count == 1 {
                aim
            } else {
                let t = i as f32 / (count - 1) as f32;
                aim - stats.spread_angle / 2.0 + stats.spread_angle * t
            };
            let id = self.next_id;
            self.next_id += 1;
            self.projectiles.push(Projectile {
                id,
                pos: origin,
                vel: direction(theta) * speed,
                radius,
                base_damage: PROJECTILE_BASE_DAMAGE,
                pierce_remaining: stats.piercing_count,
                bounce_remaining: stats.bounce_count,
                pierce_hits: 0,
                damage_decay: stats.pierce_damage_decay,
                homing_target,
                traveled: 0.0,
                max_range: PROJECTILE_MAX_RANGE,
                returns_remaining: stats.return_count,
                homeward: false,
                hit_ids: Vec::new(),
                alive: true,
            });
        }
        count as usize
    }

    /// Integrate motion, steer homing shots, drop shots past range or bounds.
    /// A shot with a turn-back left heads for the player at the end of its
    /// range, free to hit the same enemies again, and despawns on arrival.
    pub fn update(
        &mut self,
        dt: f32,
        enemies: &EnemySystem,
        stats: &PlayerStats,
        player_pos: Vec2,
    ) {
        for p in &mut self.projectiles {
            if p.homeward {
                let to_player = player_pos - p.pos;
                let speed = p.speed();
                if to_player.length() <= (speed * dt).max(PLAYER_RADIUS) {
                    p.alive = false;
                    continue;
                }
                p.vel = to_player.normalize() * speed;
            } else if stats.homing_turn_rate > 0.0 {
                steer_homing(p, enemies, stats.homing_turn_rate, dt);
            }

            p.pos += p.vel * dt;
            p.traveled += p.speed() * dt;

            if p.traveled >= p.max_range {
                if !p.homeward && p.returns_remaining > 0 {
                    p.returns_remaining -= 1;
                    p.homeward = true;
                    p.traveled = 0.0;
                    p.homing_target = None;
                    p.hit_ids.clear();
                } else {
                    p.alive = false;
                }
            }
            if p.pos.distance(player_pos) > PROJECTILE_WORLD_BOUNDS {
                p.alive = false;
            }
        }
        self.projectiles.retain(|p| p.alive);
    }

    /// Resolve projectile-enemy contacts. Each contact yields one `Hit`, at
    /// most one `Kill`, and an `Explosion` when the shot is used up.
    pub fn check_collisions(
        &mut self,
        enemies: &mut EnemySystem,
        stats: &PlayerStats,
        rng: &mut impl Rng,
        events: &mut Vec<CombatEvent>,
    ) {
        for p in &mut self.projectiles {
            if !p.alive {
                continue;
            }

            // Closest overlapping live enemy not already hit by this shot
            let hit_idx = enemies
                .enemies()
                .iter()
                .enumerate()
                .filter(|(_, e)| !e.is_dead() && !p.hit_ids.contains(&e.id))
                .map(|(i, e)| (i, e.pos.distance(p.pos), e.radius()))
                .filter(|(_, dist, r)| *dist < p.radius + *r)
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(i, _, _)| i);
            let Some(idx) = hit_idx else {
                continue;
            };

            let mut damage = p.base_damage * stats.damage_multiplier * p.decay_factor();
            let critical = stats.crit_chance > 0.0 && rng.random::<f32>() < stats.crit_chance;
            if critical {
                damage *= stats.crit_multiplier;
            }

            let enemy = &mut enemies.enemies_mut()[idx];
            let killed = enemy.damage(damage);
            enemy.apply_knockback(p.vel, KNOCKBACK_BASE * stats.knockback_multiplier);
            let (enemy_id, enemy_pos, tier) = (enemy.id, enemy.pos, enemy.tier);

            p.hit_ids.push(enemy_id);
            events.push(CombatEvent::Hit {
                enemy_id,
                pos: enemy_pos,
                damage,
                critical,
            });
            if killed {
                events.push(CombatEvent::Kill {
                    enemy_id,
                    pos: enemy_pos,
                    tier,
                });
            }

            if p.pierce_remaining > 0 {
                p.pierce_remaining -= 1;
                p.pierce_hits += 1;
            } else if p.bounce_remaining > 0 {
                p.bounce_remaining -= 1;
                let speed = p.speed();
                let next = enemies.nearest(p.pos, BOUNCE_SEEK_RANGE, &p.hit_ids);
                p.vel = match next {
                    Some(target) => (target.pos - p.pos).normalize_or_zero() * speed,
                    None => {
                        let normal = (p.pos - enemy_pos).normalize_or_zero();
                        reflect(p.vel, normal)
                    }
                };
                if let Some(target) = next {
                    if p.homing_target.is_some() {
                        p.homing_target = Some(target.id);
                    }
                }
            } else {
                if stats.explosion_radius > 0.0 {
                    events.push(CombatEvent::Explosion {
                        pos: enemy_pos,
                        radius: stats.explosion_radius,
                        damage: p.base_damage * stats.damage_multiplier * EXPLOSION_DAMAGE_FACTOR,
                    });
                }
                p.alive = false;
            }
        }
        self.projectiles.retain(|p| p.alive);
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn shift(&mut self, offset: Vec2) {
        for p in &mut self.projectiles {
            p.pos += offset;
        }
    }

    pub fn clear(&mut self) {
        self.projectiles.clear();
    }
}

/// Turn toward the homing target by at most `turn_rate * dt`. A dead or
/// missing target is replaced by the nearest enemy, or the shot flies straight.
fn steer_homing(p: &mut Projectile, enemies: &EnemySystem, turn_rate: f32, dt: f32) {
    let current = p
        .homing_target
        .and_then(|id| enemies.find(id))
        .filter(|e| !e.is_dead());
    let target = match current {
        Some(enemy) => Some(enemy),
        None => enemies.nearest(p.pos, HOMING_SEEK_RANGE, &p.hit_ids),
    };
    p.homing_target = target.map(|e| e.id);

    let Some(target) = target else {
        return;
    };
    let to_target = target.pos - p.pos;
    if to_target == Vec2::ZERO {
        return;
    }
    let current_heading = heading(p.vel);
    let diff = normalize_angle(heading(to_target) - current_heading);
    let max_turn = turn_rate * dt;
    let turn = diff.clamp(-max_turn, max_turn);
    p.vel = direction(current_heading + turn) * p.speed();
}

fn reflect(vel: Vec2, normal: Vec2) -> Vec2 {
    if normal == Vec2::ZERO {
        return -vel;
    }
    vel - 2.0 * vel.dot(normal) * normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::MergeRules;
    use crate::sim::stats::DEFAULT_PLAYER_STATS;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const DT: f32 = 1.0 / 60.0;

    fn no_crit() -> PlayerStats {
        PlayerStats {
            crit_chance: 0.0,
            ..DEFAULT_PLAYER_STATS
        }
    }

    fn step(
        shots: &mut ProjectileSystem,
        enemies: &mut EnemySystem,
        stats: &PlayerStats,
        rng: &mut Pcg32,
        events: &mut Vec<CombatEvent>,
    ) {
        shots.update(DT, enemies, stats, Vec2::ZERO);
        shots.check_collisions(enemies, stats, rng, events);
    }

    #[test]
    fn test_spread_count_sets_volley_size() {
        let enemies = EnemySystem::new(MergeRules::default());
        let mut shots = ProjectileSystem::new();
        let stats = PlayerStats {
            spread_count: 2,
            ..DEFAULT_PLAYER_STATS
        };
        assert_eq!(shots.fire(Vec2::ZERO, &enemies, &stats, Vec2::X), 3);

        let headings: Vec<f32> = shots.projectiles().iter().map(|p| heading(p.vel)).collect();
        assert!((headings[0] + stats.spread_angle / 2.0).abs() < 1e-5);
        assert!(headings[1].abs() < 1e-5);
        assert!((headings[2] - stats.spread_angle / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_fire_aims_at_nearest_enemy() {
        let mut enemies = EnemySystem::new(MergeRules::default());
        enemies.spawn_at_tier(EnemyTier::Small, Vec2::new(0.0, 200.0), 1.0);
        enemies.spawn_at_tier(EnemyTier::Small, Vec2::new(-500.0, 0.0), 1.0);
        let mut shots = ProjectileSystem::new();
        shots.fire(Vec2::ZERO, &enemies, &DEFAULT_PLAYER_STATS, Vec2::X);
        let dir = shots.projectiles()[0].vel.normalize();
        assert!((dir - Vec2::Y).length() < 1e-5);
    }

    #[test]
    fn test_pierce_decay_sequence() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut enemies = EnemySystem::new(MergeRules::default());
        for x in [100.0, 200.0, 300.0] {
            enemies.spawn_at_tier(EnemyTier::Boss, Vec2::new(x, 0.0), 1.0);
        }
        let stats = PlayerStats {
            piercing_count: 2,
            pierce_damage_decay: 0.3,
            ..no_crit()
        };
        let mut shots = ProjectileSystem::new();
        shots.fire(Vec2::ZERO, &enemies, &stats, Vec2::X);

        let mut events = Vec::new();
        for _ in 0..120 {
            step(&mut shots, &mut enemies, &stats, &mut rng, &mut events);
        }

        let damages: Vec<f32> = events
            .iter()
            .filter_map(|e| match e {
                CombatEvent::Hit { damage, .. } => Some(*damage),
                _ => None,
            })
            .collect();
        let d = PROJECTILE_BASE_DAMAGE;
        assert_eq!(damages.len(), 3);
        assert!((damages[0] - d).abs() < 1e-4);
        assert!((damages[1] - d * 0.7).abs() < 1e-4);
        assert!((damages[2] - d * 0.49).abs() < 1e-4);
        assert!(shots.projectiles().is_empty());
    }

    #[test]
    fn test_each_contact_reports_once() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut enemies = EnemySystem::new(MergeRules::default());
        enemies.spawn_at_tier(EnemyTier::Boss, Vec2::new(60.0, 0.0), 1.0);
        let stats = PlayerStats {
            piercing_count: 5,
            ..no_crit()
        };
        let mut shots = ProjectileSystem::new();
        shots.fire(Vec2::ZERO, &enemies, &stats, Vec2::X);

        let mut events = Vec::new();
        // The shot overlaps the boss for many frames
        for _ in 0..30 {
            step(&mut shots, &mut enemies, &stats, &mut rng, &mut events);
        }
        let hits = events
            .iter()
            .filter(|e| matches!(e, CombatEvent::Hit { .. }))
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_kill_and_explosion_events() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut enemies = EnemySystem::new(MergeRules::default());
        let id = enemies.spawn_at_tier(EnemyTier::Small, Vec2::new(40.0, 0.0), 0.1);
        let stats = PlayerStats {
            explosion_radius: 50.0,
            ..no_crit()
        };
        let mut shots = ProjectileSystem::new();
        shots.fire(Vec2::ZERO, &enemies, &stats, Vec2::X);

        let mut events = Vec::new();
        for _ in 0..10 {
            step(&mut shots, &mut enemies, &stats, &mut rng, &mut events);
        }
        assert!(events.contains(&CombatEvent::Kill {
            enemy_id: id,
            pos: Vec2::new(40.0, 0.0),
            tier: EnemyTier::Small,
        }));
        assert!(events
            .iter()
            .any(|e| matches!(e, CombatEvent::Explosion { radius, .. } if *radius == 50.0)));
        assert!(shots.projectiles().is_empty());
    }

    #[test]
    fn test_bounce_redirects_to_next_enemy() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut enemies = EnemySystem::new(MergeRules::default());
        enemies.spawn_at_tier(EnemyTier::Boss, Vec2::new(60.0, 0.0), 1.0);
        enemies.spawn_at_tier(EnemyTier::Boss, Vec2::new(60.0, 200.0), 1.0);
        let stats = PlayerStats {
            bounce_count: 1,
            ..no_crit()
        };
        let mut shots = ProjectileSystem::new();
        shots.fire(Vec2::ZERO, &enemies, &stats, Vec2::X);

        let mut events = Vec::new();
        for _ in 0..60 {
            step(&mut shots, &mut enemies, &stats, &mut rng, &mut events);
        }
        let hits = events
            .iter()
            .filter(|e| matches!(e, CombatEvent::Hit { .. }))
            .count();
        assert_eq!(hits, 2);
        assert!(shots.projectiles().is_empty());
    }

    #[test]
    fn test_homing_survives_target_death() {
        let mut enemies = EnemySystem::new(MergeRules::default());
        let target = enemies.spawn_at_tier(EnemyTier::Small, Vec2::new(300.0, 0.0), 1.0);
        let stats = PlayerStats {
            homing_turn_rate: 3.0,
            ..no_crit()
        };
        let mut shots = ProjectileSystem::new();
        shots.fire(Vec2::ZERO, &enemies, &stats, Vec2::X);
        assert_eq!(shots.projectiles()[0].homing_target, Some(target));

        enemies.find_mut(target).unwrap().damage(1000.0);
        enemies.cleanup_dead();
        shots.update(DT, &enemies, &stats, Vec2::ZERO);

        let shot = &shots.projectiles()[0];
        assert_eq!(shot.homing_target, None);
        assert!((shot.vel.normalize() - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn test_homing_turn_is_bounded() {
        let mut enemies = EnemySystem::new(MergeRules::default());
        enemies.spawn_at_tier(EnemyTier::Small, Vec2::new(0.0, 300.0), 1.0);
        let stats = PlayerStats {
            homing_turn_rate: 2.0,
            ..no_crit()
        };
        let mut shots = ProjectileSystem::new();
        // Fired away from the enemy on purpose
        shots.fire(Vec2::ZERO, &EnemySystem::new(MergeRules::default()), &stats, Vec2::X);
        shots.update(0.1, &enemies, &stats, Vec2::ZERO);
        let turned = heading(shots.projectiles()[0].vel);
        assert!((turned - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_returning_shot_hits_again_and_lands_on_player() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut enemies = EnemySystem::new(MergeRules::default());
        enemies.spawn_at_tier(EnemyTier::Boss, Vec2::new(300.0, 0.0), 1.0);
        let stats = PlayerStats {
            piercing_count: 5,
            return_count: 1,
            ..no_crit()
        };
        let mut shots = ProjectileSystem::new();
        shots.fire(Vec2::ZERO, &enemies, &stats, Vec2::X);

        let mut events = Vec::new();
        // Out to max range (~1.9s at base speed), then partway back
        for _ in 0..150 {
            step(&mut shots, &mut enemies, &stats, &mut rng, &mut events);
        }
        let shot = &shots.projectiles()[0];
        assert!(shot.homeward);
        assert!(shot.vel.x < 0.0);

        for _ in 0..150 {
            step(&mut shots, &mut enemies, &stats, &mut rng, &mut events);
        }
        let hits = events
            .iter()
            .filter(|e| matches!(e, CombatEvent::Hit { .. }))
            .count();
        assert_eq!(hits, 2);
        assert!(shots.projectiles().is_empty());
    }

    #[test]
    fn test_range_and_bounds_despawn() {
        let enemies = EnemySystem::new(MergeRules::default());
        let mut shots = ProjectileSystem::new();
        shots.fire(Vec2::ZERO, &enemies, &DEFAULT_PLAYER_STATS, Vec2::X);
        for _ in 0..200 {
            shots.update(DT, &enemies, &DEFAULT_PLAYER_STATS, Vec2::ZERO);
        }
        assert!(shots.projectiles().is_empty());

        shots.fire(Vec2::ZERO, &enemies, &DEFAULT_PLAYER_STATS, Vec2::X);
        shots.update(DT, &enemies, &DEFAULT_PLAYER_STATS, Vec2::new(5000.0, 0.0));
        assert!(shots.projectiles().is_empty());
    }
}
