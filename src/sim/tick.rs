//! Per-frame simulation pipeline
//!
//! One call advances a `Playing` run by one frame. The stage order is fixed:
//! time gate, stage forces, player movement, world re-centering, firing,
//! projectiles, enemies, boss check, victory check, bookkeeping.

use rand::Rng;

use super::enemy::{EnemyTier, difficulty_scale};
use super::events::{EventQueue, GameEvent};
use super::impact::ImpactKind;
use super::projectile::CombatEvent;
use super::state::{EXPLOSION_RING_SECS, Joystick, RunState};
use super::timers::ScheduledAction;
use crate::consts::*;
use crate::direction;
use crate::settings::DebugConfig;

/// Input for a single frame
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    pub joystick: Joystick,
    /// Pause toggle
    pub pause: bool,
}

/// Scene-level consequences of a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// At least one level was gained; skill selection should open
    pub level_up: bool,
    pub player_died: bool,
    pub victory: bool,
    /// Hit-stop swallowed the frame
    pub frozen: bool,
}

/// Seconds between spawn batches at `game_time`
pub fn spawn_interval(game_time: f32) -> f32 {
    (SPAWN_INTERVAL_START * 0.5f32.powf(game_time.max(0.0) / 150.0)).max(SPAWN_INTERVAL_MIN)
}

/// Enemies per spawn batch at `game_time`
pub fn spawn_batch(game_time: f32) -> u32 {
    (1 + (game_time.max(0.0) / 60.0) as u32).min(6)
}

/// Advance a playing run by one frame of `raw_dt` seconds
pub fn tick(
    run: &mut RunState,
    input: &FrameInput,
    raw_dt: f32,
    debug: &DebugConfig,
    destroyed: bool,
    events: &mut EventQueue,
) -> TickOutcome {
    let mut outcome = TickOutcome::default();

    // Time gate; cosmetics always run on the raw delta
    let dt = run.impact.update(raw_dt);
    run.damage_text.update(raw_dt);
    run.anim_time += raw_dt;
    if dt <= 0.0 {
        outcome.frozen = true;
        return outcome;
    }
    run.game_time += dt;
    for explosion in &mut run.explosions {
        explosion.age += dt;
    }
    for action in run.timers.update(dt, destroyed) {
        run_scheduled(run, action, events);
    }

    // Stage forces
    let effect = run
        .world
        .apply(dt, run.player.pos, PLAYER_RADIUS, &mut run.enemies);
    run.player.external_vel += effect.player_impulse;
    run.player.pos += effect.player_push;
    run.proximity = effect.proximity;
    if effect.player_damage > 0.0 {
        hurt_player(run, effect.player_damage, false, debug, events);
    }

    // Player movement
    let speed = PLAYER_BASE_SPEED * run.stats.move_speed_multiplier;
    run.player.step(dt, &input.joystick, speed);

    // World re-centering, then the camera follows
    if let Some(offset) = run.recenter_if_needed() {
        events.push(GameEvent::WorldRecentered { offset });
    }
    run.camera = run.player.pos;

    // Fire on cooldown from the finalized player position
    run.player.fire_cooldown -= dt;
    if run.player.fire_cooldown <= 0.0 {
        let interval = FIRE_INTERVAL_SECS / run.stats.fire_rate_multiplier.max(0.05);
        run.player.fire_cooldown = (run.player.fire_cooldown + interval).max(0.0);
        run.projectiles
            .fire(run.player.pos, &run.enemies, &run.stats, run.player.facing);
    }

    // Projectiles
    run.projectiles
        .update(dt, &run.enemies, &run.stats, run.player.pos);
    let mut combat = Vec::new();
    run.projectiles
        .check_collisions(&mut run.enemies, &run.stats, &mut run.rng, &mut combat);
    for event in combat {
        resolve_combat(run, event, events);
    }
    apply_aura(run, dt);

    // Enemies
    run.enemies.update(dt, run.player.pos, run.anim_time);
    run.enemies.check_collisions();
    for merge in run.enemies.update_merges() {
        if debug.log_merges {
            log::info!("Merged into {:?} #{} at {:?}", merge.tier, merge.id, merge.pos);
        }
        run.impact.trigger(ImpactKind::Merge, merge.pos);
        events.push(GameEvent::EnemiesMerged {
            id: merge.id,
            pos: merge.pos,
            tier: merge.tier,
        });
    }
    if let Some(contact) = run
        .enemies
        .check_player_collision(run.player.pos, PLAYER_RADIUS)
    {
        hurt_player(run, contact, true, debug, events);
    }
    spawn_director(run, dt);
    collect_dead(run, events);
    run.enemies.cleanup_off_screen(run.camera);
    run.orbs.cleanup_off_screen(run.camera);

    // Boss timeline
    if !run.boss_announced && run.game_time >= BOSS_SPAWN_TIME {
        run.boss_announced = true;
        run.timers
            .schedule(BOSS_ANNOUNCE_DELAY, ScheduledAction::SpawnBoss);
        events.push(GameEvent::BossIncoming);
        log::info!("Boss incoming at {:.1}s", run.game_time);
    }

    if run.game_time >= VICTORY_TIME {
        outcome.victory = true;
    }

    // Bookkeeping: combo, orbs and leveling, regeneration
    if let Some(multi) = run.combo.update(dt) {
        let (intensity, duration) = multi.tier.shake();
        run.impact.shake(intensity, duration);
        if let Some((scale, recover)) = multi.tier.slow_motion() {
            run.impact.slow_motion(scale, recover);
        }
        events.push(GameEvent::MultiKill {
            count: multi.count,
            tier: multi.tier,
        });
    }

    let magnet = run.magnet_radius();
    let collected = run.orbs.update(dt, run.player.pos, magnet);
    if collected > 0 {
        let amount = (collected as f32 * run.stats.xp_multiplier).round() as u32;
        events.push(GameEvent::XpCollected { amount });
        let gained = run.progress.add_xp(amount);
        if gained > 0 {
            run.recalculate_stats();
            run.impact.trigger(ImpactKind::LevelUp, run.player.pos);
            events.push(GameEvent::LevelUp {
                level: run.progress.level,
            });
            outcome.level_up = true;
        }
    }

    if run.stats.regeneration > 0.0 && run.player.is_alive() {
        run.player.heal(run.stats.regeneration * dt);
    }

    if !run.player.is_alive() {
        outcome.player_died = true;
    }
    outcome
}

fn run_scheduled(run: &mut RunState, action: ScheduledAction, events: &mut EventQueue) {
    match action {
        ScheduledAction::SpawnBoss => spawn_boss(run, events),
        ScheduledAction::ExpireExplosion(id) => run.explosions.retain(|e| e.id != id),
        ScheduledAction::ShowResult | ScheduledAction::EndOpening => {
            log::warn!("{:?} scheduled on the gameplay clock, ignoring", action);
        }
    }
}

fn spawn_boss(run: &mut RunState, events: &mut EventQueue) {
    let theta = run.rng.random_range(0.0..std::f32::consts::TAU);
    let pos = run.player.pos + direction(theta) * SPAWN_RADIUS;
    let id = run
        .enemies
        .spawn_at_tier(EnemyTier::Boss, pos, difficulty_scale(run.game_time));
    run.boss_id = Some(id);
    run.impact.trigger(ImpactKind::BossSpawn, pos);
    events.push(GameEvent::BossSpawned { id });
    log::info!("Boss #{} spawned at {:?}", id, pos);
}

fn spawn_director(run: &mut RunState, dt: f32) {
    run.spawn_timer -= dt;
    while run.spawn_timer <= 0.0 {
        run.spawn_timer += spawn_interval(run.game_time);
        for _ in 0..spawn_batch(run.game_time) {
            if run.enemies.live_count() >= MAX_ENEMIES {
                return;
            }
            run.enemies
                .spawn_at_edge(run.game_time, run.player.pos, &mut run.rng);
        }
    }
}

fn resolve_combat(run: &mut RunState, event: CombatEvent, events: &mut EventQueue) {
    match event {
        CombatEvent::Hit {
            pos,
            damage,
            critical,
            ..
        } => {
            run.damage_text.spawn(pos, damage, critical);
            let kind = if critical {
                ImpactKind::CriticalHit
            } else {
                ImpactKind::Hit
            };
            run.impact.trigger(kind, pos);
            events.push(GameEvent::EnemyHit {
                pos,
                damage,
                critical,
            });
        }
        CombatEvent::Kill { pos, tier, .. } => {
            let kind = if tier == EnemyTier::Boss {
                ImpactKind::BossKill
            } else {
                ImpactKind::Kill
            };
            run.impact.trigger(kind, pos);
            let (intensity, duration) = tier.death_shake();
            run.impact.shake(intensity, duration);
        }
        CombatEvent::Explosion {
            pos,
            radius,
            damage,
        } => {
            log::debug!("Explosion r={:.0} dmg={:.1} at {:?}", radius, damage, pos);
            for (_, hit_pos, amount, killed) in
                run.enemies.apply_area_damage(pos, radius, damage, true)
            {
                run.damage_text.spawn(hit_pos, amount, false);
                if killed {
                    run.impact.trigger(ImpactKind::Kill, hit_pos);
                }
            }
            run.impact.trigger(ImpactKind::Explosion, pos);
            let id = run.add_explosion(pos, radius);
            run.timers
                .schedule(EXPLOSION_RING_SECS, ScheduledAction::ExpireExplosion(id));
            events.push(GameEvent::Explosion { pos, radius });
        }
    }
}

/// Guardian aura: continuous damage around the player
fn apply_aura(run: &mut RunState, dt: f32) {
    if run.stats.aura_radius <= 0.0 || run.stats.aura_damage <= 0.0 {
        return;
    }
    let hits = run.enemies.apply_area_damage(
        run.player.pos,
        run.stats.aura_radius,
        run.stats.aura_damage * dt,
        false,
    );
    for (_, pos, _, killed) in hits {
        if killed {
            run.impact.trigger(ImpactKind::Kill, pos);
        }
    }
}

/// Spawn orbs and register kills for every dead enemy, then remove them.
/// The dead list must be read before `cleanup_dead`.
fn collect_dead(run: &mut RunState, events: &mut EventQueue) {
    let dead = run.enemies.get_dead_enemies();
    for enemy in &dead {
        run.orbs.spawn(enemy.pos, enemy.tier.xp());
        run.combo.register_kill();
        run.kills += 1;
        if enemy.tier == EnemyTier::Boss {
            run.boss_defeated = true;
            events.push(GameEvent::BossDefeated);
            log::info!("Boss #{} defeated", enemy.id);
        }
        events.push(GameEvent::EnemyKilled {
            id: enemy.id,
            pos: enemy.pos,
            tier: enemy.tier,
        });
    }
    run.score += run.enemies.cleanup_dead();
}

/// Apply damage to the player. Contact damage respects and restarts the
/// invulnerability window; continuous stage damage ignores it.
fn hurt_player(
    run: &mut RunState,
    raw: f32,
    contact: bool,
    debug: &DebugConfig,
    events: &mut EventQueue,
) {
    if debug.invincible || !run.player.is_alive() {
        return;
    }
    if contact {
        if run.player.is_invulnerable() {
            return;
        }
        run.player.invuln_timer = PLAYER_INVULN_SECS;
        run.impact.trigger(ImpactKind::PlayerHurt, run.player.pos);
    }
    let amount = run.player.take_damage(raw, run.stats.damage_reduction);
    events.push(GameEvent::PlayerHurt {
        amount,
        health: run.player.health,
    });
}
