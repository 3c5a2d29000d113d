//! Stage gimmicks
//!
//! Every stage binds exactly one world entity. The entities share the
//! [`WorldEntity`] lifecycle; their force queries differ per kind, so
//! [`StageWorld`] dispatches on the active stage and folds the result into a
//! single [`WorldEffect`] for the player plus direct mutation of enemies.
//! The entities do not enforce mutual exclusion themselves.

pub mod black_hole;
pub mod crusher;
pub mod gravity_well;
pub mod repulsion;

pub use black_hole::BlackHole;
pub use crusher::{Crusher, CrusherPhase};
pub use gravity_well::{GravityWell, GravityWellField};
pub use repulsion::{Barrier, BarrierContact, RepulsionField};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy::EnemySystem;

/// Point mass handed to the distortion filters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravitySource {
    pub pos: Vec2,
    /// Negative for repulsive sources
    pub mass: f32,
}

/// Shared lifecycle for stage gimmicks
pub trait WorldEntity {
    fn activate(&mut self, origin: Vec2);
    fn deactivate(&mut self);
    fn is_active(&self) -> bool;
    /// Advance timers and motion
    fn update(&mut self, dt: f32, player_pos: Vec2);
    /// How strongly the player is affected right now (0-1), for distortion
    fn player_proximity_effect(&self, pos: Vec2) -> f32;
    /// World re-centering
    fn shift(&mut self, offset: Vec2);
    fn gravity_sources(&self) -> Vec<GravitySource>;
}

/// Selectable stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    #[default]
    EventHorizon,
    GravityField,
    RepulsionZone,
    CrusherPit,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::EventHorizon,
        Stage::GravityField,
        Stage::RepulsionZone,
        Stage::CrusherPit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::EventHorizon => "event-horizon",
            Stage::GravityField => "gravity-field",
            Stage::RepulsionZone => "repulsion-zone",
            Stage::CrusherPit => "crusher-pit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Stage::ALL.into_iter().find(|stage| stage.as_str() == s)
    }
}

/// What the active gimmick did to the player this frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorldEffect {
    /// Added to the player's external velocity
    pub player_impulse: Vec2,
    /// Direct position correction (push-out)
    pub player_push: Vec2,
    /// Raw damage before damage reduction
    pub player_damage: f32,
    /// Distortion strength for the filters (0-1)
    pub proximity: f32,
}

/// All four gimmicks, at most one active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageWorld {
    pub black_hole: BlackHole,
    pub gravity_wells: GravityWellField,
    pub repulsion: RepulsionField,
    pub crusher: Crusher,
    active: Option<Stage>,
}

impl StageWorld {
    pub fn new(seed: u64) -> Self {
        Self {
            black_hole: BlackHole::new(),
            gravity_wells: GravityWellField::new(seed),
            repulsion: RepulsionField::new(seed.wrapping_add(1)),
            crusher: Crusher::new(),
            active: None,
        }
    }

    /// Deactivate everything, then activate the entity bound to `stage`
    pub fn select(&mut self, stage: Stage, origin: Vec2) {
        self.deactivate_all();
        self.entity_mut(stage).activate(origin);
        self.active = Some(stage);
        log::info!("Stage {} active at {:?}", stage.as_str(), origin);
    }

    pub fn deactivate_all(&mut self) {
        for stage in Stage::ALL {
            self.entity_mut(stage).deactivate();
        }
        self.active = None;
    }

    pub fn active(&self) -> Option<Stage> {
        self.active
    }

    fn entity(&self, stage: Stage) -> &dyn WorldEntity {
        match stage {
            Stage::EventHorizon => &self.black_hole,
            Stage::GravityField => &self.gravity_wells,
            Stage::RepulsionZone => &self.repulsion,
            Stage::CrusherPit => &self.crusher,
        }
    }

    fn entity_mut(&mut self, stage: Stage) -> &mut dyn WorldEntity {
        match stage {
            Stage::EventHorizon => &mut self.black_hole,
            Stage::GravityField => &mut self.gravity_wells,
            Stage::RepulsionZone => &mut self.repulsion,
            Stage::CrusherPit => &mut self.crusher,
        }
    }

    /// Advance the active gimmick, push/damage enemies directly and report
    /// the player-side effect.
    pub fn apply(
        &mut self,
        dt: f32,
        player_pos: Vec2,
        player_radius: f32,
        enemies: &mut EnemySystem,
    ) -> WorldEffect {
        let Some(stage) = self.active else {
            return WorldEffect::default();
        };
        self.entity_mut(stage).update(dt, player_pos);

        let mut effect = WorldEffect {
            proximity: self.entity(stage).player_proximity_effect(player_pos),
            ..WorldEffect::default()
        };

        match stage {
            Stage::EventHorizon => {
                effect.player_impulse = self.black_hole.pull(player_pos) * dt;
                effect.player_damage =
                    self.black_hole.horizon_damage(player_pos, player_radius) * dt;
                for enemy in enemies.enemies_mut().iter_mut().filter(|e| !e.is_dead()) {
                    enemy.vel += self.black_hole.pull(enemy.pos) * dt / enemy.mass.sqrt();
                    if self.black_hole.consumes(enemy.pos, enemy.radius()) {
                        let health = enemy.health;
                        enemy.damage(health);
                    }
                }
            }
            Stage::GravityField => {
                effect.player_impulse = self.gravity_wells.drift(player_pos) * dt;
                for enemy in enemies.enemies_mut().iter_mut().filter(|e| !e.is_dead()) {
                    enemy.vel += self.gravity_wells.drift(enemy.pos) * dt / enemy.mass.sqrt();
                }
            }
            Stage::RepulsionZone => {
                if let Some(contact) = self.repulsion.collide(player_pos, player_radius) {
                    effect.player_push = contact.normal * contact.penetration;
                    effect.player_impulse = contact.normal * self.repulsion.bounce_speed();
                }
                for enemy in enemies.enemies_mut().iter_mut().filter(|e| !e.is_dead()) {
                    if let Some(contact) = self.repulsion.collide(enemy.pos, enemy.radius()) {
                        enemy.pos += contact.normal * contact.penetration;
                        enemy.vel +=
                            contact.normal * self.repulsion.bounce_speed() / enemy.mass.sqrt();
                    }
                }
            }
            Stage::CrusherPit => {
                if let Some((push, dps)) = self.crusher.press(player_pos, player_radius) {
                    effect.player_push = push;
                    effect.player_damage = dps * dt;
                }
                for enemy in enemies.enemies_mut().iter_mut().filter(|e| !e.is_dead()) {
                    if let Some((push, dps)) = self.crusher.press(enemy.pos, enemy.radius()) {
                        enemy.pos += push;
                        enemy.damage(dps * dt * crusher::ENEMY_DAMAGE_FACTOR);
                    }
                }
            }
        }

        effect
    }

    pub fn shift(&mut self, offset: Vec2) {
        for stage in Stage::ALL {
            self.entity_mut(stage).shift(offset);
        }
    }

    pub fn gravity_sources(&self) -> Vec<GravitySource> {
        match self.active {
            Some(stage) => self.entity(stage).gravity_sources(),
            None => Vec::new(),
        }
    }
}
