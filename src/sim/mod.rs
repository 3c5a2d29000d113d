//! Deterministic simulation module
//!
//! All gameplay logic lives here. Given the same seed, debug config and
//! frame deltas, a run plays out identically:
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod combo;
pub mod effects;
pub mod enemy;
pub mod events;
pub mod impact;
pub mod orbs;
pub mod pool;
pub mod progress;
pub mod projectile;
pub mod scene;
pub mod skills;
pub mod state;
pub mod stats;
pub mod tick;
pub mod timers;
pub mod world;

pub use combo::{ComboTier, ComboTracker};
pub use enemy::{Enemy, EnemySystem, EnemyTier, MergeRules};
pub use events::{EventQueue, GameEvent};
pub use impact::{ImpactController, ImpactKind};
pub use projectile::{CombatEvent, Projectile, ProjectileSystem};
pub use scene::PhysicsSurvivorScene;
pub use skills::{SkillBook, SkillId};
pub use state::{Joystick, Player, Rank, RunState, RunSummary, ScenePhase};
pub use stats::{Character, PlayerStats};
pub use tick::{FrameInput, TickOutcome, tick};
pub use world::{Stage, StageWorld};
