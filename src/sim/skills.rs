//! Skill catalog and the player's held skills
//!
//! Every skill is themed after a physics formula. Display names are looked up
//! externally by [`SkillId::as_str`]; the `formula` string is shown verbatim.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Skill identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkillId {
    Force,
    Frequency,
    Velocity,
    Momentum,
    ElasticCollision,
    Transmission,
    ChainReaction,
    Diffraction,
    KineticEnergy,
    CentripetalForce,
    HarmonicMotion,
    MagneticField,
    Uncertainty,
    MassIncrease,
    Superconductivity,
    Inertia,
    Entropy,
    /// Always-available fallback when every other skill is maxed
    EnergyConservation,
}

/// What one level of a skill does to the stat sheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkillEffect {
    DamageMultiplier(f32),
    FireRateMultiplier(f32),
    MoveSpeedMultiplier(f32),
    KnockbackMultiplier(f32),
    ProjectileSpeedMultiplier(f32),
    ProjectileSizeMultiplier(f32),
    BounceCount(u32),
    PiercingCount(u32),
    ExplosionRadius(f32),
    SpreadCount(u32),
    HomingTurnRate(f32),
    /// Shots turn back toward the player at the end of their range
    ReturnCount(u32),
    MagnetRadius(f32),
    CritChance(f32),
    PierceDecayReduction(f32),
    MaxHealth(f32),
    Regeneration(f32),
    /// Instant heal by a fraction of max health; never enters the skill list
    Heal(f32),
}

/// Static skill definition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillDef {
    pub id: SkillId,
    pub formula: &'static str,
    pub max_level: u32,
    pub effect: SkillEffect,
}

impl SkillDef {
    pub fn is_instant(&self) -> bool {
        matches!(self.effect, SkillEffect::Heal(_))
    }
}

/// The full catalog (fallback last)
pub const SKILLS: &[SkillDef] = &[
    SkillDef {
        id: SkillId::Force,
        formula: "F = ma",
        max_level: 5,
        effect: SkillEffect::DamageMultiplier(0.15),
    },
    SkillDef {
        id: SkillId::Frequency,
        formula: "f = 1/T",
        max_level: 5,
        effect: SkillEffect::FireRateMultiplier(0.12),
    },
    SkillDef {
        id: SkillId::Velocity,
        formula: "v = d/t",
        max_level: 5,
        effect: SkillEffect::MoveSpeedMultiplier(0.08),
    },
    SkillDef {
        id: SkillId::Momentum,
        formula: "p = mv",
        max_level: 5,
        effect: SkillEffect::KnockbackMultiplier(0.25),
    },
    SkillDef {
        id: SkillId::ElasticCollision,
        formula: "m1v1 + m2v2 = m1v1' + m2v2'",
        max_level: 3,
        effect: SkillEffect::BounceCount(1),
    },
    SkillDef {
        id: SkillId::Transmission,
        formula: "T = 1 - R",
        max_level: 3,
        effect: SkillEffect::PiercingCount(1),
    },
    SkillDef {
        id: SkillId::ChainReaction,
        formula: "E = mc²",
        max_level: 5,
        effect: SkillEffect::ExplosionRadius(24.0),
    },
    SkillDef {
        id: SkillId::Diffraction,
        formula: "d sinθ = nλ",
        max_level: 4,
        effect: SkillEffect::SpreadCount(1),
    },
    SkillDef {
        id: SkillId::KineticEnergy,
        formula: "KE = ½mv²",
        max_level: 5,
        effect: SkillEffect::ProjectileSpeedMultiplier(0.1),
    },
    SkillDef {
        id: SkillId::CentripetalForce,
        formula: "F = mv²/r",
        max_level: 3,
        effect: SkillEffect::HomingTurnRate(1.5),
    },
    SkillDef {
        id: SkillId::HarmonicMotion,
        formula: "x = A cos(ωt)",
        max_level: 1,
        effect: SkillEffect::ReturnCount(1),
    },
    SkillDef {
        id: SkillId::MagneticField,
        formula: "F = qvB",
        max_level: 5,
        effect: SkillEffect::MagnetRadius(30.0),
    },
    SkillDef {
        id: SkillId::Uncertainty,
        formula: "ΔxΔp ≥ ħ/2",
        max_level: 5,
        effect: SkillEffect::CritChance(0.05),
    },
    SkillDef {
        id: SkillId::MassIncrease,
        formula: "m = m0/√(1-v²/c²)",
        max_level: 5,
        effect: SkillEffect::ProjectileSizeMultiplier(0.15),
    },
    SkillDef {
        id: SkillId::Superconductivity,
        formula: "R = 0",
        max_level: 3,
        effect: SkillEffect::PierceDecayReduction(0.08),
    },
    SkillDef {
        id: SkillId::Inertia,
        formula: "ΣF = 0",
        max_level: 5,
        effect: SkillEffect::MaxHealth(20.0),
    },
    SkillDef {
        id: SkillId::Entropy,
        formula: "ΔS ≥ 0",
        max_level: 5,
        effect: SkillEffect::Regeneration(0.5),
    },
    SkillDef {
        id: SkillId::EnergyConservation,
        formula: "ΔE = 0",
        max_level: u32::MAX,
        effect: SkillEffect::Heal(0.3),
    },
];

impl SkillId {
    /// Stable id used for localization lookups and persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillId::Force => "force",
            SkillId::Frequency => "frequency",
            SkillId::Velocity => "velocity",
            SkillId::Momentum => "momentum",
            SkillId::ElasticCollision => "elastic-collision",
            SkillId::Transmission => "transmission",
            SkillId::ChainReaction => "chain-reaction",
            SkillId::Diffraction => "diffraction",
            SkillId::KineticEnergy => "kinetic-energy",
            SkillId::CentripetalForce => "centripetal-force",
            SkillId::HarmonicMotion => "harmonic-motion",
            SkillId::MagneticField => "magnetic-field",
            SkillId::Uncertainty => "uncertainty",
            SkillId::MassIncrease => "mass-increase",
            SkillId::Superconductivity => "superconductivity",
            SkillId::Inertia => "inertia",
            SkillId::Entropy => "entropy",
            SkillId::EnergyConservation => "energy-conservation",
        }
    }

    pub fn def(&self) -> &'static SkillDef {
        // Every id has exactly one catalog entry
        SKILLS
            .iter()
            .find(|d| d.id == *self)
            .unwrap_or(&SKILLS[SKILLS.len() - 1])
    }
}

/// A held skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSkill {
    pub skill_id: SkillId,
    pub level: u32,
}

/// The active skill list; one entry per skill id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillBook {
    skills: Vec<PlayerSkill>,
}

impl SkillBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skills(&self) -> &[PlayerSkill] {
        &self.skills
    }

    pub fn level_of(&self, id: SkillId) -> u32 {
        self.skills
            .iter()
            .find(|s| s.skill_id == id)
            .map(|s| s.level)
            .unwrap_or(0)
    }

    pub fn is_maxed(&self, id: SkillId) -> bool {
        self.level_of(id) >= id.def().max_level
    }

    /// Take a skill: increments a held skill (clamped to `max_level`) or adds
    /// it at level 1. Instant skills are not recorded. Returns the new level.
    pub fn add(&mut self, id: SkillId) -> u32 {
        let def = id.def();
        if def.is_instant() {
            return 0;
        }
        match self.skills.iter_mut().find(|s| s.skill_id == id) {
            Some(skill) => {
                skill.level = (skill.level + 1).min(def.max_level);
                skill.level
            }
            None => {
                self.skills.push(PlayerSkill {
                    skill_id: id,
                    level: 1,
                });
                1
            }
        }
    }

    /// Roll up to `count` distinct offers among skills that can still level.
    /// Falls back to the baseline recovery skill if nothing is left.
    pub fn roll_options(&self, count: usize, rng: &mut impl Rng) -> Vec<SkillId> {
        let mut pool: Vec<SkillId> = SKILLS
            .iter()
            .filter(|d| !d.is_instant() && !self.is_maxed(d.id))
            .map(|d| d.id)
            .collect();

        if pool.is_empty() {
            log::warn!("Skill pool exhausted, offering fallback");
            return vec![SkillId::EnergyConservation];
        }

        pool.shuffle(rng);
        pool.truncate(count.max(1));
        pool
    }

    pub fn clear(&mut self) {
        self.skills.clear();
    }
}
