//! Player stat aggregation
//!
//! `PlayerStats` is always rebuilt from `DEFAULT_PLAYER_STATS`: character base,
//! then every held skill, then the character's passive trait. Multiplicative
//! fields combine by product, count/additive fields by sum.

use serde::{Deserialize, Serialize};

use super::skills::{PlayerSkill, SkillEffect};

/// Derived per-frame stat sheet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    // Multiplicative (default 1.0)
    pub damage_multiplier: f32,
    pub fire_rate_multiplier: f32,
    pub move_speed_multiplier: f32,
    pub knockback_multiplier: f32,
    pub projectile_speed_multiplier: f32,
    pub projectile_size_multiplier: f32,
    pub xp_multiplier: f32,

    // Additive / counts (default 0)
    pub bounce_count: u32,
    pub piercing_count: u32,
    pub spread_count: u32,
    /// Times a shot turns back toward the player at the end of its range
    pub return_count: u32,
    pub explosion_radius: f32,
    /// Total fan angle (radians) used when `spread_count > 0`
    pub spread_angle: f32,
    /// Radians per second a homing shot may turn (0 = no homing)
    pub homing_turn_rate: f32,
    pub magnet_radius_bonus: f32,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    /// Damage lost per pierce (fraction)
    pub pierce_damage_decay: f32,
    pub damage_reduction: f32,
    pub max_health_bonus: f32,
    /// Health per second
    pub regeneration: f32,
    pub aura_radius: f32,
    /// Aura damage per second
    pub aura_damage: f32,
}

pub const DEFAULT_PLAYER_STATS: PlayerStats = PlayerStats {
    damage_multiplier: 1.0,
    fire_rate_multiplier: 1.0,
    move_speed_multiplier: 1.0,
    knockback_multiplier: 1.0,
    projectile_speed_multiplier: 1.0,
    projectile_size_multiplier: 1.0,
    xp_multiplier: 1.0,
    bounce_count: 0,
    piercing_count: 0,
    spread_count: 0,
    return_count: 0,
    explosion_radius: 0.0,
    spread_angle: 0.35,
    homing_turn_rate: 0.0,
    magnet_radius_bonus: 0.0,
    crit_chance: 0.05,
    crit_multiplier: 1.5,
    pierce_damage_decay: 0.3,
    damage_reduction: 0.0,
    max_health_bonus: 0.0,
    regeneration: 0.0,
    aura_radius: 0.0,
    aura_damage: 0.0,
};

impl Default for PlayerStats {
    fn default() -> Self {
        DEFAULT_PLAYER_STATS
    }
}

/// Upper bound for damage reduction from all sources
pub const MAX_DAMAGE_REDUCTION: f32 = 0.75;

/// Passive traits, one per character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PassiveTrait {
    /// Damage reduction that scales with level
    Fortitude,
    /// Flat crit chance and crit damage
    CriticalEdge,
    /// XP multiplier
    LuckyStar,
    /// Damaging aura around the player, radius scales with level
    GuardianAura,
}

impl PassiveTrait {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassiveTrait::Fortitude => "fortitude",
            PassiveTrait::CriticalEdge => "critical-edge",
            PassiveTrait::LuckyStar => "lucky-star",
            PassiveTrait::GuardianAura => "guardian-aura",
        }
    }

    /// Applied last, after character base and skills
    pub fn apply(&self, stats: &mut PlayerStats, level: u32) {
        let level = level.max(1) as f32;
        match self {
            PassiveTrait::Fortitude => {
                stats.damage_reduction += (0.05 + 0.01 * level).min(0.3);
            }
            PassiveTrait::CriticalEdge => {
                stats.crit_chance += 0.1;
                stats.crit_multiplier += 0.5;
            }
            PassiveTrait::LuckyStar => {
                stats.xp_multiplier *= 1.25;
            }
            PassiveTrait::GuardianAura => {
                stats.aura_radius += 60.0 + 4.0 * level;
                stats.aura_damage += 6.0 + 0.5 * level;
            }
        }
    }
}

/// Selectable characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Character {
    #[default]
    Newton,
    Einstein,
    Curie,
    Tesla,
}

impl Character {
    pub const ALL: [Character; 4] = [
        Character::Newton,
        Character::Einstein,
        Character::Curie,
        Character::Tesla,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Character::Newton => "newton",
            Character::Einstein => "einstein",
            Character::Curie => "curie",
            Character::Tesla => "tesla",
        }
    }

    pub fn passive(&self) -> PassiveTrait {
        match self {
            Character::Newton => PassiveTrait::Fortitude,
            Character::Einstein => PassiveTrait::CriticalEdge,
            Character::Curie => PassiveTrait::LuckyStar,
            Character::Tesla => PassiveTrait::GuardianAura,
        }
    }

    /// Character base modifiers
    fn apply_base(&self, stats: &mut PlayerStats) {
        match self {
            Character::Newton => {
                stats.knockback_multiplier *= 1.3;
                stats.max_health_bonus += 20.0;
            }
            Character::Einstein => {
                stats.projectile_speed_multiplier *= 1.2;
                stats.fire_rate_multiplier *= 1.1;
            }
            Character::Curie => {
                stats.damage_multiplier *= 1.15;
                stats.explosion_radius += 20.0;
            }
            Character::Tesla => {
                stats.move_speed_multiplier *= 1.1;
                stats.bounce_count += 1;
            }
        }
    }
}

impl SkillEffect {
    /// Fold `level` levels of this effect into `stats`
    pub fn apply(&self, stats: &mut PlayerStats, level: u32) {
        let lv = level as f32;
        match *self {
            SkillEffect::DamageMultiplier(per) => stats.damage_multiplier *= 1.0 + per * lv,
            SkillEffect::FireRateMultiplier(per) => stats.fire_rate_multiplier *= 1.0 + per * lv,
            SkillEffect::MoveSpeedMultiplier(per) => stats.move_speed_multiplier *= 1.0 + per * lv,
            SkillEffect::KnockbackMultiplier(per) => stats.knockback_multiplier *= 1.0 + per * lv,
            SkillEffect::ProjectileSpeedMultiplier(per) => {
                stats.projectile_speed_multiplier *= 1.0 + per * lv
            }
            SkillEffect::ProjectileSizeMultiplier(per) => {
                stats.projectile_size_multiplier *= 1.0 + per * lv
            }
            SkillEffect::BounceCount(per) => stats.bounce_count += per * level,
            SkillEffect::PiercingCount(per) => stats.piercing_count += per * level,
            SkillEffect::ExplosionRadius(per) => stats.explosion_radius += per * lv,
            SkillEffect::SpreadCount(per) => {
                stats.spread_count += per * level;
                stats.spread_angle += 0.1 * lv;
            }
            SkillEffect::HomingTurnRate(per) => stats.homing_turn_rate += per * lv,
            SkillEffect::ReturnCount(per) => stats.return_count += per * level,
            SkillEffect::MagnetRadius(per) => stats.magnet_radius_bonus += per * lv,
            SkillEffect::CritChance(per) => stats.crit_chance += per * lv,
            SkillEffect::PierceDecayReduction(per) => stats.pierce_damage_decay -= per * lv,
            SkillEffect::MaxHealth(per) => stats.max_health_bonus += per * lv,
            SkillEffect::Regeneration(per) => stats.regeneration += per * lv,
            SkillEffect::Heal(_) => {}
        }
    }
}

/// Rebuild the full stat sheet. Pure: same inputs, same output.
pub fn recalculate_stats(character: Character, skills: &[PlayerSkill], level: u32) -> PlayerStats {
    let mut stats = DEFAULT_PLAYER_STATS;
    character.apply_base(&mut stats);

    for skill in skills {
        let def = skill.skill_id.def();
        def.effect.apply(&mut stats, skill.level.min(def.max_level));
    }

    character.passive().apply(&mut stats, level);

    stats.crit_chance = stats.crit_chance.clamp(0.0, 1.0);
    stats.pierce_damage_decay = stats.pierce_damage_decay.clamp(0.0, 1.0);
    stats.damage_reduction = stats.damage_reduction.clamp(0.0, MAX_DAMAGE_REDUCTION);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::skills::{SKILLS, SkillId};
    use proptest::prelude::*;

    fn skill(id: SkillId, level: u32) -> PlayerSkill {
        PlayerSkill { skill_id: id, level }
    }

    #[test]
    fn test_defaults_without_skills() {
        let stats = recalculate_stats(Character::Einstein, &[], 1);
        assert_eq!(stats.damage_multiplier, 1.0);
        assert_eq!(stats.bounce_count, 0);
        assert!((stats.crit_chance - 0.15).abs() < 1e-6);
        assert!((stats.projectile_speed_multiplier - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_multiplicative_fields_combine_by_product() {
        let stats = recalculate_stats(Character::Curie, &[skill(SkillId::Force, 2)], 1);
        // 1.15 (Curie) * 1.3 (two levels of Force)
        assert!((stats.damage_multiplier - 1.15 * 1.3).abs() < 1e-5);
    }

    #[test]
    fn test_additive_fields_combine_by_sum() {
        let stats = recalculate_stats(
            Character::Tesla,
            &[skill(SkillId::ElasticCollision, 2), skill(SkillId::Transmission, 1)],
            1,
        );
        assert_eq!(stats.bounce_count, 3);
        assert_eq!(stats.piercing_count, 1);
    }

    #[test]
    fn test_dropping_a_skill_leaves_no_stale_multiplier() {
        let with = recalculate_stats(Character::Newton, &[skill(SkillId::Frequency, 3)], 4);
        let without = recalculate_stats(Character::Newton, &[], 4);
        assert!(with.fire_rate_multiplier > 1.0);
        assert_eq!(without.fire_rate_multiplier, 1.0);
    }

    #[test]
    fn test_fortitude_scales_with_level() {
        let low = recalculate_stats(Character::Newton, &[], 1);
        let high = recalculate_stats(Character::Newton, &[], 10);
        assert!(high.damage_reduction > low.damage_reduction);
    }

    #[test]
    fn test_guardian_aura_radius() {
        let stats = recalculate_stats(Character::Tesla, &[], 5);
        assert_eq!(stats.aura_radius, 80.0);
        assert!(stats.aura_damage > 0.0);
    }

    #[test]
    fn test_harmonic_motion_grants_one_return() {
        let stats = recalculate_stats(Character::Einstein, &[skill(SkillId::HarmonicMotion, 4)], 1);
        assert_eq!(stats.return_count, 1);
        assert_eq!(recalculate_stats(Character::Einstein, &[], 1).return_count, 0);
    }

    #[test]
    fn test_levels_above_max_are_clamped() {
        let clamped = recalculate_stats(Character::Newton, &[skill(SkillId::Transmission, 99)], 1);
        assert_eq!(clamped.piercing_count, 3);
    }

    fn skill_list() -> impl Strategy<Value = Vec<PlayerSkill>> {
        prop::collection::vec((0..SKILLS.len(), 1u32..6), 0..8).prop_map(|picks| {
            let mut out: Vec<PlayerSkill> = Vec::new();
            for (idx, level) in picks {
                let id = SKILLS[idx].id;
                if !out.iter().any(|s| s.skill_id == id) {
                    out.push(skill(id, level));
                }
            }
            out
        })
    }

    proptest! {
        #[test]
        fn prop_recalculation_is_pure(
            character in prop::sample::select(Character::ALL.to_vec()),
            skills in skill_list(),
            level in 1u32..40,
        ) {
            let a = recalculate_stats(character, &skills, level);
            let b = recalculate_stats(character, &skills, level);
            prop_assert_eq!(a, b);
            prop_assert!(a.damage_reduction <= MAX_DAMAGE_REDUCTION);
            prop_assert!(a.crit_chance <= 1.0);
        }
    }
}
