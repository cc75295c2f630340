//! # XP Formulas
//!
//! Pure functions of their inputs. The progression engine reads flags,
//! calls into here under its lock, then writes the outcome back.

use crate::settings::SkillSettings;
use bruiser_shared::SKILL_MAX_LEVEL;

/// XP needed to go from `level` to `level + 1`.
///
/// `SkillImproveMult * level ^ curve + SkillImproveOffset`, the engine's own
/// skill curve.
#[must_use]
pub fn next_skill_level_xp(settings: &SkillSettings, level: f32, curve: f32) -> f32 {
    settings.skill_improve_mult.get() * level.powf(curve) + settings.skill_improve_offset.get()
}

/// Skill XP for one hit dealing `damage`.
///
/// `SkillUseMult * damage ^ DamageXPDampen + SkillUseOffset`.
#[must_use]
pub fn calc_skill_xp_gain(settings: &SkillSettings, damage: f32) -> f32 {
    settings.skill_use_mult.get() * damage.powf(settings.damage_xp_dampen.get())
        + settings.skill_use_offset.get()
}

/// Skill state after applying an XP gain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RolloverOutcome {
    /// New level.
    pub level: f32,
    /// XP carried toward the next level. Zero at max level.
    pub exp: f32,
    /// `exp / xp_needed`. Zero at max level.
    pub ratio: f32,
    /// XP needed for the next level at the new level.
    pub xp_needed: f32,
    /// Levels gained by this application.
    pub levels_gained: u32,
    /// Player level XP earned by the level-ups.
    pub player_xp: f32,
}

impl RolloverOutcome {
    /// `true` if the skill is capped.
    #[must_use]
    pub fn at_max_level(&self) -> bool {
        self.level >= SKILL_MAX_LEVEL
    }
}

/// Adds `xp_gain` to `(level, exp)` and rolls over as many levels as it
/// pays for, stopping at [`SKILL_MAX_LEVEL`].
///
/// Each level-up to `n` earns `n * xp_per_rank` player XP when
/// `xp_per_rank` is given.
#[must_use]
pub fn apply_rollover(
    settings: &SkillSettings,
    level: f32,
    exp: f32,
    xp_gain: f32,
    curve: f32,
    xp_per_rank: Option<f32>,
) -> RolloverOutcome {
    let mut level = level;
    let mut new_exp = exp + xp_gain;
    let mut xp_needed = next_skill_level_xp(settings, level, curve);
    let mut levels_gained = 0;
    let mut player_xp = 0.0;

    while new_exp >= xp_needed && level < SKILL_MAX_LEVEL {
        level += 1.0;
        levels_gained += 1;
        new_exp -= xp_needed;
        xp_needed = next_skill_level_xp(settings, level, curve);
        if let Some(per_rank) = xp_per_rank {
            player_xp += level * per_rank;
        }
    }

    if level >= SKILL_MAX_LEVEL {
        return RolloverOutcome {
            level,
            exp: 0.0,
            ratio: 0.0,
            xp_needed,
            levels_gained,
            player_xp,
        };
    }

    let ratio = if xp_needed > 0.0 {
        new_exp / xp_needed
    } else {
        0.0
    };
    RolloverOutcome {
        level,
        exp: new_exp,
        ratio,
        xp_needed,
        levels_gained,
        player_xp,
    }
}
