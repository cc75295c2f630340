//! # Host Services
//!
//! Everything the plugin asks of the game engine, as traits. The engine
//! side implements these; [`mock`] implements them in-process for tests.
//!
//! ```text
//! bruiser defines:        the engine binding implements:
//! ┌──────────────────┐    ┌──────────────────┐
//! │ trait FormLookup │ ←─ │ impl FormLookup  │
//! └──────────────────┘    └──────────────────┘
//! ```
//!
//! All methods are called from host notification threads and from
//! background tasks, so implementations must be `Send + Sync`.

pub mod mock;

use crate::dispatch::EventSource;
use crate::error::{ProcessError, ResolveError, ResolveResult};
use crate::flags::{GameSetting, NamedFlag};
use crate::script::ScriptVm;
use bruiser_shared::{
    AnimationEvent, FormId, Hand, HitEvent, KeywordId, MenuOpenCloseEvent, RefId,
};
use std::sync::Arc;

// =============================================================================
// DATA
// =============================================================================

/// Weapon record, as far as the plugin cares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeaponInfo {
    /// Form id.
    pub form: FormId,
    /// Display name.
    pub name: String,
    /// Keywords attached to the weapon.
    pub keywords: Vec<KeywordId>,
}

impl WeaponInfo {
    /// `true` if the weapon carries `keyword`.
    #[must_use]
    pub fn has_keyword(&self, keyword: KeywordId) -> bool {
        self.keywords.contains(&keyword)
    }
}

/// The attack the player is currently performing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttackData {
    /// Attack kind, e.g. `AttackStartH2HRight`.
    pub event: String,
    /// Power attack flag.
    pub is_power: bool,
}

/// Actor life state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LifeState {
    /// Up and about.
    #[default]
    Alive,
    /// Knocked down but recoverable.
    Bleedout,
    /// Dying animation playing.
    Dying,
    /// Dead.
    Dead,
}

/// Runtime state of an actor hit by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActorStatus {
    /// Has an AI process.
    pub has_process: bool,
    /// The process has high-level data (the actor is loaded near the player).
    pub has_high_process: bool,
    /// Life state.
    pub life_state: LifeState,
    /// 3D is loaded.
    pub has_3d: bool,
}

impl ActorStatus {
    /// A loaded, living actor.
    #[must_use]
    pub const fn alive() -> Self {
        Self {
            has_process: true,
            has_high_process: true,
            life_state: LifeState::Alive,
            has_3d: true,
        }
    }

    /// `true` if hitting this actor can train a skill.
    #[must_use]
    pub fn is_valid_target(&self) -> bool {
        self.has_process
            && self.has_high_process
            && self.life_state != LifeState::Dead
            && self.has_3d
    }
}

/// Skills a race can boost at character creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkillKind {
    /// One-handed weapons.
    OneHanded,
    /// Two-handed weapons.
    TwoHanded,
    /// Bows.
    Archery,
    /// Blocking.
    Block,
    /// Any other skill, by actor value index.
    Other(u32),
}

/// One race skill bonus.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkillBoost {
    /// Boosted skill.
    pub skill: SkillKind,
    /// Bonus points.
    pub bonus: f32,
}

// =============================================================================
// TRAITS
// =============================================================================

/// Form table access.
pub trait FormLookup: Send + Sync {
    /// Named flag by editor id.
    fn flag(&self, editor_id: &str) -> Option<NamedFlag>;

    /// Keyword by editor id.
    fn keyword(&self, editor_id: &str) -> Option<KeywordId>;

    /// Engine setting by name.
    fn game_setting(&self, name: &str) -> Option<GameSetting>;

    /// Weapon data. `None` if the form is not a weapon.
    fn weapon(&self, form: FormId) -> Option<WeaponInfo>;
}

/// Actor and player state.
pub trait ActorAccess: Send + Sync {
    /// The player reference.
    fn player(&self) -> RefId;

    /// `true` if `actor` is the player.
    fn is_player(&self, actor: RefId) -> bool {
        actor == self.player()
    }

    /// Display name, for logs.
    fn display_name(&self, reference: RefId) -> String;

    /// Form equipped in the player's hand, weapon or not.
    fn equipped_object(&self, hand: Hand) -> Option<FormId>;

    /// The player's current attack.
    ///
    /// `Ok(None)` when the player is not attacking.
    ///
    /// # Errors
    ///
    /// [`ProcessError`] when the player's AI process data is missing.
    fn attack_data(&self) -> Result<Option<AttackData>, ProcessError>;

    /// Runtime state of `reference`. `None` if it is not an actor.
    fn actor_status(&self, reference: RefId) -> Option<ActorStatus>;

    /// `true` while the player is a werewolf or vampire lord.
    fn in_beast_form(&self) -> bool;

    /// The player's base unarmed damage.
    fn unarmed_damage(&self) -> f32;

    /// The player race's skill bonuses. `None` if the race is unavailable.
    fn race_skill_boosts(&self) -> Option<Vec<SkillBoost>>;

    /// `true` while character creation is unfinished (hands still bound).
    fn char_gen_in_progress(&self) -> bool;
}

/// Perk entry points the plugin runs values through.
pub trait PerkEntryPoints: Send + Sync {
    /// Applies the player's attack damage perks against `target`.
    fn mod_attack_damage(&self, weapon: FormId, target: RefId, damage: f32) -> f32;

    /// Applies the player's skill use perks.
    fn mod_skill_use(&self, skill_improve: f32) -> f32;
}

// =============================================================================
// HOST BUNDLE
// =============================================================================

/// Every host service the plugin uses, shared by handle.
#[derive(Clone)]
pub struct Host {
    /// Form table.
    pub forms: Arc<dyn FormLookup>,
    /// Actor state.
    pub actors: Arc<dyn ActorAccess>,
    /// Perk entry points.
    pub perks: Arc<dyn PerkEntryPoints>,
    /// Script VM.
    pub vm: Arc<dyn ScriptVm>,
    /// The player's animation graph notifications.
    pub animation_events: Arc<dyn EventSource<AnimationEvent>>,
    /// Hit notifications.
    pub hit_events: Arc<dyn EventSource<HitEvent>>,
    /// Menu open/close notifications.
    pub menu_events: Arc<dyn EventSource<MenuOpenCloseEvent>>,
}

impl Host {
    /// Resolves a named flag.
    ///
    /// # Errors
    ///
    /// [`ResolveError::MissingFlag`] if the host has no such flag.
    pub fn resolve_flag(&self, editor_id: &str) -> ResolveResult<NamedFlag> {
        self.forms
            .flag(editor_id)
            .ok_or_else(|| ResolveError::MissingFlag(editor_id.to_string()))
    }

    /// Resolves a keyword.
    ///
    /// # Errors
    ///
    /// [`ResolveError::MissingKeyword`] if the host has no such keyword.
    pub fn resolve_keyword(&self, editor_id: &str) -> ResolveResult<KeywordId> {
        self.forms
            .keyword(editor_id)
            .ok_or_else(|| ResolveError::MissingKeyword(editor_id.to_string()))
    }

    /// Resolves an engine setting.
    ///
    /// # Errors
    ///
    /// [`ResolveError::MissingGameSetting`] if the host has no such setting.
    pub fn resolve_game_setting(&self, name: &str) -> ResolveResult<GameSetting> {
        self.forms
            .game_setting(name)
            .ok_or_else(|| ResolveError::MissingGameSetting(name.to_string()))
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use bruiser_shared::constants;

    #[test]
    fn test_dead_or_unloaded_actors_are_not_targets() {
        assert!(ActorStatus::alive().is_valid_target());

        let dead = ActorStatus {
            life_state: LifeState::Dead,
            ..ActorStatus::alive()
        };
        assert!(!dead.is_valid_target());

        let bleeding = ActorStatus {
            life_state: LifeState::Bleedout,
            ..ActorStatus::alive()
        };
        assert!(bleeding.is_valid_target());

        let unloaded = ActorStatus {
            has_3d: false,
            ..ActorStatus::alive()
        };
        assert!(!unloaded.is_valid_target());

        let far = ActorStatus {
            has_high_process: false,
            ..ActorStatus::alive()
        };
        assert!(!far.is_valid_target());
    }

    #[test]
    fn test_resolve_reports_missing_names() {
        let mock = MockHost::new();
        let host = mock.host();

        assert_eq!(
            host.resolve_flag(constants::SKILL_LEVEL).expect_err("empty host"),
            ResolveError::MissingFlag(constants::SKILL_LEVEL.to_string())
        );
        assert!(matches!(
            host.resolve_keyword(constants::UNARMED_KEYWORD),
            Err(ResolveError::MissingKeyword(_))
        ));
        assert!(matches!(
            host.resolve_game_setting(constants::SKILL_USE_CURVE),
            Err(ResolveError::MissingGameSetting(_))
        ));
    }

    #[test]
    fn test_resolved_flag_is_the_host_cell() {
        let mock = MockHost::standard();
        let host = mock.host();
        let level = host.resolve_flag(constants::SKILL_LEVEL).expect("flag");
        level.set(42.0);
        assert_eq!(mock.forms.flag_value(constants::SKILL_LEVEL), Some(42.0));
    }
}
