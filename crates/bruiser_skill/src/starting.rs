//! # Starting Skill Initializer
//!
//! Gives a fresh character a hand-to-hand level derived from its race, once.
//!
//! ## States
//!
//! ```text
//!            new game / load during char-gen
//!   Idle ───────────────────────────────────▶ AwaitingRaceMenu
//!    │                                              │ RaceSex Menu closed
//!    │ load of a finished character                 ▼
//!    └─────────────────────────────────────────▶ Applied
//! ```
//!
//! The level flag is written with compare-and-swap against zero, so a value
//! set by anything else first is never overwritten.

use bruiser_core::{
    ActorAccess, EventSink, EventSource, GameSetting, Host, NamedFlag, ResolveResult, SinkHandle,
    SkillKind,
};
use bruiser_shared::constants;
use bruiser_shared::{EventControl, MenuOpenCloseEvent};
use parking_lot::Mutex;
use std::sync::Arc;

/// Where the initializer is in its one-shot life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InitState {
    /// Nothing pending.
    #[default]
    Idle,
    /// Waiting for race selection to finish.
    AwaitingRaceMenu,
    /// The starting level was computed and committed.
    Applied,
}

/// Starting level for a race with the given weapon skill bonuses.
///
/// `ceil(base + (one_handed + two_handed) / 2)`
#[must_use]
pub fn starting_level(base: i32, one_handed: f32, two_handed: f32) -> f32 {
    (base as f32 + (one_handed + two_handed) / 2.0).ceil()
}

/// One-shot starting skill writer.
pub struct StartingSkillManager {
    actors: Arc<dyn ActorAccess>,
    menu_events: Arc<dyn EventSource<MenuOpenCloseEvent>>,
    skill_level: NamedFlag,
    skill_start: GameSetting,
    state: Mutex<InitState>,
    sink: Mutex<Option<SinkHandle>>,
}

impl StartingSkillManager {
    /// Resolves the level flag and the base starting skill.
    ///
    /// # Errors
    ///
    /// The first [`ResolveError`](bruiser_core::ResolveError).
    pub fn load_forms(host: &Host) -> ResolveResult<Arc<Self>> {
        let skill_level = host.resolve_flag(constants::SKILL_LEVEL)?;
        let skill_start = host.resolve_game_setting(constants::SKILL_START)?;
        tracing::info!("Starting Skill Manager loaded.");

        Ok(Arc::new(Self {
            actors: Arc::clone(&host.actors),
            menu_events: Arc::clone(&host.menu_events),
            skill_level,
            skill_start,
            state: Mutex::new(InitState::Idle),
            sink: Mutex::new(None),
        }))
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> InitState {
        *self.state.lock()
    }

    /// Arms the race menu wait. Called on new game.
    ///
    /// Returns `false` if the menu source refused the subscription.
    pub fn register_for_race_menu_done(self: &Arc<Self>) -> bool {
        let mut sink = self.sink.lock();
        if sink.is_none() {
            let handler: Arc<dyn EventSink<MenuOpenCloseEvent>> = self.clone();
            match self.menu_events.add_sink(handler) {
                Some(handle) => *sink = Some(handle),
                None => {
                    tracing::error!(
                        "Failed to register race menu complete event with the menu event source."
                    );
                    return false;
                }
            }
        }
        *self.state.lock() = InitState::AwaitingRaceMenu;
        tracing::info!("Skill manager ready to set skill values after racemenu close");
        true
    }

    /// Handles a save load.
    pub fn handle_existing_character(self: &Arc<Self>) {
        tracing::trace!("Handling skill initialization for existing save.");

        if self.skill_level.get() != 0.0 {
            tracing::info!("Skill level already set, no starting skill management needed.");
            return;
        }
        if self.state() == InitState::AwaitingRaceMenu {
            tracing::info!(
                "Race Menu close event will handle setting starting skills. Ignoring post game load."
            );
            return;
        }
        if self.actors.char_gen_in_progress() {
            tracing::info!(
                "Loaded into game preexisting save that hasn't yet finished race menu selection. \
                 Will set starting skills post race menu finish."
            );
            self.register_for_race_menu_done();
            return;
        }

        self.set_starting_skill_value();
    }

    /// Computes and commits the starting level. Returns `true` if written.
    fn set_starting_skill_value(&self) -> bool {
        tracing::trace!("Performing Hand To Hand Skill value initialization.");
        let Some(boosts) = self.actors.race_skill_boosts() else {
            tracing::error!("Unable to get player race info.");
            *self.state.lock() = InitState::Idle;
            return false;
        };

        let mut one_handed = 0.0;
        let mut two_handed = 0.0;
        for boost in &boosts {
            match boost.skill {
                SkillKind::OneHanded => one_handed = boost.bonus,
                SkillKind::TwoHanded => two_handed = boost.bonus,
                _ => {}
            }
        }

        let level = starting_level(self.skill_start.get_int(), one_handed, two_handed);
        *self.state.lock() = InitState::Applied;
        match self.skill_level.compare_exchange(0.0, level) {
            Ok(_) => {
                tracing::info!("Setting Hand to Hand starting skill level to {level}");
                true
            }
            Err(current) => {
                tracing::info!("Skill level became {current} before initialization; leaving it.");
                false
            }
        }
    }

    /// Drops a pending race menu wait. Returns `false` if none was armed.
    pub fn unregister(&self) -> bool {
        match self.sink.lock().take() {
            Some(handle) => self.menu_events.remove_sink(handle),
            None => false,
        }
    }
}

impl EventSink<MenuOpenCloseEvent> for StartingSkillManager {
    fn process_event(&self, event: &MenuOpenCloseEvent) -> EventControl {
        if event.opening || event.menu_name != constants::RACE_MENU {
            return EventControl::Continue;
        }
        if self.state() != InitState::AwaitingRaceMenu {
            return EventControl::Continue;
        }

        if self.skill_level.get() == 0.0 {
            self.set_starting_skill_value();
        } else {
            tracing::info!("Skill level already set, no starting skill management needed.");
            *self.state.lock() = InitState::Idle;
        }
        self.unregister();
        EventControl::Stop
    }
}

impl std::fmt::Debug for StartingSkillManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartingSkillManager")
            .field("state", &self.state())
            .field("level", &self.skill_level.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bruiser_core::host::mock::MockHost;
    use bruiser_core::{ResolveError, SkillBoost};

    fn fresh_character() -> MockHost {
        let mock = MockHost::standard();
        mock.forms.set_flag(constants::SKILL_LEVEL, 0.0);
        mock.actors.set_race_boosts(Some(vec![
            SkillBoost {
                skill: SkillKind::OneHanded,
                bonus: 5.0,
            },
            SkillBoost {
                skill: SkillKind::TwoHanded,
                bonus: 3.0,
            },
            SkillBoost {
                skill: SkillKind::Block,
                bonus: 10.0,
            },
        ]));
        mock
    }

    fn level(mock: &MockHost) -> f32 {
        mock.forms.flag_value(constants::SKILL_LEVEL).expect("flag")
    }

    #[test]
    fn test_starting_level_formula() {
        assert_eq!(starting_level(15, 5.0, 3.0), 19.0);
        assert_eq!(starting_level(15, 5.0, 0.0), 18.0, "17.5 rounds up");
        assert_eq!(starting_level(15, 0.0, 0.0), 15.0);
    }

    #[test]
    fn test_load_forms_requires_level_and_setting() {
        let mock = MockHost::standard();
        mock.forms.remove_game_setting(constants::SKILL_START);
        let err = StartingSkillManager::load_forms(&mock.host()).expect_err("must fail");
        assert_eq!(
            err,
            ResolveError::MissingGameSetting(constants::SKILL_START.into())
        );
    }

    #[test]
    fn test_existing_finished_character_applies_immediately() {
        let mock = fresh_character();
        let manager = StartingSkillManager::load_forms(&mock.host()).expect("forms");
        manager.handle_existing_character();
        assert_eq!(level(&mock), 19.0);
        assert_eq!(manager.state(), InitState::Applied);
    }

    #[test]
    fn test_existing_levelled_character_is_left_alone() {
        let mock = fresh_character();
        mock.forms.set_flag(constants::SKILL_LEVEL, 42.0);
        let manager = StartingSkillManager::load_forms(&mock.host()).expect("forms");
        manager.handle_existing_character();
        assert_eq!(level(&mock), 42.0);
        assert_eq!(manager.state(), InitState::Idle);
    }

    #[test]
    fn test_load_during_char_gen_waits_for_race_menu() {
        let mock = fresh_character();
        mock.actors.set_char_gen_in_progress(true);
        let manager = StartingSkillManager::load_forms(&mock.host()).expect("forms");

        manager.handle_existing_character();
        assert_eq!(manager.state(), InitState::AwaitingRaceMenu);
        assert_eq!(level(&mock), 0.0);

        mock.menu_events
            .dispatch(&MenuOpenCloseEvent::closed(constants::RACE_MENU));
        assert_eq!(level(&mock), 19.0);
    }

    #[test]
    fn test_new_game_applies_on_race_menu_close_only() {
        let mock = fresh_character();
        let manager = StartingSkillManager::load_forms(&mock.host()).expect("forms");
        assert!(manager.register_for_race_menu_done());

        assert_eq!(
            mock.menu_events
                .dispatch(&MenuOpenCloseEvent::opened(constants::RACE_MENU)),
            EventControl::Continue
        );
        assert_eq!(
            mock.menu_events
                .dispatch(&MenuOpenCloseEvent::closed("InventoryMenu")),
            EventControl::Continue
        );
        assert_eq!(level(&mock), 0.0);

        assert_eq!(
            mock.menu_events
                .dispatch(&MenuOpenCloseEvent::closed(constants::RACE_MENU)),
            EventControl::Stop
        );
        assert_eq!(level(&mock), 19.0);
        assert_eq!(manager.state(), InitState::Applied);
        assert_eq!(mock.menu_events.sink_count(), 0, "consumed once");
    }

    #[test]
    fn test_applies_once_per_character() {
        let mock = fresh_character();
        let manager = StartingSkillManager::load_forms(&mock.host()).expect("forms");
        manager.register_for_race_menu_done();
        mock.menu_events
            .dispatch(&MenuOpenCloseEvent::closed(constants::RACE_MENU));
        assert_eq!(level(&mock), 19.0);

        // Player re-opens race menu and trains meanwhile.
        mock.forms.set_flag(constants::SKILL_LEVEL, 23.0);
        mock.menu_events
            .dispatch(&MenuOpenCloseEvent::closed(constants::RACE_MENU));
        manager.handle_existing_character();
        assert_eq!(level(&mock), 23.0);
    }

    #[test]
    fn test_load_while_race_menu_pending_is_ignored() {
        let mock = fresh_character();
        let manager = StartingSkillManager::load_forms(&mock.host()).expect("forms");
        manager.register_for_race_menu_done();

        manager.handle_existing_character();
        assert_eq!(level(&mock), 0.0);
        assert_eq!(manager.state(), InitState::AwaitingRaceMenu);
    }

    #[test]
    fn test_race_menu_close_with_level_set_stays_idle() {
        let mock = fresh_character();
        let manager = StartingSkillManager::load_forms(&mock.host()).expect("forms");
        manager.register_for_race_menu_done();
        mock.forms.set_flag(constants::SKILL_LEVEL, 30.0);

        let control = mock
            .menu_events
            .dispatch(&MenuOpenCloseEvent::closed(constants::RACE_MENU));
        assert_eq!(control, EventControl::Stop);
        assert_eq!(level(&mock), 30.0);
        assert_eq!(manager.state(), InitState::Idle);
    }

    #[test]
    fn test_missing_race_leaves_level_zero() {
        let mock = fresh_character();
        mock.actors.set_race_boosts(None);
        let manager = StartingSkillManager::load_forms(&mock.host()).expect("forms");
        manager.register_for_race_menu_done();
        mock.menu_events
            .dispatch(&MenuOpenCloseEvent::closed(constants::RACE_MENU));
        assert_eq!(level(&mock), 0.0);
        assert_eq!(manager.state(), InitState::Idle);

        // A later load can still initialize.
        mock.actors.set_race_boosts(Some(Vec::new()));
        manager.handle_existing_character();
        assert_eq!(level(&mock), 15.0);
    }

    #[test]
    fn test_rearming_does_not_double_subscribe() {
        let mock = fresh_character();
        let manager = StartingSkillManager::load_forms(&mock.host()).expect("forms");
        manager.register_for_race_menu_done();
        manager.register_for_race_menu_done();
        assert_eq!(mock.menu_events.sink_count(), 1);
    }
}
