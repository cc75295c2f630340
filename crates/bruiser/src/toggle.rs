//! # Attack Direction Toggle
//!
//! Hand-to-hand attacks alternate fists through a rotate flag the behavior
//! graph reads: `+1` means the next attack comes from the left, `-1` from
//! the right. This watches the player's animation tags and flips the flag
//! each time an attack string advances.
//!
//! ## Per-event checks
//!
//! 1. Event is from the player
//! 2. Feature on (`EnableH2HBlock == 1`) and rotate flag initialized (±1)
//! 3. Both hands empty or unarmed-keyword weapons
//! 4. 400ms since the last classified event
//! 5. Player has attack data
//! 6. Tag starts with `AttackWinStart` or `attackStop`, and the attack is
//!    not the combo power attack
//!
//! Passing all six stamps the cooldown, then the attack kind picks the
//! direction.

use bruiser_core::{
    ActorAccess, EventSink, FormLookup, Host, NamedFlag, ResolveError, ResolveResult, SinkHandle,
};
use bruiser_shared::constants;
use bruiser_shared::{AnimationEvent, EventControl, Hand, KeywordId, TOGGLE_COOLDOWN};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

// =============================================================================
// CLASSIFICATION TABLES
// =============================================================================

/// Animation tags that mark an attack string advancing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagClass {
    /// Light attack chained into the next (`AttackWinStart`, `AttackWinStartLeft`).
    AttackFollow,
    /// Any attack ending (`attackStop`).
    AttackStop,
}

const TAG_PREFIXES: [(&str, TagClass); 2] = [
    (constants::TAG_ATTACK_FOLLOW, TagClass::AttackFollow),
    (constants::TAG_ATTACK_STOP, TagClass::AttackStop),
];

impl TagClass {
    /// Classifies a raw tag by prefix.
    #[must_use]
    pub fn classify(tag: &str) -> Option<Self> {
        TAG_PREFIXES
            .iter()
            .find(|(prefix, _)| tag.starts_with(prefix))
            .map(|(_, class)| *class)
    }
}

/// Hand-to-hand attack kinds, from the player's attack data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttackKind {
    /// Right light attack.
    Right,
    /// Right power attack.
    RightPower,
    /// Left light attack.
    Left,
    /// Left power attack.
    LeftPower,
    /// Both fists at once.
    ComboPower,
}

const ATTACK_KINDS: [(&str, AttackKind); 5] = [
    (constants::ATTACK_RIGHT, AttackKind::Right),
    (constants::ATTACK_RIGHT_POWER, AttackKind::RightPower),
    (constants::ATTACK_LEFT, AttackKind::Left),
    (constants::ATTACK_LEFT_POWER, AttackKind::LeftPower),
    (constants::ATTACK_COMBO_POWER, AttackKind::ComboPower),
];

impl AttackKind {
    /// Looks up an attack data event name.
    #[must_use]
    pub fn parse(event: &str) -> Option<Self> {
        ATTACK_KINDS
            .iter()
            .find(|(name, _)| *name == event)
            .map(|(_, kind)| *kind)
    }

    /// `true` for power attacks.
    #[must_use]
    pub const fn is_power(self) -> bool {
        matches!(self, Self::RightPower | Self::LeftPower | Self::ComboPower)
    }

    /// Direction this attack flips the rotate flag to.
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Right | Self::RightPower => Some(Direction::Right),
            Self::Left | Self::LeftPower => Some(Direction::Left),
            Self::ComboPower => None,
        }
    }
}

/// Rotate flag values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// `+1`.
    Left,
    /// `-1`.
    Right,
}

impl Direction {
    /// Value written to the rotate flag.
    #[must_use]
    pub const fn flag_value(self) -> f32 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
        }
    }
}

/// Direction for an attack, if it toggles at all.
///
/// The kind's power flavour must agree with the attack's power flag.
#[must_use]
pub fn toggle_direction(attack_event: &str, is_power: bool) -> Option<Direction> {
    let kind = AttackKind::parse(attack_event)?;
    if kind.is_power() != is_power {
        return None;
    }
    kind.direction()
}

// =============================================================================
// TOGGLE
// =============================================================================

/// Flips the rotate flag as the player's attack strings advance.
pub struct AttackToggle {
    host: Host,
    enable: NamedFlag,
    rotate: NamedFlag,
    unarmed_keyword: KeywordId,
    cooldown: Duration,
    last_toggle: Mutex<Option<Instant>>,
    sink: Mutex<Option<SinkHandle>>,
}

impl AttackToggle {
    /// Resolves the toggle's flags and keyword, then subscribes to the
    /// player's animation events.
    ///
    /// # Errors
    ///
    /// The first [`ResolveError`]; the toggle is then never subscribed.
    pub fn register(host: &Host) -> ResolveResult<Arc<Self>> {
        let toggle = Arc::new(Self::resolve(host)?);

        let sink: Arc<dyn EventSink<AnimationEvent>> = toggle.clone();
        let Some(handle) = host.animation_events.add_sink(sink) else {
            tracing::error!("Failed to register AnimationGraphEvent event");
            return Err(ResolveError::SinkRefused("animation graph"));
        };
        *toggle.sink.lock() = Some(handle);

        tracing::info!("AnimationGraphEvent event Registered");
        Ok(toggle)
    }

    /// Resolves without subscribing.
    ///
    /// # Errors
    ///
    /// The first [`ResolveError`].
    pub fn resolve(host: &Host) -> ResolveResult<Self> {
        Ok(Self {
            host: host.clone(),
            enable: host.resolve_flag(constants::ENABLE_H2H_BLOCK)?,
            rotate: host.resolve_flag(constants::ROTATE_ATTACKS)?,
            unarmed_keyword: host.resolve_keyword(constants::UNARMED_KEYWORD)?,
            cooldown: TOGGLE_COOLDOWN,
            last_toggle: Mutex::new(None),
            sink: Mutex::new(None),
        })
    }

    /// Unsubscribes. Returns `false` if not subscribed.
    pub fn unregister(&self) -> bool {
        match self.sink.lock().take() {
            Some(handle) => self.host.animation_events.remove_sink(handle),
            None => false,
        }
    }

    /// Feature on and rotate flag initialized.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_toggle_on(&self) -> bool {
        let rotate = self.rotate.get();
        self.enable.get() == 1.0 && (rotate == 1.0 || rotate == -1.0)
    }

    /// Both hands empty or holding unarmed weapons. Spells and other
    /// non-weapons pass.
    fn h2h_equipped(&self) -> bool {
        let actors: &dyn ActorAccess = self.host.actors.as_ref();
        let forms: &dyn FormLookup = self.host.forms.as_ref();
        Hand::BOTH.iter().all(|&hand| {
            let Some(weapon) = actors.equipped_object(hand).and_then(|form| forms.weapon(form))
            else {
                return true;
            };
            let unarmed = weapon.has_keyword(self.unarmed_keyword);
            if !unarmed {
                tracing::trace!("{hand:?} unarmed check fail");
            }
            unarmed
        })
    }

    /// Processes one animation event observed at `now`.
    ///
    /// Returns the direction written, if any.
    pub fn handle_at(&self, event: &AnimationEvent, now: Instant) -> Option<Direction> {
        if !self.host.actors.is_player(event.holder) {
            return None;
        }
        if !self.is_toggle_on() || !self.h2h_equipped() {
            return None;
        }

        let mut last_toggle = self.last_toggle.lock();
        if let Some(last) = *last_toggle {
            if now.saturating_duration_since(last) < self.cooldown {
                return None;
            }
        }

        let attack = match self.host.actors.attack_data() {
            Ok(Some(attack)) => attack,
            // Not an attack animation.
            Ok(None) => return None,
            Err(err) => {
                tracing::error!("Player attack data unavailable: {err}");
                return None;
            }
        };

        if AttackKind::parse(&attack.event) == Some(AttackKind::ComboPower) {
            return None;
        }
        if TagClass::classify(&event.tag).is_none() {
            return None;
        }

        tracing::trace!(
            "animEventTag {}, attackEvent {}, attack isPower {}",
            event.tag,
            attack.event,
            attack.is_power
        );
        *last_toggle = Some(now);

        let Some(direction) = toggle_direction(&attack.event, attack.is_power) else {
            tracing::trace!("No case reached for attack {}", attack.event);
            return None;
        };
        self.rotate.set(direction.flag_value());
        Some(direction)
    }
}

impl EventSink<AnimationEvent> for AttackToggle {
    fn process_event(&self, event: &AnimationEvent) -> EventControl {
        self.handle_at(event, Instant::now());
        EventControl::Continue
    }
}

impl std::fmt::Debug for AttackToggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttackToggle")
            .field("rotate", &self.rotate.get())
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bruiser_core::host::mock::MockHost;
    use bruiser_core::ProcessError;
    use bruiser_shared::RefId;

    fn setup() -> (MockHost, Arc<AttackToggle>) {
        let mock = MockHost::standard();
        let toggle = AttackToggle::register(&mock.host()).expect("registration failed");
        (mock, toggle)
    }

    fn rotate(mock: &MockHost) -> f32 {
        mock.forms
            .flag_value(constants::ROTATE_ATTACKS)
            .expect("rotate flag")
    }

    fn player_tag(tag: &str) -> AnimationEvent {
        AnimationEvent::new(tag, MockHost::PLAYER)
    }

    #[test]
    fn test_tag_table() {
        assert_eq!(TagClass::classify("AttackWinStart"), Some(TagClass::AttackFollow));
        assert_eq!(TagClass::classify("AttackWinStartLeft"), Some(TagClass::AttackFollow));
        assert_eq!(TagClass::classify("attackStop"), Some(TagClass::AttackStop));
        assert_eq!(TagClass::classify("preHitFrame"), None);
        assert_eq!(TagClass::classify("PowerAttackStop"), None);
    }

    #[test]
    fn test_direction_mapping() {
        assert_eq!(toggle_direction(constants::ATTACK_RIGHT, false), Some(Direction::Right));
        assert_eq!(toggle_direction(constants::ATTACK_RIGHT_POWER, true), Some(Direction::Right));
        assert_eq!(toggle_direction(constants::ATTACK_LEFT, false), Some(Direction::Left));
        assert_eq!(toggle_direction(constants::ATTACK_LEFT_POWER, true), Some(Direction::Left));
        assert_eq!(toggle_direction(constants::ATTACK_COMBO_POWER, true), None);
        assert_eq!(toggle_direction("AttackStartSword", false), None);
    }

    #[test]
    fn test_power_flag_must_agree_with_kind() {
        assert_eq!(toggle_direction(constants::ATTACK_RIGHT, true), None);
        assert_eq!(toggle_direction(constants::ATTACK_LEFT_POWER, false), None);
    }

    #[test]
    fn test_left_attack_sets_plus_one() {
        let (mock, toggle) = setup();
        mock.forms.set_flag(constants::ROTATE_ATTACKS, -1.0);
        mock.actors.set_attack(constants::ATTACK_LEFT, false);

        let applied = toggle.handle_at(&player_tag("AttackWinStartLeft"), Instant::now());
        assert_eq!(applied, Some(Direction::Left));
        assert_eq!(rotate(&mock), 1.0);
    }

    #[test]
    fn test_right_power_attack_sets_minus_one() {
        let (mock, toggle) = setup();
        mock.actors.set_attack(constants::ATTACK_RIGHT_POWER, true);
        toggle.handle_at(&player_tag("attackStop"), Instant::now());
        assert_eq!(rotate(&mock), -1.0);
    }

    #[test]
    fn test_cooldown_allows_one_toggle_per_window() {
        let (mock, toggle) = setup();
        mock.actors.set_attack(constants::ATTACK_RIGHT, false);
        let t0 = Instant::now();

        assert!(toggle.handle_at(&player_tag("attackStop"), t0).is_some());
        mock.forms.set_flag(constants::ROTATE_ATTACKS, 1.0);
        assert!(toggle
            .handle_at(&player_tag("attackStop"), t0 + Duration::from_millis(399))
            .is_none());
        assert_eq!(rotate(&mock), 1.0, "second event inside the window is dropped");

        assert!(toggle
            .handle_at(&player_tag("attackStop"), t0 + Duration::from_millis(400))
            .is_some());
        assert_eq!(rotate(&mock), -1.0);
    }

    #[test]
    fn test_combo_power_attack_never_toggles() {
        let (mock, toggle) = setup();
        mock.actors.set_attack(constants::ATTACK_COMBO_POWER, true);
        let t0 = Instant::now();

        for i in 0..5 {
            let at = t0 + Duration::from_millis(500 * i);
            assert!(toggle.handle_at(&player_tag("AttackWinStart"), at).is_none());
            assert!(toggle.handle_at(&player_tag("attackStop"), at).is_none());
        }
        assert_eq!(rotate(&mock), 1.0);

        // Combo does not stamp the cooldown either.
        mock.actors.set_attack(constants::ATTACK_RIGHT, false);
        assert!(toggle
            .handle_at(&player_tag("attackStop"), t0 + Duration::from_millis(2000))
            .is_some());
    }

    #[test]
    fn test_unclassified_tag_does_not_stamp_cooldown() {
        let (mock, toggle) = setup();
        mock.actors.set_attack(constants::ATTACK_RIGHT, false);
        let t0 = Instant::now();

        assert!(toggle.handle_at(&player_tag("preHitFrame"), t0).is_none());
        assert!(toggle
            .handle_at(&player_tag("attackStop"), t0 + Duration::from_millis(10))
            .is_some());
    }

    #[test]
    fn test_unknown_kind_stamps_cooldown_without_toggling() {
        let (mock, toggle) = setup();
        mock.actors.set_attack(constants::ATTACK_RIGHT, true);
        let t0 = Instant::now();

        assert!(toggle.handle_at(&player_tag("attackStop"), t0).is_none());
        assert_eq!(rotate(&mock), 1.0);

        mock.actors.set_attack(constants::ATTACK_RIGHT, false);
        assert!(toggle
            .handle_at(&player_tag("attackStop"), t0 + Duration::from_millis(100))
            .is_none());
    }

    #[test]
    fn test_guards_block_toggle() {
        let (mock, toggle) = setup();
        mock.actors.set_attack(constants::ATTACK_RIGHT, false);
        let mut at = Instant::now();
        let mut next = || {
            at += Duration::from_secs(1);
            at
        };

        // Feature off.
        mock.forms.set_flag(constants::ENABLE_H2H_BLOCK, 0.0);
        assert!(toggle.handle_at(&player_tag("attackStop"), next()).is_none());
        mock.forms.set_flag(constants::ENABLE_H2H_BLOCK, 1.0);

        // Rotate flag not initialized.
        mock.forms.set_flag(constants::ROTATE_ATTACKS, 0.0);
        assert!(toggle.handle_at(&player_tag("attackStop"), next()).is_none());
        assert_eq!(rotate(&mock), 0.0);
        mock.forms.set_flag(constants::ROTATE_ATTACKS, 1.0);

        // Sword in the left hand.
        mock.actors.equip(Hand::Left, Some(MockHost::IRON_SWORD));
        assert!(toggle.handle_at(&player_tag("attackStop"), next()).is_none());
        mock.actors.equip(Hand::Left, None);

        // Another actor's graph.
        let npc = AnimationEvent::new("attackStop", RefId(0x1234));
        assert!(toggle.handle_at(&npc, next()).is_none());

        // Not attacking.
        mock.actors.clear_attack();
        assert!(toggle.handle_at(&player_tag("attackStop"), next()).is_none());

        // Missing process data.
        mock.actors.set_process_error(ProcessError::NoHighProcess);
        assert!(toggle.handle_at(&player_tag("attackStop"), next()).is_none());

        assert_eq!(rotate(&mock), 1.0);
    }

    #[test]
    fn test_wraps_and_spells_pass_equip_guard() {
        let (mock, toggle) = setup();
        mock.actors.set_attack(constants::ATTACK_RIGHT, false);
        mock.actors.equip(Hand::Right, Some(MockHost::FIST_WRAPS));
        mock.actors.equip(Hand::Left, Some(MockHost::FLAMES));
        assert_eq!(
            toggle.handle_at(&player_tag("attackStop"), Instant::now()),
            Some(Direction::Right)
        );
    }

    #[test]
    fn test_registration_needs_keyword() {
        let mock = MockHost::standard();
        mock.forms.remove_keyword(constants::UNARMED_KEYWORD);
        assert!(matches!(
            AttackToggle::register(&mock.host()),
            Err(ResolveError::MissingKeyword(_))
        ));
        assert_eq!(mock.animation_events.sink_count(), 0);
    }

    #[test]
    fn test_dispatch_reaches_toggle() {
        let (mock, toggle) = setup();
        mock.actors.set_attack(constants::ATTACK_RIGHT, false);
        assert_eq!(
            mock.animation_events.dispatch(&player_tag("attackStop")),
            EventControl::Continue
        );
        assert_eq!(rotate(&mock), -1.0);
        assert!(toggle.unregister());
        assert_eq!(mock.animation_events.sink_count(), 0);
    }
}
