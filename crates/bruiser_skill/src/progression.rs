//! # Skill Progression Engine
//!
//! Turns the player's unarmed hits into hand-to-hand XP.
//!
//! ## Per-hit pipeline
//!
//! ```text
//! host thread                       hit queue worker (xp lock held)
//! ───────────                       ────────────────────────────────
//! max level?  xp mod > 0?           max level? (again)
//! attacker/target present?          damage = perks(unarmed damage)
//! player → actor?  beast form?      skill improve = perks(1.0)
//! unarmed weapon?  live target?     gain = improve * xp(damage) * mod
//!        │                          rollover → commit level/exp/ratio
//!        └──── spawn ─────────────▶ player xp > 0 → awarder
//! ```
//!
//! A full hit queue holds the host thread for at most
//! [`HIT_QUEUE_WAIT`]; past that the hit is dropped with a warning.
//!
//! The filter runs without the lock and never mutates. Everything after the
//! spawn runs under one lock shared by all hits, so readers never see a
//! level that disagrees with its ratio.

use crate::award::PlayerXpAwarder;
use crate::formulas::{apply_rollover, calc_skill_xp_gain, RolloverOutcome};
use crate::settings::SkillSettings;
use bruiser_core::{
    EventSink, GameSetting, Host, NamedFlag, ResolveError, ResolveResult, SinkHandle, TaskQueue,
};
use bruiser_shared::constants;
use bruiser_shared::{
    EventControl, FormId, HitEvent, KeywordId, RefId, HIT_QUEUE_WAIT, SKILL_MAX_LEVEL,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Flags the engine reads and writes.
struct SkillFlags {
    level: NamedFlag,
    exp: NamedFlag,
    ratio: NamedFlag,
    show_level_up: NamedFlag,
    enable_player_xp: NamedFlag,
    xp_mod: NamedFlag,
    enable_beast_form_xp: NamedFlag,
}

/// State shared between the sink and its background jobs.
struct ProgressionCore {
    host: Host,
    settings: Arc<SkillSettings>,
    flags: SkillFlags,
    xp_per_rank: GameSetting,
    skill_curve: GameSetting,
    unarmed_keyword: KeywordId,
    awarder: Arc<PlayerXpAwarder>,
    xp_lock: Mutex<()>,
}

/// Hit-driven skill XP.
pub struct SkillProgression {
    core: Arc<ProgressionCore>,
    hit_queue: Arc<TaskQueue>,
    sink: Mutex<Option<SinkHandle>>,
}

impl SkillProgression {
    /// Resolves everything the engine needs and subscribes it to hits.
    ///
    /// Resolution runs in a fixed order and stops at the first missing name.
    ///
    /// # Errors
    ///
    /// The first [`ResolveError`]; the engine is then never subscribed.
    pub fn register(
        host: &Host,
        settings: Arc<SkillSettings>,
        hit_queue: Arc<TaskQueue>,
        awarder: Arc<PlayerXpAwarder>,
    ) -> ResolveResult<Arc<Self>> {
        let engine = Arc::new(Self::resolve(host, settings, hit_queue, awarder)?);

        let sink: Arc<dyn EventSink<HitEvent>> = engine.clone();
        let handle = host
            .hit_events
            .add_sink(sink)
            .ok_or(ResolveError::SinkRefused("hit"))?;
        *engine.sink.lock() = Some(handle);

        tracing::info!("HitEvent event registered.");
        Ok(engine)
    }

    /// Resolves without subscribing. Hits can then be fed through
    /// [`EventSink::process_event`] or [`apply_hit_xp`](Self::apply_hit_xp).
    ///
    /// # Errors
    ///
    /// The first [`ResolveError`].
    pub fn resolve(
        host: &Host,
        settings: Arc<SkillSettings>,
        hit_queue: Arc<TaskQueue>,
        awarder: Arc<PlayerXpAwarder>,
    ) -> ResolveResult<Self> {
        let xp_per_rank = host.resolve_game_setting(constants::XP_PER_SKILL_RANK)?;
        let skill_curve = host.resolve_game_setting(constants::SKILL_USE_CURVE)?;

        let flags = SkillFlags {
            level: host.resolve_flag(constants::SKILL_LEVEL)?,
            exp: host.resolve_flag(constants::SKILL_EXP)?,
            ratio: host.resolve_flag(constants::SKILL_RATIO)?,
            show_level_up: host.resolve_flag(constants::SKILL_SHOW_LEVEL_UP)?,
            enable_player_xp: host.resolve_flag(constants::ENABLE_PLAYER_XP)?,
            xp_mod: host.resolve_flag(constants::SKILL_XP_MOD)?,
            enable_beast_form_xp: host.resolve_flag(constants::ENABLE_BEAST_FORM_XP)?,
        };

        let unarmed_keyword = host.resolve_keyword(constants::UNARMED_KEYWORD)?;

        Ok(Self {
            core: Arc::new(ProgressionCore {
                host: host.clone(),
                settings,
                flags,
                xp_per_rank,
                skill_curve,
                unarmed_keyword,
                awarder,
                xp_lock: Mutex::new(()),
            }),
            hit_queue,
            sink: Mutex::new(None),
        })
    }

    /// Unsubscribes from hits. Returns `false` if not subscribed.
    pub fn unregister(&self) -> bool {
        match self.sink.lock().take() {
            Some(handle) => self.core.host.hit_events.remove_sink(handle),
            None => false,
        }
    }

    /// The queue hits are processed on.
    #[must_use]
    pub fn hit_queue(&self) -> &TaskQueue {
        &self.hit_queue
    }

    /// Runs the locked part of the pipeline on the calling thread.
    ///
    /// Returns the committed outcome, or `None` if nothing changed.
    pub fn apply_hit_xp(&self, target: RefId, weapon: FormId) -> Option<RolloverOutcome> {
        self.core.apply_hand_to_hand_xp(target, weapon)
    }

    /// Filter stage. Returns the target and weapon of an eligible hit.
    fn eligible(&self, event: &HitEvent) -> Option<(RefId, FormId)> {
        let core = &self.core;
        let flags = &core.flags;

        if flags.level.get() >= SKILL_MAX_LEVEL {
            tracing::trace!("Character at max level, no more xp hit processing.");
            return None;
        }
        if flags.xp_mod.get() <= 0.0 {
            tracing::trace!("Skill modify multiplier set to 0. No more XP hit processing.");
            return None;
        }
        let Some(cause) = event.cause else {
            tracing::error!("Hit Event Attacker Not Found!");
            return None;
        };
        let Some(target) = event.target else {
            tracing::error!("Hit Event Target Not Found!");
            return None;
        };

        let actors = &core.host.actors;
        let status = if actors.is_player(cause) {
            actors.actor_status(target)
        } else {
            None
        };
        let Some(status) = status else {
            tracing::trace!("Ignoring hit from either non player source or non actor target.");
            return None;
        };
        tracing::trace!(
            "Player hit event received: attacker {}, target {}",
            actors.display_name(cause),
            actors.display_name(target)
        );

        if actors.in_beast_form() && flags.enable_beast_form_xp.get() == 0.0 {
            tracing::trace!("Player in beast form, and beast form exp is off, disabling.");
            return None;
        }

        let Some(weapon) = core.host.forms.weapon(event.source) else {
            tracing::trace!("Hit from a non melee: {}. Ignoring.", event.source);
            return None;
        };
        if !weapon.has_keyword(core.unarmed_keyword) {
            tracing::trace!("Hit from a non unarmed: {}. Ignoring.", weapon.name);
            return None;
        }

        if !status.is_valid_target() {
            tracing::trace!("Defender is dead or not valid.");
            return None;
        }

        Some((target, weapon.form))
    }
}

impl EventSink<HitEvent> for SkillProgression {
    fn process_event(&self, event: &HitEvent) -> EventControl {
        let Some((target, weapon)) = self.eligible(event) else {
            return EventControl::Continue;
        };

        let core = Arc::clone(&self.core);
        let job = move || {
            core.apply_hand_to_hand_xp(target, weapon);
        };
        if let Err(err) = self.hit_queue.spawn_timeout(job, HIT_QUEUE_WAIT) {
            tracing::warn!(
                "Dropping hand to hand hit on {target} with {weapon} at level {}, {} hit(s) queued: {err}",
                self.core.flags.level.get(),
                self.hit_queue.in_flight()
            );
        }
        EventControl::Continue
    }
}

impl ProgressionCore {
    fn apply_hand_to_hand_xp(&self, target: RefId, weapon: FormId) -> Option<RolloverOutcome> {
        let _guard = self.xp_lock.lock();
        let flags = &self.flags;

        let level = flags.level.get();
        if level >= SKILL_MAX_LEVEL {
            return None;
        }
        tracing::trace!("Processing hand to hand xp from hit.");

        let base_damage = self.host.actors.unarmed_damage();
        tracing::trace!("Unarmed base damage: {base_damage}");
        let mut damage = self
            .host
            .perks
            .mod_attack_damage(weapon, target, base_damage);
        if damage < 0.0 {
            tracing::error!("Perk modded damage was negative ({damage}). Using 0.");
            damage = 0.0;
        }
        tracing::trace!("Unarmed perk modded damage: {damage}");

        let mut skill_improve = self.host.perks.mod_skill_use(1.0);
        if skill_improve < 0.0 {
            tracing::error!(
                "Skill improve set to negative? Just using 1. There may be a bad perk somewhere."
            );
            skill_improve = 1.0;
        }

        let xp_mod = flags.xp_mod.get();
        tracing::trace!(
            "Calculating skill xp with skillimprove = {skill_improve}, skillMod = {xp_mod}"
        );
        let xp_gain = skill_improve * calc_skill_xp_gain(&self.settings, damage) * xp_mod;
        if xp_gain.is_nan() || xp_gain <= 0.0 {
            tracing::info!("XP gain was less than or equal to 0. No H2H exp added.");
            return None;
        }
        tracing::info!("XP Gain is {xp_gain}");

        let xp_per_rank =
            (flags.enable_player_xp.get() != 0.0).then(|| self.xp_per_rank.get_float());
        let outcome = apply_rollover(
            &self.settings,
            level,
            flags.exp.get(),
            xp_gain,
            self.skill_curve.get_float(),
            xp_per_rank,
        );

        if outcome.levels_gained > 0 {
            tracing::info!("Hand to hand skill increased to {}", outcome.level);
            flags.show_level_up.set(outcome.level);
        }
        flags.level.set(outcome.level);
        flags.exp.set(outcome.exp);
        flags.ratio.set(outcome.ratio);

        if outcome.player_xp > 0.0 {
            tracing::trace!("Dispatching player xp func");
            if let Err(err) = self.awarder.award(outcome.player_xp) {
                tracing::error!("Player XP award of {} dropped: {err}", outcome.player_xp);
            }
        }

        Some(outcome)
    }
}

impl std::fmt::Debug for SkillProgression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillProgression")
            .field("level", &self.core.flags.level.get())
            .field("exp", &self.core.flags.exp.get())
            .field("hit_queue", &self.hit_queue.name())
            .finish_non_exhaustive()
    }
}
