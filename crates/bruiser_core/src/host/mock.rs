//! # Mock Host
//!
//! In-process implementations of every host service, for tests and
//! benchmarks. State is behind locks so tests can reshape the world while
//! components hold the same handles.

use super::{
    ActorAccess, ActorStatus, AttackData, FormLookup, Host, PerkEntryPoints, SkillBoost,
    WeaponInfo,
};
use crate::dispatch::EventDispatcher;
use crate::error::ProcessError;
use crate::flags::{FlagTable, GameSetting, NamedFlag};
use crate::script::{ScriptValue, ScriptVm, StackCallback};
use bruiser_shared::constants;
use bruiser_shared::{
    AnimationEvent, FormId, Hand, HitEvent, KeywordId, MenuOpenCloseEvent, RefId,
};
use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

// =============================================================================
// FORMS
// =============================================================================

/// Mock form table.
#[derive(Debug, Default)]
pub struct MockForms {
    flags: FlagTable,
    keywords: RwLock<HashMap<String, KeywordId>>,
    settings: RwLock<HashMap<String, GameSetting>>,
    weapons: RwLock<HashMap<FormId, WeaponInfo>>,
}

impl MockForms {
    /// Creates an empty form table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named flag.
    pub fn insert_flag(&self, editor_id: &str, value: f32) -> NamedFlag {
        self.flags.insert(editor_id, value)
    }

    /// Removes a named flag.
    pub fn remove_flag(&self, editor_id: &str) {
        self.flags.remove(editor_id);
    }

    /// Reads a named flag.
    #[must_use]
    pub fn flag_value(&self, editor_id: &str) -> Option<f32> {
        self.flags.value(editor_id)
    }

    /// Overwrites a named flag, if present.
    pub fn set_flag(&self, editor_id: &str, value: f32) {
        if let Some(flag) = self.flags.get(editor_id) {
            flag.set(value);
        }
    }

    /// Adds a keyword.
    pub fn insert_keyword(&self, editor_id: &str, keyword: KeywordId) {
        self.keywords.write().insert(editor_id.to_string(), keyword);
    }

    /// Removes a keyword.
    pub fn remove_keyword(&self, editor_id: &str) {
        self.keywords.write().remove(editor_id);
    }

    /// Adds an engine setting.
    pub fn insert_game_setting(&self, name: &str, value: f32) -> GameSetting {
        let setting = GameSetting::new(name, value);
        self.settings
            .write()
            .insert(name.to_string(), setting.clone());
        setting
    }

    /// Removes an engine setting.
    pub fn remove_game_setting(&self, name: &str) {
        self.settings.write().remove(name);
    }

    /// Adds a weapon record.
    pub fn insert_weapon(&self, weapon: WeaponInfo) {
        self.weapons.write().insert(weapon.form, weapon);
    }
}

impl FormLookup for MockForms {
    fn flag(&self, editor_id: &str) -> Option<NamedFlag> {
        self.flags.get(editor_id)
    }

    fn keyword(&self, editor_id: &str) -> Option<KeywordId> {
        self.keywords.read().get(editor_id).copied()
    }

    fn game_setting(&self, name: &str) -> Option<GameSetting> {
        self.settings.read().get(name).cloned()
    }

    fn weapon(&self, form: FormId) -> Option<WeaponInfo> {
        self.weapons.read().get(&form).cloned()
    }
}

// =============================================================================
// ACTORS
// =============================================================================

#[derive(Debug)]
struct ActorState {
    equipped: HashMap<Hand, FormId>,
    attack: Result<Option<AttackData>, ProcessError>,
    actors: HashMap<RefId, (String, ActorStatus)>,
    beast_form: bool,
    unarmed_damage: f32,
    race_boosts: Option<Vec<SkillBoost>>,
    char_gen_in_progress: bool,
}

/// Mock player and world actors.
#[derive(Debug)]
pub struct MockActors {
    player: RefId,
    state: Mutex<ActorState>,
}

impl MockActors {
    /// Creates a world holding only the player, unarmed and idle.
    #[must_use]
    pub fn new(player: RefId) -> Self {
        let mut actors = HashMap::new();
        actors.insert(player, ("Prisoner".to_string(), ActorStatus::alive()));
        Self {
            player,
            state: Mutex::new(ActorState {
                equipped: HashMap::new(),
                attack: Ok(None),
                actors,
                beast_form: false,
                unarmed_damage: 10.0,
                race_boosts: Some(Vec::new()),
                char_gen_in_progress: false,
            }),
        }
    }

    /// Puts `form` in `hand`, or empties it.
    pub fn equip(&self, hand: Hand, form: Option<FormId>) {
        let mut state = self.state.lock();
        match form {
            Some(form) => state.equipped.insert(hand, form),
            None => state.equipped.remove(&hand),
        };
    }

    /// Sets the player's current attack.
    pub fn set_attack(&self, event: &str, is_power: bool) {
        self.state.lock().attack = Ok(Some(AttackData {
            event: event.to_string(),
            is_power,
        }));
    }

    /// Clears the player's current attack.
    pub fn clear_attack(&self) {
        self.state.lock().attack = Ok(None);
    }

    /// Makes attack data lookups fail.
    pub fn set_process_error(&self, error: ProcessError) {
        self.state.lock().attack = Err(error);
    }

    /// Adds or replaces a world actor.
    pub fn insert_actor(&self, reference: RefId, name: &str, status: ActorStatus) {
        self.state
            .lock()
            .actors
            .insert(reference, (name.to_string(), status));
    }

    /// Turns the player into (or out of) a beast.
    pub fn set_beast_form(&self, beast_form: bool) {
        self.state.lock().beast_form = beast_form;
    }

    /// Sets the player's base unarmed damage.
    pub fn set_unarmed_damage(&self, damage: f32) {
        self.state.lock().unarmed_damage = damage;
    }

    /// Sets the player race's skill bonuses.
    pub fn set_race_boosts(&self, boosts: Option<Vec<SkillBoost>>) {
        self.state.lock().race_boosts = boosts;
    }

    /// Marks character creation as running or finished.
    pub fn set_char_gen_in_progress(&self, in_progress: bool) {
        self.state.lock().char_gen_in_progress = in_progress;
    }
}

impl ActorAccess for MockActors {
    fn player(&self) -> RefId {
        self.player
    }

    fn display_name(&self, reference: RefId) -> String {
        self.state
            .lock()
            .actors
            .get(&reference)
            .map_or_else(|| reference.to_string(), |(name, _)| name.clone())
    }

    fn equipped_object(&self, hand: Hand) -> Option<FormId> {
        self.state.lock().equipped.get(&hand).copied()
    }

    fn attack_data(&self) -> Result<Option<AttackData>, ProcessError> {
        self.state.lock().attack.clone()
    }

    fn actor_status(&self, reference: RefId) -> Option<ActorStatus> {
        self.state
            .lock()
            .actors
            .get(&reference)
            .map(|(_, status)| *status)
    }

    fn in_beast_form(&self) -> bool {
        self.state.lock().beast_form
    }

    fn unarmed_damage(&self) -> f32 {
        self.state.lock().unarmed_damage
    }

    fn race_skill_boosts(&self) -> Option<Vec<SkillBoost>> {
        self.state.lock().race_boosts.clone()
    }

    fn char_gen_in_progress(&self) -> bool {
        self.state.lock().char_gen_in_progress
    }
}

// =============================================================================
// PERKS
// =============================================================================

/// Mock perk entry points: a damage multiplier and a skill use override.
#[derive(Debug)]
pub struct MockPerks {
    damage_mult: Mutex<f32>,
    skill_use: Mutex<Option<f32>>,
}

impl MockPerks {
    /// No perks: values pass through.
    #[must_use]
    pub fn new() -> Self {
        Self {
            damage_mult: Mutex::new(1.0),
            skill_use: Mutex::new(None),
        }
    }

    /// Multiplies every damage value by `mult`.
    pub fn set_damage_mult(&self, mult: f32) {
        *self.damage_mult.lock() = mult;
    }

    /// Replaces the skill use result, or passes through on `None`.
    pub fn set_skill_use(&self, value: Option<f32>) {
        *self.skill_use.lock() = value;
    }
}

impl Default for MockPerks {
    fn default() -> Self {
        Self::new()
    }
}

impl PerkEntryPoints for MockPerks {
    fn mod_attack_damage(&self, _weapon: FormId, _target: RefId, damage: f32) -> f32 {
        damage * *self.damage_mult.lock()
    }

    fn mod_skill_use(&self, skill_improve: f32) -> f32 {
        self.skill_use.lock().unwrap_or(skill_improve)
    }
}

// =============================================================================
// SCRIPT VM
// =============================================================================

#[derive(Debug, Default)]
struct VmState {
    experience: Mutex<f32>,
    get_answer: Mutex<Option<ScriptValue>>,
    calls: Mutex<Vec<String>>,
    held: Mutex<bool>,
    released: Condvar,
}

impl VmState {
    fn answer(&self, function: &str, args: &[ScriptValue]) -> ScriptValue {
        match function {
            constants::SCRIPT_GET_PLAYER_XP => self
                .get_answer
                .lock()
                .clone()
                .unwrap_or_else(|| ScriptValue::Float(*self.experience.lock())),
            constants::SCRIPT_SET_PLAYER_XP => {
                if let Some(ScriptValue::Float(value)) = args.first() {
                    *self.experience.lock() = *value;
                }
                ScriptValue::None
            }
            _ => ScriptValue::None,
        }
    }

    fn wait_until_released(&self) {
        let mut held = self.held.lock();
        while *held {
            self.released.wait(&mut held);
        }
    }
}

/// Mock script VM owning the player's experience.
///
/// Callbacks arrive on a fresh thread, like the real VM. They can be held
/// back to observe a caller blocked mid-call.
#[derive(Debug, Default)]
pub struct MockScriptVm {
    state: Arc<VmState>,
    reject: AtomicBool,
}

impl MockScriptVm {
    /// Creates a VM with the given player experience.
    #[must_use]
    pub fn new(experience: f32) -> Self {
        let vm = Self::default();
        *vm.state.experience.lock() = experience;
        vm
    }

    /// Current player experience.
    #[must_use]
    pub fn player_experience(&self) -> f32 {
        *self.state.experience.lock()
    }

    /// Overwrites the player experience.
    pub fn set_player_experience(&self, experience: f32) {
        *self.state.experience.lock() = experience;
    }

    /// Refuses every dispatch while `reject` is set.
    pub fn reject_calls(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Forces the get call's answer; `None` restores the real value.
    pub fn answer_get_with(&self, answer: Option<ScriptValue>) {
        *self.state.get_answer.lock() = answer;
    }

    /// Holds back every callback until [`release_callbacks`](Self::release_callbacks).
    pub fn hold_callbacks(&self) {
        *self.state.held.lock() = true;
    }

    /// Delivers held callbacks.
    pub fn release_callbacks(&self) {
        *self.state.held.lock() = false;
        self.state.released.notify_all();
    }

    /// Every accepted call so far, as `Class.Function`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state.calls.lock().clone()
    }
}

impl ScriptVm for MockScriptVm {
    fn dispatch_static_call(
        &self,
        class: &str,
        function: &str,
        args: Vec<ScriptValue>,
        callback: Arc<dyn StackCallback>,
    ) -> bool {
        if self.reject.load(Ordering::SeqCst) {
            return false;
        }
        self.state.calls.lock().push(format!("{class}.{function}"));

        let state = Arc::clone(&self.state);
        let function = function.to_string();
        thread::spawn(move || {
            state.wait_until_released();
            let result = state.answer(&function, &args);
            callback.call(result);
        });
        true
    }
}

// =============================================================================
// MOCK HOST
// =============================================================================

/// A whole simulated host.
#[derive(Debug)]
pub struct MockHost {
    /// Form table.
    pub forms: Arc<MockForms>,
    /// Actors.
    pub actors: Arc<MockActors>,
    /// Perks.
    pub perks: Arc<MockPerks>,
    /// Script VM.
    pub vm: Arc<MockScriptVm>,
    /// Player animation graph.
    pub animation_events: Arc<EventDispatcher<AnimationEvent>>,
    /// Hit notifications.
    pub hit_events: Arc<EventDispatcher<HitEvent>>,
    /// Menu notifications.
    pub menu_events: Arc<EventDispatcher<MenuOpenCloseEvent>>,
}

impl MockHost {
    /// The player reference.
    pub const PLAYER: RefId = RefId(0x0000_0014);
    /// A bandit standing in front of the player.
    pub const TARGET: RefId = RefId(0xff00_0d62);
    /// The engine's unarmed weapon.
    pub const UNARMED_WEAPON: FormId = FormId(0x0000_01f4);
    /// Fist wraps carrying the unarmed keyword.
    pub const FIST_WRAPS: FormId = FormId(0x0500_0812);
    /// An ordinary sword.
    pub const IRON_SWORD: FormId = FormId(0x0001_2eb7);
    /// A spell, which is not a weapon.
    pub const FLAMES: FormId = FormId(0x0001_2fcd);
    /// The unarmed keyword.
    pub const UNARMED_KEYWORD: KeywordId = KeywordId(0x0500_0800);

    /// A host with the player and one target, and no forms.
    #[must_use]
    pub fn new() -> Self {
        let actors = MockActors::new(Self::PLAYER);
        actors.insert_actor(Self::TARGET, "Bandit", ActorStatus::alive());

        Self {
            forms: Arc::new(MockForms::new()),
            actors: Arc::new(actors),
            perks: Arc::new(MockPerks::new()),
            vm: Arc::new(MockScriptVm::new(0.0)),
            animation_events: Arc::new(EventDispatcher::new()),
            hit_events: Arc::new(EventDispatcher::new()),
            menu_events: Arc::new(EventDispatcher::new()),
        }
    }

    /// A host carrying every form the plugin resolves, with stock values.
    #[must_use]
    pub fn standard() -> Self {
        let mock = Self::new();
        let forms = &mock.forms;

        forms.insert_flag(constants::ENABLE_H2H_BLOCK, 1.0);
        forms.insert_flag(constants::ROTATE_ATTACKS, 1.0);
        forms.insert_flag(constants::SKILL_LEVEL, 15.0);
        forms.insert_flag(constants::SKILL_EXP, 0.0);
        forms.insert_flag(constants::SKILL_RATIO, 0.0);
        forms.insert_flag(constants::SKILL_SHOW_LEVEL_UP, 0.0);
        forms.insert_flag(constants::SKILL_XP_MOD, 1.0);
        forms.insert_flag(constants::ENABLE_PLAYER_XP, 1.0);
        forms.insert_flag(constants::ENABLE_BEAST_FORM_XP, 0.0);

        forms.insert_keyword(constants::UNARMED_KEYWORD, Self::UNARMED_KEYWORD);

        forms.insert_game_setting(constants::XP_PER_SKILL_RANK, 1.0);
        forms.insert_game_setting(constants::SKILL_USE_CURVE, 1.95);
        forms.insert_game_setting(constants::SKILL_START, 15.0);

        forms.insert_weapon(WeaponInfo {
            form: Self::UNARMED_WEAPON,
            name: "Unarmed".to_string(),
            keywords: vec![Self::UNARMED_KEYWORD],
        });
        forms.insert_weapon(WeaponInfo {
            form: Self::FIST_WRAPS,
            name: "Fist Wraps".to_string(),
            keywords: vec![Self::UNARMED_KEYWORD],
        });
        forms.insert_weapon(WeaponInfo {
            form: Self::IRON_SWORD,
            name: "Iron Sword".to_string(),
            keywords: Vec::new(),
        });

        mock
    }

    /// The service bundle components register against.
    #[must_use]
    pub fn host(&self) -> Host {
        Host {
            forms: self.forms.clone(),
            actors: self.actors.clone(),
            perks: self.perks.clone(),
            vm: self.vm.clone(),
            animation_events: self.animation_events.clone(),
            hit_events: self.hit_events.clone(),
            menu_events: self.menu_events.clone(),
        }
    }

    /// An unarmed hit from the player on [`TARGET`](Self::TARGET).
    #[must_use]
    pub const fn player_punch() -> HitEvent {
        HitEvent::new(Self::PLAYER, Self::TARGET, Self::UNARMED_WEAPON)
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}
