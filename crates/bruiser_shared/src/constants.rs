//! # Editor IDs, Tags & Limits
//!
//! Every string the plugin agrees on with its data files and with the host
//! lives here.
//!
//! **CRITICAL:** The editor ids must match the plugin's data file exactly.
//! A typo here silently disables a whole feature at registration.

use std::time::Duration;

// =============================================================================
// PLUGIN IDENTITY
// =============================================================================

/// Plugin name, as reported at load.
pub const PLUGIN_NAME: &str = "BruiserHandToHand";

/// Plugin version, as reported at load.
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tunables file name, resolved next to the plugin.
pub const SETTINGS_FILE: &str = "BruiserHandToHand.toml";

// =============================================================================
// NAMED FLAGS (host globals)
// =============================================================================

/// Feature switch for the attack-direction toggle (1 = on).
pub const ENABLE_H2H_BLOCK: &str = "BHH_EnableH2HBlock";

/// Rotate direction: +1 left, -1 right, anything else = not initialized.
pub const ROTATE_ATTACKS: &str = "BHH_RotateAttacks";

/// Current hand-to-hand skill level.
pub const SKILL_LEVEL: &str = "BHH_HandtoHandLevel";

/// Experience accumulated toward the next level.
pub const SKILL_EXP: &str = "BHH_HandtoHandExp";

/// `experience / xp needed`, for progress bars.
pub const SKILL_RATIO: &str = "BHH_HandtoHandRatio";

/// Set to the new level on each level-up. Read by the presentation layer.
pub const SKILL_SHOW_LEVEL_UP: &str = "BHH_HandtoHandShowLevelup";

/// Global skill XP multiplier. Zero or below disables XP gain.
pub const SKILL_XP_MOD: &str = "BHH_H2HXPMod";

/// Non-zero when level-ups also award player level experience.
pub const ENABLE_PLAYER_XP: &str = "BHH_EnablePlayerXPGain";

/// Non-zero when hits in beast form still earn skill XP.
pub const ENABLE_BEAST_FORM_XP: &str = "BHH_EnableBeastFormXP";

// =============================================================================
// KEYWORDS
// =============================================================================

/// Capability keyword: the weapon counts as unarmed.
pub const UNARMED_KEYWORD: &str = "BHH_WeapTypeUnarmed";

// =============================================================================
// GAME SETTINGS
// =============================================================================

/// Player level XP granted per skill rank gained.
pub const XP_PER_SKILL_RANK: &str = "fXPPerSkillRank";

/// Exponent of the skill level-up curve.
pub const SKILL_USE_CURVE: &str = "fSkillUseCurve";

/// Base starting value for skills at character creation.
pub const SKILL_START: &str = "iAVDSkillStart";

// =============================================================================
// ANIMATION TAGS
// =============================================================================

/// Shows up when a player chains light attacks. Also prefixes
/// `AttackWinStartLeft`.
pub const TAG_ATTACK_FOLLOW: &str = "AttackWinStart";

/// Fires at the end of every attack.
pub const TAG_ATTACK_STOP: &str = "attackStop";

// =============================================================================
// ATTACK KINDS (attack data event names)
// =============================================================================

/// Right-hand light attack.
pub const ATTACK_RIGHT: &str = "AttackStartH2HRight";

/// Right-hand power attack.
pub const ATTACK_RIGHT_POWER: &str = "attackPowerStartForwardH2HRightHand";

/// Left-hand light attack.
pub const ATTACK_LEFT: &str = "AttackStartH2HLeft";

/// Left-hand power attack.
pub const ATTACK_LEFT_POWER: &str = "attackPowerStartForwardH2HLeftHand";

/// Dual power attack. Never toggles.
pub const ATTACK_COMBO_POWER: &str = "attackPowerStartH2HCombo";

// =============================================================================
// MENUS & SCRIPTS
// =============================================================================

/// Character creation menu. Its close ends race selection.
pub const RACE_MENU: &str = "RaceSex Menu";

/// Script class owning the player experience functions.
pub const SCRIPT_GAME_CLASS: &str = "Game";

/// Returns the player's level experience as a float.
pub const SCRIPT_GET_PLAYER_XP: &str = "GetPlayerExperience";

/// Sets the player's level experience. One float argument.
pub const SCRIPT_SET_PLAYER_XP: &str = "SetPlayerExperience";

// =============================================================================
// LIMITS
// =============================================================================

/// Hand-to-hand skill cap.
pub const SKILL_MAX_LEVEL: f32 = 100.0;

/// Minimum time between two direction toggles.
pub const TOGGLE_COOLDOWN: Duration = Duration::from_millis(400);

/// Longest a hit notification waits for a slot on a full hit queue.
pub const HIT_QUEUE_WAIT: Duration = Duration::from_millis(50);
