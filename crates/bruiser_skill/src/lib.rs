//! # Bruiser Skill
//!
//! A hand-to-hand skill that levels like the engine's own skills.
//!
//! ## Flow
//!
//! ```text
//! HitEvent ──> SkillProgression (filter, host thread)
//!                  │ spawn
//!                  ▼
//!              hit queue ──> xp lock ──> formulas::apply_rollover ──> flags
//!                                              │ player xp > 0
//!                                              ▼
//!                                          award queue ──> award lock ──> ScriptVm
//! ```
//!
//! The two locks never nest. The hit path never waits on the script VM.

#![deny(unsafe_code)]

pub mod award;
pub mod error;
pub mod formulas;
pub mod progression;
pub mod settings;
pub mod starting;

pub use award::PlayerXpAwarder;
pub use error::{AwardError, SettingsError, SettingsResult};
pub use formulas::{apply_rollover, calc_skill_xp_gain, next_skill_level_xp, RolloverOutcome};
pub use progression::SkillProgression;
pub use settings::{SettingVal, SkillSettings};
pub use starting::{starting_level, InitState, StartingSkillManager};
