//! # Tunable Settings
//!
//! Five bounded floats shaping the XP curve, read once at startup from the
//! `[SkillXP]` table of a TOML file:
//!
//! ```toml
//! [SkillXP]
//! SkillUseMult = 6.6
//! SkillUseOffset = 1.0
//! SkillImproveMult = 2.0
//! SkillImproveOffset = 0.0
//! DamageXPDampen = 0.91
//! ```
//!
//! Whole-line `;` comments are skipped, so an INI file using the same
//! section and keys loads unchanged. Anything else must be valid TOML.
//!
//! A missing file or a parse failure means defaults for everything. A value
//! outside its range means the default for that key only.

use crate::error::{SettingsError, SettingsResult};
use serde::Deserialize;
use std::path::Path;

/// One bounded setting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SettingVal {
    /// Key in the `[SkillXP]` table.
    pub name: &'static str,
    /// Smallest accepted value.
    pub min: f32,
    /// Largest accepted value.
    pub max: f32,
    /// Default.
    pub regular: f32,
    /// Value in effect.
    pub value: f32,
}

impl SettingVal {
    /// A setting holding its default.
    #[must_use]
    pub const fn new(name: &'static str, min: f32, max: f32, regular: f32) -> Self {
        Self {
            name,
            min,
            max,
            regular,
            value: regular,
        }
    }

    /// Takes `raw` if it is in range, the default otherwise.
    ///
    /// Returns `true` if `raw` was accepted.
    pub fn apply(&mut self, raw: f32) -> bool {
        if raw.is_finite() && raw >= self.min && raw <= self.max {
            self.value = raw;
            true
        } else {
            self.value = self.regular;
            false
        }
    }

    /// Value in effect.
    #[must_use]
    pub const fn get(&self) -> f32 {
        self.value
    }
}

/// Every XP tunable.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillSettings {
    /// Multiplier on dampened damage.
    pub skill_use_mult: SettingVal,
    /// Flat XP added per hit.
    pub skill_use_offset: SettingVal,
    /// Multiplier on `level ^ curve`.
    pub skill_improve_mult: SettingVal,
    /// Flat XP added to each level's requirement.
    pub skill_improve_offset: SettingVal,
    /// Exponent applied to damage. Unarmed damage grows with perks only, so
    /// it is flattened to keep levels from racing ahead.
    pub damage_xp_dampen: SettingVal,
}

impl Default for SkillSettings {
    fn default() -> Self {
        Self {
            skill_use_mult: SettingVal::new("SkillUseMult", 0.0, 100.0, 6.6),
            skill_use_offset: SettingVal::new("SkillUseOffset", 0.0, 100.0, 1.0),
            skill_improve_mult: SettingVal::new("SkillImproveMult", 0.0, 100.0, 2.0),
            skill_improve_offset: SettingVal::new("SkillImproveOffset", 0.0, 100.0, 0.0),
            damage_xp_dampen: SettingVal::new("DamageXPDampen", 0.0, 2.0, 0.91),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(rename = "SkillXP", default)]
    skill_xp: SkillXpTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SkillXpTable {
    skill_use_mult: Option<f32>,
    skill_use_offset: Option<f32>,
    skill_improve_mult: Option<f32>,
    skill_improve_offset: Option<f32>,
    #[serde(rename = "DamageXPDampen")]
    damage_xp_dampen: Option<f32>,
}

impl SkillSettings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Parse`] if the text is not valid TOML or a key holds
    /// a non-number.
    pub fn from_toml_str(text: &str) -> SettingsResult<Self> {
        let text: String = text
            .lines()
            .filter(|line| !line.trim_start().starts_with(';'))
            .map(|line| format!("{line}\n"))
            .collect();
        let file: SettingsFile = toml::from_str(&text)?;
        let table = file.skill_xp;
        let mut settings = Self::default();

        for (setting, raw) in [
            (&mut settings.skill_use_mult, table.skill_use_mult),
            (&mut settings.skill_use_offset, table.skill_use_offset),
            (&mut settings.skill_improve_mult, table.skill_improve_mult),
            (&mut settings.skill_improve_offset, table.skill_improve_offset),
            (&mut settings.damage_xp_dampen, table.damage_xp_dampen),
        ] {
            if let Some(raw) = raw {
                if !setting.apply(raw) {
                    tracing::warn!(
                        "Setting SkillXP.{} = {} is outside [{}, {}], using {}",
                        setting.name,
                        raw,
                        setting.min,
                        setting.max,
                        setting.regular
                    );
                }
            }
            tracing::info!("Setting SkillXP.{} set to {}", setting.name, setting.value);
        }

        Ok(settings)
    }

    /// Reads and parses a settings file.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Io`] if the file cannot be read, or any error of
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn try_load(path: &Path) -> SettingsResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads settings, falling back to defaults on any failure.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                tracing::info!("Finished loading XP settings from {}", path.display());
                settings
            }
            Err(err) => {
                tracing::warn!("{err}. Defaulting to hardcoded values.");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_table() {
        let settings = SkillSettings::default();
        assert_eq!(settings.skill_use_mult.get(), 6.6);
        assert_eq!(settings.skill_use_offset.get(), 1.0);
        assert_eq!(settings.skill_improve_mult.get(), 2.0);
        assert_eq!(settings.skill_improve_offset.get(), 0.0);
        assert_eq!(settings.damage_xp_dampen.get(), 0.91);
    }

    #[test]
    fn test_reads_all_keys() {
        let settings = SkillSettings::from_toml_str(
            r"
[SkillXP]
SkillUseMult = 3.0
SkillUseOffset = 2
SkillImproveMult = 1.5
SkillImproveOffset = 10.0
DamageXPDampen = 1.0
",
        )
        .expect("valid settings");
        assert_eq!(settings.skill_use_mult.get(), 3.0);
        assert_eq!(settings.skill_use_offset.get(), 2.0);
        assert_eq!(settings.skill_improve_mult.get(), 1.5);
        assert_eq!(settings.skill_improve_offset.get(), 10.0);
        assert_eq!(settings.damage_xp_dampen.get(), 1.0);
    }

    #[test]
    fn test_out_of_range_key_falls_back_alone() {
        let settings = SkillSettings::from_toml_str(
            r"
[SkillXP]
SkillUseMult = 250.0
DamageXPDampen = 1.2
",
        )
        .expect("valid settings");
        assert_eq!(settings.skill_use_mult.get(), 6.6, "out of range uses default");
        assert_eq!(settings.damage_xp_dampen.get(), 1.2, "in range is kept");
    }

    #[test]
    fn test_negative_value_falls_back() {
        let settings =
            SkillSettings::from_toml_str("[SkillXP]\nSkillImproveOffset = -1.0\n").expect("valid");
        assert_eq!(settings.skill_improve_offset.get(), 0.0);
    }

    #[test]
    fn test_missing_table_means_defaults() {
        let settings = SkillSettings::from_toml_str("[Other]\nKey = 1\n").expect("valid");
        assert_eq!(settings, SkillSettings::default());
    }

    #[test]
    fn test_ini_comment_lines_are_skipped() {
        let settings = SkillSettings::from_toml_str(
            r"
; Hand to hand XP tuning
[SkillXP]
    ; multiplier on dampened damage
SkillUseMult = 4.0
DamageXPDampen = 0.8
",
        )
        .expect("comments should not break parsing");
        assert_eq!(settings.skill_use_mult.get(), 4.0);
        assert_eq!(settings.damage_xp_dampen.get(), 0.8);
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let result = SkillSettings::from_toml_str("this is not { valid toml !!!");
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::env::temp_dir().join("bruiser-settings-does-not-exist.toml");
        assert!(matches!(
            SkillSettings::try_load(&path),
            Err(SettingsError::Io { .. })
        ));
        assert_eq!(SkillSettings::load(&path), SkillSettings::default());
    }

    #[test]
    fn test_load_reads_file() {
        let path = std::env::temp_dir().join(format!(
            "bruiser-settings-{}.toml",
            std::process::id()
        ));
        {
            let mut file = std::fs::File::create(&path).expect("create temp file");
            writeln!(file, "[SkillXP]\nSkillUseMult = 8.0").expect("write temp file");
        }
        let settings = SkillSettings::load(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(settings.skill_use_mult.get(), 8.0);
    }
}
