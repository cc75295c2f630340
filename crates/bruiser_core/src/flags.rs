//! # Named Flags
//!
//! Host-resident numeric cells keyed by editor id. The host owns them; the
//! plugin resolves each one once at registration and keeps the handle.
//!
//! A cell stores an `f32` as raw bits in an `AtomicU32`, so readers on any
//! thread see whole values. Grouped updates (level, exp, ratio) still need
//! the owning component's lock.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

// =============================================================================
// FLAG CELL
// =============================================================================

/// One host global.
#[derive(Debug)]
pub struct FlagCell {
    editor_id: String,
    bits: AtomicU32,
}

impl FlagCell {
    /// Creates a cell holding `value`.
    #[must_use]
    pub fn new(editor_id: impl Into<String>, value: f32) -> Self {
        Self {
            editor_id: editor_id.into(),
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    /// Editor id this cell was resolved under.
    #[must_use]
    pub fn editor_id(&self) -> &str {
        &self.editor_id
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Overwrites the value.
    pub fn set(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }

    /// Writes `new` only if the cell still compares equal to `current`.
    ///
    /// Comparison is by value, so `0.0` matches `-0.0`.
    ///
    /// # Errors
    ///
    /// Returns the value actually held when it differs from `current`.
    #[allow(clippy::float_cmp)]
    pub fn compare_exchange(&self, current: f32, new: f32) -> Result<f32, f32> {
        let mut observed = self.bits.load(Ordering::Acquire);
        loop {
            let value = f32::from_bits(observed);
            if value != current {
                return Err(value);
            }
            match self.bits.compare_exchange_weak(
                observed,
                new.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(value),
                Err(actual) => observed = actual,
            }
        }
    }
}

/// Cached handle to a host global.
pub type NamedFlag = Arc<FlagCell>;

// =============================================================================
// GAME SETTING
// =============================================================================

/// Cached handle to an engine setting such as `fSkillUseCurve`.
///
/// Settings are typed by prefix on the host (`f` float, `i` integer); the
/// handle reads either way.
#[derive(Clone, Debug)]
pub struct GameSetting {
    cell: Arc<FlagCell>,
}

impl GameSetting {
    /// Creates a setting holding `value`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: f32) -> Self {
        Self {
            cell: Arc::new(FlagCell::new(name, value)),
        }
    }

    /// Setting name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.cell.editor_id()
    }

    /// Float view.
    #[must_use]
    pub fn get_float(&self) -> f32 {
        self.cell.get()
    }

    /// Integer view, rounded to nearest.
    #[must_use]
    pub fn get_int(&self) -> i32 {
        self.cell.get().round() as i32
    }

    /// Overwrites the value. Host side only.
    pub fn set(&self, value: f32) {
        self.cell.set(value);
    }
}

// =============================================================================
// FLAG TABLE
// =============================================================================

/// In-process store of named flags, keyed by editor id.
///
/// Stands in for the host's form table wherever a host is simulated.
#[derive(Debug, Default)]
pub struct FlagTable {
    flags: RwLock<HashMap<String, NamedFlag>>,
}

impl FlagTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a flag and returns its handle.
    pub fn insert(&self, editor_id: &str, value: f32) -> NamedFlag {
        let flag = Arc::new(FlagCell::new(editor_id, value));
        self.flags
            .write()
            .insert(editor_id.to_string(), Arc::clone(&flag));
        flag
    }

    /// Removes a flag. Handles already given out stay valid.
    pub fn remove(&self, editor_id: &str) -> Option<NamedFlag> {
        self.flags.write().remove(editor_id)
    }

    /// Looks up a flag handle.
    #[must_use]
    pub fn get(&self, editor_id: &str) -> Option<NamedFlag> {
        self.flags.read().get(editor_id).cloned()
    }

    /// Reads a flag's value.
    #[must_use]
    pub fn value(&self, editor_id: &str) -> Option<f32> {
        self.flags.read().get(editor_id).map(|flag| flag.get())
    }

    /// Number of flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.read().len()
    }

    /// `true` if no flags are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.read().is_empty()
    }
}
