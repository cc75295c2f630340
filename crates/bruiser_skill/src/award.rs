//! # Player Level XP Award
//!
//! Skill level-ups also feed the player's character level. The player's
//! level experience lives in the script VM, so an award is a read-modify-write
//! over two blocking script calls:
//!
//! 1. `Game.GetPlayerExperience()` → current total
//! 2. `Game.SetPlayerExperience(current + award)` → acknowledged
//!
//! Awards run on their own task queue under their own lock, so concurrent
//! awards cannot interleave their read and write.

use crate::error::AwardError;
use bruiser_core::script::{call_static, call_static_float};
use bruiser_core::{ScriptValue, ScriptVm, TaskError, TaskQueue};
use bruiser_shared::constants::{SCRIPT_GAME_CLASS, SCRIPT_GET_PLAYER_XP, SCRIPT_SET_PLAYER_XP};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Sends player level XP to the script VM.
pub struct PlayerXpAwarder {
    vm: Arc<dyn ScriptVm>,
    queue: Arc<TaskQueue>,
    award_lock: Mutex<()>,
    timeout: Mutex<Option<Duration>>,
}

impl PlayerXpAwarder {
    /// Creates an awarder running its calls on `queue`.
    ///
    /// Callback waits have no timeout until [`set_timeout`](Self::set_timeout).
    #[must_use]
    pub fn new(vm: Arc<dyn ScriptVm>, queue: Arc<TaskQueue>) -> Self {
        Self {
            vm,
            queue,
            award_lock: Mutex::new(()),
            timeout: Mutex::new(None),
        }
    }

    /// Bounds the wait for the read. `None` waits forever.
    ///
    /// The write always waits for its acknowledgement, so awards never
    /// overlap.
    pub fn set_timeout(&self, timeout: Option<Duration>) {
        *self.timeout.lock() = timeout;
    }

    /// Current callback wait bound.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        *self.timeout.lock()
    }

    /// The queue awards run on.
    #[must_use]
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Queues an award and returns immediately.
    ///
    /// # Errors
    ///
    /// Any [`TaskError`] from the award queue. The award is then lost.
    pub fn award(self: &Arc<Self>, xp: f32) -> Result<(), TaskError> {
        let awarder = Arc::clone(self);
        self.queue.spawn(move || {
            if let Err(err) = awarder.give_player_xp(xp) {
                tracing::error!("Player XP award of {xp} abandoned: {err}");
            }
        })
    }

    /// Adds `xp` to the player's level experience, blocking on the VM.
    ///
    /// Returns the new total.
    ///
    /// # Errors
    ///
    /// [`AwardError::Script`] if either call is rejected, the read times out
    /// or returns a non-float; [`AwardError::NegativeExperience`] if the read
    /// returns a negative total. Nothing is written in any of these cases.
    pub fn give_player_xp(&self, xp: f32) -> Result<f32, AwardError> {
        let _guard = self.award_lock.lock();
        let timeout = self.timeout();
        tracing::trace!("Processing player level xp of {xp}.");

        let current = call_static_float(
            self.vm.as_ref(),
            SCRIPT_GAME_CLASS,
            SCRIPT_GET_PLAYER_XP,
            Vec::new(),
            timeout,
        )?;
        if current < 0.0 {
            return Err(AwardError::NegativeExperience(current));
        }

        let new_xp = current + xp;
        tracing::trace!("Player XP: {current}, new XP {new_xp}");

        // The write is never bounded: a VM that applies it after we stop
        // waiting would race the next award's read.
        call_static(
            self.vm.as_ref(),
            SCRIPT_GAME_CLASS,
            SCRIPT_SET_PLAYER_XP,
            vec![ScriptValue::Float(new_xp)],
            None,
        )?;
        tracing::trace!("XP Gain Finished");
        Ok(new_xp)
    }
}

impl std::fmt::Debug for PlayerXpAwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerXpAwarder")
            .field("queue", &self.queue.name())
            .field("timeout", &self.timeout())
            .finish_non_exhaustive()
    }
}
