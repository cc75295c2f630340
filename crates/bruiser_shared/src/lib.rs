//! # Bruiser Shared
//!
//! Common types used by every Bruiser component.
//!
//! ## CRITICAL RULE
//!
//! This crate is plain data. It must NEVER reach into the host:
//! - no flag reads or writes
//! - no locks
//! - no threads
//!
//! If you need host access, put it behind a trait in `bruiser_core`.

#![deny(unsafe_code)]

pub mod constants;
pub mod events;
pub mod ids;

pub use constants::{HIT_QUEUE_WAIT, SKILL_MAX_LEVEL, TOGGLE_COOLDOWN};
pub use events::{
    AnimationEvent, EventControl, HitEvent, LifecycleMessage, MenuOpenCloseEvent,
};
pub use ids::{FormId, Hand, KeywordId, RefId};
