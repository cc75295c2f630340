//! # Bruiser Core
//!
//! The host boundary and the concurrency kernel every component builds on.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  notifications  ┌──────────────┐   jobs    ┌──────────────┐
//! │    Host      │ ──────────────▶ │ EventSink<E> │ ────────▶ │  TaskQueue   │
//! │  (engine)    │                 │ (component)  │           │  (workers)   │
//! └──────┬───────┘                 └──────┬───────┘           └──────┬───────┘
//!        │  NamedFlag cells               │ read/write               │ ScriptVm
//!        └────────────────────────────────┴──────────────────────────┘ round trips
//! ```
//!
//! ## Modules
//!
//! - `flags`: host-owned numeric cells, resolved once and cached by handle
//! - `host`: traits for every host service, plus mocks for tests
//! - `dispatch`: typed sinks/sources per notification kind
//! - `sync`: completion signal for callback waits
//! - `tasks`: named worker pools for fire-and-forget jobs
//! - `script`: blocking calls over the VM's async callbacks

#![deny(unsafe_code)]

pub mod dispatch;
pub mod error;
pub mod flags;
pub mod host;
pub mod script;
pub mod sync;
pub mod tasks;

pub use dispatch::{EventDispatcher, EventSink, EventSource, SinkHandle};
pub use error::{ProcessError, ResolveError, ResolveResult, ScriptError, TaskError};
pub use flags::{FlagCell, FlagTable, GameSetting, NamedFlag};
pub use host::{
    ActorAccess, ActorStatus, AttackData, FormLookup, Host, LifeState, PerkEntryPoints,
    SkillBoost, SkillKind, WeaponInfo,
};
pub use script::{PendingCall, ScriptValue, ScriptVm, StackCallback};
pub use sync::CompletionSignal;
pub use tasks::{TaskQueue, TaskQueueConfig, TaskStats};
