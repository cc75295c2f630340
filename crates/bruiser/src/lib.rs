//! # Bruiser
//!
//! Hand-to-hand combat for the engine: alternating fists, a trainable
//! hand-to-hand skill, and a race-based starting level.
//!
//! ## Usage
//!
//! ```ignore
//! bruiser::logging::init(Some(Path::new("BruiserHandToHand.log")))?;
//! let plugin = Plugin::load(host, &PluginConfig::default())?;
//! // From the host's messaging callback:
//! plugin.on_message(LifecycleMessage::DataLoaded);
//! ```
//!
//! ## Crates
//!
//! - `bruiser_shared`: payloads, ids, editor ids
//! - `bruiser_core`: host traits, dispatch, task queues, script calls
//! - `bruiser_skill`: settings, formulas, progression, starting skill
//! - `bruiser`: the toggle and the plugin context

#![deny(unsafe_code)]

pub mod logging;
pub mod plugin;
pub mod toggle;

pub use plugin::{Plugin, PluginConfig, PluginError};
pub use toggle::{AttackKind, AttackToggle, Direction, TagClass};
