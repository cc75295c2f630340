//! # Plugin Context
//!
//! Owns every component and wires them to host lifecycle messages.
//!
//! | Message        | Action                                                  |
//! |----------------|---------------------------------------------------------|
//! | `DataLoaded`   | Register skill progression, load starting-skill forms   |
//! | `PostLoadGame` | Register the toggle (once), initialize existing saves   |
//! | `NewGame`      | Register the toggle (once), wait for race menu close    |
//!
//! A feature whose registration fails stays off for the session. The rest of
//! the plugin keeps running.

use crate::toggle::AttackToggle;
use bruiser_core::{Host, TaskError, TaskQueue, TaskQueueConfig};
use bruiser_shared::constants::{PLUGIN_NAME, PLUGIN_VERSION, SETTINGS_FILE};
use bruiser_shared::LifecycleMessage;
use bruiser_skill::{PlayerXpAwarder, SkillProgression, SkillSettings, StartingSkillManager};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// The plugin could not start.
#[derive(Error, Debug)]
pub enum PluginError {
    /// A background task queue could not be created.
    #[error("failed to start background tasks: {0}")]
    Tasks(#[from] TaskError),
}

/// Load-time options.
#[derive(Clone, Debug)]
pub struct PluginConfig {
    /// Tunables file.
    pub settings_path: PathBuf,
    /// Workers processing hits. The XP lock serializes them anyway; more
    /// than one only keeps a slow perk hook from backing up the queue.
    pub hit_workers: usize,
    /// Hits that can wait before new ones are dropped.
    pub hit_queue_capacity: usize,
    /// Bound on the player XP read. `None` waits forever.
    pub award_timeout: Option<Duration>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from(SETTINGS_FILE),
            hit_workers: 2,
            hit_queue_capacity: 1024,
            award_timeout: None,
        }
    }
}

/// Everything the plugin owns.
pub struct Plugin {
    host: Host,
    settings: Arc<SkillSettings>,
    hit_queue: Arc<TaskQueue>,
    awarder: Arc<PlayerXpAwarder>,
    progression: Mutex<Option<Arc<SkillProgression>>>,
    starting: Mutex<Option<Arc<StartingSkillManager>>>,
    toggle: Mutex<Option<Arc<AttackToggle>>>,
}

impl Plugin {
    /// Loads tunables and starts the background queues.
    ///
    /// # Errors
    ///
    /// [`PluginError::Tasks`] if a worker thread cannot be started.
    pub fn load(host: Host, config: &PluginConfig) -> Result<Self, PluginError> {
        let settings = Arc::new(SkillSettings::load(&config.settings_path));

        let hit_queue = Arc::new(TaskQueue::new(
            TaskQueueConfig::new("bruiser-hit")
                .with_workers(config.hit_workers)
                .with_capacity(config.hit_queue_capacity),
        )?);
        let award_queue = Arc::new(TaskQueue::new(
            TaskQueueConfig::new("bruiser-award").with_capacity(256),
        )?);

        let awarder = Arc::new(PlayerXpAwarder::new(Arc::clone(&host.vm), award_queue));
        awarder.set_timeout(config.award_timeout);

        tracing::info!("Registering {PLUGIN_NAME}, Version {PLUGIN_VERSION}, for load.");

        Ok(Self {
            host,
            settings,
            hit_queue,
            awarder,
            progression: Mutex::new(None),
            starting: Mutex::new(None),
            toggle: Mutex::new(None),
        })
    }

    /// Handles a host lifecycle message.
    pub fn on_message(&self, message: LifecycleMessage) {
        tracing::debug!("Lifecycle message {message:?}");
        match message {
            LifecycleMessage::DataLoaded => {
                self.register_progression();
                self.load_starting_skill();
            }
            LifecycleMessage::PostLoadGame => {
                self.register_toggle();
                if let Some(starting) = self.starting_skill() {
                    starting.handle_existing_character();
                }
            }
            LifecycleMessage::NewGame => {
                self.register_toggle();
                if let Some(starting) = self.starting_skill() {
                    starting.register_for_race_menu_done();
                }
            }
        }
    }

    fn register_progression(&self) {
        let mut slot = self.progression.lock();
        if slot.is_some() {
            return;
        }
        match SkillProgression::register(
            &self.host,
            Arc::clone(&self.settings),
            Arc::clone(&self.hit_queue),
            Arc::clone(&self.awarder),
        ) {
            Ok(engine) => *slot = Some(engine),
            Err(err) => tracing::error!("Hand to hand skill progression disabled: {err}"),
        }
    }

    fn load_starting_skill(&self) {
        let mut slot = self.starting.lock();
        if slot.is_some() {
            return;
        }
        match StartingSkillManager::load_forms(&self.host) {
            Ok(manager) => *slot = Some(manager),
            Err(err) => tracing::error!("Starting skill initializer disabled: {err}"),
        }
    }

    fn register_toggle(&self) {
        let mut slot = self.toggle.lock();
        if slot.is_some() {
            return;
        }
        match AttackToggle::register(&self.host) {
            Ok(toggle) => *slot = Some(toggle),
            Err(err) => tracing::error!("Attack direction toggle disabled: {err}"),
        }
    }

    /// Tunables in effect.
    #[must_use]
    pub fn settings(&self) -> &SkillSettings {
        &self.settings
    }

    /// The skill engine, once registered.
    #[must_use]
    pub fn progression(&self) -> Option<Arc<SkillProgression>> {
        self.progression.lock().clone()
    }

    /// The starting skill initializer, once its forms resolved.
    #[must_use]
    pub fn starting_skill(&self) -> Option<Arc<StartingSkillManager>> {
        self.starting.lock().clone()
    }

    /// The attack toggle, once registered.
    #[must_use]
    pub fn toggle(&self) -> Option<Arc<AttackToggle>> {
        self.toggle.lock().clone()
    }

    /// The player XP awarder.
    #[must_use]
    pub fn awarder(&self) -> &Arc<PlayerXpAwarder> {
        &self.awarder
    }

    /// Blocks until queued hits and awards drain, or `timeout` elapses.
    ///
    /// Returns `true` if both queues went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        let hits_idle = self.hit_queue.wait_idle(timeout);
        let remaining = timeout.saturating_sub(start.elapsed());
        hits_idle && self.awarder.queue().wait_idle(remaining)
    }

    /// Unsubscribes every handler. Queued work still runs.
    pub fn shutdown(&self) {
        if let Some(engine) = self.progression.lock().take() {
            engine.unregister();
        }
        if let Some(toggle) = self.toggle.lock().take() {
            toggle.unregister();
        }
        if let Some(starting) = self.starting.lock().take() {
            starting.unregister();
        }
        tracing::info!("{PLUGIN_NAME} handlers unregistered.");
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("settings", &self.settings)
            .field("progression", &self.progression.lock().is_some())
            .field("starting", &self.starting.lock().is_some())
            .field("toggle", &self.toggle.lock().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bruiser_core::host::mock::MockHost;
    use bruiser_shared::constants;

    fn config() -> PluginConfig {
        PluginConfig {
            settings_path: std::env::temp_dir().join("bruiser-plugin-no-settings.toml"),
            ..PluginConfig::default()
        }
    }

    #[test]
    fn test_load_without_settings_file_uses_defaults() {
        let mock = MockHost::standard();
        let plugin = Plugin::load(mock.host(), &config()).expect("load failed");
        assert_eq!(*plugin.settings(), SkillSettings::default());
        assert!(plugin.progression().is_none());
        assert!(plugin.toggle().is_none());
    }

    #[test]
    fn test_data_loaded_registers_engine_and_forms() {
        let mock = MockHost::standard();
        let plugin = Plugin::load(mock.host(), &config()).expect("load failed");
        plugin.on_message(LifecycleMessage::DataLoaded);
        plugin.on_message(LifecycleMessage::DataLoaded);

        assert!(plugin.progression().is_some());
        assert!(plugin.starting_skill().is_some());
        assert_eq!(mock.hit_events.sink_count(), 1, "registered once");
        assert_eq!(mock.animation_events.sink_count(), 0);
    }

    #[test]
    fn test_toggle_registers_once_across_loads() {
        let mock = MockHost::standard();
        let plugin = Plugin::load(mock.host(), &config()).expect("load failed");
        plugin.on_message(LifecycleMessage::DataLoaded);
        plugin.on_message(LifecycleMessage::NewGame);
        plugin.on_message(LifecycleMessage::PostLoadGame);
        plugin.on_message(LifecycleMessage::PostLoadGame);
        assert_eq!(mock.animation_events.sink_count(), 1);
    }

    #[test]
    fn test_failed_feature_leaves_others_running() {
        let mock = MockHost::standard();
        mock.forms.remove_flag(constants::SKILL_EXP);
        let plugin = Plugin::load(mock.host(), &config()).expect("load failed");
        plugin.on_message(LifecycleMessage::DataLoaded);
        plugin.on_message(LifecycleMessage::PostLoadGame);

        assert!(plugin.progression().is_none());
        assert!(plugin.starting_skill().is_some());
        assert!(plugin.toggle().is_some());
    }

    #[test]
    fn test_shutdown_unsubscribes() {
        let mock = MockHost::standard();
        let plugin = Plugin::load(mock.host(), &config()).expect("load failed");
        plugin.on_message(LifecycleMessage::DataLoaded);
        plugin.on_message(LifecycleMessage::NewGame);
        assert_eq!(mock.menu_events.sink_count(), 1);
        plugin.shutdown();

        assert_eq!(mock.hit_events.sink_count(), 0);
        assert_eq!(mock.menu_events.sink_count(), 0);
        assert_eq!(mock.animation_events.sink_count(), 0);
        assert!(plugin.wait_idle(Duration::from_secs(1)));
    }
}
