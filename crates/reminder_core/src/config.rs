//! Core configuration and persisted user preferences.
//!
//! # Invariants
//! - Defaults are usable without any host-provided values.
//! - Preference reads never fail; unreadable values fall back to defaults.

use crate::kv::{KeyValueStore, KvResult};
use crate::repo::reminder_repo::DEFAULT_REMINDERS_KEY;
use log::warn;
use std::time::Duration;

/// Interval of the periodic due-check when no alert is armed sooner.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(60);

/// Key holding the alert sound preference (`"true"` / `"false"`).
pub const SOUND_ENABLED_KEY: &str = "sound-enabled";

/// Runtime configuration for the reminder core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderConfig {
    /// Key under which the reminder collection is stored.
    pub reminders_key: String,
    pub sound_enabled_key: String,
    /// Upper bound on the event loop sleep between ticks.
    pub tick_period: Duration,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            reminders_key: DEFAULT_REMINDERS_KEY.to_string(),
            sound_enabled_key: SOUND_ENABLED_KEY.to_string(),
            tick_period: DEFAULT_TICK_PERIOD,
        }
    }
}

/// User preferences persisted next to the reminder collection.
pub struct Preferences<S: KeyValueStore> {
    kv: S,
    sound_enabled_key: String,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(kv: S, config: &ReminderConfig) -> Self {
        Self {
            kv,
            sound_enabled_key: config.sound_enabled_key.clone(),
        }
    }

    /// Whether alerts play a sound. Defaults to `true`.
    pub fn sound_enabled(&self) -> bool {
        match self.kv.get(&self.sound_enabled_key) {
            Ok(Some(value)) => value.trim() != "false",
            Ok(None) => true,
            Err(err) => {
                warn!(
                    "event=preferences_load module=config status=recovered error_code=kv_read_failed error={}",
                    err
                );
                true
            }
        }
    }

    pub fn set_sound_enabled(&self, enabled: bool) -> KvResult<()> {
        self.kv
            .set(&self.sound_enabled_key, if enabled { "true" } else { "false" })
    }
}
