//! Core domain logic for the reminder tracker.
//! This crate is the single source of truth for reminder invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod kv;
pub mod logging;
pub mod model;
pub mod repo;
pub mod scheduler;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Preferences, ReminderConfig, DEFAULT_TICK_PERIOD, SOUND_ENABLED_KEY};
pub use kv::{KeyValueStore, KvError, KvResult, MemoryKeyValueStore, SqliteKeyValueStore};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::reminder::{Reminder, ReminderId, ReminderValidationError};
pub use repo::reminder_repo::{
    KvReminderRepository, ReminderRepository, RepoError, RepoResult, DEFAULT_REMINDERS_KEY,
};
pub use scheduler::notifier::{request_permission, LogNotifier, Notifier, PermissionState};
pub use scheduler::registry::{AlertHandle, AlertScheduler, ArmedAlert, Delivery, FiredAlert};
pub use scheduler::ticker::{SleepTicker, Ticker};
pub use service::reminder_controller::{
    ControllerError, ControllerResult, InitSummary, ReminderController,
};
pub use service::views::{
    filter_reminders, group_by_date, sort_reminders, DateGroup, DateLabel, ReminderFilter,
    UnknownFilterError,
};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
