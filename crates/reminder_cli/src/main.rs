//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `reminder_core` linkage and wiring of store, notifier and clock.
//! - Keep output deterministic for quick local sanity checks.
//! - Route core `event=...` lines to a rolling log under the temp directory.

use reminder_core::{
    default_log_level, init_logging, KvReminderRepository, LogNotifier, ReminderController,
    ReminderFilter, SqliteKeyValueStore, SystemClock,
};
use std::process::ExitCode;

const LOG_DIR_NAME: &str = "reminder_cli_logs";

fn main() -> ExitCode {
    println!("reminder_core ping={}", reminder_core::ping());
    println!("reminder_core version={}", reminder_core::core_version());

    let log_dir = std::env::temp_dir().join(LOG_DIR_NAME);
    match init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        Ok(()) => println!("reminder_core log_dir={}", log_dir.display()),
        Err(err) => eprintln!("reminder_core logging=disabled {err}"),
    }

    let kv = match SqliteKeyValueStore::open_in_memory() {
        Ok(kv) => kv,
        Err(err) => {
            eprintln!("reminder_core storage=error {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut controller = ReminderController::new(
        KvReminderRepository::new(kv),
        LogNotifier::new(),
        SystemClock,
    );
    let summary = controller.initialize();
    println!(
        "reminder_core loaded={} armed={} permission_granted={} upcoming={}",
        summary.loaded,
        summary.armed,
        summary.permission_granted,
        controller.view(ReminderFilter::Upcoming).len()
    );

    let fired = controller.tick();
    println!(
        "reminder_core fired={} alerts_shown={}",
        fired.len(),
        controller.notifier().shown_count()
    );
    ExitCode::SUCCESS
}
