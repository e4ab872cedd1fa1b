use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use reminder_core::{
    Clock, ControllerError, DateLabel, Delivery, KeyValueStore, KvError, KvReminderRepository,
    KvResult, ManualClock, MemoryKeyValueStore, Notifier, PermissionState, Reminder,
    ReminderConfig, ReminderController, ReminderFilter, ReminderRepository, Ticker,
    DEFAULT_REMINDERS_KEY,
};
use std::cell::{Cell, RefCell};
use std::time::Duration;

#[derive(Default)]
struct RecordingNotifier {
    denied: Cell<bool>,
    prompts: Cell<usize>,
    shown: RefCell<Vec<(String, String)>>,
}

impl RecordingNotifier {
    fn shown_titles(&self) -> Vec<String> {
        self.shown
            .borrow()
            .iter()
            .map(|(title, _)| title.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn permission(&self) -> PermissionState {
        if self.denied.get() {
            PermissionState::Denied
        } else {
            PermissionState::Granted
        }
    }

    fn prompt_permission(&self) -> PermissionState {
        self.prompts.set(self.prompts.get() + 1);
        self.permission()
    }

    fn show(&self, title: &str, body: &str) {
        self.shown
            .borrow_mut()
            .push((title.to_string(), body.to_string()));
    }
}

/// Advances the shared clock instead of sleeping.
struct ClockTicker {
    clock: ManualClock,
    remaining: usize,
    waits: Vec<Duration>,
}

impl Ticker for ClockTicker {
    fn wait(&mut self, timeout: Duration) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.waits.push(timeout);
        self.clock.advance(TimeDelta::from_std(timeout).unwrap());
        true
    }
}

/// Accepts reads, refuses writes.
struct ReadOnlyKv(MemoryKeyValueStore);

impl KeyValueStore for ReadOnlyKv {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        self.0.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> KvResult<()> {
        Err(KvError::Unavailable("quota exceeded".to_string()))
    }
}

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 18)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .unwrap()
}

type TestController<'a> = ReminderController<
    KvReminderRepository<&'a MemoryKeyValueStore>,
    &'a RecordingNotifier,
    ManualClock,
>;

fn controller<'a>(
    kv: &'a MemoryKeyValueStore,
    notifier: &'a RecordingNotifier,
    clock: &ManualClock,
) -> TestController<'a> {
    let mut controller =
        ReminderController::new(KvReminderRepository::new(kv), notifier, clock.clone());
    controller.initialize();
    controller
}

#[test]
fn add_persists_trimmed_record_and_arms_alert() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller = controller(&kv, &notifier, &clock);
    let due = start() + TimeDelta::minutes(30);

    let reminder = controller.add("  Pay rent  ", "  landlord  ", due).unwrap();

    let stored = controller.repository().get_all().unwrap();
    assert_eq!(stored, vec![reminder.clone()]);
    assert_eq!(reminder.title, "Pay rent");
    assert_eq!(reminder.description, "landlord");
    assert_eq!(reminder.datetime, due);
    assert!(!reminder.completed);
    assert!(!reminder.notified);
    assert!(controller.scheduler().is_armed(&reminder.id));
    assert_eq!(controller.reminders().len(), 1);
}

#[test]
fn add_with_blank_title_changes_nothing() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller = controller(&kv, &notifier, &clock);

    let err = controller
        .add(" \t ", "desc", start() + TimeDelta::hours(1))
        .unwrap_err();

    assert!(matches!(err, ControllerError::Validation(_)));
    assert!(kv.get(DEFAULT_REMINDERS_KEY).unwrap().is_none());
    assert!(controller.reminders().is_empty());
    assert_eq!(controller.scheduler().armed_count(), 0);
}

#[test]
fn add_with_past_datetime_persists_but_arms_nothing() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller = controller(&kv, &notifier, &clock);

    let reminder = controller
        .add("Yesterday's call", "", start() - TimeDelta::days(1))
        .unwrap();

    assert!(!controller.scheduler().is_armed(&reminder.id));
    assert_eq!(controller.overdue(), vec![reminder]);
}

#[test]
fn failed_store_write_leaves_memory_and_alerts_untouched() {
    let kv = ReadOnlyKv(MemoryKeyValueStore::new());
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller =
        ReminderController::new(KvReminderRepository::new(&kv), &notifier, clock.clone());
    controller.initialize();

    let err = controller
        .add("Pay rent", "", start() + TimeDelta::minutes(30))
        .unwrap_err();

    assert!(matches!(err, ControllerError::Store(_)));
    assert!(controller.reminders().is_empty());
    assert_eq!(controller.scheduler().armed_count(), 0);
}

#[test]
fn edit_resets_notified_and_rearms_new_datetime() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller = controller(&kv, &notifier, &clock);
    let reminder = controller
        .add("Dentist", "", start() + TimeDelta::minutes(10))
        .unwrap();

    clock.advance(TimeDelta::minutes(10));
    assert_eq!(controller.tick().len(), 1);
    assert!(controller.get(&reminder.id).unwrap().notified);

    let new_due = start() + TimeDelta::days(1);
    let edited = controller
        .edit(&reminder.id, " Dentist (moved) ", "bring card", new_due)
        .unwrap()
        .unwrap();

    assert!(!edited.notified);
    assert_eq!(edited.title, "Dentist (moved)");
    assert_eq!(edited.id, reminder.id);
    assert_eq!(controller.repository().get_all().unwrap(), vec![edited.clone()]);
    let armed = controller.scheduler().armed(&reminder.id).unwrap();
    assert_eq!(armed.fire_at, new_due);
    assert_eq!(armed.title, "Reminder: Dentist (moved)");
}

#[test]
fn edit_replaces_previous_alert_instead_of_adding_one() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller = controller(&kv, &notifier, &clock);
    let reminder = controller
        .add("Standup", "", start() + TimeDelta::minutes(5))
        .unwrap();

    controller
        .edit(&reminder.id, "Standup", "", start() + TimeDelta::minutes(20))
        .unwrap();
    assert_eq!(controller.scheduler().armed_count(), 1);

    clock.advance(TimeDelta::minutes(5));
    assert!(controller.tick().is_empty());
    clock.advance(TimeDelta::minutes(15));
    assert_eq!(controller.tick().len(), 1);
    assert_eq!(notifier.shown.borrow().len(), 1);
}

#[test]
fn edit_of_completed_reminder_resets_notified_but_stays_unarmed() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller = controller(&kv, &notifier, &clock);
    let reminder = controller
        .add("Taxes", "", start() + TimeDelta::minutes(5))
        .unwrap();
    controller.complete(&reminder.id).unwrap();

    let edited = controller
        .edit(&reminder.id, "Taxes", "", start() + TimeDelta::days(2))
        .unwrap()
        .unwrap();

    assert!(edited.completed);
    assert!(!edited.notified);
    assert!(!controller.scheduler().is_armed(&reminder.id));
}

#[test]
fn edit_validates_title_and_ignores_unknown_id() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller = controller(&kv, &notifier, &clock);
    let reminder = controller
        .add("Taxes", "", start() + TimeDelta::minutes(5))
        .unwrap();

    let err = controller
        .edit(&reminder.id, "   ", "", start() + TimeDelta::days(2))
        .unwrap_err();
    assert!(matches!(err, ControllerError::Validation(_)));
    assert_eq!(controller.get(&reminder.id).unwrap().title, "Taxes");

    assert!(controller
        .edit("missing", "Ghost", "", start())
        .unwrap()
        .is_none());
    assert_eq!(controller.reminders().len(), 1);
}

#[test]
fn edit_of_reminder_removed_from_store_drops_it_and_its_alert() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller = controller(&kv, &notifier, &clock);
    let reminder = controller
        .add("Water plants", "", start() + TimeDelta::hours(1))
        .unwrap();
    assert!(controller.scheduler().is_armed(&reminder.id));

    assert!(KvReminderRepository::new(&kv).delete(&reminder.id).unwrap());

    assert!(controller
        .edit(&reminder.id, "Water plants", "", start() + TimeDelta::hours(2))
        .unwrap()
        .is_none());
    assert!(controller.get(&reminder.id).is_none());
    assert!(!controller.scheduler().is_armed(&reminder.id));
    assert_eq!(kv.get(DEFAULT_REMINDERS_KEY).unwrap().as_deref(), Some("[]"));

    clock.advance(TimeDelta::hours(3));
    assert!(controller.tick().is_empty());
    assert!(notifier.shown_titles().is_empty());
}

#[test]
fn complete_is_idempotent_and_disarms_alert() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller = controller(&kv, &notifier, &clock);
    let reminder = controller
        .add("Water plants", "", start() + TimeDelta::minutes(5))
        .unwrap();

    assert!(controller.complete(&reminder.id).unwrap());
    assert!(controller.complete(&reminder.id).unwrap());
    assert!(!controller.complete("missing").unwrap());

    assert!(controller.get(&reminder.id).unwrap().completed);
    assert!(controller.repository().get_all().unwrap()[0].completed);
    assert!(!controller.scheduler().is_armed(&reminder.id));

    clock.advance(TimeDelta::minutes(10));
    assert!(controller.tick().is_empty());
    assert!(notifier.shown.borrow().is_empty());
}

#[test]
fn delete_removes_record_and_disarms_alert() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller = controller(&kv, &notifier, &clock);
    let keep = controller
        .add("Keep", "", start() + TimeDelta::minutes(5))
        .unwrap();
    let gone = controller
        .add("Gone", "", start() + TimeDelta::minutes(5))
        .unwrap();

    assert!(controller.delete(&gone.id).unwrap());
    assert!(!controller.delete(&gone.id).unwrap());

    assert_eq!(controller.repository().get_all().unwrap(), vec![keep.clone()]);
    assert_eq!(controller.reminders(), &[keep]);
    clock.advance(TimeDelta::minutes(5));
    assert_eq!(controller.tick().len(), 1);
    assert_eq!(notifier.shown_titles(), vec!["Reminder: Keep".to_string()]);
}

#[test]
fn due_reminder_alerts_once_and_stays_incomplete() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller = controller(&kv, &notifier, &clock);
    let reminder = controller
        .add("Pay rent", "transfer", start() + TimeDelta::minutes(30))
        .unwrap();

    let upcoming = controller.view(ReminderFilter::Upcoming);
    assert_eq!(upcoming, vec![reminder.clone()]);

    clock.advance(TimeDelta::minutes(31));
    let fired = controller.tick();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].delivery, Delivery::Shown);
    assert!(controller.tick().is_empty());
    clock.advance(TimeDelta::hours(2));
    assert!(controller.tick().is_empty());

    assert_eq!(
        notifier.shown.borrow().clone(),
        vec![("Reminder: Pay rent".to_string(), "transfer".to_string())]
    );
    let current = controller.get(&reminder.id).unwrap();
    assert!(!current.completed);
    assert!(current.notified);
    assert!(controller.repository().get_all().unwrap()[0].notified);
    assert_eq!(controller.overdue().len(), 1);
    assert!(controller.view(ReminderFilter::Upcoming).is_empty());
    assert_eq!(controller.view(ReminderFilter::All).len(), 1);
}

#[test]
fn revoked_permission_skips_alert_but_marks_attempt() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller = controller(&kv, &notifier, &clock);
    let reminder = controller
        .add("Pay rent", "", start() + TimeDelta::minutes(1))
        .unwrap();

    notifier.denied.set(true);
    clock.advance(TimeDelta::minutes(1));
    let fired = controller.tick();

    assert_eq!(fired[0].delivery, Delivery::Skipped);
    assert!(notifier.shown.borrow().is_empty());
    assert!(controller.get(&reminder.id).unwrap().notified);
    assert_eq!(controller.scheduler().armed_count(), 0);
}

#[test]
fn initialize_arms_only_pending_unnotified_future_reminders() {
    let kv = MemoryKeyValueStore::new();
    let seed = KvReminderRepository::new(&kv);
    let future = start() + TimeDelta::hours(1);
    let mut done = Reminder::with_id("done", "Done", "", future);
    done.completed = true;
    let mut notified = Reminder::with_id("notified", "Notified", "", future);
    notified.notified = true;
    seed.save_all(&[
        Reminder::with_id("pending", "Pending", "", future),
        done,
        notified,
        Reminder::with_id("past", "Past", "", start() - TimeDelta::hours(1)),
    ])
    .unwrap();

    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller =
        ReminderController::new(KvReminderRepository::new(&kv), &notifier, clock.clone());
    let summary = controller.initialize();

    assert_eq!(summary.loaded, 4);
    assert_eq!(summary.armed, 1);
    assert!(summary.permission_granted);
    assert!(controller.scheduler().is_armed("pending"));
}

#[test]
fn initialize_with_corrupt_payload_starts_empty() {
    let kv = MemoryKeyValueStore::new();
    kv.set(DEFAULT_REMINDERS_KEY, "definitely not json").unwrap();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller =
        ReminderController::new(KvReminderRepository::new(&kv), &notifier, clock.clone());

    let summary = controller.initialize();
    assert_eq!(summary.loaded, 0);
    assert_eq!(summary.armed, 0);
}

#[test]
fn reload_rebuilds_view_and_alerts_from_store() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller = controller(&kv, &notifier, &clock);
    controller
        .add("Mine", "", start() + TimeDelta::minutes(5))
        .unwrap();

    KvReminderRepository::new(&kv)
        .save_all(&[Reminder::with_id(
            "external",
            "External",
            "",
            start() + TimeDelta::minutes(15),
        )])
        .unwrap();

    assert_eq!(controller.reload(), 1);
    assert_eq!(controller.reminders().len(), 1);
    assert!(controller.scheduler().is_armed("external"));
    assert_eq!(controller.scheduler().armed_count(), 1);
}

#[test]
fn grouped_view_labels_today_and_tomorrow() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let mut controller = controller(&kv, &notifier, &clock);
    controller
        .add("Tomorrow", "", start() + TimeDelta::days(1))
        .unwrap();
    controller
        .add("Today", "", start() + TimeDelta::hours(2))
        .unwrap();
    let done = controller
        .add("Done today", "", start() + TimeDelta::hours(1))
        .unwrap();
    controller.complete(&done.id).unwrap();

    let groups = controller.grouped(ReminderFilter::All);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].label, DateLabel::Today);
    let today_titles: Vec<&str> = groups[0]
        .reminders
        .iter()
        .map(|reminder| reminder.title.as_str())
        .collect();
    assert_eq!(today_titles, vec!["Today", "Done today"]);
    assert_eq!(groups[1].heading(), "Tomorrow");

    let completed = controller.view(ReminderFilter::Completed);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, done.id);
}

#[test]
fn run_wakes_at_deadlines_and_caps_waits_at_tick_period() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let config = ReminderConfig {
        tick_period: Duration::from_secs(60),
        ..ReminderConfig::default()
    };
    let mut controller = ReminderController::with_config(
        KvReminderRepository::new(&kv),
        &notifier,
        clock.clone(),
        &config,
    );
    controller.initialize();
    controller
        .add("Soon", "", start() + TimeDelta::seconds(20))
        .unwrap();
    controller
        .add("Later", "", start() + TimeDelta::minutes(3))
        .unwrap();

    let mut ticker = ClockTicker {
        clock: clock.clone(),
        remaining: 6,
        waits: Vec::new(),
    };
    let fired = controller.run(&mut ticker);

    assert_eq!(fired, 2);
    assert_eq!(ticker.waits[0], Duration::from_secs(20));
    assert!(ticker
        .waits
        .iter()
        .all(|wait| *wait <= Duration::from_secs(60)));
    assert_eq!(
        notifier.shown_titles(),
        vec!["Reminder: Soon".to_string(), "Reminder: Later".to_string()]
    );
    assert!(clock.now() >= start() + TimeDelta::minutes(3));
}

#[test]
fn next_wait_defaults_to_tick_period_when_nothing_is_armed() {
    let kv = MemoryKeyValueStore::new();
    let notifier = RecordingNotifier::default();
    let clock = ManualClock::new(start());
    let controller = controller(&kv, &notifier, &clock);

    assert_eq!(controller.next_wait(), Duration::from_secs(60));
    assert_eq!(notifier.prompts.get(), 0);
}
