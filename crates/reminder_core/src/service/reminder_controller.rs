//! Reminder lifecycle controller.
//!
//! # Responsibility
//! - Turn user intents (add/edit/complete/delete) into store mutations and
//!   alert arming.
//! - Keep an in-memory mirror of the stored collection for derived views.
//!
//! # Invariants
//! - The in-memory mirror only changes after the matching store write
//!   succeeded, or after the store reported the record gone.
//! - Completed reminders are never armed.
//! - Completing, deleting or editing a reminder disarms its previous alert.
//! - Unknown ids are no-ops.

use crate::clock::Clock;
use crate::config::ReminderConfig;
use crate::model::reminder::{validate_title, Reminder, ReminderValidationError};
use crate::repo::reminder_repo::{ReminderRepository, RepoError};
use crate::scheduler::notifier::{request_permission, Notifier};
use crate::scheduler::registry::{AlertScheduler, FiredAlert};
use crate::scheduler::ticker::Ticker;
use crate::service::views::{
    filter_reminders, group_by_date, sort_reminders, DateGroup, ReminderFilter,
};
use chrono::NaiveDateTime;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Failure reported back to the caller of a lifecycle operation.
///
/// Neither variant is fatal; the operation simply did not happen.
#[derive(Debug)]
pub enum ControllerError {
    Validation(ReminderValidationError),
    Store(RepoError),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "failed to persist reminders: {err}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ReminderValidationError> for ControllerError {
    fn from(value: ReminderValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ControllerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

/// Outcome of `initialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitSummary {
    pub loaded: usize,
    pub armed: usize,
    pub permission_granted: bool,
}

/// Single point of truth for reminder lifecycle operations.
pub struct ReminderController<R: ReminderRepository, N: Notifier, C: Clock> {
    repo: R,
    notifier: N,
    clock: C,
    scheduler: AlertScheduler,
    reminders: Vec<Reminder>,
    tick_period: Duration,
    permission_granted: bool,
}

impl<R: ReminderRepository, N: Notifier, C: Clock> ReminderController<R, N, C> {
    pub fn new(repo: R, notifier: N, clock: C) -> Self {
        Self::with_config(repo, notifier, clock, &ReminderConfig::default())
    }

    pub fn with_config(repo: R, notifier: N, clock: C, config: &ReminderConfig) -> Self {
        Self {
            repo,
            notifier,
            clock,
            scheduler: AlertScheduler::new(),
            reminders: Vec::new(),
            tick_period: config.tick_period,
            permission_granted: false,
        }
    }

    /// Loads the stored collection, asks for alert permission and arms an
    /// alert for every pending, not yet notified reminder due in the future.
    ///
    /// A store read failure degrades to an empty collection.
    pub fn initialize(&mut self) -> InitSummary {
        self.load_from_store();
        self.permission_granted = request_permission(&self.notifier);
        let armed = self.arm_all();

        let summary = InitSummary {
            loaded: self.reminders.len(),
            armed,
            permission_granted: self.permission_granted,
        };
        info!(
            "event=controller_init module=service status=ok loaded={} armed={} permission_granted={}",
            summary.loaded, summary.armed, summary.permission_granted
        );
        summary
    }

    /// Discards the in-memory mirror and every armed alert, then rebuilds
    /// both from the store. Returns the number of armed alerts.
    pub fn reload(&mut self) -> usize {
        self.scheduler.cancel_all();
        self.load_from_store();
        let armed = self.arm_all();
        info!(
            "event=controller_reload module=service status=ok loaded={} armed={}",
            self.reminders.len(),
            armed
        );
        armed
    }

    /// Re-asks the host for alert permission.
    pub fn request_permission(&mut self) -> bool {
        self.permission_granted = request_permission(&self.notifier);
        self.permission_granted
    }

    /// Creates a reminder from trimmed inputs, persists it and arms its alert.
    pub fn add(
        &mut self,
        title: &str,
        description: &str,
        datetime: NaiveDateTime,
    ) -> ControllerResult<Reminder> {
        let title = title.trim();
        if let Err(err) = validate_title(title) {
            warn!("event=reminder_add module=service status=rejected error_code=empty_title");
            return Err(err.into());
        }

        let reminder = Reminder::new(title, description.trim(), datetime);
        if let Err(err) = self.repo.add(&reminder) {
            error!(
                "event=reminder_add module=service status=error error_code=store_write_failed error={}",
                err
            );
            return Err(err.into());
        }

        let armed = self.arm(&reminder);
        self.reminders.push(reminder.clone());
        info!(
            "event=reminder_add module=service status=ok armed={} total={}",
            armed,
            self.reminders.len()
        );
        Ok(reminder)
    }

    /// Replaces title, description and due instant of an existing reminder.
    ///
    /// `notified` is reset so the new instant can alert again; `completed` is
    /// kept. Returns `Ok(None)` when `id` is unknown. A reminder that is known
    /// here but already gone from the store is dropped from memory and
    /// disarmed.
    pub fn edit(
        &mut self,
        id: &str,
        title: &str,
        description: &str,
        datetime: NaiveDateTime,
    ) -> ControllerResult<Option<Reminder>> {
        let title = title.trim();
        if let Err(err) = validate_title(title) {
            warn!("event=reminder_edit module=service status=rejected error_code=empty_title");
            return Err(err.into());
        }

        let Some(index) = self.position(id) else {
            info!("event=reminder_edit module=service status=noop reason=unknown_id");
            return Ok(None);
        };

        let mut updated = self.reminders[index].clone();
        updated.title = title.to_string();
        updated.description = description.trim().to_string();
        updated.datetime = datetime;
        updated.notified = false;

        match self.repo.update(&updated) {
            Ok(true) => {}
            Ok(false) => {
                self.reminders.remove(index);
                self.scheduler.cancel(id);
                warn!(
                    "event=reminder_edit module=service status=noop reason=missing_in_store total={}",
                    self.reminders.len()
                );
                return Ok(None);
            }
            Err(err) => {
                error!(
                    "event=reminder_edit module=service status=error error_code=store_write_failed error={}",
                    err
                );
                return Err(err.into());
            }
        }

        let armed = self.arm(&updated);
        self.reminders[index] = updated.clone();
        info!(
            "event=reminder_edit module=service status=ok armed={} completed={}",
            armed, updated.completed
        );
        Ok(Some(updated))
    }

    /// Marks a reminder completed and disarms its alert. Idempotent.
    ///
    /// Returns whether `id` was known.
    pub fn complete(&mut self, id: &str) -> ControllerResult<bool> {
        let Some(index) = self.position(id) else {
            info!("event=reminder_complete module=service status=noop reason=unknown_id");
            return Ok(false);
        };

        if let Err(err) = self.repo.mark_completed(id) {
            error!(
                "event=reminder_complete module=service status=error error_code=store_write_failed error={}",
                err
            );
            return Err(err.into());
        }

        self.reminders[index].completed = true;
        self.scheduler.cancel(id);
        info!("event=reminder_complete module=service status=ok");
        Ok(true)
    }

    /// Removes a reminder and disarms its alert. Returns whether `id` was known.
    pub fn delete(&mut self, id: &str) -> ControllerResult<bool> {
        let Some(index) = self.position(id) else {
            info!("event=reminder_delete module=service status=noop reason=unknown_id");
            return Ok(false);
        };

        if let Err(err) = self.repo.delete(id) {
            error!(
                "event=reminder_delete module=service status=error error_code=store_write_failed error={}",
                err
            );
            return Err(err.into());
        }

        self.reminders.remove(index);
        self.scheduler.cancel(id);
        info!(
            "event=reminder_delete module=service status=ok total={}",
            self.reminders.len()
        );
        Ok(true)
    }

    /// Fires every alert that is due and marks the matching reminders
    /// notified.
    ///
    /// Skipped alerts (permission missing at fire time) count as attempted.
    pub fn tick(&mut self) -> Vec<FiredAlert> {
        let now = self.clock.now();
        let fired = self.scheduler.fire_due(&self.notifier, now);

        for alert in &fired {
            let id = alert.alert.reminder_id.as_str();
            let Some(index) = self.position(id) else {
                continue;
            };
            if self.reminders[index].completed || self.reminders[index].notified {
                continue;
            }
            match self.repo.mark_notified(id) {
                Ok(_) => self.reminders[index].notified = true,
                Err(err) => error!(
                    "event=reminder_notified module=service status=error error_code=store_write_failed error={}",
                    err
                ),
            }
        }

        fired
    }

    /// Runs the event loop until `ticker` asks to stop.
    ///
    /// Each iteration fires due alerts, then waits until the next armed
    /// deadline or one tick period, whichever comes first. Returns the number
    /// of alerts fired.
    pub fn run<T: Ticker + ?Sized>(&mut self, ticker: &mut T) -> usize {
        let mut fired = 0;
        loop {
            fired += self.tick().len();
            if !ticker.wait(self.next_wait()) {
                break;
            }
        }
        info!("event=controller_run module=service status=stopped fired={fired}");
        fired
    }

    /// Time until the loop should wake next, capped at the tick period.
    pub fn next_wait(&self) -> Duration {
        let Some(deadline) = self.scheduler.next_deadline() else {
            return self.tick_period;
        };
        let until_deadline = (deadline - self.clock.now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        until_deadline.min(self.tick_period)
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.scheduler.set_sound_enabled(enabled);
    }

    pub fn permission_granted(&self) -> bool {
        self.permission_granted
    }

    /// In-memory reminders in stored order.
    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn get(&self, id: &str) -> Option<&Reminder> {
        self.reminders.iter().find(|reminder| reminder.id == id)
    }

    /// Filtered and display-sorted reminders at the current instant.
    pub fn view(&self, filter: ReminderFilter) -> Vec<Reminder> {
        let mut reminders = filter_reminders(&self.reminders, filter, self.clock.now());
        sort_reminders(&mut reminders);
        reminders
    }

    /// `view(filter)` bucketed by local calendar date.
    pub fn grouped(&self, filter: ReminderFilter) -> Vec<DateGroup> {
        group_by_date(&self.view(filter), self.clock.now().date())
    }

    /// Pending reminders whose due instant has passed, display-sorted.
    pub fn overdue(&self) -> Vec<Reminder> {
        let now = self.clock.now();
        let mut reminders: Vec<Reminder> = self
            .reminders
            .iter()
            .filter(|reminder| reminder.is_overdue(now))
            .cloned()
            .collect();
        sort_reminders(&mut reminders);
        reminders
    }

    pub fn scheduler(&self) -> &AlertScheduler {
        &self.scheduler
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.reminders.iter().position(|reminder| reminder.id == id)
    }

    fn load_from_store(&mut self) {
        self.reminders = match self.repo.get_all() {
            Ok(reminders) => reminders,
            Err(err) => {
                warn!(
                    "event=reminders_load module=service status=recovered error_code=store_read_failed error={}",
                    err
                );
                Vec::new()
            }
        };
    }

    fn arm_all(&mut self) -> usize {
        let reminders = std::mem::take(&mut self.reminders);
        let armed = reminders
            .iter()
            .filter(|reminder| self.arm(reminder))
            .count();
        self.reminders = reminders;
        armed
    }

    /// Arms or disarms the alert for `reminder`. Returns whether it is armed.
    fn arm(&mut self, reminder: &Reminder) -> bool {
        if !reminder.needs_alert() {
            self.scheduler.cancel(&reminder.id);
            return false;
        }
        self.scheduler
            .schedule(
                &reminder.id,
                reminder.alert_title(),
                reminder.description.clone(),
                reminder.datetime,
                self.clock.now(),
            )
            .is_some()
    }
}
