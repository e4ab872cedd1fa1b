//! Alert registry: one armed one-shot alert per reminder.
//!
//! # Invariants
//! - At most one alert is armed per reminder id.
//! - `fire_due` removes every alert it reports; fired alerts are never
//!   requeued or retried.
//! - An alert whose target instant is not strictly in the future is never
//!   armed.

use super::notifier::{Notifier, PermissionState};
use crate::model::reminder::ReminderId;
use chrono::NaiveDateTime;
use log::{debug, info};
use std::collections::BTreeMap;

/// Opaque handle for one armed alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlertHandle(u64);

impl AlertHandle {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmedAlert {
    pub handle: AlertHandle,
    pub reminder_id: ReminderId,
    pub fire_at: NaiveDateTime,
    pub title: String,
    pub body: String,
}

/// What happened to an alert when its instant arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Shown,
    /// Permission was not granted at fire time.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredAlert {
    pub alert: ArmedAlert,
    pub delivery: Delivery,
}

/// Deadline registry standing in for platform one-shot timers.
///
/// The owning thread calls `fire_due` whenever it wakes; `next_deadline`
/// tells it how long it may sleep.
#[derive(Debug)]
pub struct AlertScheduler {
    alerts: BTreeMap<ReminderId, ArmedAlert>,
    next_handle: u64,
    sound_enabled: bool,
}

impl Default for AlertScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertScheduler {
    pub fn new() -> Self {
        Self {
            alerts: BTreeMap::new(),
            next_handle: 1,
            sound_enabled: true,
        }
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    /// Arms a one-shot alert for `reminder_id` at `fire_at`.
    ///
    /// Any alert already armed for the id is cancelled first. Returns `None`
    /// without arming when `fire_at <= now`.
    pub fn schedule(
        &mut self,
        reminder_id: &str,
        title: impl Into<String>,
        body: impl Into<String>,
        fire_at: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Option<AlertHandle> {
        self.cancel(reminder_id);

        if fire_at <= now {
            debug!("event=alert_schedule module=scheduler status=skipped reason=not_in_future");
            return None;
        }

        let handle = AlertHandle(self.next_handle);
        self.next_handle += 1;
        self.alerts.insert(
            reminder_id.to_string(),
            ArmedAlert {
                handle,
                reminder_id: reminder_id.to_string(),
                fire_at,
                title: title.into(),
                body: body.into(),
            },
        );
        debug!(
            "event=alert_schedule module=scheduler status=ok handle={} armed={}",
            handle.0,
            self.alerts.len()
        );
        Some(handle)
    }

    /// Disarms the alert for `reminder_id`, returning it when one was armed.
    pub fn cancel(&mut self, reminder_id: &str) -> Option<ArmedAlert> {
        let removed = self.alerts.remove(reminder_id);
        if let Some(alert) = &removed {
            debug!(
                "event=alert_cancel module=scheduler status=ok handle={}",
                alert.handle.0
            );
        }
        removed
    }

    pub fn cancel_all(&mut self) {
        self.alerts.clear();
    }

    pub fn is_armed(&self, reminder_id: &str) -> bool {
        self.alerts.contains_key(reminder_id)
    }

    pub fn armed(&self, reminder_id: &str) -> Option<&ArmedAlert> {
        self.alerts.get(reminder_id)
    }

    pub fn armed_count(&self) -> usize {
        self.alerts.len()
    }

    /// Earliest target instant among armed alerts.
    pub fn next_deadline(&self) -> Option<NaiveDateTime> {
        self.alerts.values().map(|alert| alert.fire_at).min()
    }

    /// Fires every alert whose instant has been reached.
    ///
    /// Permission is checked per alert at fire time; without it the alert is
    /// dropped as `Skipped`. Results are ordered by target instant.
    pub fn fire_due<N: Notifier + ?Sized>(
        &mut self,
        notifier: &N,
        now: NaiveDateTime,
    ) -> Vec<FiredAlert> {
        let due_ids: Vec<ReminderId> = self
            .alerts
            .values()
            .filter(|alert| alert.fire_at <= now)
            .map(|alert| alert.reminder_id.clone())
            .collect();

        let mut due: Vec<ArmedAlert> = due_ids
            .iter()
            .filter_map(|id| self.alerts.remove(id))
            .collect();
        due.sort_by_key(|alert| (alert.fire_at, alert.handle));

        due.into_iter()
            .map(|alert| {
                let delivery = if notifier.permission() == PermissionState::Granted {
                    if self.sound_enabled {
                        notifier.play_sound();
                    }
                    notifier.show(&alert.title, &alert.body);
                    Delivery::Shown
                } else {
                    Delivery::Skipped
                };
                info!(
                    "event=alert_fire module=scheduler status={} handle={}",
                    match delivery {
                        Delivery::Shown => "shown",
                        Delivery::Skipped => "skipped",
                    },
                    alert.handle.0
                );
                FiredAlert { alert, delivery }
            })
            .collect()
    }
}
