//! Platform alert capability.

use log::info;
use std::cell::Cell;

/// Host permission state for showing alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// Not decided yet; the host may still ask the user.
    Prompt,
}

impl PermissionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Prompt => "prompt",
        }
    }
}

/// Opaque platform notifier.
///
/// `show` is fire-and-forget and only called while permission is granted.
pub trait Notifier {
    fn permission(&self) -> PermissionState;
    fn prompt_permission(&self) -> PermissionState;
    fn show(&self, title: &str, body: &str);
    fn play_sound(&self) {}
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn permission(&self) -> PermissionState {
        (**self).permission()
    }

    fn prompt_permission(&self) -> PermissionState {
        (**self).prompt_permission()
    }

    fn show(&self, title: &str, body: &str) {
        (**self).show(title, body)
    }

    fn play_sound(&self) {
        (**self).play_sound()
    }
}

/// Asks for alert permission only when the host has not decided yet.
///
/// Returns whether alerts are currently permitted. Safe to call repeatedly.
pub fn request_permission<N: Notifier + ?Sized>(notifier: &N) -> bool {
    let state = match notifier.permission() {
        PermissionState::Prompt => notifier.prompt_permission(),
        decided => decided,
    };
    info!(
        "event=notify_permission module=scheduler status=ok permission={}",
        state.as_str()
    );
    state == PermissionState::Granted
}

/// Notifier that records alerts in the log instead of a platform surface.
///
/// Permission is always granted. Titles are user content, so only their
/// length is logged.
#[derive(Debug, Default)]
pub struct LogNotifier {
    shown: Cell<usize>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown_count(&self) -> usize {
        self.shown.get()
    }
}

impl Notifier for LogNotifier {
    fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn prompt_permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn show(&self, title: &str, body: &str) {
        self.shown.set(self.shown.get() + 1);
        info!(
            "event=alert_show module=scheduler status=ok title_len={} body_len={}",
            title.chars().count(),
            body.chars().count()
        );
    }
}
