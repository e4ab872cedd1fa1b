//! Reminder domain model.
//!
//! # Responsibility
//! - Define the canonical reminder record persisted by the store.
//! - Provide lifecycle predicates shared by scheduling and derived views.
//!
//! # Invariants
//! - `id` is assigned once at creation and never reused for another reminder.
//! - `title` is non-empty after trimming whitespace.
//! - `completed` only moves from `false` to `true`.
//! - `notified` is reset whenever `datetime` is edited.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a reminder.
///
/// Fresh ids are UUID v4 strings; records loaded from older payloads may
/// carry any non-empty string.
pub type ReminderId = String;

/// Prefix used for platform alert titles.
const ALERT_TITLE_PREFIX: &str = "Reminder: ";

/// Canonical reminder record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Due instant on the local wall clock.
    #[serde(with = "datetime_format")]
    pub datetime: NaiveDateTime,
    #[serde(default)]
    pub completed: bool,
    /// Set once an alert was attempted for the current `datetime`.
    #[serde(default)]
    pub notified: bool,
}

/// Validation errors for reminder invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderValidationError {
    EmptyTitle,
}

impl Display for ReminderValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "reminder title must not be empty"),
        }
    }
}

impl Error for ReminderValidationError {}

impl Reminder {
    /// Creates a new pending reminder with a generated id.
    ///
    /// Inputs are stored as given; callers trim before constructing.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        datetime: NaiveDateTime,
    ) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), title, description, datetime)
    }

    /// Creates a pending reminder with a caller-provided id.
    pub fn with_id(
        id: impl Into<ReminderId>,
        title: impl Into<String>,
        description: impl Into<String>,
        datetime: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            datetime,
            completed: false,
            notified: false,
        }
    }

    /// Checks record invariants that must hold before persistence.
    pub fn validate(&self) -> Result<(), ReminderValidationError> {
        validate_title(&self.title)
    }

    /// Returns whether the due instant has been reached.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.datetime <= now
    }

    /// Incomplete and strictly past its due instant.
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        !self.completed && self.datetime < now
    }

    /// Incomplete and not yet past its due instant.
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        !self.completed && self.datetime >= now
    }

    /// Returns whether this reminder is still eligible for an alert.
    pub fn needs_alert(&self) -> bool {
        !self.completed && !self.notified
    }

    /// Title shown by the platform alert.
    pub fn alert_title(&self) -> String {
        format!("{ALERT_TITLE_PREFIX}{}", self.title)
    }
}

/// Validates a raw title input.
pub fn validate_title(title: &str) -> Result<(), ReminderValidationError> {
    if title.trim().is_empty() {
        return Err(ReminderValidationError::EmptyTitle);
    }
    Ok(())
}

/// Wire format for `datetime`.
///
/// Writes `YYYY-MM-DDTHH:MM:SS[.fraction]`. Reads that shape, the shorter
/// minute-precision form produced by `datetime-local` inputs, and RFC 3339
/// timestamps (converted to local wall-clock time).
pub mod datetime_format {
    use chrono::{DateTime, Local, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
    const READ_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("unsupported datetime value `{raw}`"))
        })
    }

    /// Formats a wall-clock instant in the persisted shape.
    pub fn format(value: &NaiveDateTime) -> String {
        value.format(WRITE_FORMAT).to_string()
    }

    /// Parses any accepted persisted shape.
    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let trimmed = raw.trim();
        for pattern in READ_FORMATS {
            if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, pattern) {
                return Some(value);
            }
        }
        DateTime::parse_from_rfc3339(trimmed)
            .ok()
            .map(|value| value.with_timezone(&Local).naive_local())
    }
}
