//! Derived reminder views: filter, order, and date grouping.
//!
//! # Invariants
//! - Pure functions over a reminder slice; no persistence side effects.
//! - Sorting is stable: equal keys keep their input order.

use crate::model::reminder::Reminder;
use chrono::{NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

const FULL_DATE_FORMAT: &str = "%A, %B %-d, %Y";

/// List filter selected by the view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReminderFilter {
    #[default]
    All,
    /// Not completed and due now or later.
    Upcoming,
    Completed,
}

impl ReminderFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Upcoming => "upcoming",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownFilterError> {
        match value.trim() {
            "all" => Ok(Self::All),
            "upcoming" => Ok(Self::Upcoming),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownFilterError(other.to_string())),
        }
    }

    pub fn matches(self, reminder: &Reminder, now: NaiveDateTime) -> bool {
        match self {
            Self::All => true,
            Self::Upcoming => reminder.is_upcoming(now),
            Self::Completed => reminder.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilterError(pub String);

impl Display for UnknownFilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown reminder filter `{}`; expected all|upcoming|completed",
            self.0
        )
    }
}

impl Error for UnknownFilterError {}

/// Returns the reminders matching `filter` at `now`, in input order.
pub fn filter_reminders(
    reminders: &[Reminder],
    filter: ReminderFilter,
    now: NaiveDateTime,
) -> Vec<Reminder> {
    reminders
        .iter()
        .filter(|reminder| filter.matches(reminder, now))
        .cloned()
        .collect()
}

/// Incomplete reminders first, each group ascending by due instant.
pub fn sort_reminders(reminders: &mut [Reminder]) {
    reminders.sort_by(compare_for_display);
}

fn compare_for_display(a: &Reminder, b: &Reminder) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| a.datetime.cmp(&b.datetime))
}

/// Heading kind for a calendar-date group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLabel {
    Today,
    Tomorrow,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGroup {
    pub date: NaiveDate,
    pub label: DateLabel,
    pub reminders: Vec<Reminder>,
}

impl DateGroup {
    /// `"Today"`, `"Tomorrow"`, or the full date such as
    /// `"Sunday, October 18, 2026"`.
    pub fn heading(&self) -> String {
        match self.label {
            DateLabel::Today => "Today".to_string(),
            DateLabel::Tomorrow => "Tomorrow".to_string(),
            DateLabel::Date => self.full_date(),
        }
    }

    pub fn full_date(&self) -> String {
        self.date.format(FULL_DATE_FORMAT).to_string()
    }

    /// Relative label joined to the full date, e.g.
    /// `"Today - Sunday, October 18, 2026"`. Plain dates carry no prefix.
    pub fn full_heading(&self) -> String {
        match self.label {
            DateLabel::Today => format!("Today - {}", self.full_date()),
            DateLabel::Tomorrow => format!("Tomorrow - {}", self.full_date()),
            DateLabel::Date => self.full_date(),
        }
    }
}

/// Buckets reminders by local calendar date.
///
/// Groups appear in the order their first reminder appears in `reminders`,
/// so passing a sorted slice yields display-ready groups.
pub fn group_by_date(reminders: &[Reminder], today: NaiveDate) -> Vec<DateGroup> {
    let tomorrow = today.succ_opt();
    let mut groups: Vec<DateGroup> = Vec::new();

    for reminder in reminders {
        let date = reminder.datetime.date();
        if let Some(group) = groups.iter_mut().find(|group| group.date == date) {
            group.reminders.push(reminder.clone());
            continue;
        }

        let label = if date == today {
            DateLabel::Today
        } else if Some(date) == tomorrow {
            DateLabel::Tomorrow
        } else {
            DateLabel::Date
        };
        groups.push(DateGroup {
            date,
            label,
            reminders: vec![reminder.clone()],
        });
    }

    groups
}
