//! Reminder store contract and key-value implementation.
//!
//! # Responsibility
//! - Persist the reminder collection as one serialized value.
//! - Recover from unreadable payloads without failing callers.
//!
//! # Invariants
//! - Write paths call `Reminder::validate()` before persisting a record.
//! - `id` stays unique within the stored collection.
//! - A payload that cannot be decoded reads back as an empty collection.
//! - Individual records that cannot be decoded are hidden from reads but
//!   written back verbatim on every save.

use crate::kv::{KeyValueStore, KvError};
use crate::model::reminder::{Reminder, ReminderValidationError};
use log::{debug, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default key holding the serialized reminder collection.
///
/// Matches the key used by the existing web client so its stored data loads
/// unchanged.
pub const DEFAULT_REMINDERS_KEY: &str = "Your-reminders";

pub type RepoResult<T> = Result<T, RepoError>;

/// Reminder store error.
#[derive(Debug)]
pub enum RepoError {
    Validation(ReminderValidationError),
    Kv(KvError),
    Encode(serde_json::Error),
    DuplicateId(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Kv(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode reminders: {err}"),
            Self::DuplicateId(id) => write!(f, "reminder id already exists: {id}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Kv(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::DuplicateId(_) => None,
        }
    }
}

impl From<ReminderValidationError> for RepoError {
    fn from(value: ReminderValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<KvError> for RepoError {
    fn from(value: KvError) -> Self {
        Self::Kv(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Whole-collection reminder store.
///
/// Implementors provide `get_all`/`save_all`; the record-level operations
/// are read-modify-write passes over the full collection. Record-level
/// operations return `true` when the id was present.
pub trait ReminderRepository {
    fn get_all(&self) -> RepoResult<Vec<Reminder>>;
    fn save_all(&self, reminders: &[Reminder]) -> RepoResult<()>;

    fn add(&self, reminder: &Reminder) -> RepoResult<()> {
        reminder.validate()?;
        let mut reminders = self.get_all()?;
        if reminders.iter().any(|existing| existing.id == reminder.id) {
            return Err(RepoError::DuplicateId(reminder.id.clone()));
        }
        reminders.push(reminder.clone());
        self.save_all(&reminders)
    }

    fn update(&self, reminder: &Reminder) -> RepoResult<bool> {
        reminder.validate()?;
        modify_record(self, &reminder.id, |existing| *existing = reminder.clone())
    }

    fn delete(&self, id: &str) -> RepoResult<bool> {
        let mut reminders = self.get_all()?;
        let before = reminders.len();
        reminders.retain(|reminder| reminder.id != id);
        if reminders.len() == before {
            return Ok(false);
        }
        self.save_all(&reminders)?;
        Ok(true)
    }

    fn mark_completed(&self, id: &str) -> RepoResult<bool> {
        modify_record(self, id, |reminder| reminder.completed = true)
    }

    fn mark_notified(&self, id: &str) -> RepoResult<bool> {
        modify_record(self, id, |reminder| reminder.notified = true)
    }
}

/// Applies `change` to the record with `id` and persists the collection when
/// the record actually changed.
fn modify_record<R, F>(repo: &R, id: &str, change: F) -> RepoResult<bool>
where
    R: ReminderRepository + ?Sized,
    F: FnOnce(&mut Reminder),
{
    let mut reminders = repo.get_all()?;
    let Some(target) = reminders.iter_mut().find(|reminder| reminder.id == id) else {
        return Ok(false);
    };

    let before = target.clone();
    change(target);
    if *target != before {
        repo.save_all(&reminders)?;
    }
    Ok(true)
}

/// Reminder store persisted as a JSON array under one key.
pub struct KvReminderRepository<S: KeyValueStore> {
    kv: S,
    key: String,
}

impl<S: KeyValueStore> KvReminderRepository<S> {
    /// Creates a store using `DEFAULT_REMINDERS_KEY`.
    pub fn new(kv: S) -> Self {
        Self::with_key(kv, DEFAULT_REMINDERS_KEY)
    }

    pub fn with_key(kv: S, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }
}

impl<S: KeyValueStore> ReminderRepository for KvReminderRepository<S> {
    fn get_all(&self) -> RepoResult<Vec<Reminder>> {
        let Some(payload) = self.kv.get(&self.key)? else {
            return Ok(Vec::new());
        };
        Ok(decode_collection(&payload))
    }

    /// Writes `reminders`, carrying over any stored record that could not be
    /// decoded. Such records keep their place after the readable record that
    /// preceded them; records whose anchor is gone move to the end.
    fn save_all(&self, reminders: &[Reminder]) -> RepoResult<()> {
        let unreadable = match self.kv.get(&self.key)? {
            Some(payload) => split_collection(&payload)
                .map(|stored| stored.unreadable)
                .unwrap_or_default(),
            None => Vec::new(),
        };
        let kept = unreadable.len();
        let records = merge_records(reminders, unreadable)?;
        let payload = serde_json::to_string(&records)?;
        self.kv.set(&self.key, &payload)?;
        debug!(
            "event=reminders_save module=repo status=ok count={} unreadable_kept={}",
            reminders.len(),
            kept
        );
        Ok(())
    }
}

/// Stored record that failed to decode, kept verbatim.
struct UnreadableRecord {
    /// Id of the nearest readable record before it.
    after: Option<String>,
    value: Value,
}

struct StoredCollection {
    reminders: Vec<Reminder>,
    unreadable: Vec<UnreadableRecord>,
}

/// Splits a stored array into decoded reminders and verbatim leftovers.
///
/// Returns the parse error when the payload is not a JSON array.
fn split_collection(payload: &str) -> Result<StoredCollection, serde_json::Error> {
    let mut stored = StoredCollection {
        reminders: Vec::new(),
        unreadable: Vec::new(),
    };
    if payload.trim().is_empty() {
        return Ok(stored);
    }

    for (index, record) in serde_json::from_str::<Vec<Value>>(payload)?
        .into_iter()
        .enumerate()
    {
        match serde_json::from_value::<Reminder>(record.clone()) {
            Ok(reminder) => stored.reminders.push(reminder),
            Err(err) => {
                debug!(
                    "event=reminders_decode module=repo status=skipped index={} error={}",
                    index, err
                );
                stored.unreadable.push(UnreadableRecord {
                    after: stored.reminders.last().map(|last| last.id.clone()),
                    value: record,
                });
            }
        }
    }
    Ok(stored)
}

/// Decodes a stored collection for reading, skipping anything unreadable.
fn decode_collection(payload: &str) -> Vec<Reminder> {
    match split_collection(payload) {
        Ok(stored) => {
            if !stored.unreadable.is_empty() {
                warn!(
                    "event=reminders_load module=repo status=partial kept={} skipped={}",
                    stored.reminders.len(),
                    stored.unreadable.len()
                );
            }
            stored.reminders
        }
        Err(err) => {
            warn!(
                "event=reminders_load module=repo status=recovered error_code=payload_corrupt error={}",
                err
            );
            Vec::new()
        }
    }
}

fn merge_records(
    reminders: &[Reminder],
    unreadable: Vec<UnreadableRecord>,
) -> RepoResult<Vec<Value>> {
    let mut pending = unreadable;
    let mut records = Vec::with_capacity(reminders.len() + pending.len());

    drain_after(&mut pending, None, &mut records);
    for reminder in reminders {
        records.push(serde_json::to_value(reminder)?);
        drain_after(&mut pending, Some(reminder.id.as_str()), &mut records);
    }
    records.extend(pending.into_iter().map(|record| record.value));
    Ok(records)
}

fn drain_after(
    pending: &mut Vec<UnreadableRecord>,
    anchor: Option<&str>,
    records: &mut Vec<Value>,
) {
    let mut index = 0;
    while index < pending.len() {
        if pending[index].after.as_deref() == anchor {
            records.push(pending.remove(index).value);
        } else {
            index += 1;
        }
    }
}
