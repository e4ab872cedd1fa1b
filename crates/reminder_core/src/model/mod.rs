//! Domain model for reminder records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every reminder is identified by a stable `ReminderId`.
//! - Deletion removes the record; there are no tombstones.

pub mod reminder;
