//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the whole-collection reminder store contract.
//! - Isolate payload encoding details from lifecycle orchestration.
//!
//! # Invariants
//! - Every mutation is one read-modify-write of the full collection.
//! - Unknown ids are no-ops, not errors.

pub mod reminder_repo;
