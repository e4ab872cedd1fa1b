//! Notification scheduling.
//!
//! # Responsibility
//! - Wrap the platform permission/alert capability behind `Notifier`.
//! - Keep one armed alert per reminder in an explicit registry.
//! - Drive alert firing from a single thread of control via `Ticker`.
//!
//! # Invariants
//! - Armed alerts live only in process memory; nothing here is persisted.
//! - An alert never fires before its target instant.
//! - Arming an id cancels any alert previously armed for that id.

pub mod notifier;
pub mod registry;
pub mod ticker;
