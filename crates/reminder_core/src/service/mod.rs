//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, scheduler and clock into lifecycle operations.
//! - Provide pure derived views for the external view layer.

pub mod reminder_controller;
pub mod views;
