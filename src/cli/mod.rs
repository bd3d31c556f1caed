//! Command-line interface for outbox.

pub mod args;
pub mod commands;
