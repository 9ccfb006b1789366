//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `sync` - Reconcile RT group memberships with the directory
//! - `migrate` - Database migrations
//! - `directory` - Inspect directory users and groups

pub mod args;

pub use args::{Cli, Commands};
