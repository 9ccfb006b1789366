//! rt-ldap-sync - Mirror LDAP group membership into Request Tracker
//!
//! Reads groups and their members from a directory server and makes the
//! `UserDefined` groups of an RT database match: missing groups are created,
//! memberships the directory reports are added, and memberships it no longer
//! reports are removed.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Directory and RT records, connection policy, set-difference logic
//! - **services**: Reconciliation and the sync run
//! - **infra**: Directory client, database, repositories
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Sync two groups, printing what would change
//! cargo run -- sync dotkom foobar --dry-run
//!
//! # Sync every directory group
//! cargo run -- sync
//!
//! # Create the RT tables in an empty database
//! cargo run -- migrate up
//!
//! # List the directory groups a user belongs to
//! cargo run -- directory groups --user norangsh
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;

// Re-export commonly used types at crate root
pub use config::Config;
pub use domain::{DirectoryGroup, DirectoryUser, LocalGroup, LocalUser, MembershipPlan, Mutation};
pub use errors::{AppError, AppResult};
pub use services::{GroupSync, SyncOptions, SyncReport, SyncService};
