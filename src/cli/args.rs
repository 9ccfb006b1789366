//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Args, Parser, Subcommand};

/// rt-ldap-sync - Mirror LDAP group membership into Request Tracker
#[derive(Parser, Debug)]
#[command(name = "rt-ldap-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Env file to load settings from
    #[arg(short, long, global = true, env = "CONFIG_PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile RT group memberships with the directory
    Sync(SyncArgs),

    /// Run database migrations
    Migrate(MigrateArgs),

    /// Query the directory without touching RT
    Directory(DirectoryArgs),
}

/// Directory connection overrides shared by commands that connect
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// Directory host
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Directory port
    #[arg(short, long)]
    pub port: Option<u32>,

    /// ldap, ldaps or ldapi
    #[arg(long)]
    pub protocol: Option<String>,

    /// Search base DN
    #[arg(short = 'b', long)]
    pub search_base: Option<String>,
}

/// Arguments for the sync command
#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Directory groups to sync (defaults to SYNC_GROUPS, then every group)
    pub groups: Vec<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Compute and print the changes without writing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
}

/// Arguments for the directory command
#[derive(Parser, Debug)]
pub struct DirectoryArgs {
    #[command(subcommand)]
    pub query: DirectoryQuery,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Directory queries
#[derive(Subcommand, Debug)]
pub enum DirectoryQuery {
    /// List user accounts
    Users,
    /// List groups
    Groups {
        /// Only groups listing this uid as a member
        #[arg(short, long)]
        user: Option<String>,
    },
}
