//! Sync command - Reconcile RT group memberships with the directory.

use std::sync::Arc;

use crate::cli::args::SyncArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Database, Persistence};
use crate::services::{GroupSync, SyncOptions, SyncReport, SyncService};

/// Execute the sync command
pub async fn execute(args: SyncArgs, config: Config) -> AppResult<()> {
    let params = super::connect_params(&config, &args.connection)?;
    let groups = if args.groups.is_empty() {
        config.sync.groups.clone()
    } else {
        args.groups
    };

    if groups.is_empty() {
        tracing::info!("No groups requested, syncing every directory group");
    } else {
        tracing::info!(groups = ?groups, "Syncing requested groups");
    }

    let db = Database::connect_without_migrations(config.database_url()).await?;
    let store = Arc::new(Persistence::new(db.get_connection()));
    let service = GroupSync::new(
        store,
        SyncOptions {
            managed_domain: config.sync.managed_domain.clone(),
            creator_id: config.sync.creator_id,
            dry_run: args.dry_run,
        },
    );

    let mut directory = super::ldap_directory(&config);
    let report = service.run(&mut directory, &params, &groups).await?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| AppError::internal(format!("Failed to render report: {}", e)))?;
        println!("{}", rendered);
    } else {
        print_report(&report);
    }

    report.into_result().map(|_| ())
}

fn print_report(report: &SyncReport) {
    let prefix = if report.dry_run { "would " } else { "" };
    for mutation in &report.mutations {
        println!("{}{}", prefix, mutation);
    }
    for user in &report.skipped_users {
        println!("skipped {} (no RT account)", user);
    }
    for failure in &report.failures {
        println!("failed {}: {}", failure.subject, failure.message);
    }
    println!(
        "{} group(s) created, {} membership(s) added, {} removed, {} user(s) skipped, {} failure(s)",
        report.groups_created(),
        report.additions(),
        report.removals(),
        report.skipped_users.len(),
        report.failures.len()
    );
}
