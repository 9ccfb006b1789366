//! Directory command - Read-only directory queries.

use serde::Serialize;

use crate::cli::args::{DirectoryArgs, DirectoryQuery};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Directory;

/// Execute the directory command
pub async fn execute(args: DirectoryArgs, config: Config) -> AppResult<()> {
    let params = super::connect_params(&config, &args.connection)?;
    let mut directory = super::ldap_directory(&config);

    directory.connect(&params).await?;
    let outcome = query(&mut directory, &args.query, args.json).await;
    if let Err(e) = directory.close().await {
        tracing::warn!(error = %e, "Failed to close directory connection");
    }
    outcome
}

async fn query(directory: &mut dyn Directory, query: &DirectoryQuery, json: bool) -> AppResult<()> {
    match query {
        DirectoryQuery::Users => {
            let users = directory.get_users().await?;
            if json {
                return print_json(&users);
            }
            for user in users {
                match user.email {
                    Some(email) => println!("{} <{}>", user.uid, email),
                    None => println!("{}", user.uid),
                }
            }
        }
        DirectoryQuery::Groups { user } => {
            let groups = directory.get_groups(user.as_deref()).await?;
            if json {
                return print_json(&groups);
            }
            for group in groups {
                println!("{}: {}", group.cn, group.member_uids.join(", "));
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::internal(format!("Failed to render JSON: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}
