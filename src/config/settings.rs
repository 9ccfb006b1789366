//! Application settings loaded from environment variables.

use std::env;
use std::path::Path;
use std::time::Duration;

use super::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_DATABASE_URL, DEFAULT_EMAIL_ATTRIBUTE,
    DEFAULT_GROUP_ID_ATTRIBUTE, DEFAULT_GROUP_OBJECT_CLASS, DEFAULT_LDAP_PORT,
    DEFAULT_MEMBER_ATTRIBUTE, DEFAULT_NAME_ATTRIBUTE, DEFAULT_UID_ATTRIBUTE,
    DEFAULT_USER_OBJECT_CLASS, MANAGED_DOMAIN, ROOT_ACCOUNT_ID,
};
use crate::domain::{ConnectParams, Protocol};
use crate::errors::{AppError, AppResult};
use crate::infra::directory::{BindCredentials, DirectorySchema, MemberFormat, SearchScope};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    database_url: String,
    pub directory: DirectorySettings,
    pub sync: SyncSettings,
}

/// Everything needed to reach and query the directory.
#[derive(Debug, Clone)]
pub struct DirectorySettings {
    pub connection: ConnectParams,
    pub bind: Option<BindCredentials>,
    pub schema: DirectorySchema,
    pub connect_timeout: Duration,
}

/// Reconciliation scope and store bookkeeping.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Directory groups to reconcile; empty means every group
    pub groups: Vec<String>,
    pub managed_domain: String,
    pub creator_id: i32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("directory", &self.directory)
            .field("sync", &self.sync)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured when present.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars()
    }

    /// Load configuration from an explicit env file, then the environment.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        dotenvy::from_path(path).map_err(|e| {
            AppError::invalid_configuration(format!(
                "cannot read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_vars()
    }

    fn from_vars() -> AppResult<Self> {
        let protocol = var("LDAP_PROTOCOL")
            .map(|p| p.parse::<Protocol>())
            .transpose()?;

        let bind = var("LDAP_BIND_DN").map(|dn| BindCredentials {
            dn,
            password: var("LDAP_BIND_PASSWORD").unwrap_or_default(),
        });

        let directory = DirectorySettings {
            connection: ConnectParams {
                hostname: var("LDAP_HOST"),
                port: parse_var("LDAP_PORT")?.unwrap_or(DEFAULT_LDAP_PORT),
                search_base: var("LDAP_SEARCH_BASE").unwrap_or_default(),
                protocol,
            },
            bind,
            schema: DirectorySchema {
                user_container: var("LDAP_USER_CONTAINER"),
                group_container: var("LDAP_GROUP_CONTAINER"),
                user_object_class: var_or("LDAP_USER_OBJECT_CLASS", DEFAULT_USER_OBJECT_CLASS),
                group_object_class: var_or("LDAP_GROUP_OBJECT_CLASS", DEFAULT_GROUP_OBJECT_CLASS),
                uid_attribute: var_or("LDAP_UID_ATTRIBUTE", DEFAULT_UID_ATTRIBUTE),
                group_id_attribute: var_or("LDAP_GROUP_ID_ATTRIBUTE", DEFAULT_GROUP_ID_ATTRIBUTE),
                member_attribute: var_or("LDAP_MEMBER_ATTRIBUTE", DEFAULT_MEMBER_ATTRIBUTE),
                name_attribute: var_or("LDAP_NAME_ATTRIBUTE", DEFAULT_NAME_ATTRIBUTE),
                email_attribute: var_or("LDAP_EMAIL_ATTRIBUTE", DEFAULT_EMAIL_ATTRIBUTE),
                extra_user_filter: var("LDAP_USER_FILTER"),
                user_scope: parse_var::<SearchScope>("LDAP_USER_SCOPE")?.unwrap_or_default(),
                group_scope: parse_var::<SearchScope>("LDAP_GROUP_SCOPE")?.unwrap_or_default(),
                member_format: parse_var::<MemberFormat>("LDAP_MEMBER_FORMAT")?.unwrap_or_default(),
            },
            connect_timeout: Duration::from_secs(
                parse_var("LDAP_CONNECT_TIMEOUT_SECS")?.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
        };

        let sync = SyncSettings {
            groups: var("SYNC_GROUPS")
                .map(|groups| split_list(&groups))
                .unwrap_or_default(),
            managed_domain: var_or("SYNC_MANAGED_DOMAIN", MANAGED_DOMAIN),
            creator_id: parse_var("SYNC_CREATOR_ID")?.unwrap_or(ROOT_ACCOUNT_ID),
        };

        Ok(Self {
            database_url: var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            directory,
            sync,
        })
    }

    /// Database connection URL.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Override the database URL (used by tests and the CLI).
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }
}

/// Split a comma separated list, dropping blanks.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|| default.to_string())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> AppResult<Option<T>> {
    var(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| {
                AppError::invalid_configuration(format!("{} has an invalid value: {}", name, raw))
            })
        })
        .transpose()
}
