//! LDAP implementation of [`Directory`].

use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tracing::{debug, info, instrument, warn};

use super::{
    BindCredentials, ConnectionHandle, Directory, DirectorySchema, MemberFormat, SearchScope,
};
use crate::config::DEFAULT_CONNECT_TIMEOUT_SECS;
use crate::domain::{ConnectParams, DirectoryGroup, DirectoryUser, EncryptionMode};
use crate::errors::{AppError, AppResult};

/// Directory client over a single `ldap3` connection.
pub struct LdapDirectory {
    schema: DirectorySchema,
    bind: Option<BindCredentials>,
    connect_timeout: Duration,
    session: Option<Session>,
    connections_opened: u64,
}

struct Session {
    ldap: Ldap,
    handle: ConnectionHandle,
}

impl LdapDirectory {
    /// Create a disconnected client.
    pub fn new(schema: DirectorySchema, bind: Option<BindCredentials>) -> Self {
        Self {
            schema,
            bind,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            session: None,
            connections_opened: 0,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Run a search and construct the entries.
    async fn search(
        ldap: &mut Ldap,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attrs: Vec<&str>,
    ) -> AppResult<Vec<SearchEntry>> {
        debug!(base = %base, scope = %scope, filter = %filter, "Searching directory");

        let (entries, _) = ldap
            .search(base, ldap_scope(scope), filter, attrs)
            .await?
            .success()
            .map_err(|e| AppError::directory_operation(format!("search failed: {}", e)))?;

        Ok(entries.into_iter().map(SearchEntry::construct).collect())
    }
}

fn ldap_scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::Subtree => Scope::Subtree,
    }
}

/// Convert an account entry. Entries without a uid are dropped.
pub(crate) fn user_from_entry(schema: &DirectorySchema, entry: &SearchEntry) -> Option<DirectoryUser> {
    let Some(uid) = first_value(entry, &schema.uid_attribute) else {
        warn!(dn = %entry.dn, attribute = %schema.uid_attribute, "Skipping user entry without identifier");
        return None;
    };

    Some(DirectoryUser {
        dn: entry.dn.clone(),
        uid,
        display_name: first_value(entry, &schema.name_attribute),
        email: first_value(entry, &schema.email_attribute),
    })
}

/// Convert a group entry. Entries without a group id are dropped.
pub(crate) fn group_from_entry(
    schema: &DirectorySchema,
    entry: &SearchEntry,
) -> Option<DirectoryGroup> {
    let Some(cn) = first_value(entry, &schema.group_id_attribute) else {
        warn!(dn = %entry.dn, attribute = %schema.group_id_attribute, "Skipping group entry without identifier");
        return None;
    };

    let mut member_uids: Vec<String> = Vec::new();
    for value in all_values(entry, &schema.member_attribute) {
        let Some(uid) = schema.member_uid(&value) else {
            debug!(group = %cn, member = %value, "Ignoring member value without a uid");
            continue;
        };
        if !member_uids.contains(&uid) {
            member_uids.push(uid);
        }
    }

    Some(DirectoryGroup {
        dn: entry.dn.clone(),
        cn,
        member_uids,
    })
}

/// Attribute names are case-insensitive in LDAP.
fn all_values(entry: &SearchEntry, name: &str) -> Vec<String> {
    entry
        .attrs
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case(name))
        .flat_map(|(_, values)| values.iter().cloned())
        .collect()
}

fn first_value(entry: &SearchEntry, name: &str) -> Option<String> {
    all_values(entry, name)
        .into_iter()
        .find(|v| !v.trim().is_empty())
}

#[async_trait]
impl Directory for LdapDirectory {
    #[instrument(skip(self, params), fields(host = ?params.hostname, port = params.port))]
    async fn connect(&mut self, params: &ConnectParams) -> AppResult<ConnectionHandle> {
        if let Some(session) = &self.session {
            debug!(id = session.handle.id, "Reusing directory connection");
            return Ok(session.handle.clone());
        }

        let plan = params.resolve()?;
        let url = plan.url();

        debug!(url = %url, protocol = %plan.protocol, encryption = ?plan.encryption, "Connecting to directory");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.connect_timeout)
            .set_starttls(plan.encryption == EncryptionMode::StartTls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url).await?;

        // Spawn the connection driver
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        if let Some(bind) = &self.bind {
            debug!(bind_dn = %bind.dn, "Performing LDAP bind");
            ldap.simple_bind(&bind.dn, &bind.password)
                .await?
                .success()
                .map_err(|e| {
                    AppError::directory_operation(format!("bind as {} failed: {}", bind.dn, e))
                })?;
        }

        self.connections_opened += 1;
        let handle = ConnectionHandle {
            id: self.connections_opened,
            url,
            protocol: plan.protocol,
            encryption: plan.encryption,
            search_base: params.search_base.clone(),
        };

        info!(url = %handle.url, "Directory connection established");
        self.session = Some(Session {
            ldap,
            handle: handle.clone(),
        });

        Ok(handle)
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    async fn close(&mut self) -> AppResult<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        session.ldap.unbind().await?;
        info!(id = session.handle.id, "Directory connection closed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_users(&mut self) -> AppResult<Vec<DirectoryUser>> {
        let session = self.session.as_mut().ok_or(AppError::NotConnected)?;
        let schema = &self.schema;

        let base = schema.user_base(&session.handle.search_base);
        let attrs = vec![
            schema.uid_attribute.as_str(),
            schema.name_attribute.as_str(),
            schema.email_attribute.as_str(),
        ];
        let entries = Self::search(
            &mut session.ldap,
            &base,
            schema.user_scope,
            &schema.user_filter(),
            attrs,
        )
        .await?;

        let users: Vec<DirectoryUser> = entries
            .iter()
            .filter_map(|entry| user_from_entry(schema, entry))
            .collect();

        info!(found = entries.len(), returned = users.len(), "Directory user search completed");
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn get_groups(&mut self, username: Option<&str>) -> AppResult<Vec<DirectoryGroup>> {
        let session = self.session.as_mut().ok_or(AppError::NotConnected)?;
        let schema = &self.schema;

        let base = schema.group_base(&session.handle.search_base);
        let attrs = vec![
            schema.group_id_attribute.as_str(),
            schema.member_attribute.as_str(),
        ];
        let filter = schema.group_filter(username);
        let entries =
            Self::search(&mut session.ldap, &base, schema.group_scope, &filter, attrs).await?;

        let groups: Vec<DirectoryGroup> = entries
            .iter()
            .filter_map(|entry| group_from_entry(schema, entry))
            .filter(|group| match (username, schema.member_format) {
                (Some(uid), MemberFormat::Dn) => group.has_member(uid),
                _ => true,
            })
            .collect();

        debug!(found = entries.len(), returned = groups.len(), "Directory group search completed");
        Ok(groups)
    }
}

impl std::fmt::Debug for LdapDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapDirectory")
            .field("schema", &self.schema)
            .field("bind", &self.bind)
            .field("connected", &self.is_connected())
            .finish()
    }
}
