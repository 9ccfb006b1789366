//! In-memory implementation of [`Directory`] backed by fixtures.

use async_trait::async_trait;

use super::{ConnectionHandle, Directory};
use crate::domain::{ConnectParams, DirectoryGroup, DirectoryUser};
use crate::errors::{AppError, AppResult};

/// Directory double holding users and groups in memory.
///
/// Runs the same connection policy as the LDAP client and keeps
/// connect/close counters so callers can assert the connection lifecycle.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: Vec<DirectoryUser>,
    groups: Vec<DirectoryGroup>,
    handle: Option<ConnectionHandle>,
    connects: u64,
    closes: u64,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: DirectoryUser) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_group(mut self, group: DirectoryGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Replace a group's members, adding the group when missing.
    pub fn set_members<I, S>(&mut self, cn: &str, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        match self.groups.iter_mut().find(|g| g.cn == cn) {
            Some(group) => group.member_uids = members,
            None => self.groups.push(DirectoryGroup::new(cn, members)),
        }
    }

    /// Number of connections actually opened
    pub fn connects(&self) -> u64 {
        self.connects
    }

    /// Number of connections released
    pub fn closes(&self) -> u64 {
        self.closes
    }

    fn ensure_connected(&self) -> AppResult<()> {
        if self.handle.is_none() {
            return Err(AppError::NotConnected);
        }
        Ok(())
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn connect(&mut self, params: &ConnectParams) -> AppResult<ConnectionHandle> {
        if let Some(handle) = &self.handle {
            return Ok(handle.clone());
        }

        let plan = params.resolve()?;
        self.connects += 1;
        let handle = ConnectionHandle {
            id: self.connects,
            url: plan.url(),
            protocol: plan.protocol,
            encryption: plan.encryption,
            search_base: params.search_base.clone(),
        };
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    async fn close(&mut self) -> AppResult<()> {
        if self.handle.take().is_some() {
            self.closes += 1;
        }
        Ok(())
    }

    async fn get_users(&mut self) -> AppResult<Vec<DirectoryUser>> {
        self.ensure_connected()?;
        Ok(self.users.clone())
    }

    async fn get_groups(&mut self, username: Option<&str>) -> AppResult<Vec<DirectoryGroup>> {
        self.ensure_connected()?;
        Ok(self
            .groups
            .iter()
            .filter(|group| username.map_or(true, |uid| group.has_member(uid)))
            .cloned()
            .collect())
    }
}
