//! Request Tracker users, groups and memberships as seen by the sync.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A persisted RT user. Only read, never provisioned here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalUser {
    pub id: i32,
    pub name: String,
    pub real_name: Option<String>,
    pub email_address: Option<String>,
}

/// A persisted RT group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalGroup {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub domain: String,
    pub group_type: String,
    pub instance: i32,
    pub creator: i32,
    pub created: Option<DateTime<Utc>>,
    pub last_updated_by: i32,
    pub last_updated: Option<DateTime<Utc>>,
}

impl LocalGroup {
    /// Whether the group belongs to the given managed domain
    pub fn is_managed_by(&self, domain: &str) -> bool {
        self.domain == domain
    }
}

/// Input for creating a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub name: String,
    pub description: String,
    pub domain: String,
    pub creator: i32,
}

impl NewGroup {
    pub fn managed(name: impl Into<String>, domain: impl Into<String>, creator: i32) -> Self {
        let name = name.into();
        Self {
            description: format!("Synchronized from directory group {}", name),
            name,
            domain: domain.into(),
            creator,
        }
    }
}

/// A persisted (group, member) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalMembership {
    pub id: i32,
    pub group_id: i32,
    pub member_id: i32,
    pub creator: i32,
    pub created: Option<DateTime<Utc>>,
    pub last_updated_by: i32,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Membership lookup by group and/or member
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MembershipFilter {
    pub group_id: Option<i32>,
    pub member_id: Option<i32>,
}

impl MembershipFilter {
    pub fn group(group_id: i32) -> Self {
        Self {
            group_id: Some(group_id),
            member_id: None,
        }
    }

    pub fn member(member_id: i32) -> Self {
        Self {
            group_id: None,
            member_id: Some(member_id),
        }
    }

    pub fn pair(group_id: i32, member_id: i32) -> Self {
        Self {
            group_id: Some(group_id),
            member_id: Some(member_id),
        }
    }
}
