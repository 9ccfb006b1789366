//! Typed directory records.
//!
//! Search results are validated into these at the directory client
//! boundary; nothing past it sees raw attribute maps.

use serde::Serialize;

/// A user account entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryUser {
    pub dn: String,
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl DirectoryUser {
    pub fn new(uid: impl Into<String>) -> Self {
        let uid = uid.into();
        Self {
            dn: format!("uid={}", uid),
            uid,
            display_name: None,
            email: None,
        }
    }
}

/// A group entry with its member uids in directory order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryGroup {
    pub dn: String,
    pub cn: String,
    pub member_uids: Vec<String>,
}

impl DirectoryGroup {
    pub fn new<I, S>(cn: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cn = cn.into();
        Self {
            dn: format!("cn={}", cn),
            cn,
            member_uids: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact, case-sensitive membership test
    pub fn has_member(&self, uid: &str) -> bool {
        self.member_uids.iter().any(|m| m == uid)
    }
}
