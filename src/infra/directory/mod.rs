//! Directory client capability.
//!
//! The sync depends only on the [`Directory`] trait. [`LdapDirectory`] talks
//! to a real server; [`InMemoryDirectory`] serves fixtures for tests and
//! dry runs against canned data.

mod ldap;
mod memory;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::domain::{ConnectParams, DirectoryGroup, DirectoryUser, EncryptionMode, Protocol};
use crate::errors::{AppError, AppResult};

pub use ldap::LdapDirectory;
pub use memory::InMemoryDirectory;

/// Directory queries the sync needs.
///
/// Implementations hold at most one connection. `connect` on a connected
/// client returns the existing handle; queries without a connection fail
/// with `NotConnected`.
#[async_trait]
pub trait Directory: Send {
    /// Open (or reuse) the connection and bind.
    async fn connect(&mut self, params: &ConnectParams) -> AppResult<ConnectionHandle>;

    /// Whether a connection is held
    fn is_connected(&self) -> bool;

    /// Release the connection. No-op when not connected.
    async fn close(&mut self) -> AppResult<()>;

    /// Every account entry under the user search base
    async fn get_users(&mut self) -> AppResult<Vec<DirectoryUser>>;

    /// Every group under the group search base, or only those listing `username`
    async fn get_groups(&mut self, username: Option<&str>) -> AppResult<Vec<DirectoryGroup>>;
}

/// Identifies an open directory connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionHandle {
    pub id: u64,
    pub url: String,
    pub protocol: Protocol,
    pub encryption: EncryptionMode,
    pub search_base: String,
}

/// Credentials for a simple bind. Anonymous when absent.
#[derive(Clone, PartialEq, Eq)]
pub struct BindCredentials {
    pub dn: String,
    pub password: String,
}

impl std::fmt::Debug for BindCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindCredentials")
            .field("dn", &self.dn)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// How far below its base a search reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchScope {
    /// Direct children of the base only
    OneLevel,
    #[default]
    Subtree,
}

impl FromStr for SearchScope {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sub" | "subtree" => Ok(SearchScope::Subtree),
            "one" | "onelevel" | "one-level" => Ok(SearchScope::OneLevel),
            other => Err(AppError::invalid_configuration(format!(
                "unknown search scope: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchScope::OneLevel => write!(f, "one"),
            SearchScope::Subtree => write!(f, "sub"),
        }
    }
}

/// What the member attribute of a group holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemberFormat {
    /// Bare user identifiers (`memberUid: norangsh`)
    #[default]
    Uid,
    /// Full user DNs (`member: uid=norangsh,ou=people,...`)
    Dn,
}

impl FromStr for MemberFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uid" => Ok(MemberFormat::Uid),
            "dn" => Ok(MemberFormat::Dn),
            other => Err(AppError::invalid_configuration(format!(
                "unknown member format: {}",
                other
            ))),
        }
    }
}

/// Object classes, attribute names and containers used for searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySchema {
    /// User container relative to the search base (e.g. "ou=people")
    pub user_container: Option<String>,
    /// Group container relative to the search base (e.g. "ou=groups")
    pub group_container: Option<String>,
    pub user_object_class: String,
    pub group_object_class: String,
    pub uid_attribute: String,
    pub group_id_attribute: String,
    pub member_attribute: String,
    pub name_attribute: String,
    pub email_attribute: String,
    /// Extra filter ANDed with the user object class (e.g. "(!(loginShell=/bin/false))")
    pub extra_user_filter: Option<String>,
    pub user_scope: SearchScope,
    pub group_scope: SearchScope,
    pub member_format: MemberFormat,
}

impl Default for DirectorySchema {
    fn default() -> Self {
        use crate::config::{
            DEFAULT_EMAIL_ATTRIBUTE, DEFAULT_GROUP_ID_ATTRIBUTE, DEFAULT_GROUP_OBJECT_CLASS,
            DEFAULT_MEMBER_ATTRIBUTE, DEFAULT_NAME_ATTRIBUTE, DEFAULT_UID_ATTRIBUTE,
            DEFAULT_USER_OBJECT_CLASS,
        };

        Self {
            user_container: None,
            group_container: None,
            user_object_class: DEFAULT_USER_OBJECT_CLASS.to_string(),
            group_object_class: DEFAULT_GROUP_OBJECT_CLASS.to_string(),
            uid_attribute: DEFAULT_UID_ATTRIBUTE.to_string(),
            group_id_attribute: DEFAULT_GROUP_ID_ATTRIBUTE.to_string(),
            member_attribute: DEFAULT_MEMBER_ATTRIBUTE.to_string(),
            name_attribute: DEFAULT_NAME_ATTRIBUTE.to_string(),
            email_attribute: DEFAULT_EMAIL_ATTRIBUTE.to_string(),
            extra_user_filter: None,
            user_scope: SearchScope::default(),
            group_scope: SearchScope::default(),
            member_format: MemberFormat::default(),
        }
    }
}

impl DirectorySchema {
    /// Full DN searched for users.
    pub fn user_base(&self, search_base: &str) -> String {
        join_dn(self.user_container.as_deref(), search_base)
    }

    /// Full DN searched for groups.
    pub fn group_base(&self, search_base: &str) -> String {
        join_dn(self.group_container.as_deref(), search_base)
    }

    /// Filter matching account entries.
    pub fn user_filter(&self) -> String {
        let class = format!("(objectClass={})", self.user_object_class);
        let extra = self
            .extra_user_filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty());

        match extra {
            Some(extra) if extra.starts_with('(') => format!("(&{}{})", class, extra),
            Some(extra) => format!("(&{}({}))", class, extra),
            None => class,
        }
    }

    /// Filter matching groups, optionally only those listing `username`.
    ///
    /// DN-valued member attributes cannot be matched by uid on the server,
    /// so with [`MemberFormat::Dn`] the caller filters the results itself.
    pub fn group_filter(&self, username: Option<&str>) -> String {
        match username {
            Some(name) if self.member_format == MemberFormat::Uid => format!(
                "(&(objectClass={})({}={}))",
                self.group_object_class,
                self.member_attribute,
                escape_filter_value(name)
            ),
            _ => format!("(objectClass={})", self.group_object_class),
        }
    }

    /// Reduce a member attribute value to a user id.
    ///
    /// DN values yield the value of their leading RDN when its attribute is
    /// the uid attribute; anything else is `None`.
    pub fn member_uid(&self, value: &str) -> Option<String> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        match self.member_format {
            MemberFormat::Uid => Some(value.to_string()),
            MemberFormat::Dn => {
                let (attribute, raw) = leading_rdn(value).split_once('=')?;
                if !attribute.trim().eq_ignore_ascii_case(&self.uid_attribute) {
                    return None;
                }
                unescape_dn_value(raw.trim()).filter(|uid| !uid.is_empty())
            }
        }
    }
}

/// First attribute-value assertion of a DN, up to the first unescaped `,` or `+`.
fn leading_rdn(dn: &str) -> &str {
    let mut escaped = false;
    for (i, c) in dn.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ',' | '+' => return &dn[..i],
            _ => {}
        }
    }
    dn
}

/// Undo RFC 4514 escaping: `\,` style and `\2c` hex pairs.
fn unescape_dn_value(raw: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        let first = chars.next()?;
        match (first.to_digit(16), chars.peek().and_then(|c| c.to_digit(16))) {
            (Some(high), Some(low)) => {
                chars.next();
                bytes.push((high * 16 + low) as u8);
            }
            _ => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(first.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    String::from_utf8(bytes).ok()
}

fn join_dn(container: Option<&str>, base: &str) -> String {
    match container {
        Some(container) if base.is_empty() => container.to_string(),
        Some(container) => format!("{},{}", container, base),
        None => base.to_string(),
    }
}

/// Escape special characters in LDAP filter values (RFC 4515).
pub fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}
