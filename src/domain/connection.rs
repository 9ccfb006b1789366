//! Directory connection policy.
//!
//! Pure decision logic that picks the protocol and encryption mode for a
//! directory connection from the configured host, port and protocol.

use std::fmt;
use std::str::FromStr;

use crate::config::{LDAPS_PORT, MAX_PORT};
use crate::errors::{AppError, AppResult};

/// Directory transport protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Plain LDAP, upgraded with STARTTLS
    Ldap,
    /// LDAP over TLS
    Ldaps,
    /// LDAP over a local IPC socket
    Ldapi,
}

impl Protocol {
    /// URL scheme for this protocol
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Ldap => "ldap",
            Protocol::Ldaps => "ldaps",
            Protocol::Ldapi => "ldapi",
        }
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Protocol::Ldaps
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl FromStr for Protocol {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ldap" => Ok(Protocol::Ldap),
            "ldaps" => Ok(Protocol::Ldaps),
            "ldapi" => Ok(Protocol::Ldapi),
            other => Err(AppError::invalid_configuration(format!(
                "unsupported directory protocol: {}",
                other
            ))),
        }
    }
}

/// How the connection is encrypted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionMode {
    /// Local transport, nothing to encrypt
    None,
    /// TLS negotiated when the socket is opened
    Transport,
    /// Plain connect followed by a STARTTLS upgrade
    StartTls,
}

impl From<Protocol> for EncryptionMode {
    fn from(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Ldapi => EncryptionMode::None,
            Protocol::Ldaps => EncryptionMode::Transport,
            _ => EncryptionMode::StartTls,
        }
    }
}

/// Inputs of a connection attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectParams {
    pub hostname: Option<String>,
    pub port: u32,
    pub search_base: String,
    pub protocol: Option<Protocol>,
}

impl ConnectParams {
    pub fn new(hostname: impl Into<String>, port: u32) -> Self {
        Self {
            hostname: Some(hostname.into()),
            port,
            ..Default::default()
        }
    }

    pub fn with_search_base(mut self, base: impl Into<String>) -> Self {
        self.search_base = base.into();
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Run the connection policy over these parameters.
    pub fn resolve(&self) -> AppResult<ConnectionPlan> {
        resolve_connection(self.hostname.as_deref(), self.port, self.protocol)
    }
}

/// Outcome of the connection policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPlan {
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
    pub encryption: EncryptionMode,
}

impl ConnectionPlan {
    /// URL handed to the LDAP transport.
    ///
    /// For `ldapi` the host is a socket path and is percent-encoded.
    pub fn url(&self) -> String {
        match self.protocol {
            Protocol::Ldapi => format!("ldapi://{}", encode_socket_path(&self.host)),
            protocol => format!("{}://{}:{}", protocol.scheme(), self.host, self.port),
        }
    }
}

/// Select protocol and encryption for a connection.
///
/// Port 636 always means `ldaps`; otherwise the requested protocol wins,
/// defaulting to `ldaps`.
pub fn resolve_connection(
    hostname: Option<&str>,
    port: u32,
    requested: Option<Protocol>,
) -> AppResult<ConnectionPlan> {
    let host = hostname
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AppError::invalid_configuration("directory hostname is required"))?;

    if port == 0 || port > MAX_PORT {
        return Err(AppError::invalid_configuration(format!(
            "directory port {} is outside 1-{}",
            port, MAX_PORT
        )));
    }
    let valid_port = u16::try_from(port)
        .map_err(|_| AppError::invalid_configuration(format!("invalid port {}", port)))?;

    let protocol = if port == LDAPS_PORT {
        Protocol::Ldaps
    } else {
        requested.unwrap_or_default()
    };

    Ok(ConnectionPlan {
        host: host.to_string(),
        port: valid_port,
        protocol,
        encryption: EncryptionMode::from(protocol),
    })
}

fn encode_socket_path(path: &str) -> String {
    path.replace('%', "%25").replace('/', "%2F")
}
