//! Commands module - CLI command implementations.
//!
//! Each command is implemented in its own module for separation of concerns.

pub mod directory;
pub mod migrate;
pub mod sync;

use crate::cli::args::ConnectionArgs;
use crate::config::Config;
use crate::domain::{ConnectParams, Protocol};
use crate::errors::AppResult;
use crate::infra::LdapDirectory;

/// Layer CLI overrides on top of the configured connection.
pub(crate) fn connect_params(config: &Config, args: &ConnectionArgs) -> AppResult<ConnectParams> {
    let mut params = config.directory.connection.clone();
    if let Some(host) = &args.host {
        params.hostname = Some(host.clone());
    }
    if let Some(port) = args.port {
        params.port = port;
    }
    if let Some(protocol) = &args.protocol {
        params.protocol = Some(protocol.parse::<Protocol>()?);
    }
    if let Some(base) = &args.search_base {
        params.search_base = base.clone();
    }
    Ok(params)
}

/// LDAP client built from the directory settings.
pub(crate) fn ldap_directory(config: &Config) -> LdapDirectory {
    let settings = &config.directory;
    LdapDirectory::new(settings.schema.clone(), settings.bind.clone())
        .with_connect_timeout(settings.connect_timeout)
}
