//! Domain layer - Core business entities and logic
//!
//! Directory records, RT store records, the connection policy and the
//! reconciliation functions. Nothing here performs I/O.

pub mod connection;
pub mod directory;
pub mod group;
pub mod reconcile;

pub use connection::{resolve_connection, ConnectParams, ConnectionPlan, EncryptionMode, Protocol};
pub use directory::{DirectoryGroup, DirectoryUser};
pub use group::{LocalGroup, LocalMembership, LocalUser, MembershipFilter, NewGroup};
pub use reconcile::{
    extra_directory_groups, extra_local_groups, groups_not_listed, MembershipPlan, Mutation,
};
