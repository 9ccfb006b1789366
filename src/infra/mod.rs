//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Directory (LDAP) client
//! - Database connection, migrations and repositories
//! - Store gateway grouping the repositories

pub mod db;
pub mod directory;
pub mod repositories;
pub mod store;

pub use db::{Database, Migrator};
pub use directory::{Directory, InMemoryDirectory, LdapDirectory};
pub use repositories::{
    GroupRepository, GroupStore, MembershipRepository, MembershipStore, UserRepository, UserStore,
};
pub use store::{Persistence, StoreGateway};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{MockGroupRepository, MockMembershipRepository, MockUserRepository};
