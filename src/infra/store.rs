//! Store gateway.
//!
//! Centralizes access to the three RT repositories the sync needs. Writes are
//! not wrapped in a transaction; each membership change commits on its own.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::repositories::{
    GroupRepository, GroupStore, MembershipRepository, MembershipStore, UserRepository, UserStore,
};

/// Store gateway trait for dependency injection.
pub trait StoreGateway: Send + Sync {
    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get group repository
    fn groups(&self) -> Arc<dyn GroupRepository>;

    /// Get membership repository
    fn memberships(&self) -> Arc<dyn MembershipRepository>;
}

/// Concrete implementation of StoreGateway over a SeaORM connection
pub struct Persistence {
    user_repo: Arc<UserStore>,
    group_repo: Arc<GroupStore>,
    membership_repo: Arc<MembershipStore>,
}

impl Persistence {
    /// Create new gateway instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            group_repo: Arc::new(GroupStore::new(db.clone())),
            membership_repo: Arc::new(MembershipStore::new(db)),
        }
    }
}

impl StoreGateway for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn groups(&self) -> Arc<dyn GroupRepository> {
        self.group_repo.clone()
    }

    fn memberships(&self) -> Arc<dyn MembershipRepository> {
        self.membership_repo.clone()
    }
}
