//! RT user repository. Read-only: users are provisioned elsewhere.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use super::entities::user::{self, Entity as UserEntity};
use crate::domain::LocalUser;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by unique name
    async fn find_by_name(&self, name: &str) -> AppResult<Option<LocalUser>>;

    /// Find every user whose name is in `names`, ordered by name
    async fn find_by_names(&self, names: &[String]) -> AppResult<Vec<LocalUser>>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_name(&self, name: &str) -> AppResult<Option<LocalUser>> {
        let result = UserEntity::find()
            .filter(user::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(LocalUser::from))
    }

    async fn find_by_names(&self, names: &[String]) -> AppResult<Vec<LocalUser>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let models = UserEntity::find()
            .filter(user::Column::Name.is_in(names.iter().cloned()))
            .order_by_asc(user::Column::Name)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(LocalUser::from).collect())
    }
}
