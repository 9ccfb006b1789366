//! RT group repository.
//!
//! Every query is scoped by domain so groups outside the managed domain
//! (queue roles, system groups) never look like sync candidates.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::entities::group::{self, Entity as GroupEntity};
use super::entities::GroupActiveModel;
use crate::domain::{LocalGroup, NewGroup};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Group repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// All groups tagged with `domain`, ordered by name
    async fn find_by_domain(&self, domain: &str) -> AppResult<Vec<LocalGroup>>;

    /// Group named `name` within `domain`
    async fn find_by_name(&self, name: &str, domain: &str) -> AppResult<Option<LocalGroup>>;

    /// Whether a group named `name` exists within `domain`
    async fn has_group(&self, name: &str, domain: &str) -> AppResult<bool>;

    /// Create a group; failures surface as `GroupCreationFailed`
    async fn create(&self, group: NewGroup) -> AppResult<LocalGroup>;
}

/// Concrete implementation of GroupRepository
pub struct GroupStore {
    db: DatabaseConnection,
}

impl GroupStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GroupRepository for GroupStore {
    async fn find_by_domain(&self, domain: &str) -> AppResult<Vec<LocalGroup>> {
        let models = GroupEntity::find()
            .filter(group::Column::Domain.eq(domain))
            .order_by_asc(group::Column::Name)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(LocalGroup::from).collect())
    }

    async fn find_by_name(&self, name: &str, domain: &str) -> AppResult<Option<LocalGroup>> {
        let result = GroupEntity::find()
            .filter(group::Column::Name.eq(name))
            .filter(group::Column::Domain.eq(domain))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(LocalGroup::from))
    }

    async fn has_group(&self, name: &str, domain: &str) -> AppResult<bool> {
        Ok(self.find_by_name(name, domain).await?.is_some())
    }

    async fn create(&self, group: NewGroup) -> AppResult<LocalGroup> {
        let now = chrono::Utc::now().naive_utc();
        let active_model = GroupActiveModel {
            name: Set(group.name.clone()),
            description: Set(Some(group.description)),
            domain: Set(group.domain),
            group_type: Set(Some(String::new())),
            instance: Set(Some(0)),
            creator: Set(group.creator),
            created: Set(Some(now)),
            last_updated_by: Set(group.creator),
            last_updated: Set(Some(now)),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| AppError::GroupCreationFailed {
                group: group.name,
                reason: e.to_string(),
            })?;

        Ok(LocalGroup::from(model))
    }
}
