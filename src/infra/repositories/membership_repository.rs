//! RT group membership repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
};

use super::entities::group_member::{self, Entity as GroupMemberEntity};
use super::entities::{group, user, GroupEntity, GroupMemberActiveModel};
use crate::domain::{LocalGroup, LocalMembership, LocalUser, MembershipFilter};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Membership repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Memberships matching the group and/or member in `filter`
    async fn find(&self, filter: MembershipFilter) -> AppResult<Vec<LocalMembership>>;

    /// Names of the `domain` groups `member_id` belongs to, ordered by name
    async fn group_names_for_member(&self, member_id: i32, domain: &str) -> AppResult<Vec<String>>;

    /// (group name, user name) for every membership in a `domain` group
    async fn members_in_domain(&self, domain: &str) -> AppResult<Vec<(String, String)>>;

    /// Add `member` to `group`; an existing pair fails with `DuplicateMembership`
    async fn create(
        &self,
        group: &LocalGroup,
        member: &LocalUser,
        creator: i32,
    ) -> AppResult<LocalMembership>;

    /// Delete memberships matching (group, member); returns rows removed
    async fn delete(&self, group: &LocalGroup, member: &LocalUser) -> AppResult<u64>;
}

/// Concrete implementation of MembershipRepository
pub struct MembershipStore {
    db: DatabaseConnection,
}

impl MembershipStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[async_trait]
impl MembershipRepository for MembershipStore {
    async fn find(&self, filter: MembershipFilter) -> AppResult<Vec<LocalMembership>> {
        let mut query = GroupMemberEntity::find();
        if let Some(group_id) = filter.group_id {
            query = query.filter(group_member::Column::GroupId.eq(group_id));
        }
        if let Some(member_id) = filter.member_id {
            query = query.filter(group_member::Column::MemberId.eq(member_id));
        }

        let models = query
            .order_by_asc(group_member::Column::Id)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(LocalMembership::from).collect())
    }

    async fn group_names_for_member(&self, member_id: i32, domain: &str) -> AppResult<Vec<String>> {
        let models = GroupEntity::find()
            .inner_join(GroupMemberEntity)
            .filter(group_member::Column::MemberId.eq(member_id))
            .filter(group::Column::Domain.eq(domain))
            .order_by_asc(group::Column::Name)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(|g| g.name).collect())
    }

    async fn members_in_domain(&self, domain: &str) -> AppResult<Vec<(String, String)>> {
        let pairs = GroupMemberEntity::find()
            .select_only()
            .column_as(group::Column::Name, "group_name")
            .column_as(user::Column::Name, "user_name")
            .join(
                sea_orm::JoinType::InnerJoin,
                group_member::Relation::Group.def(),
            )
            .join(
                sea_orm::JoinType::InnerJoin,
                group_member::Relation::Member.def(),
            )
            .filter(group::Column::Domain.eq(domain))
            .order_by_asc(group::Column::Name)
            .order_by_asc(user::Column::Name)
            .into_tuple::<(String, String)>()
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(pairs)
    }

    async fn create(
        &self,
        group: &LocalGroup,
        member: &LocalUser,
        creator: i32,
    ) -> AppResult<LocalMembership> {
        let now = chrono::Utc::now().naive_utc();
        let active_model = GroupMemberActiveModel {
            group_id: Set(group.id),
            member_id: Set(member.id),
            creator: Set(creator),
            created: Set(Some(now)),
            last_updated_by: Set(creator),
            last_updated: Set(Some(now)),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::duplicate_membership(&group.name, &member.name)
            } else {
                AppError::MembershipWriteFailed {
                    group: group.name.clone(),
                    member: member.name.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(LocalMembership::from(model))
    }

    async fn delete(&self, group: &LocalGroup, member: &LocalUser) -> AppResult<u64> {
        let result = GroupMemberEntity::delete_many()
            .filter(group_member::Column::GroupId.eq(group.id))
            .filter(group_member::Column::MemberId.eq(member.id))
            .exec(&self.db)
            .await
            .map_err(|e| AppError::MembershipWriteFailed {
                group: group.name.clone(),
                member: member.name.clone(),
                reason: e.to_string(),
            })?;

        Ok(result.rows_affected)
    }
}
