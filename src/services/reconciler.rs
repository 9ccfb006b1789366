//! Reconciliation service - Diffs directory state against the RT store.
//!
//! Reads snapshots through the store gateway and hands them to the pure
//! functions in [`crate::domain::reconcile`]. Holds no entities between calls.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{reconcile, LocalUser, MembershipPlan};
use crate::errors::AppResult;
use crate::infra::StoreGateway;

/// Reconciliation service trait for dependency injection.
#[async_trait]
pub trait ReconcileService: Send + Sync {
    /// Candidate names with no managed-domain group, sorted and de-duplicated
    async fn find_groups_not_listed(&self, candidates: Option<&[String]>) -> AppResult<Vec<String>>;

    /// Directory groups the user still needs to be added to
    async fn extra_directory_groups(
        &self,
        user: &LocalUser,
        directory_groups: &[String],
    ) -> AppResult<Vec<String>>;

    /// Managed groups the user must be removed from
    async fn extra_local_groups(
        &self,
        user: &LocalUser,
        directory_groups: &[String],
    ) -> AppResult<Vec<String>>;

    /// Additions and removals from a single store snapshot
    async fn plan_for_user(
        &self,
        user: &LocalUser,
        directory_groups: &[String],
    ) -> AppResult<MembershipPlan>;
}

/// Concrete implementation of ReconcileService using the store gateway.
pub struct Reconciler<S: StoreGateway> {
    store: Arc<S>,
    managed_domain: String,
}

impl<S: StoreGateway> Reconciler<S> {
    /// Create new reconciler scoped to `managed_domain`
    pub fn new(store: Arc<S>, managed_domain: impl Into<String>) -> Self {
        Self {
            store,
            managed_domain: managed_domain.into(),
        }
    }

    async fn managed_group_names(&self) -> AppResult<Vec<String>> {
        let groups = self.store.groups().find_by_domain(&self.managed_domain).await?;
        Ok(groups.into_iter().map(|g| g.name).collect())
    }

    async fn local_groups_of(&self, user: &LocalUser) -> AppResult<Vec<String>> {
        self.store
            .memberships()
            .group_names_for_member(user.id, &self.managed_domain)
            .await
    }
}

#[async_trait]
impl<S: StoreGateway> ReconcileService for Reconciler<S> {
    async fn find_groups_not_listed(&self, candidates: Option<&[String]>) -> AppResult<Vec<String>> {
        match candidates {
            None => Ok(Vec::new()),
            Some(names) if names.is_empty() => Ok(Vec::new()),
            Some(names) => {
                let managed = self.managed_group_names().await?;
                Ok(reconcile::groups_not_listed(Some(names), &managed))
            }
        }
    }

    async fn extra_directory_groups(
        &self,
        user: &LocalUser,
        directory_groups: &[String],
    ) -> AppResult<Vec<String>> {
        let local = self.local_groups_of(user).await?;
        Ok(reconcile::extra_directory_groups(&local, directory_groups))
    }

    async fn extra_local_groups(
        &self,
        user: &LocalUser,
        directory_groups: &[String],
    ) -> AppResult<Vec<String>> {
        let local = self.local_groups_of(user).await?;
        Ok(reconcile::extra_local_groups(&local, directory_groups))
    }

    async fn plan_for_user(
        &self,
        user: &LocalUser,
        directory_groups: &[String],
    ) -> AppResult<MembershipPlan> {
        let local = self.local_groups_of(user).await?;
        Ok(MembershipPlan::compute(&user.name, &local, directory_groups))
    }
}
