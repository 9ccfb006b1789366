//! Group sync service - Drives one directory-to-RT reconciliation run.
//!
//! Connect, fetch, diff, apply, disconnect. Directory failures abort the run;
//! store write failures are recorded in the [`SyncReport`] and the run goes on.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::reconciler::{ReconcileService, Reconciler};
use crate::config::{MANAGED_DOMAIN, ROOT_ACCOUNT_ID};
use crate::domain::{ConnectParams, LocalGroup, LocalUser, Mutation, NewGroup};
use crate::errors::{AppError, AppResult};
use crate::infra::{Directory, StoreGateway};

/// Knobs for a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub managed_domain: String,
    pub creator_id: i32,
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            managed_domain: MANAGED_DOMAIN.to_string(),
            creator_id: ROOT_ACCOUNT_ID,
            dry_run: false,
        }
    }
}

/// A per-entity failure that did not abort the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub code: String,
    pub subject: String,
    pub message: String,
}

impl SyncFailure {
    fn new(subject: impl Into<String>, error: &AppError) -> Self {
        Self {
            code: error.code().to_string(),
            subject: subject.into(),
            message: error.to_string(),
        }
    }
}

/// Outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    /// Applied mutations, or planned ones in a dry run
    pub mutations: Vec<Mutation>,
    /// Directory usernames with no RT account
    pub skipped_users: Vec<String>,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn groups_created(&self) -> usize {
        self.count(|m| matches!(m, Mutation::CreateGroup { .. }))
    }

    pub fn additions(&self) -> usize {
        self.count(|m| matches!(m, Mutation::AddMembership { .. }))
    }

    pub fn removals(&self) -> usize {
        self.count(|m| matches!(m, Mutation::RemoveMembership { .. }))
    }

    /// Turn recorded failures into `SyncIncomplete`.
    pub fn into_result(self) -> AppResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AppError::SyncIncomplete(self.failures.len()))
        }
    }

    fn count(&self, pred: impl Fn(&Mutation) -> bool) -> usize {
        self.mutations.iter().filter(|m| pred(m)).count()
    }

    fn record(&mut self, subject: impl Into<String>, error: &AppError) {
        let failure = SyncFailure::new(subject, error);
        warn!(subject = %failure.subject, code = %failure.code, error = %failure.message, "Sync step failed");
        self.failures.push(failure);
    }
}

/// Group sync service trait for dependency injection.
#[async_trait]
pub trait SyncService: Send + Sync {
    /// Reconcile `groups` (every directory group when empty).
    ///
    /// The directory connection is closed on every exit path.
    async fn run(
        &self,
        directory: &mut dyn Directory,
        params: &ConnectParams,
        groups: &[String],
    ) -> AppResult<SyncReport>;
}

/// Concrete implementation of SyncService
pub struct GroupSync<S: StoreGateway> {
    store: Arc<S>,
    reconciler: Reconciler<S>,
    options: SyncOptions,
}

/// Which groups a run touches
struct Scope {
    /// Requested groups that exist in the directory
    directory_groups: BTreeSet<String>,
    /// Groups removals may touch; `None` means every managed group
    removals: Option<BTreeSet<String>>,
    /// Groups whose creation failed this run; additions to them are skipped
    uncreated: BTreeSet<String>,
}

impl Scope {
    fn allows_removal_from(&self, group: &str) -> bool {
        self.removals.as_ref().map_or(true, |set| set.contains(group))
    }
}

impl<S: StoreGateway> GroupSync<S> {
    pub fn new(store: Arc<S>, options: SyncOptions) -> Self {
        let reconciler = Reconciler::new(store.clone(), options.managed_domain.clone());
        Self {
            store,
            reconciler,
            options,
        }
    }

    async fn sync(
        &self,
        directory: &mut dyn Directory,
        params: &ConnectParams,
        requested: &[String],
        report: &mut SyncReport,
    ) -> AppResult<()> {
        let handle = directory.connect(params).await?;
        debug!(id = handle.id, url = %handle.url, "Connected");

        let all_groups = directory.get_groups(None).await?;
        let known: BTreeSet<String> = all_groups.iter().map(|g| g.cn.clone()).collect();

        let mut scope = if requested.is_empty() {
            Scope {
                directory_groups: known,
                removals: None,
                uncreated: BTreeSet::new(),
            }
        } else {
            let wanted: BTreeSet<String> = requested.iter().cloned().collect();
            for name in wanted.difference(&known) {
                warn!(group = %name, "Requested group not found in directory");
            }
            Scope {
                directory_groups: wanted.intersection(&known).cloned().collect(),
                removals: Some(wanted),
                uncreated: BTreeSet::new(),
            }
        };

        let mut candidates: BTreeSet<String> = all_groups
            .iter()
            .filter(|g| scope.directory_groups.contains(&g.cn))
            .flat_map(|g| g.member_uids.iter().cloned())
            .collect();

        let local_members = self
            .store
            .memberships()
            .members_in_domain(&self.options.managed_domain)
            .await?;
        candidates.extend(
            local_members
                .into_iter()
                .filter(|(group, _)| scope.allows_removal_from(group))
                .map(|(_, user)| user),
        );

        info!(
            groups = scope.directory_groups.len(),
            candidates = candidates.len(),
            "Sync scope resolved"
        );

        scope.uncreated = self.create_missing_groups(&scope, report).await?;

        let managed: HashMap<String, LocalGroup> = self
            .store
            .groups()
            .find_by_domain(&self.options.managed_domain)
            .await?
            .into_iter()
            .map(|g| (g.name.clone(), g))
            .collect();

        let names: Vec<String> = candidates.into_iter().collect();
        let users = self.store.users().find_by_names(&names).await?;
        let found: BTreeSet<&str> = users.iter().map(|u| u.name.as_str()).collect();
        for name in names.iter().filter(|n| !found.contains(n.as_str())) {
            info!(user = %name, "No RT account for directory user, skipping");
            report.skipped_users.push(name.clone());
        }

        for user in &users {
            self.sync_user(directory, user, &scope, &managed, report).await?;
        }

        Ok(())
    }

    /// Returns the names that could not be created.
    async fn create_missing_groups(
        &self,
        scope: &Scope,
        report: &mut SyncReport,
    ) -> AppResult<BTreeSet<String>> {
        let candidates: Vec<String> = scope.directory_groups.iter().cloned().collect();
        let missing = self
            .reconciler
            .find_groups_not_listed(Some(candidates.as_slice()))
            .await?;

        let mut failed = BTreeSet::new();
        for name in missing {
            if !self.options.dry_run {
                let new_group = NewGroup::managed(
                    name.as_str(),
                    self.options.managed_domain.as_str(),
                    self.options.creator_id,
                );
                match self.store.groups().create(new_group).await {
                    Ok(_) => info!(group = %name, "Created group"),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        report.record(&name, &e);
                        failed.insert(name);
                        continue;
                    }
                }
            }
            report.mutations.push(Mutation::CreateGroup { group: name });
        }

        Ok(failed)
    }

    /// Fatal errors escape; store errors are recorded against the user.
    async fn sync_user(
        &self,
        directory: &mut dyn Directory,
        user: &LocalUser,
        scope: &Scope,
        managed: &HashMap<String, LocalGroup>,
        report: &mut SyncReport,
    ) -> AppResult<()> {
        let directory_groups: Vec<String> = directory
            .get_groups(Some(&user.name))
            .await?
            .into_iter()
            .map(|g| g.cn)
            .filter(|cn| scope.directory_groups.contains(cn))
            .collect();

        let mut plan = match self.reconciler.plan_for_user(user, &directory_groups).await {
            Ok(plan) => plan,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                report.record(&user.name, &e);
                return Ok(());
            }
        };
        if let Some(removals) = &scope.removals {
            plan = plan.restrict_removals(removals);
        }
        plan.additions.retain(|group| {
            let available = !scope.uncreated.contains(group);
            if !available {
                debug!(user = %user.name, group = %group, "Group was not created, skipping addition");
            }
            available
        });
        if plan.is_empty() {
            debug!(user = %user.name, "Memberships up to date");
            return Ok(());
        }

        for mutation in plan.mutations() {
            if self.options.dry_run {
                report.mutations.push(mutation);
                continue;
            }
            match self.apply(&mutation, user, managed).await {
                Ok(()) => {
                    info!(user = %user.name, change = %mutation, "Applied");
                    report.mutations.push(mutation);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => report.record(mutation.to_string(), &e),
            }
        }

        Ok(())
    }

    async fn apply(
        &self,
        mutation: &Mutation,
        user: &LocalUser,
        managed: &HashMap<String, LocalGroup>,
    ) -> AppResult<()> {
        let memberships = self.store.memberships();
        match mutation {
            Mutation::AddMembership { group, .. } => {
                let group = lookup(managed, group)?;
                memberships
                    .create(group, user, self.options.creator_id)
                    .await?;
            }
            Mutation::RemoveMembership { group, .. } => {
                let group = lookup(managed, group)?;
                memberships.delete(group, user).await?;
            }
            Mutation::CreateGroup { group } => {
                return Err(AppError::internal(format!(
                    "group creation for {} is not a membership change",
                    group
                )));
            }
        }
        Ok(())
    }
}

fn lookup<'a>(managed: &'a HashMap<String, LocalGroup>, name: &str) -> AppResult<&'a LocalGroup> {
    managed
        .get(name)
        .ok_or_else(|| AppError::internal(format!("managed group {} does not exist", name)))
}

#[async_trait]
impl<S: StoreGateway + 'static> SyncService for GroupSync<S> {
    #[instrument(skip_all, fields(groups = groups.len(), dry_run = self.options.dry_run))]
    async fn run(
        &self,
        directory: &mut dyn Directory,
        params: &ConnectParams,
        groups: &[String],
    ) -> AppResult<SyncReport> {
        let mut report = SyncReport {
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        let outcome = self.sync(directory, params, groups, &mut report).await;

        if let Err(e) = directory.close().await {
            warn!(error = %e, "Failed to close directory connection");
        }

        outcome?;
        info!(
            created = report.groups_created(),
            added = report.additions(),
            removed = report.removals(),
            skipped = report.skipped_users.len(),
            failures = report.failures.len(),
            "Sync finished"
        );
        Ok(report)
    }
}
