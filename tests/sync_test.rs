//! End-to-end sync runs: in-memory directory against an in-memory RT store.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use common::{groups_of, insert_group, insert_managed_group, insert_user, names, store};
use rt_ldap_sync::config::{MANAGED_DOMAIN, QUEUE_ROLE_DOMAIN};
use rt_ldap_sync::domain::{
    ConnectParams, DirectoryGroup, DirectoryUser, LocalGroup, LocalMembership, LocalUser,
    MembershipFilter, Mutation, NewGroup,
};
use rt_ldap_sync::errors::{AppError, AppResult};
use rt_ldap_sync::infra::directory::ConnectionHandle;
use rt_ldap_sync::infra::{
    Directory, GroupRepository, InMemoryDirectory, MembershipRepository, Persistence,
    StoreGateway, UserRepository,
};
use rt_ldap_sync::services::{GroupSync, SyncOptions, SyncService};

fn params() -> ConnectParams {
    ConnectParams::new("ldap.example.org", 636).with_search_base("dc=example,dc=org")
}

fn service(store: &Arc<Persistence>) -> GroupSync<Persistence> {
    GroupSync::new(store.clone(), SyncOptions::default())
}

fn dry_run_service(store: &Arc<Persistence>) -> GroupSync<Persistence> {
    GroupSync::new(
        store.clone(),
        SyncOptions {
            dry_run: true,
            ..Default::default()
        },
    )
}

fn add(user: &str, group: &str) -> Mutation {
    Mutation::AddMembership {
        user: user.into(),
        group: group.into(),
    }
}

fn remove(user: &str, group: &str) -> Mutation {
    Mutation::RemoveMembership {
        user: user.into(),
        group: group.into(),
    }
}

fn create(group: &str) -> Mutation {
    Mutation::CreateGroup {
        group: group.into(),
    }
}

#[tokio::test]
async fn test_creates_missing_group_and_adds_membership() {
    let (db, store) = store().await;
    let user = insert_user(&db, "norangsh").await;
    let dotkom = insert_managed_group(&db, "dotkom").await;
    store.memberships().create(&dotkom, &user, 0).await.unwrap();

    let mut directory = InMemoryDirectory::new()
        .with_user(DirectoryUser::new("norangsh"))
        .with_group(DirectoryGroup::new("dotkom", ["norangsh"]))
        .with_group(DirectoryGroup::new("foobar", ["norangsh"]));

    let report = service(&store)
        .run(&mut directory, &params(), &names(&["dotkom", "foobar"]))
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.mutations, vec![create("foobar"), add("norangsh", "foobar")]);
    assert_eq!(report.groups_created(), 1);
    assert_eq!(report.additions(), 1);
    assert_eq!(report.removals(), 0);
    assert!(store.groups().has_group("foobar", MANAGED_DOMAIN).await.unwrap());
    assert_eq!(groups_of(store.as_ref(), &user).await, names(&["dotkom", "foobar"]));
}

#[tokio::test]
async fn test_adds_and_removes_in_one_run() {
    let (db, store) = store().await;
    let user = insert_user(&db, "norangsh").await;
    for name in ["dotkom", "xdotkom"] {
        let group = insert_managed_group(&db, name).await;
        store.memberships().create(&group, &user, 0).await.unwrap();
    }

    let mut directory = InMemoryDirectory::new()
        .with_group(DirectoryGroup::new("dotkom", ["norangsh"]))
        .with_group(DirectoryGroup::new("trollkom", ["norangsh"]));

    let report = service(&store)
        .run(&mut directory, &params(), &[])
        .await
        .unwrap();

    assert_eq!(
        report.mutations,
        vec![
            create("trollkom"),
            add("norangsh", "trollkom"),
            remove("norangsh", "xdotkom"),
        ]
    );
    assert_eq!(groups_of(store.as_ref(), &user).await, names(&["dotkom", "trollkom"]));
}

#[tokio::test]
async fn test_second_run_changes_nothing() {
    let (db, store) = store().await;
    let user = insert_user(&db, "norangsh").await;
    insert_user(&db, "other").await;

    let mut directory = InMemoryDirectory::new()
        .with_group(DirectoryGroup::new("dotkom", ["norangsh", "other"]))
        .with_group(DirectoryGroup::new("foobar", ["norangsh"]));
    let sync = service(&store);

    let first = sync.run(&mut directory, &params(), &[]).await.unwrap();
    assert_eq!(first.groups_created(), 2);
    assert_eq!(first.additions(), 3);

    let second = sync.run(&mut directory, &params(), &[]).await.unwrap();
    assert!(second.is_success());
    assert!(second.mutations.is_empty());
    assert_eq!(groups_of(store.as_ref(), &user).await, names(&["dotkom", "foobar"]));
}

#[tokio::test]
async fn test_unknown_users_are_skipped() {
    let (db, store) = store().await;
    insert_user(&db, "norangsh").await;

    let mut directory =
        InMemoryDirectory::new().with_group(DirectoryGroup::new("dotkom", ["norangsh", "ghost"]));

    let report = service(&store)
        .run(&mut directory, &params(), &names(&["dotkom"]))
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.skipped_users, names(&["ghost"]));
    assert_eq!(report.mutations, vec![create("dotkom"), add("norangsh", "dotkom")]);
}

#[tokio::test]
async fn test_explicit_groups_limit_removals() {
    let (db, store) = store().await;
    let user = insert_user(&db, "norangsh").await;
    for name in ["dotkom", "xdotkom"] {
        let group = insert_managed_group(&db, name).await;
        store.memberships().create(&group, &user, 0).await.unwrap();
    }

    let mut directory =
        InMemoryDirectory::new().with_group(DirectoryGroup::new("dotkom", ["norangsh"]));

    let report = service(&store)
        .run(&mut directory, &params(), &names(&["dotkom"]))
        .await
        .unwrap();

    assert!(report.mutations.is_empty());
    assert_eq!(groups_of(store.as_ref(), &user).await, names(&["dotkom", "xdotkom"]));
}

#[tokio::test]
async fn test_user_dropped_from_directory_group_is_removed() {
    let (db, store) = store().await;
    let user = insert_user(&db, "norangsh").await;
    let dotkom = insert_managed_group(&db, "dotkom").await;
    store.memberships().create(&dotkom, &user, 0).await.unwrap();

    let mut directory =
        InMemoryDirectory::new().with_group(DirectoryGroup::new("dotkom", Vec::<String>::new()));

    let report = service(&store)
        .run(&mut directory, &params(), &names(&["dotkom"]))
        .await
        .unwrap();

    assert_eq!(report.mutations, vec![remove("norangsh", "dotkom")]);
    assert!(groups_of(store.as_ref(), &user).await.is_empty());
}

#[tokio::test]
async fn test_groups_outside_managed_domain_are_untouched() {
    let (db, store) = store().await;
    let user = insert_user(&db, "norangsh").await;
    let role = insert_group(&db, "dotkom", QUEUE_ROLE_DOMAIN).await;
    store.memberships().create(&role, &user, 0).await.unwrap();

    let mut directory = InMemoryDirectory::new();
    let report = service(&store)
        .run(&mut directory, &params(), &[])
        .await
        .unwrap();

    assert!(report.mutations.is_empty());
    let rows = store
        .memberships()
        .find(MembershipFilter::pair(role.id, user.id))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let (db, store) = store().await;
    let user = insert_user(&db, "norangsh").await;

    let mut directory =
        InMemoryDirectory::new().with_group(DirectoryGroup::new("foobar", ["norangsh"]));

    let report = dry_run_service(&store)
        .run(&mut directory, &params(), &[])
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.mutations, vec![create("foobar"), add("norangsh", "foobar")]);
    assert!(!store.groups().has_group("foobar", MANAGED_DOMAIN).await.unwrap());
    assert!(groups_of(store.as_ref(), &user).await.is_empty());
}

#[tokio::test]
async fn test_connection_is_closed_after_run() {
    let (db, store) = store().await;
    insert_user(&db, "norangsh").await;

    let mut directory =
        InMemoryDirectory::new().with_group(DirectoryGroup::new("dotkom", ["norangsh"]));

    service(&store)
        .run(&mut directory, &params(), &[])
        .await
        .unwrap();

    assert!(!directory.is_connected());
    assert_eq!(directory.connects(), 1);
    assert_eq!(directory.closes(), 1);
}

#[tokio::test]
async fn test_invalid_configuration_aborts_run() {
    let (_db, store) = store().await;
    let mut directory =
        InMemoryDirectory::new().with_group(DirectoryGroup::new("dotkom", ["norangsh"]));

    let err = service(&store)
        .run(&mut directory, &ConnectParams::new("ldap.example.org", 0), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidConfiguration(_)));
    assert!(err.is_fatal());
    assert!(!directory.is_connected());
    assert_eq!(directory.connects(), 0);
    assert!(!store.groups().has_group("dotkom", MANAGED_DOMAIN).await.unwrap());
}

// =============================================================================
// FAILURE HANDLING
// =============================================================================

/// Group repository that cannot create `reject`
struct RejectingGroups {
    inner: Arc<dyn GroupRepository>,
    reject: String,
}

#[async_trait]
impl GroupRepository for RejectingGroups {
    async fn find_by_domain(&self, domain: &str) -> AppResult<Vec<LocalGroup>> {
        self.inner.find_by_domain(domain).await
    }

    async fn find_by_name(&self, name: &str, domain: &str) -> AppResult<Option<LocalGroup>> {
        self.inner.find_by_name(name, domain).await
    }

    async fn has_group(&self, name: &str, domain: &str) -> AppResult<bool> {
        self.inner.has_group(name, domain).await
    }

    async fn create(&self, group: NewGroup) -> AppResult<LocalGroup> {
        if group.name == self.reject {
            return Err(AppError::GroupCreationFailed {
                group: group.name,
                reason: "insert rejected".into(),
            });
        }
        self.inner.create(group).await
    }
}

/// Membership repository that cannot add `member` to `group`
struct RejectingMemberships {
    inner: Arc<dyn MembershipRepository>,
    group: String,
    member: String,
}

#[async_trait]
impl MembershipRepository for RejectingMemberships {
    async fn find(&self, filter: MembershipFilter) -> AppResult<Vec<LocalMembership>> {
        self.inner.find(filter).await
    }

    async fn group_names_for_member(&self, member_id: i32, domain: &str) -> AppResult<Vec<String>> {
        self.inner.group_names_for_member(member_id, domain).await
    }

    async fn members_in_domain(&self, domain: &str) -> AppResult<Vec<(String, String)>> {
        self.inner.members_in_domain(domain).await
    }

    async fn create(
        &self,
        group: &LocalGroup,
        member: &LocalUser,
        creator: i32,
    ) -> AppResult<LocalMembership> {
        if group.name == self.group && member.name == self.member {
            return Err(AppError::MembershipWriteFailed {
                group: group.name.clone(),
                member: member.name.clone(),
                reason: "insert rejected".into(),
            });
        }
        self.inner.create(group, member, creator).await
    }

    async fn delete(&self, group: &LocalGroup, member: &LocalUser) -> AppResult<u64> {
        self.inner.delete(group, member).await
    }
}

/// Gateway over a real store with one repository swapped out
struct FaultyStore {
    inner: Arc<Persistence>,
    groups: Arc<dyn GroupRepository>,
    memberships: Arc<dyn MembershipRepository>,
}

impl FaultyStore {
    fn rejecting_group(inner: &Arc<Persistence>, name: &str) -> Self {
        Self {
            inner: inner.clone(),
            groups: Arc::new(RejectingGroups {
                inner: inner.groups(),
                reject: name.to_string(),
            }),
            memberships: inner.memberships(),
        }
    }

    fn rejecting_membership(inner: &Arc<Persistence>, group: &str, member: &str) -> Self {
        Self {
            inner: inner.clone(),
            groups: inner.groups(),
            memberships: Arc::new(RejectingMemberships {
                inner: inner.memberships(),
                group: group.to_string(),
                member: member.to_string(),
            }),
        }
    }
}

impl StoreGateway for FaultyStore {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.inner.users()
    }

    fn groups(&self) -> Arc<dyn GroupRepository> {
        self.groups.clone()
    }

    fn memberships(&self) -> Arc<dyn MembershipRepository> {
        self.memberships.clone()
    }
}

/// Directory whose per-user group lookups fail once connected
struct FailingLookups {
    inner: InMemoryDirectory,
}

#[async_trait]
impl Directory for FailingLookups {
    async fn connect(&mut self, params: &ConnectParams) -> AppResult<ConnectionHandle> {
        self.inner.connect(params).await
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    async fn close(&mut self) -> AppResult<()> {
        self.inner.close().await
    }

    async fn get_users(&mut self) -> AppResult<Vec<DirectoryUser>> {
        self.inner.get_users().await
    }

    async fn get_groups(&mut self, username: Option<&str>) -> AppResult<Vec<DirectoryGroup>> {
        match username {
            Some(uid) => Err(AppError::directory_operation(format!(
                "group lookup for {} timed out",
                uid
            ))),
            None => self.inner.get_groups(None).await,
        }
    }
}

#[tokio::test]
async fn test_failed_group_creation_skips_its_additions() {
    let (db, persistence) = store().await;
    let user = insert_user(&db, "norangsh").await;
    let store = Arc::new(FaultyStore::rejecting_group(&persistence, "foobar"));

    let mut directory = InMemoryDirectory::new()
        .with_group(DirectoryGroup::new("dotkom", ["norangsh"]))
        .with_group(DirectoryGroup::new("foobar", ["norangsh"]));

    let report = GroupSync::new(store, SyncOptions::default())
        .run(&mut directory, &params(), &[])
        .await
        .unwrap();

    assert_eq!(report.mutations, vec![create("dotkom"), add("norangsh", "dotkom")]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].code, "GROUP_CREATION_FAILED");
    assert_eq!(report.failures[0].subject, "foobar");
    assert_eq!(groups_of(persistence.as_ref(), &user).await, names(&["dotkom"]));
    assert!(matches!(report.into_result(), Err(AppError::SyncIncomplete(1))));
}

#[tokio::test]
async fn test_failed_membership_write_does_not_stop_others() {
    let (db, persistence) = store().await;
    let norangsh = insert_user(&db, "norangsh").await;
    let other = insert_user(&db, "other").await;
    let store = Arc::new(FaultyStore::rejecting_membership(&persistence, "foobar", "norangsh"));

    let mut directory = InMemoryDirectory::new()
        .with_group(DirectoryGroup::new("dotkom", ["norangsh"]))
        .with_group(DirectoryGroup::new("foobar", ["norangsh", "other"]));

    let report = GroupSync::new(store, SyncOptions::default())
        .run(&mut directory, &params(), &[])
        .await
        .unwrap();

    assert_eq!(report.groups_created(), 2);
    assert_eq!(report.additions(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].code, "MEMBERSHIP_WRITE_FAILED");
    assert_eq!(report.failures[0].subject, "add norangsh to foobar");
    assert_eq!(groups_of(persistence.as_ref(), &norangsh).await, names(&["dotkom"]));
    assert_eq!(groups_of(persistence.as_ref(), &other).await, names(&["foobar"]));
    assert!(!directory.is_connected());
    assert!(matches!(report.into_result(), Err(AppError::SyncIncomplete(1))));
}

#[tokio::test]
async fn test_directory_error_after_connect_still_closes() {
    let (db, store) = store().await;
    let user = insert_user(&db, "norangsh").await;

    let mut directory = FailingLookups {
        inner: InMemoryDirectory::new().with_group(DirectoryGroup::new("dotkom", ["norangsh"])),
    };

    let err = service(&store)
        .run(&mut directory, &params(), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DirectoryOperation(_)));
    assert!(err.is_fatal());
    assert!(!directory.inner.is_connected());
    assert_eq!(directory.inner.connects(), 1);
    assert_eq!(directory.inner.closes(), 1);
    assert!(groups_of(store.as_ref(), &user).await.is_empty());
}

#[tokio::test]
async fn test_member_leaving_between_runs_is_removed() {
    let (db, store) = store().await;
    let norangsh = insert_user(&db, "norangsh").await;
    let other = insert_user(&db, "other").await;

    let mut directory =
        InMemoryDirectory::new().with_group(DirectoryGroup::new("dotkom", ["norangsh", "other"]));
    let sync = service(&store);

    sync.run(&mut directory, &params(), &[]).await.unwrap();
    assert_eq!(groups_of(store.as_ref(), &norangsh).await, names(&["dotkom"]));

    directory.set_members("dotkom", ["other"]);
    let second = sync.run(&mut directory, &params(), &[]).await.unwrap();

    assert_eq!(second.mutations, vec![remove("norangsh", "dotkom")]);
    assert!(groups_of(store.as_ref(), &norangsh).await.is_empty());
    assert_eq!(groups_of(store.as_ref(), &other).await, names(&["dotkom"]));
    assert_eq!(directory.connects(), 2);
}
