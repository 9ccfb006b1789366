//! Repository tests against the migrated schema on in-memory SQLite.

mod common;

use pretty_assertions::assert_eq;

use common::{insert_group, insert_managed_group, insert_user, names, store};
use rt_ldap_sync::config::{MANAGED_DOMAIN, QUEUE_ROLE_DOMAIN};
use rt_ldap_sync::domain::{MembershipFilter, NewGroup};
use rt_ldap_sync::errors::AppError;
use rt_ldap_sync::infra::StoreGateway;

#[tokio::test]
async fn test_has_group_is_scoped_to_domain() {
    let (db, store) = store().await;
    insert_group(&db, "dotkom", QUEUE_ROLE_DOMAIN).await;

    let groups = store.groups();
    assert!(!groups.has_group("dotkom", MANAGED_DOMAIN).await.unwrap());
    assert!(groups.has_group("dotkom", QUEUE_ROLE_DOMAIN).await.unwrap());

    insert_managed_group(&db, "dotkom").await;
    assert!(groups.has_group("dotkom", MANAGED_DOMAIN).await.unwrap());
    assert_eq!(groups.find_by_domain(MANAGED_DOMAIN).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_group_sets_managed_fields() {
    let (_db, store) = store().await;

    let group = store
        .groups()
        .create(NewGroup::managed("foobar", MANAGED_DOMAIN, 0))
        .await
        .unwrap();

    assert_eq!(group.name, "foobar");
    assert_eq!(group.domain, MANAGED_DOMAIN);
    assert_eq!(group.instance, 0);
    assert!(group.is_managed_by(MANAGED_DOMAIN));

    let found = store
        .groups()
        .find_by_name("foobar", MANAGED_DOMAIN)
        .await
        .unwrap();
    assert_eq!(found, Some(group));
}

#[tokio::test]
async fn test_find_users_by_names() {
    let (db, store) = store().await;
    insert_user(&db, "norangsh").await;
    insert_user(&db, "other").await;

    let users = store
        .users()
        .find_by_names(&names(&["other", "norangsh", "ghost"]))
        .await
        .unwrap();
    let found: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(found, vec!["norangsh", "other"]);

    assert!(store.users().find_by_names(&[]).await.unwrap().is_empty());
    assert!(store.users().find_by_name("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_membership_is_rejected() {
    let (db, store) = store().await;
    let user = insert_user(&db, "norangsh").await;
    let group = insert_managed_group(&db, "dotkom").await;

    store.memberships().create(&group, &user, 0).await.unwrap();
    let err = store
        .memberships()
        .create(&group, &user, 0)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::DuplicateMembership { ref group, ref member } if group == "dotkom" && member == "norangsh"
    ));
    let rows = store
        .memberships()
        .find(MembershipFilter::pair(group.id, user.id))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_delete_membership_by_pair() {
    let (db, store) = store().await;
    let user = insert_user(&db, "norangsh").await;
    let other = insert_user(&db, "other").await;
    let group = insert_managed_group(&db, "dotkom").await;

    store.memberships().create(&group, &user, 0).await.unwrap();
    store.memberships().create(&group, &other, 0).await.unwrap();

    let removed = store.memberships().delete(&group, &user).await.unwrap();
    assert_eq!(removed, 1);

    let remaining = store
        .memberships()
        .find(MembershipFilter::group(group.id))
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].member_id, other.id);

    assert_eq!(store.memberships().delete(&group, &user).await.unwrap(), 0);
}

#[tokio::test]
async fn test_membership_queries_ignore_other_domains() {
    let (db, store) = store().await;
    let user = insert_user(&db, "norangsh").await;
    let managed = insert_managed_group(&db, "dotkom").await;
    let role = insert_group(&db, "AdminCc", QUEUE_ROLE_DOMAIN).await;

    store.memberships().create(&managed, &user, 0).await.unwrap();
    store.memberships().create(&role, &user, 0).await.unwrap();

    let mine = store
        .memberships()
        .group_names_for_member(user.id, MANAGED_DOMAIN)
        .await
        .unwrap();
    assert_eq!(mine, names(&["dotkom"]));

    let pairs = store
        .memberships()
        .members_in_domain(MANAGED_DOMAIN)
        .await
        .unwrap();
    assert_eq!(pairs, vec![("dotkom".to_string(), "norangsh".to_string())]);

    let all = store
        .memberships()
        .find(MembershipFilter::member(user.id))
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_migration_status_lists_applied() {
    let (db, _store) = store().await;

    let status = db.migration_status().await.unwrap();
    assert_eq!(status.len(), 2);
    assert!(status.iter().all(|(_, applied)| *applied));
}

#[tokio::test]
async fn test_full_rollback_keeps_rt_tables() {
    let (db, store) = store().await;
    let user = insert_user(&db, "norangsh").await;
    let group = insert_managed_group(&db, "dotkom").await;
    store.memberships().create(&group, &user, 0).await.unwrap();

    db.rollback_migration().await.unwrap();
    db.rollback_migration().await.unwrap();

    let status = db.migration_status().await.unwrap();
    assert!(status.iter().all(|(_, applied)| !*applied));

    let users = store
        .users()
        .find_by_names(&names(&["norangsh"]))
        .await
        .unwrap();
    assert_eq!(users, vec![user.clone()]);
    assert!(store.groups().has_group("dotkom", MANAGED_DOMAIN).await.unwrap());
    assert_eq!(
        store
            .memberships()
            .group_names_for_member(user.id, MANAGED_DOMAIN)
            .await
            .unwrap(),
        names(&["dotkom"])
    );
}
