//! Shared fixtures for integration tests: an in-memory SQLite RT store.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};

use rt_ldap_sync::config::MANAGED_DOMAIN;
use rt_ldap_sync::domain::{LocalGroup, LocalUser};
use rt_ldap_sync::infra::repositories::entities::{GroupActiveModel, UserActiveModel};
use rt_ldap_sync::infra::{Database, Persistence, StoreGateway};

/// Fresh database with the RT tables migrated.
pub async fn database() -> Database {
    Database::connect("sqlite::memory:")
        .await
        .expect("in-memory database")
}

pub async fn store() -> (Database, Arc<Persistence>) {
    let db = database().await;
    let store = Arc::new(Persistence::new(db.get_connection()));
    (db, store)
}

pub async fn insert_user(db: &Database, name: &str) -> LocalUser {
    let model = UserActiveModel {
        name: Set(name.to_string()),
        real_name: Set(None),
        email_address: Set(Some(format!("{}@example.org", name))),
        ..Default::default()
    }
    .insert(db.connection())
    .await
    .expect("insert user");
    LocalUser::from(model)
}

pub async fn insert_group(db: &Database, name: &str, domain: &str) -> LocalGroup {
    let now = Utc::now().naive_utc();
    let model = GroupActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        domain: Set(domain.to_string()),
        group_type: Set(None),
        instance: Set(None),
        creator: Set(0),
        created: Set(Some(now)),
        last_updated_by: Set(0),
        last_updated: Set(None),
        ..Default::default()
    }
    .insert(db.connection())
    .await
    .expect("insert group");
    LocalGroup::from(model)
}

pub async fn insert_managed_group(db: &Database, name: &str) -> LocalGroup {
    insert_group(db, name, MANAGED_DOMAIN).await
}

/// Managed group names `user` belongs to, sorted.
pub async fn groups_of<S: StoreGateway>(store: &S, user: &LocalUser) -> Vec<String> {
    store
        .memberships()
        .group_names_for_member(user.id, MANAGED_DOMAIN)
        .await
        .expect("group names")
}

pub fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
