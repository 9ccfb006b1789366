//! RT group database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::LocalGroup;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    /// Ownership tag; only the managed domain is touched by the sync
    pub domain: String,
    #[sea_orm(column_name = "type")]
    pub group_type: Option<String>,
    pub instance: Option<i32>,
    pub creator: i32,
    /// RT stores audit times as `timestamp` without zone, in UTC
    pub created: Option<DateTime>,
    #[sea_orm(column_name = "lastupdatedby")]
    pub last_updated_by: i32,
    #[sea_orm(column_name = "lastupdated")]
    pub last_updated: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_member::Entity")]
    Members,
}

impl Related<super::group_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for LocalGroup {
    fn from(model: Model) -> Self {
        LocalGroup {
            id: model.id,
            name: model.name,
            description: model.description.unwrap_or_default(),
            domain: model.domain,
            group_type: model.group_type.unwrap_or_default(),
            instance: model.instance.unwrap_or_default(),
            creator: model.creator,
            created: model.created.map(|t| t.and_utc()),
            last_updated_by: model.last_updated_by,
            last_updated: model.last_updated.map(|t| t.and_utc()),
        }
    }
}
