//! RT group membership database entity for SeaORM.
//!
//! (groupid, memberid) carries a unique index added by the second migration.

use sea_orm::entity::prelude::*;

use crate::domain::LocalMembership;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "groupmembers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "groupid")]
    pub group_id: i32,
    #[sea_orm(column_name = "memberid")]
    pub member_id: i32,
    pub creator: i32,
    pub created: Option<DateTime>,
    #[sea_orm(column_name = "lastupdatedby")]
    pub last_updated_by: i32,
    #[sea_orm(column_name = "lastupdated")]
    pub last_updated: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::MemberId",
        to = "super::user::Column::Id"
    )]
    Member,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for LocalMembership {
    fn from(model: Model) -> Self {
        LocalMembership {
            id: model.id,
            group_id: model.group_id,
            member_id: model.member_id,
            creator: model.creator,
            created: model.created.map(|t| t.and_utc()),
            last_updated_by: model.last_updated_by,
            last_updated: model.last_updated.map(|t| t.and_utc()),
        }
    }
}
