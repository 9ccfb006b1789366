//! RT user database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::LocalUser;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_name = "realname")]
    pub real_name: Option<String>,
    #[sea_orm(column_name = "emailaddress")]
    pub email_address: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_member::Entity")]
    Memberships,
}

impl Related<super::group_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for LocalUser {
    fn from(model: Model) -> Self {
        LocalUser {
            id: model.id,
            name: model.name,
            real_name: model.real_name,
            email_address: model.email_address,
        }
    }
}
