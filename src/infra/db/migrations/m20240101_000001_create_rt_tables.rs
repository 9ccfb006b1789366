//! Migration: Create the RT users, groups and groupmembers tables.
//!
//! Only the columns the sync reads or writes are declared. Against a live RT
//! database the tables already exist and `if_not_exists` leaves them alone.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string_len(200).not_null().unique_key())
                    .col(ColumnDef::new(Users::RealName).string_len(120).null())
                    .col(ColumnDef::new(Users::EmailAddress).string_len(120).null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Groups::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Groups::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Groups::Description).string_len(255).null())
                    .col(ColumnDef::new(Groups::Domain).string_len(64).not_null())
                    .col(ColumnDef::new(Groups::Type).string_len(64).null())
                    .col(ColumnDef::new(Groups::Instance).integer().null())
                    .col(ColumnDef::new(Groups::Creator).integer().not_null().default(0))
                    .col(ColumnDef::new(Groups::Created).timestamp().null())
                    .col(ColumnDef::new(Groups::LastUpdatedBy).integer().not_null().default(0))
                    .col(ColumnDef::new(Groups::LastUpdated).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupMembers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GroupMembers::GroupId).integer().not_null())
                    .col(ColumnDef::new(GroupMembers::MemberId).integer().not_null())
                    .col(ColumnDef::new(GroupMembers::Creator).integer().not_null().default(0))
                    .col(ColumnDef::new(GroupMembers::Created).timestamp().null())
                    .col(ColumnDef::new(GroupMembers::LastUpdatedBy).integer().not_null().default(0))
                    .col(ColumnDef::new(GroupMembers::LastUpdated).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_groupmembers_groupid")
                            .from(GroupMembers::Table, GroupMembers::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_groupmembers_memberid")
                            .from(GroupMembers::Table, GroupMembers::MemberId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    /// Never drops anything: these are RT's own tables and may predate this tool.
    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        tracing::warn!("Leaving users, groups and groupmembers in place");
        Ok(())
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    #[iden = "realname"]
    RealName,
    #[iden = "emailaddress"]
    EmailAddress,
}

#[derive(Iden)]
enum Groups {
    Table,
    Id,
    Name,
    Description,
    Domain,
    Type,
    Instance,
    Creator,
    Created,
    #[iden = "lastupdatedby"]
    LastUpdatedBy,
    #[iden = "lastupdated"]
    LastUpdated,
}

#[derive(Iden)]
enum GroupMembers {
    #[iden = "groupmembers"]
    Table,
    Id,
    #[iden = "groupid"]
    GroupId,
    #[iden = "memberid"]
    MemberId,
    Creator,
    Created,
    #[iden = "lastupdatedby"]
    LastUpdatedBy,
    #[iden = "lastupdated"]
    LastUpdated,
}
