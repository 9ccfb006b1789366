//! Migration: Enforce unique (group, member) pairs and index group domains.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // A second insert of the same pair must fail, not silently succeed
        manager
            .create_index(
                Index::create()
                    .name("idx_groupmembers_group_member")
                    .table(GroupMembers::Table)
                    .col(GroupMembers::GroupId)
                    .col(GroupMembers::MemberId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_groups_domain_name")
                    .table(Groups::Table)
                    .col(Groups::Domain)
                    .col(Groups::Name)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_groups_domain_name")
                    .table(Groups::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_groupmembers_group_member")
                    .table(GroupMembers::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum Groups {
    Table,
    Domain,
    Name,
}

#[derive(Iden)]
enum GroupMembers {
    #[iden = "groupmembers"]
    Table,
    #[iden = "groupid"]
    GroupId,
    #[iden = "memberid"]
    MemberId,
}
