use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profiles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Profiles::DisplayName).string().not_null())
                    .col(ColumnDef::new(Profiles::AvatarPath).string())
                    .col(
                        ColumnDef::new(Profiles::Role)
                            .string()
                            .not_null()
                            .default("user"),
                    )
                    .col(
                        ColumnDef::new(Profiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Households::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Households::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Households::Name).string().not_null())
                    .col(
                        ColumnDef::new(Households::InviteCode)
                            .string_len(6)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Households::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HouseholdMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HouseholdMembers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HouseholdMembers::HouseholdId).integer().not_null())
                    .col(ColumnDef::new(HouseholdMembers::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(HouseholdMembers::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_household_members_household")
                            .from(HouseholdMembers::Table, HouseholdMembers::HouseholdId)
                            .to(Households::Table, Households::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_household_members_profile")
                            .from(HouseholdMembers::Table, HouseholdMembers::UserId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_household_members_unique")
                    .table(HouseholdMembers::Table)
                    .col(HouseholdMembers::HouseholdId)
                    .col(HouseholdMembers::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_household_members_user_id")
                    .table(HouseholdMembers::Table)
                    .col(HouseholdMembers::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HouseholdMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Households::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Profiles {
    Table,
    Id,
    DisplayName,
    AvatarPath,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Households {
    Table,
    Id,
    Name,
    InviteCode,
    CreatedAt,
}

#[derive(DeriveIden)]
enum HouseholdMembers {
    Table,
    Id,
    HouseholdId,
    UserId,
    JoinedAt,
}
