use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_households::Households;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WeeklyHonors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeeklyHonors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WeeklyHonors::HouseholdId).integer().not_null())
                    .col(ColumnDef::new(WeeklyHonors::WeekKey).string_len(8).not_null())
                    .col(ColumnDef::new(WeeklyHonors::MemberId).uuid().not_null())
                    .col(ColumnDef::new(WeeklyHonors::Title).string().not_null())
                    .col(ColumnDef::new(WeeklyHonors::Score).integer().not_null())
                    .col(
                        ColumnDef::new(WeeklyHonors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_weekly_honors_household")
                            .from(WeeklyHonors::Table, WeeklyHonors::HouseholdId)
                            .to(Households::Table, Households::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // one champion per household and week; archival inserts rely on it
        manager
            .create_index(
                Index::create()
                    .name("idx_weekly_honors_household_week")
                    .table(WeeklyHonors::Table)
                    .col(WeeklyHonors::HouseholdId)
                    .col(WeeklyHonors::WeekKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AppUpdates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AppUpdates::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AppUpdates::Version).string().not_null())
                    .col(ColumnDef::new(AppUpdates::Content).text().not_null())
                    .col(
                        ColumnDef::new(AppUpdates::IsPushed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AppUpdates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AppUpdates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WeeklyHonors::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WeeklyHonors {
    Table,
    Id,
    HouseholdId,
    WeekKey,
    MemberId,
    Title,
    Score,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AppUpdates {
    Table,
    Id,
    Version,
    Content,
    IsPushed,
    CreatedAt,
}
