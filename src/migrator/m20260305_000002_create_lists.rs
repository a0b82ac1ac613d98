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
                    .table(WishlistItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WishlistItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WishlistItems::HouseholdId).integer().not_null())
                    .col(ColumnDef::new(WishlistItems::UserId).uuid().not_null())
                    .col(ColumnDef::new(WishlistItems::Name).string().not_null())
                    .col(ColumnDef::new(WishlistItems::Note).text())
                    .col(
                        ColumnDef::new(WishlistItems::IsDone)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(WishlistItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wishlist_items_household")
                            .from(WishlistItems::Table, WishlistItems::HouseholdId)
                            .to(Households::Table, Households::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Coupons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Coupons::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Coupons::HouseholdId).integer().not_null())
                    .col(ColumnDef::new(Coupons::IssuerId).uuid().not_null())
                    .col(ColumnDef::new(Coupons::TargetId).uuid().not_null())
                    .col(ColumnDef::new(Coupons::Title).string().not_null())
                    .col(
                        ColumnDef::new(Coupons::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Coupons::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Coupons::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_coupons_household")
                            .from(Coupons::Table, Coupons::HouseholdId)
                            .to(Households::Table, Households::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Countdowns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Countdowns::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Countdowns::HouseholdId).integer().not_null())
                    .col(ColumnDef::new(Countdowns::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(Countdowns::Title).string().not_null())
                    .col(ColumnDef::new(Countdowns::Month).integer().not_null())
                    .col(ColumnDef::new(Countdowns::Day).integer().not_null())
                    .col(
                        ColumnDef::new(Countdowns::IsLunar)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Countdowns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_countdowns_household")
                            .from(Countdowns::Table, Countdowns::HouseholdId)
                            .to(Households::Table, Households::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Countdowns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Coupons::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WishlistItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WishlistItems {
    Table,
    Id,
    HouseholdId,
    UserId,
    Name,
    Note,
    IsDone,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Coupons {
    Table,
    Id,
    HouseholdId,
    IssuerId,
    TargetId,
    Title,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Countdowns {
    Table,
    Id,
    HouseholdId,
    CreatedBy,
    Title,
    Month,
    Day,
    IsLunar,
    CreatedAt,
}
