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
                    .table(Pets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Pets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Pets::HouseholdId).integer().not_null())
                    .col(ColumnDef::new(Pets::Name).string().not_null())
                    .col(ColumnDef::new(Pets::Species).string().not_null())
                    .col(ColumnDef::new(Pets::Birthday).date())
                    .col(
                        ColumnDef::new(Pets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pets_household")
                            .from(Pets::Table, Pets::HouseholdId)
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
                    .table(PetOwners::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PetOwners::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PetOwners::PetId).integer().not_null())
                    .col(ColumnDef::new(PetOwners::UserId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pet_owners_pet")
                            .from(PetOwners::Table, PetOwners::PetId)
                            .to(Pets::Table, Pets::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pet_owners_unique")
                    .table(PetOwners::Table)
                    .col(PetOwners::PetId)
                    .col(PetOwners::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CareEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CareEvents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CareEvents::PetId).integer().not_null())
                    .col(ColumnDef::new(CareEvents::UserId).uuid().not_null())
                    .col(ColumnDef::new(CareEvents::Action).string().not_null())
                    .col(ColumnDef::new(CareEvents::ImagePath).string())
                    .col(
                        ColumnDef::new(CareEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_care_events_pet")
                            .from(CareEvents::Table, CareEvents::PetId)
                            .to(Pets::Table, Pets::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_care_events_pet_created")
                    .table(CareEvents::Table)
                    .col(CareEvents::PetId)
                    .col(CareEvents::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CareEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PetOwners::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Pets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Pets {
    Table,
    Id,
    HouseholdId,
    Name,
    Species,
    Birthday,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PetOwners {
    Table,
    Id,
    PetId,
    UserId,
}

#[derive(DeriveIden)]
enum CareEvents {
    Table,
    Id,
    PetId,
    UserId,
    Action,
    ImagePath,
    CreatedAt,
}
