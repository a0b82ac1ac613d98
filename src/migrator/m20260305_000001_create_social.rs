use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_households::{Households, Profiles};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Posts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Posts::UserId).uuid().not_null())
                    // null: visible in every household of the author
                    .col(ColumnDef::new(Posts::HouseholdId).integer())
                    .col(ColumnDef::new(Posts::Content).text())
                    .col(ColumnDef::new(Posts::ImagePath).string())
                    .col(
                        ColumnDef::new(Posts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_profile")
                            .from(Posts::Table, Posts::UserId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_household")
                            .from(Posts::Table, Posts::HouseholdId)
                            .to(Households::Table, Households::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_posts_user_created")
                    .table(Posts::Table)
                    .col(Posts::UserId)
                    .col(Posts::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PostLikes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostLikes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostLikes::PostId).integer().not_null())
                    .col(ColumnDef::new(PostLikes::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(PostLikes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_likes_post")
                            .from(PostLikes::Table, PostLikes::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_likes_unique")
                    .table(PostLikes::Table)
                    .col(PostLikes::PostId)
                    .col(PostLikes::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reminders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reminders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reminders::HouseholdId).integer().not_null())
                    .col(ColumnDef::new(Reminders::SenderId).uuid().not_null())
                    .col(ColumnDef::new(Reminders::TargetId).uuid())
                    .col(ColumnDef::new(Reminders::Content).text().not_null())
                    .col(ColumnDef::new(Reminders::Kind).string())
                    .col(
                        ColumnDef::new(Reminders::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Reminders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reminders_household")
                            .from(Reminders::Table, Reminders::HouseholdId)
                            .to(Households::Table, Households::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reminders_household_created")
                    .table(Reminders::Table)
                    .col(Reminders::HouseholdId)
                    .col(Reminders::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reminders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PostLikes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    UserId,
    HouseholdId,
    Content,
    ImagePath,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PostLikes {
    Table,
    Id,
    PostId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Reminders {
    Table,
    Id,
    HouseholdId,
    SenderId,
    TargetId,
    Content,
    Kind,
    IsRead,
    CreatedAt,
}
