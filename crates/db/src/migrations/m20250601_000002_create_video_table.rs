//! Create video table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Video::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Video::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Video::OwnerId).string_len(32).not_null())
                    .col(ColumnDef::new(Video::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Video::Description).text().not_null())
                    .col(ColumnDef::new(Video::VideoUrl).string_len(1024).not_null())
                    .col(ColumnDef::new(Video::ThumbnailUrl).string_len(1024).not_null())
                    .col(ColumnDef::new(Video::DurationSecs).integer().not_null())
                    .col(ColumnDef::new(Video::Views).integer().not_null().default(0))
                    .col(ColumnDef::new(Video::Likes).integer().not_null().default(0))
                    .col(ColumnDef::new(Video::Dislikes).integer().not_null().default(0))
                    .col(ColumnDef::new(Video::IsPublished).boolean().not_null().default(true))
                    .col(ColumnDef::new(Video::Category).string_len(16).not_null().default("video"))
                    .col(
                        ColumnDef::new(Video::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Video::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Composite index: (owner_id, id) for channel listings
        manager
            .create_index(
                Index::create()
                    .name("idx_video_owner_id_id")
                    .table(Video::Table)
                    .col(Video::OwnerId)
                    .col(Video::Id)
                    .to_owned(),
            )
            .await?;

        // Foreign key: owner_id -> user.id
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_video_owner_id")
                    .from(Video::Table, Video::OwnerId)
                    .to(User::Table, User::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Video::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Video {
    Table,
    Id,
    OwnerId,
    Title,
    Description,
    VideoUrl,
    ThumbnailUrl,
    DurationSecs,
    Views,
    Likes,
    Dislikes,
    IsPublished,
    Category,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
