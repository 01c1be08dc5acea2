//! Create video view marker table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VideoView::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(VideoView::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(VideoView::VideoId).string_len(32).not_null())
                    .col(ColumnDef::new(VideoView::ViewerId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(VideoView::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite index: (video_id, viewer_id) for the once-per-viewer check
        manager
            .create_index(
                Index::create()
                    .name("idx_video_view_video_id_viewer_id")
                    .table(VideoView::Table)
                    .col(VideoView::VideoId)
                    .col(VideoView::ViewerId)
                    .to_owned(),
            )
            .await?;

        // Foreign key: video_id -> video.id
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_video_view_video_id")
                    .from(VideoView::Table, VideoView::VideoId)
                    .to(Video::Table, Video::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VideoView::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum VideoView {
    Table,
    Id,
    VideoId,
    ViewerId,
    CreatedAt,
}

#[derive(Iden)]
enum Video {
    Table,
    Id,
}
