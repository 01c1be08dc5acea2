//! Create reaction table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reaction::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reaction::Id).string_len(32).not_null().primary_key())
                    // Exactly one of video_id / comment_id is set. The
                    // one-reaction-per-(user, target) rule has no unique
                    // constraint; the reaction engine enforces it in its
                    // transaction.
                    .col(ColumnDef::new(Reaction::VideoId).string_len(32))
                    .col(ColumnDef::new(Reaction::CommentId).string_len(32))
                    .col(ColumnDef::new(Reaction::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Reaction::Kind).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Reaction::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite index: (user_id, video_id) for toggle lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_reaction_user_id_video_id")
                    .table(Reaction::Table)
                    .col(Reaction::UserId)
                    .col(Reaction::VideoId)
                    .to_owned(),
            )
            .await?;

        // Composite index: (user_id, comment_id) for toggle lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_reaction_user_id_comment_id")
                    .table(Reaction::Table)
                    .col(Reaction::UserId)
                    .col(Reaction::CommentId)
                    .to_owned(),
            )
            .await?;

        // Index: comment_id for cascade cleanup
        manager
            .create_index(
                Index::create()
                    .name("idx_reaction_comment_id")
                    .table(Reaction::Table)
                    .col(Reaction::CommentId)
                    .to_owned(),
            )
            .await?;

        // Foreign key: user_id -> user.id
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_reaction_user_id")
                    .from(Reaction::Table, Reaction::UserId)
                    .to(User::Table, User::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reaction::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Reaction {
    Table,
    Id,
    VideoId,
    CommentId,
    UserId,
    Kind,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
