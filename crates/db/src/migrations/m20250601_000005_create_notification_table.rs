//! Create notification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Notification::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Notification::ReceiverId).string_len(32).not_null())
                    .col(ColumnDef::new(Notification::SenderId).string_len(32))
                    .col(ColumnDef::new(Notification::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(Notification::EntityId).string_len(32).not_null())
                    .col(ColumnDef::new(Notification::EntityKind).string_len(16).not_null())
                    .col(ColumnDef::new(Notification::Title).string_len(256))
                    .col(ColumnDef::new(Notification::Message).string_len(1024))
                    .col(ColumnDef::new(Notification::Thumbnail).string_len(1024))
                    .col(ColumnDef::new(Notification::SenderAvatar).string_len(1024))
                    .col(ColumnDef::new(Notification::IsRead).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Notification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite index: (receiver_id, created_at) for feed reads
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_receiver_id_created_at")
                    .table(Notification::Table)
                    .col(Notification::ReceiverId)
                    .col(Notification::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: is_read for unread counting
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_is_read")
                    .table(Notification::Table)
                    .col(Notification::IsRead)
                    .to_owned(),
            )
            .await?;

        // Index: created_at for the retention sweep
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_created_at")
                    .table(Notification::Table)
                    .col(Notification::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Foreign key: receiver_id -> user.id
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_notification_receiver_id")
                    .from(Notification::Table, Notification::ReceiverId)
                    .to(User::Table, User::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Notification {
    Table,
    Id,
    ReceiverId,
    SenderId,
    Kind,
    EntityId,
    EntityKind,
    Title,
    Message,
    Thumbnail,
    SenderAvatar,
    IsRead,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
