//! Create subscription table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subscription::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Subscription::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Subscription::SubscriberId).string_len(32).not_null())
                    .col(ColumnDef::new(Subscription::ChannelId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Subscription::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite index: (subscriber_id, channel_id) for toggle lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_subscription_subscriber_id_channel_id")
                    .table(Subscription::Table)
                    .col(Subscription::SubscriberId)
                    .col(Subscription::ChannelId)
                    .to_owned(),
            )
            .await?;

        // Index: channel_id for fan-out audience resolution
        manager
            .create_index(
                Index::create()
                    .name("idx_subscription_channel_id")
                    .table(Subscription::Table)
                    .col(Subscription::ChannelId)
                    .to_owned(),
            )
            .await?;

        // Foreign key: subscriber_id -> user.id
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_subscription_subscriber_id")
                    .from(Subscription::Table, Subscription::SubscriberId)
                    .to(User::Table, User::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        // Foreign key: channel_id -> user.id
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_subscription_channel_id")
                    .from(Subscription::Table, Subscription::ChannelId)
                    .to(User::Table, User::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subscription::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Subscription {
    Table,
    Id,
    SubscriberId,
    ChannelId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
