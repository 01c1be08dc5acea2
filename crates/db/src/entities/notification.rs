//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification kinds.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    #[sea_orm(string_value = "LIKE")]
    Like,
    #[sea_orm(string_value = "COMMENT")]
    Comment,
    #[sea_orm(string_value = "SUBSCRIBE")]
    Subscribe,
    #[sea_orm(string_value = "UPLOAD")]
    Upload,
    #[sea_orm(string_value = "POST")]
    Post,
}

impl NotificationKind {
    /// Wire representation used in API payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::Comment => "COMMENT",
            Self::Subscribe => "SUBSCRIBE",
            Self::Upload => "UPLOAD",
            Self::Post => "POST",
        }
    }
}

/// Entity kinds a notification can point at.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    #[sea_orm(string_value = "VIDEO")]
    Video,
    #[sea_orm(string_value = "COMMENT")]
    Comment,
    #[sea_orm(string_value = "CHANNEL")]
    Channel,
    #[sea_orm(string_value = "POST")]
    Post,
}

impl EntityKind {
    /// Wire representation used in API payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "VIDEO",
            Self::Comment => "COMMENT",
            Self::Channel => "CHANNEL",
            Self::Post => "POST",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user receiving the notification
    #[sea_orm(indexed)]
    pub receiver_id: String,

    /// The user who triggered the notification
    #[sea_orm(nullable)]
    pub sender_id: Option<String>,

    pub kind: NotificationKind,

    /// The entity this notification points at
    pub entity_id: String,

    pub entity_kind: EntityKind,

    #[sea_orm(nullable)]
    pub title: Option<String>,

    #[sea_orm(nullable)]
    pub message: Option<String>,

    /// Entity thumbnail URL for display
    #[sea_orm(nullable)]
    pub thumbnail: Option<String>,

    /// Sender avatar URL for display
    #[sea_orm(nullable)]
    pub sender_avatar: Option<String>,

    /// Has this notification been read?
    #[sea_orm(default_value = false, indexed)]
    pub is_read: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReceiverId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Receiver,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SenderId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Sender,
}

impl ActiveModelBehavior for ActiveModel {}
