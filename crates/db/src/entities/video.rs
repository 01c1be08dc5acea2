//! Video entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Video categories.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Category {
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "short")]
    Short,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "video")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Channel owner user ID
    #[sea_orm(indexed)]
    pub owner_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Stored media URL
    pub video_url: String,

    /// Thumbnail URL
    pub thumbnail_url: String,

    /// Duration in seconds
    pub duration_secs: i32,

    /// View count (denormalized)
    #[sea_orm(default_value = 0)]
    pub views: i32,

    /// Like count, must equal the live like-reaction count (denormalized)
    #[sea_orm(default_value = 0)]
    pub likes: i32,

    /// Dislike count, must equal the live dislike-reaction count (denormalized)
    #[sea_orm(default_value = 0)]
    pub dislikes: i32,

    #[sea_orm(default_value = true)]
    pub is_published: bool,

    pub category: Category,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
