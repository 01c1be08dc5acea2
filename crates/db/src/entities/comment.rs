//! Comment entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Content stored in place of a soft-deleted comment's text.
pub const TOMBSTONE_CONTENT: &str = "This comment was deleted";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning video ID
    #[sea_orm(indexed)]
    pub video_id: String,

    /// Author user ID
    #[sea_orm(indexed)]
    pub author_id: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Parent comment ID; NULL = top-level. Must reference a comment on
    /// the same video (enforced at write time, not by a foreign key).
    #[sea_orm(nullable, indexed)]
    pub parent_id: Option<String>,

    /// Like count, must equal the live like-reaction count (denormalized)
    #[sea_orm(default_value = 0)]
    pub likes: i32,

    /// Dislike count, must equal the live dislike-reaction count (denormalized)
    #[sea_orm(default_value = 0)]
    pub dislikes: i32,

    /// Soft-delete flag; the row is kept to preserve the reply tree
    #[sea_orm(default_value = false)]
    pub is_deleted: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::video::Entity",
        from = "Column::VideoId",
        to = "super::video::Column::Id"
    )]
    Video,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,

    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
}

impl Related<super::video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Video.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
