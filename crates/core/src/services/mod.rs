//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod event_publisher;
pub mod notification;
pub mod reaction;
pub mod subscription;
pub mod user;
pub mod video;

pub use comment::{
    CommentPage, CommentService, CreateCommentInput, DeleteOutcome, PopulatedComment,
    UpdateCommentInput,
};
pub use event_publisher::{EventPublisher, EventPublisherService, NoOpEventPublisher, rooms};
pub use notification::{FanOutInput, NotificationService};
pub use reaction::{ReactionService, ToggleOutcome};
pub use subscription::{SubscriptionService, SubscriptionToggle};
pub use user::{AuthorProjection, UserService};
pub use video::{CreateVideoInput, VideoService, VideoWithOwner};
