//! Reaction service.
//!
//! Toggles a user's like/dislike on a video or a comment while keeping the
//! target's denormalized counters in step with the reaction rows. Every
//! counter mutation runs in the same transaction as the reaction row change
//! that justifies it.

use clipstream_common::{AppError, AppResult, IdGenerator};
use clipstream_db::{
    entities::reaction::{self, ReactionKind},
    entities::video,
    repositories::{CommentRepository, ReactionRepository, VideoRepository},
};
use sea_orm::{DatabaseConnection, DatabaseTransaction, Set, TransactionTrait};
use std::collections::HashMap;
use std::sync::Arc;

/// What a toggle call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// First reaction by this user on this target.
    Created,
    /// An existing reaction of the other kind was switched in place.
    Switched,
    /// Repeating the same kind removed the reaction.
    Removed,
}

impl ToggleOutcome {
    /// Wire representation used in API payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Switched => "switched",
            Self::Removed => "removed",
        }
    }
}

/// Reaction service for business logic.
#[derive(Clone)]
pub struct ReactionService {
    db: Arc<DatabaseConnection>,
    reaction_repo: ReactionRepository,
    video_repo: VideoRepository,
    comment_repo: CommentRepository,
    id_gen: IdGenerator,
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        reaction_repo: ReactionRepository,
        video_repo: VideoRepository,
        comment_repo: CommentRepository,
    ) -> Self {
        Self {
            db,
            reaction_repo,
            video_repo,
            comment_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Toggle a user's reaction on a video.
    ///
    /// Guarantees at most one reaction row per (user, video) and keeps the
    /// video's `likes`/`dislikes` counters consistent with the rows.
    pub async fn toggle_video_reaction(
        &self,
        user_id: &str,
        video_id: &str,
        kind: ReactionKind,
    ) -> AppResult<ToggleOutcome> {
        let txn = self.begin().await?;

        let outcome = match self
            .toggle_video_in_txn(&txn, user_id, video_id, kind)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                abort(txn).await;
                return Err(e);
            }
        };

        txn.commit()
            .await
            .map_err(|e| AppError::TransientStore(e.to_string()))?;

        tracing::debug!(
            user_id = %user_id,
            video_id = %video_id,
            kind = kind.as_str(),
            outcome = outcome.as_str(),
            "Toggled video reaction"
        );
        Ok(outcome)
    }

    async fn toggle_video_in_txn(
        &self,
        txn: &DatabaseTransaction,
        user_id: &str,
        video_id: &str,
        kind: ReactionKind,
    ) -> AppResult<ToggleOutcome> {
        // The target must exist before any counter can move.
        self.video_repo.get_by_id_in(txn, video_id).await?;

        let existing = self
            .reaction_repo
            .find_by_user_and_video_in(txn, user_id, video_id)
            .await?;

        match existing {
            Some(r) if r.kind == kind => {
                self.reaction_repo.delete_in(txn, &r.id).await?;
                match kind {
                    ReactionKind::Like => self.video_repo.decrement_likes_in(txn, video_id).await?,
                    ReactionKind::Dislike => {
                        self.video_repo.decrement_dislikes_in(txn, video_id).await?;
                    }
                }
                Ok(ToggleOutcome::Removed)
            }
            Some(r) => {
                let previous = r.kind;
                self.reaction_repo.update_kind_in(txn, r, kind).await?;
                match previous {
                    ReactionKind::Like => self.video_repo.decrement_likes_in(txn, video_id).await?,
                    ReactionKind::Dislike => {
                        self.video_repo.decrement_dislikes_in(txn, video_id).await?;
                    }
                }
                match kind {
                    ReactionKind::Like => self.video_repo.increment_likes_in(txn, video_id).await?,
                    ReactionKind::Dislike => {
                        self.video_repo.increment_dislikes_in(txn, video_id).await?;
                    }
                }
                Ok(ToggleOutcome::Switched)
            }
            None => {
                let model = reaction::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    video_id: Set(Some(video_id.to_string())),
                    comment_id: Set(None),
                    user_id: Set(user_id.to_string()),
                    kind: Set(kind),
                    created_at: Set(chrono::Utc::now().into()),
                };
                self.reaction_repo.create_in(txn, model).await?;
                match kind {
                    ReactionKind::Like => self.video_repo.increment_likes_in(txn, video_id).await?,
                    ReactionKind::Dislike => {
                        self.video_repo.increment_dislikes_in(txn, video_id).await?;
                    }
                }
                Ok(ToggleOutcome::Created)
            }
        }
    }

    /// Toggle a user's reaction on a comment.
    pub async fn toggle_comment_reaction(
        &self,
        user_id: &str,
        comment_id: &str,
        kind: ReactionKind,
    ) -> AppResult<ToggleOutcome> {
        let txn = self.begin().await?;

        let outcome = match self
            .toggle_comment_in_txn(&txn, user_id, comment_id, kind)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                abort(txn).await;
                return Err(e);
            }
        };

        txn.commit()
            .await
            .map_err(|e| AppError::TransientStore(e.to_string()))?;

        tracing::debug!(
            user_id = %user_id,
            comment_id = %comment_id,
            kind = kind.as_str(),
            outcome = outcome.as_str(),
            "Toggled comment reaction"
        );
        Ok(outcome)
    }

    async fn toggle_comment_in_txn(
        &self,
        txn: &DatabaseTransaction,
        user_id: &str,
        comment_id: &str,
        kind: ReactionKind,
    ) -> AppResult<ToggleOutcome> {
        self.comment_repo.get_by_id_in(txn, comment_id).await?;

        let existing = self
            .reaction_repo
            .find_by_user_and_comment_in(txn, user_id, comment_id)
            .await?;

        match existing {
            Some(r) if r.kind == kind => {
                self.reaction_repo.delete_in(txn, &r.id).await?;
                match kind {
                    ReactionKind::Like => {
                        self.comment_repo.decrement_likes_in(txn, comment_id).await?;
                    }
                    ReactionKind::Dislike => {
                        self.comment_repo
                            .decrement_dislikes_in(txn, comment_id)
                            .await?;
                    }
                }
                Ok(ToggleOutcome::Removed)
            }
            Some(r) => {
                let previous = r.kind;
                self.reaction_repo.update_kind_in(txn, r, kind).await?;
                match previous {
                    ReactionKind::Like => {
                        self.comment_repo.decrement_likes_in(txn, comment_id).await?;
                    }
                    ReactionKind::Dislike => {
                        self.comment_repo
                            .decrement_dislikes_in(txn, comment_id)
                            .await?;
                    }
                }
                match kind {
                    ReactionKind::Like => {
                        self.comment_repo.increment_likes_in(txn, comment_id).await?;
                    }
                    ReactionKind::Dislike => {
                        self.comment_repo
                            .increment_dislikes_in(txn, comment_id)
                            .await?;
                    }
                }
                Ok(ToggleOutcome::Switched)
            }
            None => {
                let model = reaction::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    video_id: Set(None),
                    comment_id: Set(Some(comment_id.to_string())),
                    user_id: Set(user_id.to_string()),
                    kind: Set(kind),
                    created_at: Set(chrono::Utc::now().into()),
                };
                self.reaction_repo.create_in(txn, model).await?;
                match kind {
                    ReactionKind::Like => {
                        self.comment_repo.increment_likes_in(txn, comment_id).await?;
                    }
                    ReactionKind::Dislike => {
                        self.comment_repo
                            .increment_dislikes_in(txn, comment_id)
                            .await?;
                    }
                }
                Ok(ToggleOutcome::Created)
            }
        }
    }

    /// Get the caller's current reaction kind on a video, if any.
    pub async fn video_reaction_status(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> AppResult<Option<ReactionKind>> {
        Ok(self
            .reaction_repo
            .find_by_user_and_video(user_id, video_id)
            .await?
            .map(|r| r.kind))
    }

    /// Get the caller's current reaction kind on a comment, if any.
    pub async fn comment_reaction_status(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> AppResult<Option<ReactionKind>> {
        Ok(self
            .reaction_repo
            .find_by_user_and_comment(user_id, comment_id)
            .await?
            .map(|r| r.kind))
    }

    /// Get the caller's reaction kind for every comment under a video.
    ///
    /// One batched query instead of one lookup per comment; comments the
    /// caller has not reacted to are absent from the map.
    pub async fn comment_reactions_for_video(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> AppResult<HashMap<String, ReactionKind>> {
        let comment_ids = self.comment_repo.find_ids_by_video(video_id).await?;
        let reactions = self
            .reaction_repo
            .find_by_user_and_comment_ids(user_id, &comment_ids)
            .await?;

        Ok(reactions
            .into_iter()
            .filter_map(|r| r.comment_id.map(|comment_id| (comment_id, r.kind)))
            .collect())
    }

    /// Get the videos a user has like-reacted to.
    pub async fn liked_videos(&self, user_id: &str) -> AppResult<Vec<video::Model>> {
        let video_ids = self.reaction_repo.find_liked_video_ids(user_id).await?;
        self.video_repo.find_by_ids(&video_ids).await
    }

    async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::TransientStore(e.to_string()))
    }
}

/// Roll back a failed transaction, logging if the abort itself fails.
async fn abort(txn: DatabaseTransaction) {
    if let Err(e) = txn.rollback().await {
        tracing::warn!(error = %e, "Failed to roll back reaction transaction");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clipstream_db::entities::video::Category;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_video(id: &str, owner_id: &str) -> video::Model {
        video::Model {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            title: "Test video".to_string(),
            description: "A test video".to_string(),
            video_url: "https://cdn.example.com/v.mp4".to_string(),
            thumbnail_url: "https://cdn.example.com/t.jpg".to_string(),
            duration_secs: 60,
            views: 0,
            likes: 0,
            dislikes: 0,
            is_published: true,
            category: Category::Video,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn video_reaction(id: &str, user_id: &str, video_id: &str, kind: ReactionKind) -> reaction::Model {
        reaction::Model {
            id: id.to_string(),
            video_id: Some(video_id.to_string()),
            comment_id: None,
            user_id: user_id.to_string(),
            kind,
            created_at: Utc::now().into(),
        }
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn service(db: Arc<DatabaseConnection>) -> ReactionService {
        ReactionService::new(
            Arc::clone(&db),
            ReactionRepository::new(Arc::clone(&db)),
            VideoRepository::new(Arc::clone(&db)),
            CommentRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_toggle_video_reaction_video_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<video::Model>::new()])
                .into_connection(),
        );

        let result = service(db)
            .toggle_video_reaction("user1", "nonexistent", ReactionKind::Like)
            .await;

        assert!(result.is_err());
        match result {
            Err(AppError::VideoNotFound(id)) => assert_eq!(id, "nonexistent"),
            _ => panic!("Expected VideoNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_toggle_creates_first_reaction() {
        let video = create_test_video("video1", "owner1");
        let inserted = video_reaction("r1", "user1", "video1", ReactionKind::Like);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // video lookup
                .append_query_results([[video]])
                // existing reaction lookup: none
                .append_query_results([Vec::<reaction::Model>::new()])
                // insert returning
                .append_query_results([[inserted]])
                // insert exec + counter update
                .append_exec_results([exec_ok(), exec_ok()])
                .into_connection(),
        );

        let outcome = service(db)
            .toggle_video_reaction("user1", "video1", ReactionKind::Like)
            .await
            .unwrap();

        assert_eq!(outcome, ToggleOutcome::Created);
    }

    #[tokio::test]
    async fn test_toggle_same_kind_removes() {
        let video = create_test_video("video1", "owner1");
        let existing = video_reaction("r1", "user1", "video1", ReactionKind::Like);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video]])
                .append_query_results([[existing]])
                // delete + counter decrement
                .append_exec_results([exec_ok(), exec_ok()])
                .into_connection(),
        );

        let outcome = service(db)
            .toggle_video_reaction("user1", "video1", ReactionKind::Like)
            .await
            .unwrap();

        assert_eq!(outcome, ToggleOutcome::Removed);
    }

    #[tokio::test]
    async fn test_toggle_other_kind_switches() {
        let video = create_test_video("video1", "owner1");
        let existing = video_reaction("r1", "user1", "video1", ReactionKind::Like);
        let switched = video_reaction("r1", "user1", "video1", ReactionKind::Dislike);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video]])
                .append_query_results([[existing]])
                // update returning
                .append_query_results([[switched]])
                // update exec + two counter updates
                .append_exec_results([exec_ok(), exec_ok(), exec_ok()])
                .into_connection(),
        );

        let outcome = service(db)
            .toggle_video_reaction("user1", "video1", ReactionKind::Dislike)
            .await
            .unwrap();

        assert_eq!(outcome, ToggleOutcome::Switched);
    }

    #[tokio::test]
    async fn test_video_reaction_status_none() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<reaction::Model>::new()])
                .into_connection(),
        );

        let status = service(db)
            .video_reaction_status("user1", "video1")
            .await
            .unwrap();

        assert!(status.is_none());
    }

    #[tokio::test]
    async fn test_comment_reactions_for_video_builds_map() {
        let r1 = reaction::Model {
            id: "r1".to_string(),
            video_id: None,
            comment_id: Some("c1".to_string()),
            user_id: "user1".to_string(),
            kind: ReactionKind::Like,
            created_at: Utc::now().into(),
        };
        let r2 = reaction::Model {
            id: "r2".to_string(),
            video_id: None,
            comment_id: Some("c3".to_string()),
            user_id: "user1".to_string(),
            kind: ReactionKind::Dislike,
            created_at: Utc::now().into(),
        };

        let id_row = |id: &str| maplit::btreemap! { "id" => sea_orm::Value::from(id) };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // comment ids for video
                .append_query_results([vec![id_row("c1"), id_row("c2"), id_row("c3")]])
                // the caller's reactions on those comments
                .append_query_results([[r1, r2]])
                .into_connection(),
        );

        let map = service(db)
            .comment_reactions_for_video("user1", "video1")
            .await
            .unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("c1"), Some(&ReactionKind::Like));
        assert_eq!(map.get("c2"), None);
        assert_eq!(map.get("c3"), Some(&ReactionKind::Dislike));
    }
}
