//! API endpoints.

#![allow(missing_docs)]

pub mod comments;
pub mod notifications;
pub mod reactions;
pub mod subscriptions;
pub mod videos;

use axum::Router;

use crate::middleware::AppState;

/// Build the API router.
#[must_use]
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(videos::router())
        .merge(comments::router())
        .merge(reactions::router())
        .merge(notifications::router())
        .merge(subscriptions::router())
}
