//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use clipstream_core::{
    CommentService, NotificationService, ReactionService, SubscriptionService, UserService,
    VideoService,
};
use std::sync::Arc;

use crate::streaming::ChannelRegistry;

/// Application state.
///
/// Constructed once in the server binary and injected everywhere; the
/// channel registry in particular is an explicit instance, not a global.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub video_service: VideoService,
    pub comment_service: CommentService,
    pub reaction_service: ReactionService,
    pub notification_service: NotificationService,
    pub subscription_service: SubscriptionService,
    pub registry: Arc<ChannelRegistry>,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to its user row and attaches the verified
/// identity to the request. Handlers requiring authentication extract it
/// with [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        // Authenticate user by token
        if let Ok(user) = state.user_service.authenticate_by_token(token).await {
            req.extensions_mut().insert(user);
        }
    }

    next.run(req).await
}
