//! Subscription endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use clipstream_common::AppResult;
use clipstream_core::{AuthorProjection, SubscriptionToggle};
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Toggle response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSubscriptionResponse {
    pub subscribed: bool,
}

/// Toggle the caller's subscription to a channel.
async fn toggle_subscription(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<ToggleSubscriptionResponse>> {
    let outcome = state
        .subscription_service
        .toggle(&user.id, &channel_id)
        .await?;
    Ok(ApiResponse::ok(ToggleSubscriptionResponse {
        subscribed: matches!(outcome, SubscriptionToggle::Subscribed),
    }))
}

/// Get a channel's subscribers.
async fn channel_subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<Vec<AuthorProjection>>> {
    let subscribers = state.subscription_service.subscribers(&channel_id).await?;
    Ok(ApiResponse::ok(subscribers))
}

/// Subscribed-status response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusResponse {
    pub subscribed: bool,
}

/// Whether the caller is subscribed to a channel.
async fn subscription_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<SubscriptionStatusResponse>> {
    let subscribed = state
        .subscription_service
        .status(&user.id, &channel_id)
        .await?;
    Ok(ApiResponse::ok(SubscriptionStatusResponse { subscribed }))
}

/// Get the channels the caller is subscribed to.
async fn subscribed_channels(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<AuthorProjection>>> {
    let channels = state
        .subscription_service
        .subscribed_channels(&user.id)
        .await?;
    Ok(ApiResponse::ok(channels))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/channels/{channel_id}/subscription",
            post(toggle_subscription),
        )
        .route(
            "/channels/{channel_id}/subscription/status",
            get(subscription_status),
        )
        .route("/channels/{channel_id}/subscribers", get(channel_subscribers))
        .route("/users/me/subscriptions", get(subscribed_channels))
}
