//! Subscription endpoints

use axum::extract::{Path, State};

use super::{actor_context, viewer_context};
use crate::AppState;
use crate::api::ApiResponse;
use crate::auth::CurrentUser;
use crate::data::Subscription;
use crate::error::AppError;
use crate::service::{ChannelRow, EngagementService, SubscriberRow, ToggleOutcome, ToggleState};

/// POST /api/v1/subscriptions/toggle/:channel_id
pub async fn toggle_subscription(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<ToggleOutcome<Subscription>>, AppError> {
    let ctx = actor_context(&state, &claims);
    let outcome = EngagementService::new(state.db.clone())
        .toggle_subscription(&ctx, &channel_id)
        .await?;

    let message = match outcome.state {
        ToggleState::Active => "Subscribed successfully",
        ToggleState::Inactive => "Unsubscribed",
    };
    Ok(ApiResponse::ok(outcome, message))
}

/// GET /api/v1/subscriptions/:id/subscribers
pub async fn channel_subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<Vec<SubscriberRow>>, AppError> {
    let ctx = viewer_context(&state, None);
    let rows = EngagementService::new(state.db.clone())
        .channel_subscribers(&ctx, &channel_id)
        .await?;

    Ok(ApiResponse::ok(rows, "Subscribers fetched successfully"))
}

/// GET /api/v1/subscriptions/:id/channels
pub async fn subscribed_channels(
    State(state): State<AppState>,
    Path(subscriber_id): Path<String>,
) -> Result<ApiResponse<Vec<ChannelRow>>, AppError> {
    let ctx = viewer_context(&state, None);
    let rows = EngagementService::new(state.db.clone())
        .subscribed_channels(&ctx, &subscriber_id)
        .await?;

    Ok(ApiResponse::ok(rows, "Channels fetched successfully"))
}
