//! Channel dashboard endpoints

use axum::extract::State;

use super::actor_context;
use crate::AppState;
use crate::api::ApiResponse;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::{ChannelStats, ChannelVideoRow, DashboardService};

/// GET /api/v1/dashboard/stats
pub async fn channel_stats(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<ApiResponse<ChannelStats>, AppError> {
    let ctx = actor_context(&state, &claims);
    let stats = DashboardService::new(state.db.clone()).stats(&ctx).await?;

    Ok(ApiResponse::ok(stats, "Channel stats fetched successfully"))
}

/// GET /api/v1/dashboard/videos
pub async fn channel_videos(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<ApiResponse<Vec<ChannelVideoRow>>, AppError> {
    let ctx = actor_context(&state, &claims);
    let videos = DashboardService::new(state.db.clone()).videos(&ctx).await?;

    Ok(ApiResponse::ok(videos, "Videos fetched successfully"))
}
