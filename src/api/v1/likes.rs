//! Like endpoints

use axum::extract::{Path, State};

use super::actor_context;
use crate::AppState;
use crate::api::ApiResponse;
use crate::auth::{AccessClaims, CurrentUser};
use crate::data::{Like, LikeKind};
use crate::error::AppError;
use crate::service::{EngagementService, LikedVideoRow, ToggleOutcome, ToggleState};

fn build_engagement_service(state: &AppState) -> EngagementService {
    EngagementService::new(state.db.clone())
}

async fn toggle(
    state: AppState,
    claims: &AccessClaims,
    kind: LikeKind,
    target_id: &str,
    liked_message: &'static str,
) -> Result<ApiResponse<ToggleOutcome<Like>>, AppError> {
    let ctx = actor_context(&state, claims);
    let outcome = build_engagement_service(&state)
        .toggle_like(&ctx, kind, target_id)
        .await?;

    let message = match outcome.state {
        ToggleState::Active => liked_message,
        ToggleState::Inactive => "Like removed",
    };
    Ok(ApiResponse::ok(outcome, message))
}

/// POST /api/v1/likes/toggle/video/:video_id
pub async fn toggle_video_like(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<ToggleOutcome<Like>>, AppError> {
    toggle(state, &claims, LikeKind::Video, &video_id, "Video liked successfully").await
}

/// POST /api/v1/likes/toggle/comment/:comment_id
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<ToggleOutcome<Like>>, AppError> {
    toggle(
        state,
        &claims,
        LikeKind::Comment,
        &comment_id,
        "Comment liked successfully",
    )
    .await
}

/// POST /api/v1/likes/toggle/tweet/:tweet_id
pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<ToggleOutcome<Like>>, AppError> {
    toggle(state, &claims, LikeKind::Tweet, &tweet_id, "Tweet liked successfully").await
}

/// GET /api/v1/likes/liked-videos
pub async fn liked_videos(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<ApiResponse<Vec<LikedVideoRow>>, AppError> {
    let ctx = actor_context(&state, &claims);
    let rows = build_engagement_service(&state).liked_videos(&ctx).await?;

    Ok(ApiResponse::ok(rows, "Liked videos fetched successfully"))
}
