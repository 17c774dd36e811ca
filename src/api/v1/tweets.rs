//! Tweet endpoints

use axum::Json;
use axum::extract::{Path, State};
use axum_extra::extract::WithRejection;

use super::{actor_context, viewer_context};
use crate::AppState;
use crate::api::{ApiResponse, ContentRequest};
use crate::auth::{CurrentUser, MaybeUser};
use crate::data::Tweet;
use crate::error::AppError;
use crate::service::{TweetRow, TweetService};

fn build_tweet_service(state: &AppState) -> TweetService {
    TweetService::new(state.db.clone(), state.config.content.cascade_deletes)
}

/// POST /api/v1/tweets
pub async fn create_tweet(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    WithRejection(Json(req), _): WithRejection<Json<ContentRequest>, AppError>,
) -> Result<ApiResponse<Tweet>, AppError> {
    let ctx = actor_context(&state, &claims);
    let tweet = build_tweet_service(&state)
        .create(&ctx, &req.content)
        .await?;

    Ok(ApiResponse::ok(tweet, "Tweet successfully created"))
}

/// GET /api/v1/tweets/user/:user_id
pub async fn user_tweets(
    State(state): State<AppState>,
    MaybeUser(claims): MaybeUser,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<TweetRow>>, AppError> {
    let ctx = viewer_context(&state, claims.as_ref());
    let rows = build_tweet_service(&state)
        .list_by_user(&ctx, &user_id)
        .await?;

    Ok(ApiResponse::ok(rows, "User tweets fetched successfully"))
}

/// PATCH /api/v1/tweets/:tweet_id
pub async fn update_tweet(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tweet_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<ContentRequest>, AppError>,
) -> Result<ApiResponse<Tweet>, AppError> {
    let ctx = actor_context(&state, &claims);
    let tweet = build_tweet_service(&state)
        .update(&ctx, &tweet_id, &req.content)
        .await?;

    Ok(ApiResponse::ok(tweet, "Tweet updated successfully"))
}

/// DELETE /api/v1/tweets/:tweet_id
pub async fn delete_tweet(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<Tweet>, AppError> {
    let ctx = actor_context(&state, &claims);
    let tweet = build_tweet_service(&state).delete(&ctx, &tweet_id).await?;

    Ok(ApiResponse::ok(tweet, "Tweet deleted successfully"))
}
