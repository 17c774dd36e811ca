//! Video endpoints

use axum::Json;
use axum::extract::{Path, Query, State};
use axum_extra::extract::WithRejection;

use super::{actor_context, page_request, viewer_context};
use crate::AppState;
use crate::api::{ApiResponse, CreateVideoRequest, UpdateVideoRequest, VideoListParams};
use crate::auth::{CurrentUser, MaybeUser};
use crate::data::{Video, VideoPatch};
use crate::error::AppError;
use crate::service::{NewVideo, Page, VideoListFilter, VideoRow, VideoService};

fn build_video_service(state: &AppState) -> VideoService {
    VideoService::new(state.db.clone(), state.config.content.cascade_deletes)
}

/// GET /api/v1/videos
///
/// Query params: page, limit, query, sortBy, sortType, userId
pub async fn list_videos(
    State(state): State<AppState>,
    MaybeUser(claims): MaybeUser,
    WithRejection(Query(params), _): WithRejection<Query<VideoListParams>, AppError>,
) -> Result<ApiResponse<Page<VideoRow>>, AppError> {
    let ctx = viewer_context(&state, claims.as_ref());
    let request = page_request(&state, params.page.as_deref(), params.limit.as_deref())?;
    let filter = VideoListFilter {
        query: params.query,
        user_id: params.user_id,
        sort_by: params.sort_by,
        sort_type: params.sort_type,
    };

    let page = build_video_service(&state)
        .list(&ctx, filter, request)
        .await?;
    Ok(ApiResponse::ok(page, "Videos fetched successfully"))
}

/// POST /api/v1/videos
pub async fn publish_video(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    WithRejection(Json(req), _): WithRejection<Json<CreateVideoRequest>, AppError>,
) -> Result<ApiResponse<VideoRow>, AppError> {
    let ctx = actor_context(&state, &claims);
    let input = NewVideo {
        title: req.title,
        description: req.description,
        video_file: req.video_file,
        thumbnail: req.thumbnail,
        duration: req.duration,
    };

    let video = build_video_service(&state).publish(&ctx, input).await?;
    Ok(ApiResponse::ok(video, "Video published successfully"))
}

/// GET /api/v1/videos/:video_id
pub async fn get_video(
    State(state): State<AppState>,
    MaybeUser(claims): MaybeUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<VideoRow>, AppError> {
    let ctx = viewer_context(&state, claims.as_ref());
    let video = build_video_service(&state).get(&ctx, &video_id).await?;

    Ok(ApiResponse::ok(video, "Video fetched successfully"))
}

/// PATCH /api/v1/videos/:video_id
pub async fn update_video(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(video_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateVideoRequest>, AppError>,
) -> Result<ApiResponse<Video>, AppError> {
    let ctx = actor_context(&state, &claims);
    let patch = VideoPatch {
        title: req.title,
        description: req.description,
        thumbnail: req.thumbnail,
    };

    let video = build_video_service(&state)
        .update(&ctx, &video_id, patch)
        .await?;
    Ok(ApiResponse::ok(video, "Video updated successfully"))
}

/// DELETE /api/v1/videos/:video_id
pub async fn delete_video(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Video>, AppError> {
    let ctx = actor_context(&state, &claims);
    let video = build_video_service(&state).delete(&ctx, &video_id).await?;

    Ok(ApiResponse::ok(video, "Video deleted successfully"))
}

/// PATCH /api/v1/videos/toggle/publish/:video_id
pub async fn toggle_publish(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Video>, AppError> {
    let ctx = actor_context(&state, &claims);
    let video = build_video_service(&state)
        .toggle_publish(&ctx, &video_id)
        .await?;

    Ok(ApiResponse::ok(video, "Publish status updated"))
}
