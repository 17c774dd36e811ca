//! Comment endpoints

use axum::Json;
use axum::extract::{Path, Query, State};
use axum_extra::extract::WithRejection;

use super::{actor_context, page_request, viewer_context};
use crate::AppState;
use crate::api::{ApiResponse, ContentRequest, PageParams};
use crate::auth::{CurrentUser, MaybeUser};
use crate::data::Comment;
use crate::error::AppError;
use crate::service::{CommentRow, CommentService, Page};

fn build_comment_service(state: &AppState) -> CommentService {
    CommentService::new(state.db.clone(), state.config.content.cascade_deletes)
}

/// GET /api/v1/comments/:video_id
pub async fn list_comments(
    State(state): State<AppState>,
    MaybeUser(claims): MaybeUser,
    Path(video_id): Path<String>,
    WithRejection(Query(params), _): WithRejection<Query<PageParams>, AppError>,
) -> Result<ApiResponse<Page<CommentRow>>, AppError> {
    let ctx = viewer_context(&state, claims.as_ref());
    let request = page_request(&state, params.page.as_deref(), params.limit.as_deref())?;

    let page = build_comment_service(&state)
        .list(&ctx, &video_id, request)
        .await?;
    Ok(ApiResponse::ok(page, "Comments fetched successfully"))
}

/// POST /api/v1/comments/:video_id
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(video_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<ContentRequest>, AppError>,
) -> Result<ApiResponse<Comment>, AppError> {
    let ctx = actor_context(&state, &claims);
    let comment = build_comment_service(&state)
        .add(&ctx, &video_id, &req.content)
        .await?;

    Ok(ApiResponse::ok(comment, "Comment posted successfully"))
}

/// PATCH /api/v1/comments/c/:comment_id
pub async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(comment_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<ContentRequest>, AppError>,
) -> Result<ApiResponse<Comment>, AppError> {
    let ctx = actor_context(&state, &claims);
    let comment = build_comment_service(&state)
        .update(&ctx, &comment_id, &req.content)
        .await?;

    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

/// DELETE /api/v1/comments/c/:comment_id
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<Comment>, AppError> {
    let ctx = actor_context(&state, &claims);
    let comment = build_comment_service(&state)
        .delete(&ctx, &comment_id)
        .await?;

    Ok(ApiResponse::ok(comment, "Comment deleted successfully"))
}
