//! Playlist endpoints

use axum::Json;
use axum::extract::{Path, State};
use axum_extra::extract::WithRejection;

use super::{actor_context, viewer_context};
use crate::AppState;
use crate::api::{ApiResponse, CreatePlaylistRequest, UpdatePlaylistRequest};
use crate::auth::CurrentUser;
use crate::data::{Playlist, PlaylistPatch};
use crate::error::AppError;
use crate::service::{PlaylistDetail, PlaylistService, PlaylistSummary};

fn build_playlist_service(state: &AppState) -> PlaylistService {
    PlaylistService::new(state.db.clone())
}

/// POST /api/v1/playlists
pub async fn create_playlist(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    WithRejection(Json(req), _): WithRejection<Json<CreatePlaylistRequest>, AppError>,
) -> Result<ApiResponse<Playlist>, AppError> {
    let ctx = actor_context(&state, &claims);
    let playlist = build_playlist_service(&state)
        .create(&ctx, &req.name, &req.description)
        .await?;

    Ok(ApiResponse::ok(playlist, "Playlist successfully created"))
}

/// GET /api/v1/playlists/user/:user_id
pub async fn user_playlists(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<PlaylistSummary>>, AppError> {
    let ctx = viewer_context(&state, None);
    let playlists = build_playlist_service(&state)
        .list_by_user(&ctx, &user_id)
        .await?;

    Ok(ApiResponse::ok(playlists, "Playlists fetched successfully"))
}

/// GET /api/v1/playlists/:playlist_id
pub async fn get_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<PlaylistDetail>, AppError> {
    let ctx = viewer_context(&state, None);
    let detail = build_playlist_service(&state)
        .get(&ctx, &playlist_id)
        .await?;

    Ok(ApiResponse::ok(detail, "Playlist fetched successfully"))
}

/// PATCH /api/v1/playlists/:playlist_id
pub async fn update_playlist(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(playlist_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<UpdatePlaylistRequest>, AppError>,
) -> Result<ApiResponse<Playlist>, AppError> {
    let ctx = actor_context(&state, &claims);
    let patch = PlaylistPatch {
        name: req.name,
        description: req.description,
    };

    let playlist = build_playlist_service(&state)
        .update(&ctx, &playlist_id, patch)
        .await?;
    Ok(ApiResponse::ok(playlist, "Playlist updated successfully"))
}

/// DELETE /api/v1/playlists/:playlist_id
pub async fn delete_playlist(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<Playlist>, AppError> {
    let ctx = actor_context(&state, &claims);
    let playlist = build_playlist_service(&state)
        .delete(&ctx, &playlist_id)
        .await?;

    Ok(ApiResponse::ok(playlist, "Playlist deleted successfully"))
}

/// POST /api/v1/playlists/:playlist_id/videos/:video_id
pub async fn add_video(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<ApiResponse<Playlist>, AppError> {
    let ctx = actor_context(&state, &claims);
    let (playlist, added) = build_playlist_service(&state)
        .add_video(&ctx, &playlist_id, &video_id)
        .await?;

    let message = if added {
        "Added to playlist"
    } else {
        "Video already in playlist"
    };
    Ok(ApiResponse::ok(playlist, message))
}

/// DELETE /api/v1/playlists/:playlist_id/videos/:video_id
pub async fn remove_video(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<ApiResponse<Playlist>, AppError> {
    let ctx = actor_context(&state, &claims);
    let (playlist, removed) = build_playlist_service(&state)
        .remove_video(&ctx, &playlist_id, &video_id)
        .await?;

    let message = if removed {
        "Video deleted from playlist"
    } else {
        "Video was not in playlist"
    };
    Ok(ApiResponse::ok(playlist, message))
}
