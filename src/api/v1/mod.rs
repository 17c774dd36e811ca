//! VidTube HTTP API, version 1
//!
//! Handlers are thin: they resolve the request context, build the
//! service they need, call it once and wrap the result in the envelope.

mod comments;
mod dashboard;
mod likes;
mod playlists;
mod subscriptions;
mod tweets;
mod videos;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::AppState;
use crate::auth::{AccessClaims, require_auth};
use crate::service::{ActorId, PageRequest, RequestContext};
use crate::error::AppError;

/// Create the `/api/v1` router
///
/// Routes that read public data accept anonymous viewers; everything
/// that writes sits behind `require_auth`.
pub fn v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/videos", get(videos::list_videos))
        .route("/videos/:video_id", get(videos::get_video))
        .route("/comments/:video_id", get(comments::list_comments))
        .route("/tweets/user/:user_id", get(tweets::user_tweets))
        .route("/playlists/user/:user_id", get(playlists::user_playlists))
        .route("/playlists/:playlist_id", get(playlists::get_playlist))
        // Channel and subscriber ids share a segment, so the name is shared too
        .route(
            "/subscriptions/:id/subscribers",
            get(subscriptions::channel_subscribers),
        )
        .route(
            "/subscriptions/:id/channels",
            get(subscriptions::subscribed_channels),
        );

    let authenticated_routes = Router::new()
        // Likes
        .route("/likes/toggle/video/:video_id", post(likes::toggle_video_like))
        .route(
            "/likes/toggle/comment/:comment_id",
            post(likes::toggle_comment_like),
        )
        .route("/likes/toggle/tweet/:tweet_id", post(likes::toggle_tweet_like))
        .route("/likes/liked-videos", get(likes::liked_videos))
        // Subscriptions
        .route(
            "/subscriptions/toggle/:channel_id",
            post(subscriptions::toggle_subscription),
        )
        // Videos
        .route("/videos", post(videos::publish_video))
        .route(
            "/videos/:video_id",
            patch(videos::update_video).delete(videos::delete_video),
        )
        .route(
            "/videos/toggle/publish/:video_id",
            patch(videos::toggle_publish),
        )
        // Comments
        .route("/comments/:video_id", post(comments::add_comment))
        .route(
            "/comments/c/:comment_id",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        // Tweets
        .route("/tweets", post(tweets::create_tweet))
        .route(
            "/tweets/:tweet_id",
            patch(tweets::update_tweet).delete(tweets::delete_tweet),
        )
        // Playlists
        .route("/playlists", post(playlists::create_playlist))
        .route(
            "/playlists/:playlist_id",
            patch(playlists::update_playlist).delete(playlists::delete_playlist),
        )
        .route(
            "/playlists/:playlist_id/videos/:video_id",
            post(playlists::add_video).delete(playlists::remove_video),
        )
        // Dashboard
        .route("/dashboard/stats", get(dashboard::channel_stats))
        .route("/dashboard/videos", get(dashboard::channel_videos))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public_routes.merge(authenticated_routes)
}

/// Context for a route behind `require_auth`
fn actor_context(state: &AppState, claims: &AccessClaims) -> RequestContext {
    RequestContext::authenticated(
        ActorId::from(claims),
        state.config.database.operation_timeout(),
    )
}

/// Context for a route that also serves anonymous viewers
fn viewer_context(state: &AppState, claims: Option<&AccessClaims>) -> RequestContext {
    RequestContext::new(
        claims.map(ActorId::from),
        state.config.database.operation_timeout(),
    )
}

fn page_request(
    state: &AppState,
    page: Option<&str>,
    limit: Option<&str>,
) -> Result<PageRequest, AppError> {
    PageRequest::from_params(page, limit, &state.config.pagination)
}
