//! Playlist service
//!
//! Named, ordered video collections owned by a user.

use chrono::Utc;
use std::sync::Arc;

use super::context::RequestContext;
use super::guard::assert_owner;
use super::views::{PlaylistDetail, PlaylistSummary, ViewComposer};
use super::{optional_text, parse_id, require_text};
use crate::data::{Database, EntityId, Playlist, PlaylistPatch};
use crate::error::AppError;

/// Playlist service
pub struct PlaylistService {
    db: Arc<Database>,
    views: ViewComposer,
}

impl PlaylistService {
    /// Create new playlist service
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            views: ViewComposer::new(db.clone()),
            db,
        }
    }

    /// Create an empty playlist owned by the actor
    pub async fn create(
        &self,
        ctx: &RequestContext,
        name: &str,
        description: &str,
    ) -> Result<Playlist, AppError> {
        let actor = ctx.require_actor()?;
        let name = require_text(name, "name")?;
        let description = require_text(description, "description")?;

        let now = Utc::now();
        let playlist = Playlist {
            id: EntityId::new().0,
            name,
            description,
            owner_id: actor.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        ctx.bounded("create_playlist", async {
            self.db.insert_playlist(&playlist).await?;
            tracing::info!(playlist_id = %playlist.id, owner_id = %playlist.owner_id, "Playlist created");
            Ok(playlist)
        })
        .await
    }

    /// Playlists of a user with their video counts
    pub async fn list_by_user(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> Result<Vec<PlaylistSummary>, AppError> {
        let user_id = parse_id(user_id, "user")?;

        ctx.bounded("list_playlists", async {
            let playlists = self.db.find_playlists_by_owner(user_id.as_str()).await?;
            Ok(self.views.playlist_summaries(playlists).await)
        })
        .await
    }

    /// Playlist detail with its published videos in playlist order
    pub async fn get(&self, ctx: &RequestContext, playlist_id: &str) -> Result<PlaylistDetail, AppError> {
        let playlist_id = parse_id(playlist_id, "playlist")?;

        ctx.bounded("get_playlist", async {
            let playlist = self
                .db
                .get_playlist(playlist_id.as_str())
                .await?
                .ok_or(AppError::NotFound("Playlist"))?;
            let videos = self
                .db
                .get_published_playlist_videos(playlist_id.as_str())
                .await?;

            Ok(self.views.playlist_detail(playlist, videos).await)
        })
        .await
    }

    async fn owned_playlist(
        &self,
        ctx: &RequestContext,
        playlist_id: &EntityId,
    ) -> Result<Playlist, AppError> {
        let playlist = self
            .db
            .get_playlist(playlist_id.as_str())
            .await?
            .ok_or(AppError::NotFound("Playlist"))?;
        assert_owner(&playlist, ctx.actor())?;
        Ok(playlist)
    }

    /// Rename or re-describe the actor's playlist
    pub async fn update(
        &self,
        ctx: &RequestContext,
        playlist_id: &str,
        patch: PlaylistPatch,
    ) -> Result<Playlist, AppError> {
        let playlist_id = parse_id(playlist_id, "playlist")?;
        let patch = PlaylistPatch {
            name: optional_text(patch.name.as_deref(), "name")?,
            description: optional_text(patch.description.as_deref(), "description")?,
        };
        if patch.is_empty() {
            return Err(AppError::Validation(
                "name or description is required".to_string(),
            ));
        }

        ctx.bounded("update_playlist", async {
            self.owned_playlist(ctx, &playlist_id).await?;

            let playlist = self
                .db
                .update_playlist(playlist_id.as_str(), &patch)
                .await?
                .ok_or(AppError::NotFound("Playlist"))?;
            tracing::info!(playlist_id = %playlist.id, "Playlist updated");
            Ok(playlist)
        })
        .await
    }

    /// Delete the actor's playlist
    pub async fn delete(&self, ctx: &RequestContext, playlist_id: &str) -> Result<Playlist, AppError> {
        let playlist_id = parse_id(playlist_id, "playlist")?;

        ctx.bounded("delete_playlist", async {
            self.owned_playlist(ctx, &playlist_id).await?;

            let playlist = self
                .db
                .delete_playlist(playlist_id.as_str())
                .await?
                .ok_or(AppError::NotFound("Playlist"))?;
            tracing::info!(playlist_id = %playlist.id, "Playlist deleted");
            Ok(playlist)
        })
        .await
    }

    /// Append a video to the actor's playlist
    ///
    /// # Returns
    /// The playlist and whether the video was newly added; adding a
    /// member again is a no-op.
    pub async fn add_video(
        &self,
        ctx: &RequestContext,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<(Playlist, bool), AppError> {
        let playlist_id = parse_id(playlist_id, "playlist")?;
        let video_id = parse_id(video_id, "video")?;

        ctx.bounded("add_playlist_video", async {
            let playlist = self.owned_playlist(ctx, &playlist_id).await?;
            if self.db.get_video(video_id.as_str()).await?.is_none() {
                return Err(AppError::NotFound("Video"));
            }

            let added = self
                .db
                .add_video_to_playlist(playlist_id.as_str(), video_id.as_str())
                .await?;
            tracing::info!(
                playlist_id = %playlist_id,
                video_id = %video_id,
                added,
                "Playlist video added"
            );
            Ok((playlist, added))
        })
        .await
    }

    /// Remove a video from the actor's playlist
    ///
    /// # Returns
    /// The playlist and whether the video was a member
    pub async fn remove_video(
        &self,
        ctx: &RequestContext,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<(Playlist, bool), AppError> {
        let playlist_id = parse_id(playlist_id, "playlist")?;
        let video_id = parse_id(video_id, "video")?;

        ctx.bounded("remove_playlist_video", async {
            let playlist = self.owned_playlist(ctx, &playlist_id).await?;
            if self.db.get_video(video_id.as_str()).await?.is_none() {
                return Err(AppError::NotFound("Video"));
            }

            let removed = self
                .db
                .remove_video_from_playlist(playlist_id.as_str(), video_id.as_str())
                .await?;
            tracing::info!(
                playlist_id = %playlist_id,
                video_id = %video_id,
                removed,
                "Playlist video removed"
            );
            Ok((playlist, removed))
        })
        .await
    }
}
