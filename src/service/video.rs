//! Video service
//!
//! Publishing, listing and owner-only mutation of videos. Media files
//! are uploaded elsewhere; this service only records their URLs.

use chrono::Utc;
use std::sync::Arc;

use super::context::RequestContext;
use super::guard::assert_owner;
use super::pagination::{Page, PageRequest, paginate};
use super::views::{VideoRow, ViewComposer};
use super::{optional_text, parse_id, require_text, visible_video};
use crate::data::{
    Database, EntityId, SortDirection, Video, VideoPatch, VideoQuery, VideoSortKey,
};
use crate::error::AppError;

/// Fields of a video being published
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    /// Seconds
    pub duration: f64,
}

/// Raw list parameters as received from the client
#[derive(Debug, Clone, Default)]
pub struct VideoListFilter {
    pub query: Option<String>,
    pub user_id: Option<String>,
    /// `atoz`, `ztoa` or `createdAt`
    pub sort_by: Option<String>,
    /// `asc` or `desc`
    pub sort_type: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl VideoListFilter {
    /// Resolve into a store query for the given context
    ///
    /// Unpublished videos are included only when the actor lists their
    /// own channel.
    fn into_query(self, ctx: &RequestContext) -> Result<VideoQuery, AppError> {
        let direction = match non_blank(self.sort_type).as_deref() {
            None => SortDirection::Desc,
            Some(value) if value.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            Some(value) if value.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "sortType must be asc or desc, got {}",
                    other
                )));
            }
        };

        let (sort_key, direction) = match non_blank(self.sort_by).as_deref() {
            None | Some("createdAt") => (VideoSortKey::CreatedAt, direction),
            Some("atoz") => (VideoSortKey::Title, SortDirection::Asc),
            Some("ztoa") => (VideoSortKey::Title, SortDirection::Desc),
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "sortBy must be atoz, ztoa or createdAt, got {}",
                    other
                )));
            }
        };

        let owner_id = non_blank(self.user_id)
            .map(|raw| parse_id(&raw, "user"))
            .transpose()?;
        let include_unpublished = match (&owner_id, ctx.actor()) {
            (Some(owner_id), Some(actor)) => owner_id.as_str() == actor.as_str(),
            _ => false,
        };

        Ok(VideoQuery {
            search: non_blank(self.query),
            owner_id: owner_id.map(|id| id.0),
            include_unpublished,
            sort_key,
            direction,
        })
    }
}

/// Video service
pub struct VideoService {
    db: Arc<Database>,
    views: ViewComposer,
    cascade_deletes: bool,
}

impl VideoService {
    /// Create new video service
    pub fn new(db: Arc<Database>, cascade_deletes: bool) -> Self {
        Self {
            views: ViewComposer::new(db.clone()),
            db,
            cascade_deletes,
        }
    }

    /// Paginated, filterable video list
    pub async fn list(
        &self,
        ctx: &RequestContext,
        filter: VideoListFilter,
        page: PageRequest,
    ) -> Result<Page<VideoRow>, AppError> {
        let query = filter.into_query(ctx)?;

        ctx.bounded("list_videos", async {
            let total = self.db.count_videos(&query).await?;
            let mut page = paginate(page, total, |offset, limit| {
                self.db.find_videos(&query, offset, limit)
            })
            .await?;

            let videos = std::mem::take(&mut page.items);
            let rows = self.views.video_rows(videos, ctx.actor()).await;
            Ok(page.map(|_| rows))
        })
        .await
    }

    /// Publish a video from already uploaded media
    pub async fn publish(&self, ctx: &RequestContext, input: NewVideo) -> Result<VideoRow, AppError> {
        let actor = ctx.require_actor()?;

        let title = require_text(&input.title, "title")?;
        let description = require_text(&input.description, "description")?;
        let video_file = require_text(&input.video_file, "videoFile")?;
        let thumbnail = require_text(&input.thumbnail, "thumbnail")?;
        if !input.duration.is_finite() || input.duration < 0.0 {
            return Err(AppError::Validation(
                "duration must be a non-negative number".to_string(),
            ));
        }

        let now = Utc::now();
        let video = Video {
            id: EntityId::new().0,
            video_file,
            thumbnail,
            title,
            description,
            duration: input.duration,
            views: 0,
            is_published: true,
            owner_id: actor.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        ctx.bounded("publish_video", async {
            self.db.insert_video(&video).await?;
            tracing::info!(video_id = %video.id, owner_id = %video.owner_id, "Video published");

            let mut rows = self.views.video_rows(vec![video], ctx.actor()).await;
            rows.pop()
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("video row missing after insert")))
        })
        .await
    }

    /// A single video
    ///
    /// Unpublished videos are only visible to their owner; everyone else
    /// gets `NotFound`.
    pub async fn get(&self, ctx: &RequestContext, video_id: &str) -> Result<VideoRow, AppError> {
        let video_id = parse_id(video_id, "video")?;

        ctx.bounded("get_video", async {
            let video = visible_video(&self.db, &video_id, ctx.actor()).await?;

            let mut rows = self.views.video_rows(vec![video], ctx.actor()).await;
            rows.pop().ok_or(AppError::NotFound("Video"))
        })
        .await
    }

    /// Fetch a video and check the actor owns it
    async fn owned_video(&self, ctx: &RequestContext, video_id: &EntityId) -> Result<Video, AppError> {
        let video = self
            .db
            .get_video(video_id.as_str())
            .await?
            .ok_or(AppError::NotFound("Video"))?;
        assert_owner(&video, ctx.actor())?;
        Ok(video)
    }

    /// Update title, description or thumbnail
    pub async fn update(
        &self,
        ctx: &RequestContext,
        video_id: &str,
        patch: VideoPatch,
    ) -> Result<Video, AppError> {
        let video_id = parse_id(video_id, "video")?;
        let patch = VideoPatch {
            title: optional_text(patch.title.as_deref(), "title")?,
            description: optional_text(patch.description.as_deref(), "description")?,
            thumbnail: optional_text(patch.thumbnail.as_deref(), "thumbnail")?,
        };
        if patch.is_empty() {
            return Err(AppError::Validation(
                "title, description or thumbnail is required".to_string(),
            ));
        }

        ctx.bounded("update_video", async {
            self.owned_video(ctx, &video_id).await?;

            let video = self
                .db
                .update_video(video_id.as_str(), &patch)
                .await?
                .ok_or(AppError::NotFound("Video"))?;
            tracing::info!(video_id = %video.id, "Video updated");
            Ok(video)
        })
        .await
    }

    /// Delete a video, cascading per configuration
    pub async fn delete(&self, ctx: &RequestContext, video_id: &str) -> Result<Video, AppError> {
        let video_id = parse_id(video_id, "video")?;

        ctx.bounded("delete_video", async {
            self.owned_video(ctx, &video_id).await?;

            let video = self
                .db
                .delete_video(video_id.as_str(), self.cascade_deletes)
                .await?
                .ok_or(AppError::NotFound("Video"))?;
            tracing::info!(
                video_id = %video.id,
                cascade = self.cascade_deletes,
                "Video deleted"
            );
            Ok(video)
        })
        .await
    }

    /// Flip the published flag
    pub async fn toggle_publish(
        &self,
        ctx: &RequestContext,
        video_id: &str,
    ) -> Result<Video, AppError> {
        let video_id = parse_id(video_id, "video")?;

        ctx.bounded("toggle_publish", async {
            self.owned_video(ctx, &video_id).await?;

            let video = self
                .db
                .toggle_video_published(video_id.as_str())
                .await?
                .ok_or(AppError::NotFound("Video"))?;
            tracing::info!(
                video_id = %video.id,
                is_published = video.is_published,
                "Video publish status toggled"
            );
            Ok(video)
        })
        .await
    }
}
