//! Comment service
//!
//! Comment feed per video plus owner-only edit and delete.

use chrono::Utc;
use std::sync::Arc;

use super::context::RequestContext;
use super::guard::assert_owner;
use super::pagination::{Page, PageRequest, paginate};
use super::views::{CommentRow, ViewComposer};
use super::{parse_id, require_text, visible_video};
use crate::data::{Comment, Database, EntityId};
use crate::error::AppError;

/// Comment service
pub struct CommentService {
    db: Arc<Database>,
    views: ViewComposer,
    cascade_deletes: bool,
}

impl CommentService {
    /// Create new comment service
    pub fn new(db: Arc<Database>, cascade_deletes: bool) -> Self {
        Self {
            views: ViewComposer::new(db.clone()),
            db,
            cascade_deletes,
        }
    }

    /// Comments on a video, newest first
    ///
    /// An unpublished video has no visible feed for anyone but its owner.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        video_id: &str,
        page: PageRequest,
    ) -> Result<Page<CommentRow>, AppError> {
        let video_id = parse_id(video_id, "video")?;

        ctx.bounded("list_comments", async {
            visible_video(&self.db, &video_id, ctx.actor()).await?;

            let total = self.db.count_comments_by_video(video_id.as_str()).await?;
            let mut page = paginate(page, total, |offset, limit| {
                self.db
                    .find_comments_by_video(video_id.as_str(), offset, limit)
            })
            .await?;

            let comments = std::mem::take(&mut page.items);
            let rows = self.views.comment_rows(comments, ctx.actor()).await;
            Ok(page.map(|_| rows))
        })
        .await
    }

    /// Comment on a video
    pub async fn add(
        &self,
        ctx: &RequestContext,
        video_id: &str,
        content: &str,
    ) -> Result<Comment, AppError> {
        let actor = ctx.require_actor()?;
        let video_id = parse_id(video_id, "video")?;
        let content = require_text(content, "content")?;

        ctx.bounded("add_comment", async {
            visible_video(&self.db, &video_id, ctx.actor()).await?;

            let now = Utc::now();
            let comment = Comment {
                id: EntityId::new().0,
                content,
                video_id: video_id.0.clone(),
                owner_id: actor.as_str().to_string(),
                created_at: now,
                updated_at: now,
            };
            self.db.insert_comment(&comment).await?;
            tracing::info!(comment_id = %comment.id, video_id = %comment.video_id, "Comment added");

            Ok(comment)
        })
        .await
    }

    async fn owned_comment(
        &self,
        ctx: &RequestContext,
        comment_id: &EntityId,
    ) -> Result<Comment, AppError> {
        let comment = self
            .db
            .get_comment(comment_id.as_str())
            .await?
            .ok_or(AppError::NotFound("Comment"))?;
        assert_owner(&comment, ctx.actor())?;
        Ok(comment)
    }

    /// Replace the content of the actor's comment
    pub async fn update(
        &self,
        ctx: &RequestContext,
        comment_id: &str,
        content: &str,
    ) -> Result<Comment, AppError> {
        let comment_id = parse_id(comment_id, "comment")?;
        let content = require_text(content, "content")?;

        ctx.bounded("update_comment", async {
            self.owned_comment(ctx, &comment_id).await?;

            let comment = self
                .db
                .update_comment_content(comment_id.as_str(), &content)
                .await?
                .ok_or(AppError::NotFound("Comment"))?;
            tracing::info!(comment_id = %comment.id, "Comment updated");
            Ok(comment)
        })
        .await
    }

    /// Delete the actor's comment
    pub async fn delete(&self, ctx: &RequestContext, comment_id: &str) -> Result<Comment, AppError> {
        let comment_id = parse_id(comment_id, "comment")?;

        ctx.bounded("delete_comment", async {
            self.owned_comment(ctx, &comment_id).await?;

            let comment = self
                .db
                .delete_comment(comment_id.as_str(), self.cascade_deletes)
                .await?
                .ok_or(AppError::NotFound("Comment"))?;
            tracing::info!(comment_id = %comment.id, cascade = self.cascade_deletes, "Comment deleted");
            Ok(comment)
        })
        .await
    }
}
