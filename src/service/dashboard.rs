//! Channel dashboard
//!
//! Aggregates for the acting user's own channel.

use serde::Serialize;
use std::sync::Arc;

use super::context::RequestContext;
use super::views::{ChannelVideoRow, ViewComposer};
use crate::data::Database;
use crate::error::AppError;

/// Totals shown on the channel dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_subscribers: i64,
    pub total_likes: i64,
    pub total_videos: i64,
    pub total_views: i64,
}

/// Dashboard service
pub struct DashboardService {
    db: Arc<Database>,
    views: ViewComposer,
}

impl DashboardService {
    /// Create new dashboard service
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            views: ViewComposer::new(db.clone()),
            db,
        }
    }

    /// Subscriber, like, video and view totals for the actor's channel
    pub async fn stats(&self, ctx: &RequestContext) -> Result<ChannelStats, AppError> {
        let actor = ctx.require_actor()?;

        ctx.bounded("channel_stats", async {
            let totals = self.db.channel_totals(actor.as_str()).await?;
            Ok(ChannelStats {
                total_subscribers: totals.total_subscribers,
                total_likes: totals.total_likes,
                total_videos: totals.total_videos,
                total_views: totals.total_views,
            })
        })
        .await
    }

    /// Every video of the actor's channel, unpublished ones included
    pub async fn videos(&self, ctx: &RequestContext) -> Result<Vec<ChannelVideoRow>, AppError> {
        let actor = ctx.require_actor()?;

        ctx.bounded("channel_videos", async {
            let videos = self.db.find_videos_by_owner(actor.as_str()).await?;
            Ok(self.views.channel_video_rows(videos).await)
        })
        .await
    }
}
