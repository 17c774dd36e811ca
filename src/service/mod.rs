//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Every call receives an explicit [`RequestContext`]; services hold no
//! per-request state.

mod comment;
mod context;
mod dashboard;
mod engagement;
mod guard;
mod pagination;
mod playlist;
mod tweet;
mod video;
mod views;

#[cfg(test)]
mod test_support;

pub use comment::CommentService;
pub use context::{ActorId, RequestContext};
pub use dashboard::{ChannelStats, DashboardService};
pub use engagement::{EngagementService, ToggleOutcome, ToggleState};
pub use guard::{Owned, assert_owner};
pub use pagination::{Page, PageRequest, paginate};
pub use playlist::PlaylistService;
pub use tweet::TweetService;
pub use video::{NewVideo, VideoListFilter, VideoService};
pub use views::*;

use crate::data::{Database, EntityId, Video};
use crate::error::{AppError, Result};

/// Parse a client-supplied ID, naming the entity in the error
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<EntityId> {
    EntityId::parse(raw).ok_or_else(|| AppError::Validation(format!("Invalid {} id", what)))
}

/// Trim a required text field; empty input is a validation error
pub(crate) fn require_text(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional patch field; present-but-blank is rejected
pub(crate) fn optional_text(value: Option<&str>, field: &str) -> Result<Option<String>> {
    value.map(|value| require_text(value, field)).transpose()
}

/// Fetch a video the actor may see
///
/// Unpublished videos exist only for their owner; everyone else gets
/// `NotFound`, the same as for a missing video.
pub(crate) async fn visible_video(
    db: &Database,
    video_id: &EntityId,
    actor: Option<&ActorId>,
) -> Result<Video> {
    let video = db
        .get_video(video_id.as_str())
        .await?
        .ok_or(AppError::NotFound("Video"))?;

    let visible =
        video.is_published || actor.is_some_and(|actor| actor.as_str() == video.owner_id);
    if !visible {
        return Err(AppError::NotFound("Video"));
    }
    Ok(video)
}
