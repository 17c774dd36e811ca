//! Ownership checks for guarded mutations

use super::context::ActorId;
use crate::data::{Comment, Playlist, Tweet, Video};
use crate::error::AppError;

/// A resource with a single owning user
pub trait Owned {
    /// Resource name used in the `Forbidden` message
    const KIND: &'static str;

    fn owner_id(&self) -> &str;
}

impl Owned for Video {
    const KIND: &'static str = "video";

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Owned for Comment {
    const KIND: &'static str = "comment";

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Owned for Tweet {
    const KIND: &'static str = "tweet";

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Owned for Playlist {
    const KIND: &'static str = "playlist";

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

/// Fail with `Forbidden` unless `actor` owns `resource`
///
/// A missing actor never matches, whatever the resource holds.
/// Must run before any mutating store call.
pub fn assert_owner<R: Owned>(resource: &R, actor: Option<&ActorId>) -> Result<(), AppError> {
    match actor {
        Some(actor) if actor.as_str() == resource.owner_id() => Ok(()),
        _ => {
            tracing::info!(
                resource = R::KIND,
                owner_id = %resource.owner_id(),
                actor = ?actor.map(ActorId::as_str),
                "Ownership check failed"
            );
            Err(AppError::Forbidden(R::KIND))
        }
    }
}
