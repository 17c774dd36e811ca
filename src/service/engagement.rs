//! Engagement service
//!
//! Likes and subscriptions: atomic toggles plus the list views built on
//! top of them.

use serde::Serialize;
use std::sync::Arc;

use super::context::RequestContext;
use super::{parse_id, visible_video};
use super::views::{ChannelRow, LikedVideoRow, SubscriberRow, ViewComposer};
use crate::data::{Database, Like, LikeKind, Subscription, Toggled};
use crate::error::AppError;
use crate::metrics::TOGGLES_TOTAL;

/// State of a binary relation after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    Active,
    Inactive,
}

impl ToggleState {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// Which transition a toggle performed
///
/// `record` is the created edge on activation and `None` on deactivation.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleOutcome<T> {
    pub state: ToggleState,
    pub record: Option<T>,
}

impl<T> From<Toggled<T>> for ToggleOutcome<T> {
    fn from(toggled: Toggled<T>) -> Self {
        match toggled {
            Toggled::Activated(record) => Self {
                state: ToggleState::Active,
                record: Some(record),
            },
            Toggled::Deactivated => Self {
                state: ToggleState::Inactive,
                record: None,
            },
        }
    }
}

fn record_toggle(relation: &'static str, state: ToggleState) {
    TOGGLES_TOTAL
        .with_label_values(&[relation, state.as_str()])
        .inc();
}

/// Engagement service
pub struct EngagementService {
    db: Arc<Database>,
    views: ViewComposer,
}

impl EngagementService {
    /// Create new engagement service
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            views: ViewComposer::new(db.clone()),
            db,
        }
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Flip the actor's like on a video, comment or tweet
    ///
    /// # Errors
    /// - `Unauthorized` without an actor
    /// - `Validation` for a malformed target ID
    /// - `NotFound` if the target does not exist, or is a video the actor
    ///   cannot see
    pub async fn toggle_like(
        &self,
        ctx: &RequestContext,
        kind: LikeKind,
        target_id: &str,
    ) -> Result<ToggleOutcome<Like>, AppError> {
        let actor = ctx.require_actor()?;
        let target_id = parse_id(target_id, kind.as_str())?;

        ctx.bounded("toggle_like", async {
            let exists = match kind {
                LikeKind::Video => {
                    visible_video(&self.db, &target_id, ctx.actor()).await?;
                    true
                }
                LikeKind::Comment => self.db.get_comment(target_id.as_str()).await?.is_some(),
                LikeKind::Tweet => self.db.get_tweet(target_id.as_str()).await?.is_some(),
            };
            if !exists {
                return Err(AppError::NotFound(match kind {
                    LikeKind::Video => "Video",
                    LikeKind::Comment => "Comment",
                    LikeKind::Tweet => "Tweet",
                }));
            }

            let outcome = ToggleOutcome::from(
                self.db
                    .toggle_like(actor.as_str(), kind, target_id.as_str())
                    .await?,
            );

            tracing::debug!(
                actor = %actor,
                kind = kind.as_str(),
                target_id = %target_id,
                state = outcome.state.as_str(),
                "Like toggled"
            );
            record_toggle("like", outcome.state);

            Ok(outcome)
        })
        .await
    }

    /// Videos the actor has liked, most recent like first
    pub async fn liked_videos(&self, ctx: &RequestContext) -> Result<Vec<LikedVideoRow>, AppError> {
        let actor = ctx.require_actor()?;

        ctx.bounded("liked_videos", async {
            let likes = self
                .db
                .find_likes_by_actor(actor.as_str(), LikeKind::Video)
                .await?;
            self.views.liked_video_rows(likes).await
        })
        .await
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Flip the actor's subscription to a channel
    ///
    /// Subscribing to one's own channel is permitted.
    pub async fn toggle_subscription(
        &self,
        ctx: &RequestContext,
        channel_id: &str,
    ) -> Result<ToggleOutcome<Subscription>, AppError> {
        let actor = ctx.require_actor()?;
        let channel_id = parse_id(channel_id, "channel")?;

        ctx.bounded("toggle_subscription", async {
            if self.db.get_user(channel_id.as_str()).await?.is_none() {
                return Err(AppError::NotFound("Channel"));
            }

            let outcome = ToggleOutcome::from(
                self.db
                    .toggle_subscription(actor.as_str(), channel_id.as_str())
                    .await?,
            );

            tracing::debug!(
                actor = %actor,
                channel_id = %channel_id,
                state = outcome.state.as_str(),
                "Subscription toggled"
            );
            record_toggle("subscription", outcome.state);

            Ok(outcome)
        })
        .await
    }

    /// Subscribers of a channel, newest first
    ///
    /// # Errors
    /// `NotFound` if the channel does not exist
    pub async fn channel_subscribers(
        &self,
        ctx: &RequestContext,
        channel_id: &str,
    ) -> Result<Vec<SubscriberRow>, AppError> {
        let channel_id = parse_id(channel_id, "channel")?;

        ctx.bounded("channel_subscribers", async {
            if self.db.get_user(channel_id.as_str()).await?.is_none() {
                return Err(AppError::NotFound("Channel"));
            }

            let subscriptions = self
                .db
                .find_subscriptions_by_channel(channel_id.as_str())
                .await?;
            Ok(self.views.subscriber_rows(subscriptions).await)
        })
        .await
    }

    /// Channels a user subscribes to, with their subscriber counts
    ///
    /// # Errors
    /// `NotFound` if the user does not exist
    pub async fn subscribed_channels(
        &self,
        ctx: &RequestContext,
        subscriber_id: &str,
    ) -> Result<Vec<ChannelRow>, AppError> {
        let subscriber_id = parse_id(subscriber_id, "subscriber")?;

        ctx.bounded("subscribed_channels", async {
            if self.db.get_user(subscriber_id.as_str()).await?.is_none() {
                return Err(AppError::NotFound("User"));
            }

            let subscriptions = self
                .db
                .find_subscriptions_by_subscriber(subscriber_id.as_str())
                .await?;
            Ok(self.views.channel_rows(subscriptions).await)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EntityId;
    use crate::service::test_support::{
        anonymous_ctx, create_test_db, ctx_for, seed_user, seed_video,
    };

    #[tokio::test]
    async fn like_then_unlike_video() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_user(&db, "alice").await;
        let video = seed_video(&db, &alice, "intro", true).await;
        let service = EngagementService::new(db.clone());
        let ctx = ctx_for(&alice);

        let first = service
            .toggle_like(&ctx, LikeKind::Video, &video.id)
            .await
            .unwrap();
        assert_eq!(first.state, ToggleState::Active);
        assert_eq!(first.record.as_ref().unwrap().target_id, video.id);
        assert_eq!(db.count_likes(LikeKind::Video, &video.id).await.unwrap(), 1);

        let second = service
            .toggle_like(&ctx, LikeKind::Video, &video.id)
            .await
            .unwrap();
        assert_eq!(second.state, ToggleState::Inactive);
        assert!(second.record.is_none());
        assert_eq!(db.count_likes(LikeKind::Video, &video.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn toggle_like_rejects_bad_input_before_writing() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_user(&db, "alice").await;
        let service = EngagementService::new(db.clone());

        let missing = EntityId::new().0;
        assert!(matches!(
            service
                .toggle_like(&ctx_for(&alice), LikeKind::Tweet, &missing)
                .await,
            Err(AppError::NotFound("Tweet"))
        ));
        assert!(matches!(
            service
                .toggle_like(&ctx_for(&alice), LikeKind::Video, "not-an-id")
                .await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service
                .toggle_like(&anonymous_ctx(), LikeKind::Video, &missing)
                .await,
            Err(AppError::Unauthorized)
        ));
        assert_eq!(db.count_likes(LikeKind::Tweet, &missing).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_service_toggles_keep_one_edge_at_most() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_user(&db, "alice").await;
        let video = seed_video(&db, &alice, "intro", true).await;
        let service = Arc::new(EngagementService::new(db.clone()));

        let mut handles = Vec::new();
        for _ in 0..7 {
            let service = service.clone();
            let ctx = ctx_for(&alice);
            let video_id = video.id.clone();
            handles.push(tokio::spawn(async move {
                service
                    .toggle_like(&ctx, LikeKind::Video, &video_id)
                    .await
                    .map(|outcome| outcome.state)
            }));
        }

        let mut active = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() == ToggleState::Active {
                active += 1;
            }
        }

        // Odd number of serialized toggles: one edge remains
        assert_eq!(active, 4);
        assert_eq!(db.count_likes(LikeKind::Video, &video.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn subscribed_channels_report_subscriber_counts() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let channel = seed_user(&db, "channel").await;
        let service = EngagementService::new(db.clone());

        service
            .toggle_subscription(&ctx_for(&alice), &channel.id)
            .await
            .unwrap();
        service
            .toggle_subscription(&ctx_for(&bob), &channel.id)
            .await
            .unwrap();

        let rows = service
            .subscribed_channels(&anonymous_ctx(), &alice.id)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].channel.as_ref().unwrap().subscribers, 2);

        let subscribers = service
            .channel_subscribers(&anonymous_ctx(), &channel.id)
            .await
            .unwrap();
        let mut names: Vec<String> = subscribers
            .into_iter()
            .map(|row| row.subscriber.unwrap().username)
            .collect();
        names.sort();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn toggle_subscription_requires_existing_channel() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_user(&db, "alice").await;
        let service = EngagementService::new(db.clone());

        let result = service
            .toggle_subscription(&ctx_for(&alice), &EntityId::new().0)
            .await;
        assert!(matches!(result, Err(AppError::NotFound("Channel"))));
    }

    #[tokio::test]
    async fn subscription_lists_require_existing_user() {
        let (db, _temp_dir) = create_test_db().await;
        let service = EngagementService::new(db.clone());
        let missing = EntityId::new().0;

        assert!(matches!(
            service.channel_subscribers(&anonymous_ctx(), &missing).await,
            Err(AppError::NotFound("Channel"))
        ));
        assert!(matches!(
            service.subscribed_channels(&anonymous_ctx(), &missing).await,
            Err(AppError::NotFound("User"))
        ));

        // An existing user without edges still gets empty lists
        let loner = seed_user(&db, "loner").await;
        assert!(
            service
                .channel_subscribers(&anonymous_ctx(), &loner.id)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            service
                .subscribed_channels(&anonymous_ctx(), &loner.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn unpublished_video_cannot_be_liked_by_others() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let draft = seed_video(&db, &alice, "draft", false).await;
        let service = EngagementService::new(db.clone());

        let result = service
            .toggle_like(&ctx_for(&bob), LikeKind::Video, &draft.id)
            .await;
        assert!(matches!(result, Err(AppError::NotFound("Video"))));
        assert_eq!(db.count_likes(LikeKind::Video, &draft.id).await.unwrap(), 0);

        let own = service
            .toggle_like(&ctx_for(&alice), LikeKind::Video, &draft.id)
            .await
            .unwrap();
        assert_eq!(own.state, ToggleState::Active);
    }

    #[tokio::test]
    async fn liked_videos_is_empty_not_an_error() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_user(&db, "alice").await;
        let service = EngagementService::new(db.clone());

        let rows = service.liked_videos(&ctx_for(&alice)).await.unwrap();
        assert!(rows.is_empty());
    }
}
