//! View composition
//!
//! Builds response-shaped rows from store records by applying three
//! steps per view: owner embedding, reverse counts and viewer flags.
//! Each step is a single batched query so a page costs a fixed number
//! of round trips. The steps of one view run concurrently.
//!
//! A failing step degrades to `null`/`0`/`false` for the affected field,
//! is logged and counted. Only the base scan is allowed to abort a view.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::context::ActorId;
use crate::data::{Comment, Database, Like, LikeKind, Playlist, Subscription, Tweet, User, Video};
use crate::error::AppError;
use crate::metrics::VIEW_DEGRADATIONS_TOTAL;

// =============================================================================
// View shapes
// =============================================================================

/// Restricted projection of a user embedded in other views
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerSummary {
    pub id: String,
    pub username: String,
    pub avatar: String,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// Row of the public video list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub video_file: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub owner: Option<OwnerSummary>,
    pub likes: i64,
    pub is_liked: bool,
}

/// Video as embedded in a liked-videos row
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideoSummary {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub duration: f64,
    pub created_at: DateTime<Utc>,
    pub owner: Option<OwnerSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideoRow {
    /// Like ID
    pub id: String,
    pub liked_at: DateTime<Utc>,
    pub video: LikedVideoSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRow {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub owner: Option<OwnerSummary>,
    pub likes: i64,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetRow {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: Option<OwnerSummary>,
    pub likes: i64,
    pub is_liked: bool,
}

/// Row of a channel's subscriber list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberRow {
    /// Subscription ID
    pub id: String,
    pub subscriber: Option<OwnerSummary>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelSummary {
    pub id: String,
    pub username: String,
    pub avatar: String,
    pub subscribers: i64,
}

/// Row of the list of channels a user subscribes to
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRow {
    /// Subscription ID
    pub id: String,
    pub channel: Option<ChannelSummary>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideoSummary {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub duration: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub owner: Option<OwnerSummary>,
    pub videos: Vec<PlaylistVideoSummary>,
    pub total_videos: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub total_videos: i64,
    pub created_at: DateTime<Utc>,
}

/// Row of the owner's dashboard video list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelVideoRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub video_file: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub likes: i64,
}

// =============================================================================
// Composer
// =============================================================================

fn degrade<T: Default>(view: &'static str, step: &'static str, result: Result<T, AppError>) -> T {
    result.unwrap_or_else(|error| {
        tracing::warn!(view, step, %error, "View step degraded to default");
        VIEW_DEGRADATIONS_TOTAL.with_label_values(&[view, step]).inc();
        T::default()
    })
}

fn unique_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(*id))
        .map(ToOwned::to_owned)
        .collect()
}

/// Builds the fixed set of read views over the entity store
pub struct ViewComposer {
    db: Arc<Database>,
}

impl ViewComposer {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // =========================================================================
    // Steps
    // =========================================================================

    /// Owner embedding: user ID -> restricted projection
    ///
    /// The first user returned for an ID wins.
    async fn owners(
        &self,
        view: &'static str,
        ids: Vec<String>,
    ) -> HashMap<String, OwnerSummary> {
        let users = degrade(view, "owner", self.db.get_users_by_ids(&ids).await);

        let mut owners = HashMap::with_capacity(users.len());
        for user in &users {
            owners
                .entry(user.id.clone())
                .or_insert_with(|| OwnerSummary::from(user));
        }
        owners
    }

    /// Reverse count of likes per target
    async fn like_counts(
        &self,
        view: &'static str,
        kind: LikeKind,
        ids: &[String],
    ) -> HashMap<String, i64> {
        degrade(view, "likes", self.db.count_likes_batch(kind, ids).await)
    }

    /// Viewer flag: targets the actor has liked
    ///
    /// Anonymous viewers like nothing; no query is issued for them.
    async fn viewer_likes(
        &self,
        view: &'static str,
        actor: Option<&ActorId>,
        kind: LikeKind,
        ids: &[String],
    ) -> HashSet<String> {
        let Some(actor) = actor else {
            return HashSet::new();
        };
        degrade(
            view,
            "is_liked",
            self.db.liked_target_ids(actor.as_str(), kind, ids).await,
        )
    }

    async fn subscriber_counts(&self, view: &'static str, ids: &[String]) -> HashMap<String, i64> {
        degrade(view, "subscribers", self.db.count_subscribers_batch(ids).await)
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Video-list rows with owner, like count and viewer flag
    pub async fn video_rows(&self, videos: Vec<Video>, actor: Option<&ActorId>) -> Vec<VideoRow> {
        const VIEW: &str = "video_list";

        let ids: Vec<String> = videos.iter().map(|v| v.id.clone()).collect();
        let owner_ids = unique_ids(videos.iter().map(|v| v.owner_id.as_str()));

        let (owners, likes, liked) = tokio::join!(
            self.owners(VIEW, owner_ids),
            self.like_counts(VIEW, LikeKind::Video, &ids),
            self.viewer_likes(VIEW, actor, LikeKind::Video, &ids),
        );

        videos
            .into_iter()
            .map(|video| VideoRow {
                owner: owners.get(&video.owner_id).cloned(),
                likes: likes.get(&video.id).copied().unwrap_or(0),
                is_liked: liked.contains(&video.id),
                id: video.id,
                title: video.title,
                description: video.description,
                thumbnail: video.thumbnail,
                video_file: video.video_file,
                duration: video.duration,
                views: video.views,
                is_published: video.is_published,
                created_at: video.created_at,
            })
            .collect()
    }

    /// Comment-feed rows with owner, like count and viewer flag
    pub async fn comment_rows(
        &self,
        comments: Vec<Comment>,
        actor: Option<&ActorId>,
    ) -> Vec<CommentRow> {
        const VIEW: &str = "comment_feed";

        let ids: Vec<String> = comments.iter().map(|c| c.id.clone()).collect();
        let owner_ids = unique_ids(comments.iter().map(|c| c.owner_id.as_str()));

        let (owners, likes, liked) = tokio::join!(
            self.owners(VIEW, owner_ids),
            self.like_counts(VIEW, LikeKind::Comment, &ids),
            self.viewer_likes(VIEW, actor, LikeKind::Comment, &ids),
        );

        comments
            .into_iter()
            .map(|comment| CommentRow {
                owner: owners.get(&comment.owner_id).cloned(),
                likes: likes.get(&comment.id).copied().unwrap_or(0),
                is_liked: liked.contains(&comment.id),
                id: comment.id,
                content: comment.content,
                created_at: comment.created_at,
            })
            .collect()
    }

    /// Tweet-feed rows with owner, like count and viewer flag
    pub async fn tweet_rows(&self, tweets: Vec<Tweet>, actor: Option<&ActorId>) -> Vec<TweetRow> {
        const VIEW: &str = "tweet_feed";

        let ids: Vec<String> = tweets.iter().map(|t| t.id.clone()).collect();
        let owner_ids = unique_ids(tweets.iter().map(|t| t.owner_id.as_str()));

        let (owners, likes, liked) = tokio::join!(
            self.owners(VIEW, owner_ids),
            self.like_counts(VIEW, LikeKind::Tweet, &ids),
            self.viewer_likes(VIEW, actor, LikeKind::Tweet, &ids),
        );

        tweets
            .into_iter()
            .map(|tweet| TweetRow {
                owner: owners.get(&tweet.owner_id).cloned(),
                likes: likes.get(&tweet.id).copied().unwrap_or(0),
                is_liked: liked.contains(&tweet.id),
                id: tweet.id,
                content: tweet.content,
                created_at: tweet.created_at,
                updated_at: tweet.updated_at,
            })
            .collect()
    }

    /// Liked-video rows in like order
    ///
    /// Likes whose video no longer exists are skipped. The video lookup is
    /// the base scan of this view, so its failure is an error.
    pub async fn liked_video_rows(&self, likes: Vec<Like>) -> Result<Vec<LikedVideoRow>, AppError> {
        const VIEW: &str = "liked_videos";

        let video_ids = unique_ids(likes.iter().map(|l| l.target_id.as_str()));
        let videos: HashMap<String, Video> = self
            .db
            .get_videos_by_ids(&video_ids)
            .await?
            .into_iter()
            .map(|v| (v.id.clone(), v))
            .collect();

        let owner_ids = unique_ids(videos.values().map(|v| v.owner_id.as_str()));
        let owners = self.owners(VIEW, owner_ids).await;

        let rows = likes
            .into_iter()
            .filter_map(|like| {
                let video = videos.get(&like.target_id)?;
                Some(LikedVideoRow {
                    id: like.id,
                    liked_at: like.created_at,
                    video: LikedVideoSummary {
                        id: video.id.clone(),
                        title: video.title.clone(),
                        thumbnail: video.thumbnail.clone(),
                        duration: video.duration,
                        created_at: video.created_at,
                        owner: owners.get(&video.owner_id).cloned(),
                    },
                })
            })
            .collect();

        Ok(rows)
    }

    /// Channel-subscriber rows with the subscriber embedded
    pub async fn subscriber_rows(&self, subscriptions: Vec<Subscription>) -> Vec<SubscriberRow> {
        const VIEW: &str = "channel_subscribers";

        let subscriber_ids = unique_ids(subscriptions.iter().map(|s| s.subscriber_id.as_str()));
        let owners = self.owners(VIEW, subscriber_ids).await;

        subscriptions
            .into_iter()
            .map(|subscription| SubscriberRow {
                subscriber: owners.get(&subscription.subscriber_id).cloned(),
                id: subscription.id,
                created_at: subscription.created_at,
            })
            .collect()
    }

    /// Subscribed-channel rows with each channel's subscriber count
    pub async fn channel_rows(&self, subscriptions: Vec<Subscription>) -> Vec<ChannelRow> {
        const VIEW: &str = "subscribed_channels";

        let channel_ids = unique_ids(subscriptions.iter().map(|s| s.channel_id.as_str()));
        let (owners, counts) = tokio::join!(
            self.owners(VIEW, channel_ids.clone()),
            self.subscriber_counts(VIEW, &channel_ids),
        );

        subscriptions
            .into_iter()
            .map(|subscription| ChannelRow {
                channel: owners.get(&subscription.channel_id).map(|owner| ChannelSummary {
                    id: owner.id.clone(),
                    username: owner.username.clone(),
                    avatar: owner.avatar.clone(),
                    subscribers: counts.get(&owner.id).copied().unwrap_or(0),
                }),
                id: subscription.id,
                created_at: subscription.created_at,
            })
            .collect()
    }

    /// Playlist detail over an already filtered, ordered video list
    pub async fn playlist_detail(&self, playlist: Playlist, videos: Vec<Video>) -> PlaylistDetail {
        const VIEW: &str = "playlist_detail";

        let owners = self.owners(VIEW, vec![playlist.owner_id.clone()]).await;
        let videos: Vec<PlaylistVideoSummary> = videos
            .into_iter()
            .map(|video| PlaylistVideoSummary {
                id: video.id,
                title: video.title,
                thumbnail: video.thumbnail,
                duration: video.duration,
                created_at: video.created_at,
            })
            .collect();

        PlaylistDetail {
            owner: owners.get(&playlist.owner_id).cloned(),
            total_videos: videos.len() as i64,
            videos,
            id: playlist.id,
            name: playlist.name,
            description: playlist.description,
            created_at: playlist.created_at,
        }
    }

    /// Playlist summary rows with video counts
    pub async fn playlist_summaries(&self, playlists: Vec<Playlist>) -> Vec<PlaylistSummary> {
        const VIEW: &str = "playlist_summaries";

        let ids: Vec<String> = playlists.iter().map(|p| p.id.clone()).collect();
        let counts = degrade(
            VIEW,
            "total_videos",
            self.db.count_playlist_videos_batch(&ids).await,
        );

        playlists
            .into_iter()
            .map(|playlist| PlaylistSummary {
                total_videos: counts.get(&playlist.id).copied().unwrap_or(0),
                id: playlist.id,
                name: playlist.name,
                description: playlist.description,
                created_at: playlist.created_at,
            })
            .collect()
    }

    /// Dashboard rows: every channel video with its like count
    pub async fn channel_video_rows(&self, videos: Vec<Video>) -> Vec<ChannelVideoRow> {
        const VIEW: &str = "channel_videos";

        let ids: Vec<String> = videos.iter().map(|v| v.id.clone()).collect();
        let likes = self.like_counts(VIEW, LikeKind::Video, &ids).await;

        videos
            .into_iter()
            .map(|video| ChannelVideoRow {
                likes: likes.get(&video.id).copied().unwrap_or(0),
                id: video.id,
                title: video.title,
                description: video.description,
                thumbnail: video.thumbnail,
                video_file: video.video_file,
                duration: video.duration,
                views: video.views,
                is_published: video.is_published,
                created_at: video.created_at,
            })
            .collect()
    }
}
