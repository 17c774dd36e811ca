//! Tweet service
//!
//! Short text posts on a user's channel.

use chrono::Utc;
use std::sync::Arc;

use super::context::RequestContext;
use super::guard::assert_owner;
use super::views::{TweetRow, ViewComposer};
use super::{parse_id, require_text};
use crate::data::{Database, EntityId, Tweet};
use crate::error::AppError;

/// Tweet service
pub struct TweetService {
    db: Arc<Database>,
    views: ViewComposer,
    cascade_deletes: bool,
}

impl TweetService {
    /// Create new tweet service
    pub fn new(db: Arc<Database>, cascade_deletes: bool) -> Self {
        Self {
            views: ViewComposer::new(db.clone()),
            db,
            cascade_deletes,
        }
    }

    /// Post a tweet as the actor
    pub async fn create(&self, ctx: &RequestContext, content: &str) -> Result<Tweet, AppError> {
        let actor = ctx.require_actor()?;
        let content = require_text(content, "content")?;

        let now = Utc::now();
        let tweet = Tweet {
            id: EntityId::new().0,
            content,
            owner_id: actor.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        ctx.bounded("create_tweet", async {
            self.db.insert_tweet(&tweet).await?;
            tracing::info!(tweet_id = %tweet.id, owner_id = %tweet.owner_id, "Tweet created");
            Ok(tweet)
        })
        .await
    }

    /// Tweets of a user, newest first
    pub async fn list_by_user(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> Result<Vec<TweetRow>, AppError> {
        let user_id = parse_id(user_id, "user")?;

        ctx.bounded("list_tweets", async {
            let tweets = self.db.find_tweets_by_owner(user_id.as_str()).await?;
            Ok(self.views.tweet_rows(tweets, ctx.actor()).await)
        })
        .await
    }

    async fn owned_tweet(&self, ctx: &RequestContext, tweet_id: &EntityId) -> Result<Tweet, AppError> {
        let tweet = self
            .db
            .get_tweet(tweet_id.as_str())
            .await?
            .ok_or(AppError::NotFound("Tweet"))?;
        assert_owner(&tweet, ctx.actor())?;
        Ok(tweet)
    }

    /// Replace the content of the actor's tweet
    pub async fn update(
        &self,
        ctx: &RequestContext,
        tweet_id: &str,
        content: &str,
    ) -> Result<Tweet, AppError> {
        let tweet_id = parse_id(tweet_id, "tweet")?;
        let content = require_text(content, "content")?;

        ctx.bounded("update_tweet", async {
            self.owned_tweet(ctx, &tweet_id).await?;

            let tweet = self
                .db
                .update_tweet_content(tweet_id.as_str(), &content)
                .await?
                .ok_or(AppError::NotFound("Tweet"))?;
            tracing::info!(tweet_id = %tweet.id, "Tweet updated");
            Ok(tweet)
        })
        .await
    }

    /// Delete the actor's tweet
    pub async fn delete(&self, ctx: &RequestContext, tweet_id: &str) -> Result<Tweet, AppError> {
        let tweet_id = parse_id(tweet_id, "tweet")?;

        ctx.bounded("delete_tweet", async {
            self.owned_tweet(ctx, &tweet_id).await?;

            let tweet = self
                .db
                .delete_tweet(tweet_id.as_str(), self.cascade_deletes)
                .await?
                .ok_or(AppError::NotFound("Tweet"))?;
            tracing::info!(tweet_id = %tweet.id, cascade = self.cascade_deletes, "Tweet deleted");
            Ok(tweet)
        })
        .await
    }
}
