//! SQLite database operations
//!
//! All entity store access goes through this module.
//! Point lookups return `Option` and scans return `Vec`: a missing row is
//! never an error at this layer, callers decide what absence means.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use super::models::*;
use crate::error::AppError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on IDs bound into one `IN (…)` list.
///
/// SQLite caps host parameters per statement; larger batches are split.
const MAX_BATCH_IDS: usize = 500;

/// Escape LIKE wildcards and wrap for a substring match.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[String]) {
    builder.push(" IN (");
    {
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
    }
    builder.push(")");
}

fn push_video_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &VideoQuery) {
    builder.push(" WHERE 1 = 1");
    if !query.include_unpublished {
        builder.push(" AND is_published = 1");
    }
    if let Some(owner_id) = &query.owner_id {
        builder.push(" AND owner_id = ").push_bind(owner_id.clone());
    }
    if let Some(search) = query.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            builder
                .push(" AND title LIKE ")
                .push_bind(like_pattern(search))
                .push(" ESCAPE '\\'");
        }
    }
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        Self::connect_with_pool_size(path, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Connect with an explicit connection pool size.
    pub async fn connect_with_pool_size(
        path: &Path,
        max_connections: u32,
    ) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    /// Raw pool access for tests that need to tamper with the schema
    #[cfg(test)]
    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Get user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get multiple users by ID (batch operation to avoid N+1)
    ///
    /// Any number of IDs is accepted; they are queried in chunks.
    pub async fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut users = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_BATCH_IDS) {
            let mut query_builder = QueryBuilder::<Sqlite>::new("SELECT * FROM users WHERE id");
            push_id_list(&mut query_builder, chunk);

            users.extend(
                query_builder
                    .build_query_as::<User>()
                    .fetch_all(&self.pool)
                    .await?,
            );
        }

        Ok(users)
    }

    /// Insert a new user
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, full_name, avatar, cover_image,
                password_hash, refresh_token, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar)
        .bind(&user.cover_image)
        .bind(&user.password_hash)
        .bind(&user.refresh_token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Videos
    // =========================================================================

    /// Get video by ID
    pub async fn get_video(&self, id: &str) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    /// Get multiple videos by ID, in no particular order
    pub async fn get_videos_by_ids(&self, ids: &[String]) -> Result<Vec<Video>, AppError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut videos = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_BATCH_IDS) {
            let mut query_builder = QueryBuilder::<Sqlite>::new("SELECT * FROM videos WHERE id");
            push_id_list(&mut query_builder, chunk);

            videos.extend(
                query_builder
                    .build_query_as::<Video>()
                    .fetch_all(&self.pool)
                    .await?,
            );
        }

        Ok(videos)
    }

    /// Insert a new video
    pub async fn insert_video(&self, video: &Video) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO videos (
                id, video_file, thumbnail, title, description, duration,
                views, is_published, owner_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&video.id)
        .bind(&video.video_file)
        .bind(&video.thumbnail)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.duration)
        .bind(video.views)
        .bind(video.is_published)
        .bind(&video.owner_id)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Scan videos matching `query`, ordered and windowed
    ///
    /// `id` breaks ties in the same direction as the primary key so the
    /// ordering is total.
    pub async fn find_videos(
        &self,
        query: &VideoQuery,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Video>, AppError> {
        let mut query_builder = QueryBuilder::<Sqlite>::new("SELECT * FROM videos");
        push_video_filters(&mut query_builder, query);

        let direction = query.direction.as_sql();
        match query.sort_key {
            VideoSortKey::CreatedAt => {
                query_builder.push(format!(
                    " ORDER BY created_at {direction}, id {direction}"
                ));
            }
            VideoSortKey::Title => {
                query_builder.push(format!(
                    " ORDER BY title COLLATE NOCASE {direction}, id {direction}"
                ));
            }
        }
        query_builder
            .push(" LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);

        let videos = query_builder
            .build_query_as::<Video>()
            .fetch_all(&self.pool)
            .await?;

        Ok(videos)
    }

    /// Count videos matching `query`
    pub async fn count_videos(&self, query: &VideoQuery) -> Result<u64, AppError> {
        let mut query_builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM videos");
        push_video_filters(&mut query_builder, query);

        let count = query_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    /// All videos of a channel, including unpublished ones, newest first
    pub async fn find_videos_by_owner(&self, owner_id: &str) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    /// Apply a partial update
    ///
    /// # Returns
    /// The updated video, or `None` if it does not exist
    pub async fn update_video(
        &self,
        id: &str,
        patch: &VideoPatch,
    ) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<_, Video>(
            r#"
            UPDATE videos SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                thumbnail = COALESCE(?, thumbnail),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(&patch.thumbnail)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    /// Flip `is_published` in a single statement
    pub async fn toggle_video_published(&self, id: &str) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<_, Video>(
            r#"
            UPDATE videos
            SET is_published = NOT is_published, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    /// Delete a video
    ///
    /// With `cascade`, likes on the video, its comments (and their likes)
    /// and its playlist memberships are removed in the same transaction.
    pub async fn delete_video(&self, id: &str, cascade: bool) -> Result<Option<Video>, AppError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query_as::<_, Video>("DELETE FROM videos WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if deleted.is_some() && cascade {
            sqlx::query(
                r#"
                DELETE FROM likes
                WHERE target_kind = 'comment'
                  AND target_id IN (SELECT id FROM comments WHERE video_id = ?)
                "#,
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
            sqlx::query("DELETE FROM comments WHERE video_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM likes WHERE target_kind = 'video' AND target_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM playlist_videos WHERE video_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(deleted)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Get comment by ID
    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// Insert a new comment
    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, content, video_id, owner_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.content)
        .bind(&comment.video_id)
        .bind(&comment.owner_id)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Comments on a video, newest first (paginated)
    pub async fn find_comments_by_video(
        &self,
        video_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT * FROM comments
            WHERE video_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(video_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// Count comments on a video
    pub async fn count_comments_by_video(&self, video_id: &str) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE video_id = ?")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    /// Replace comment content
    pub async fn update_comment_content(
        &self,
        id: &str,
        content: &str,
    ) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            "UPDATE comments SET content = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(content)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Delete a comment, and with `cascade` its likes
    pub async fn delete_comment(
        &self,
        id: &str,
        cascade: bool,
    ) -> Result<Option<Comment>, AppError> {
        let mut tx = self.pool.begin().await?;

        let deleted =
            sqlx::query_as::<_, Comment>("DELETE FROM comments WHERE id = ? RETURNING *")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        if deleted.is_some() && cascade {
            sqlx::query("DELETE FROM likes WHERE target_kind = 'comment' AND target_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(deleted)
    }

    // =========================================================================
    // Tweets
    // =========================================================================

    /// Get tweet by ID
    pub async fn get_tweet(&self, id: &str) -> Result<Option<Tweet>, AppError> {
        let tweet = sqlx::query_as::<_, Tweet>("SELECT * FROM tweets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tweet)
    }

    /// Insert a new tweet
    pub async fn insert_tweet(&self, tweet: &Tweet) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO tweets (id, content, owner_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&tweet.id)
        .bind(&tweet.content)
        .bind(&tweet.owner_id)
        .bind(tweet.created_at)
        .bind(tweet.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Tweets of a user, newest first
    pub async fn find_tweets_by_owner(&self, owner_id: &str) -> Result<Vec<Tweet>, AppError> {
        let tweets = sqlx::query_as::<_, Tweet>(
            "SELECT * FROM tweets WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tweets)
    }

    /// Replace tweet content
    pub async fn update_tweet_content(
        &self,
        id: &str,
        content: &str,
    ) -> Result<Option<Tweet>, AppError> {
        let tweet = sqlx::query_as::<_, Tweet>(
            "UPDATE tweets SET content = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(content)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tweet)
    }

    /// Delete a tweet, and with `cascade` its likes
    pub async fn delete_tweet(&self, id: &str, cascade: bool) -> Result<Option<Tweet>, AppError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query_as::<_, Tweet>("DELETE FROM tweets WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if deleted.is_some() && cascade {
            sqlx::query("DELETE FROM likes WHERE target_kind = 'tweet' AND target_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(deleted)
    }

    // =========================================================================
    // Playlists
    // =========================================================================

    /// Get playlist by ID
    pub async fn get_playlist(&self, id: &str) -> Result<Option<Playlist>, AppError> {
        let playlist = sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(playlist)
    }

    /// Insert a new (empty) playlist
    pub async fn insert_playlist(&self, playlist: &Playlist) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO playlists (id, name, description, owner_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&playlist.id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(&playlist.owner_id)
        .bind(playlist.created_at)
        .bind(playlist.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Playlists of a user, newest first
    pub async fn find_playlists_by_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Playlist>, AppError> {
        let playlists = sqlx::query_as::<_, Playlist>(
            "SELECT * FROM playlists WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(playlists)
    }

    /// Apply a partial update
    pub async fn update_playlist(
        &self,
        id: &str,
        patch: &PlaylistPatch,
    ) -> Result<Option<Playlist>, AppError> {
        let playlist = sqlx::query_as::<_, Playlist>(
            r#"
            UPDATE playlists SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(playlist)
    }

    /// Delete a playlist together with its membership rows
    pub async fn delete_playlist(&self, id: &str) -> Result<Option<Playlist>, AppError> {
        let mut tx = self.pool.begin().await?;

        let deleted =
            sqlx::query_as::<_, Playlist>("DELETE FROM playlists WHERE id = ? RETURNING *")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        if deleted.is_some() {
            sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(deleted)
    }

    /// Video IDs in playlist order
    #[cfg(test)]
    pub(crate) async fn get_playlist_video_ids(&self, playlist_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT video_id FROM playlist_videos WHERE playlist_id = ? ORDER BY position ASC",
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Published videos of a playlist, in playlist order
    pub async fn get_published_playlist_videos(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT v.* FROM playlist_videos pv
            INNER JOIN videos v ON v.id = pv.video_id
            WHERE pv.playlist_id = ? AND v.is_published = 1
            ORDER BY pv.position ASC
            "#,
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    /// Append a video to a playlist
    ///
    /// # Returns
    /// `false` when the video was already a member
    pub async fn add_video_to_playlist(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO playlist_videos (playlist_id, video_id, position, added_at)
            SELECT ?, ?, COALESCE(MAX(position), 0) + 1, ?
            FROM playlist_videos WHERE playlist_id = ?
            ON CONFLICT (playlist_id, video_id) DO NOTHING
            "#,
        )
        .bind(playlist_id)
        .bind(video_id)
        .bind(Utc::now())
        .bind(playlist_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a video from a playlist
    ///
    /// # Returns
    /// `false` when the video was not a member
    pub async fn remove_video_from_playlist(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ? AND video_id = ?")
                .bind(playlist_id)
                .bind(video_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of existing videos per playlist
    pub async fn count_playlist_videos_batch(
        &self,
        playlist_ids: &[String],
    ) -> Result<HashMap<String, i64>, AppError> {
        if playlist_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut counts = HashMap::with_capacity(playlist_ids.len());
        for chunk in playlist_ids.chunks(MAX_BATCH_IDS) {
            let mut query_builder = QueryBuilder::<Sqlite>::new(
                r#"
                SELECT pv.playlist_id, COUNT(*) FROM playlist_videos pv
                INNER JOIN videos v ON v.id = pv.video_id
                WHERE pv.playlist_id"#,
            );
            push_id_list(&mut query_builder, chunk);
            query_builder.push(" GROUP BY pv.playlist_id");

            counts.extend(
                query_builder
                    .build_query_as::<(String, i64)>()
                    .fetch_all(&self.pool)
                    .await?,
            );
        }

        Ok(counts)
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Atomically flip the like edge `(liked_by, kind, target_id)`
    ///
    /// The conditional DELETE runs first, so the transaction holds the
    /// write lock before the existence decision is made. The unique
    /// constraint backs the insert branch.
    pub async fn toggle_like(
        &self,
        liked_by: &str,
        kind: LikeKind,
        target_id: &str,
    ) -> Result<Toggled<Like>, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM likes WHERE liked_by = ? AND target_kind = ? AND target_id = ?",
        )
        .bind(liked_by)
        .bind(kind.as_str())
        .bind(target_id)
        .execute(&mut *tx)
        .await?;

        if removed.rows_affected() > 0 {
            tx.commit().await?;
            return Ok(Toggled::Deactivated);
        }

        let like = sqlx::query_as::<_, Like>(
            r#"
            INSERT INTO likes (id, target_kind, target_id, liked_by, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (liked_by, target_kind, target_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(EntityId::new().0)
        .bind(kind.as_str())
        .bind(target_id)
        .bind(liked_by)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(like) = like else {
            return Err(AppError::Internal(anyhow::anyhow!(
                "like insert returned no record"
            )));
        };

        tx.commit().await?;
        Ok(Toggled::Activated(like))
    }

    /// Remove a like if present
    ///
    /// # Returns
    /// Whether a row was removed; an absent edge is not an error
    pub async fn remove_like(
        &self,
        liked_by: &str,
        kind: LikeKind,
        target_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM likes WHERE liked_by = ? AND target_kind = ? AND target_id = ?",
        )
        .bind(liked_by)
        .bind(kind.as_str())
        .bind(target_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check if a user likes a target
    #[cfg(test)]
    pub(crate) async fn is_liked(
        &self,
        liked_by: &str,
        kind: LikeKind,
        target_id: &str,
    ) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM likes WHERE liked_by = ? AND target_kind = ? AND target_id = ?",
        )
        .bind(liked_by)
        .bind(kind.as_str())
        .bind(target_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Number of likes on a single target
    #[cfg(test)]
    pub(crate) async fn count_likes(&self, kind: LikeKind, target_id: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM likes WHERE target_kind = ? AND target_id = ?",
        )
        .bind(kind.as_str())
        .bind(target_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Like counts for many targets of one kind
    ///
    /// Targets without likes are absent from the map.
    pub async fn count_likes_batch(
        &self,
        kind: LikeKind,
        target_ids: &[String],
    ) -> Result<HashMap<String, i64>, AppError> {
        if target_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut counts = HashMap::with_capacity(target_ids.len());
        for chunk in target_ids.chunks(MAX_BATCH_IDS) {
            let mut query_builder = QueryBuilder::<Sqlite>::new(
                "SELECT target_id, COUNT(*) FROM likes WHERE target_kind = ",
            );
            query_builder.push_bind(kind.as_str()).push(" AND target_id");
            push_id_list(&mut query_builder, chunk);
            query_builder.push(" GROUP BY target_id");

            counts.extend(
                query_builder
                    .build_query_as::<(String, i64)>()
                    .fetch_all(&self.pool)
                    .await?,
            );
        }

        Ok(counts)
    }

    /// Which of `target_ids` the user has liked
    pub async fn liked_target_ids(
        &self,
        liked_by: &str,
        kind: LikeKind,
        target_ids: &[String],
    ) -> Result<HashSet<String>, AppError> {
        if target_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let mut liked = HashSet::new();
        for chunk in target_ids.chunks(MAX_BATCH_IDS) {
            let mut query_builder =
                QueryBuilder::<Sqlite>::new("SELECT target_id FROM likes WHERE liked_by = ");
            query_builder
                .push_bind(liked_by.to_string())
                .push(" AND target_kind = ")
                .push_bind(kind.as_str())
                .push(" AND target_id");
            push_id_list(&mut query_builder, chunk);

            liked.extend(
                query_builder
                    .build_query_scalar::<String>()
                    .fetch_all(&self.pool)
                    .await?,
            );
        }

        Ok(liked)
    }

    /// Likes of a user on one kind of target, newest first
    pub async fn find_likes_by_actor(
        &self,
        liked_by: &str,
        kind: LikeKind,
    ) -> Result<Vec<Like>, AppError> {
        let likes = sqlx::query_as::<_, Like>(
            r#"
            SELECT * FROM likes
            WHERE liked_by = ? AND target_kind = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(liked_by)
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(likes)
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Atomically flip the subscription edge `(subscriber_id, channel_id)`
    pub async fn toggle_subscription(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<Toggled<Subscription>, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed =
            sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?")
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(&mut *tx)
                .await?;

        if removed.rows_affected() > 0 {
            tx.commit().await?;
            return Ok(Toggled::Deactivated);
        }

        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (id, subscriber_id, channel_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (subscriber_id, channel_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(EntityId::new().0)
        .bind(subscriber_id)
        .bind(channel_id)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(subscription) = subscription else {
            return Err(AppError::Internal(anyhow::anyhow!(
                "subscription insert returned no record"
            )));
        };

        tx.commit().await?;
        Ok(Toggled::Activated(subscription))
    }

    /// Remove a subscription if present
    pub async fn remove_subscription(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?")
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check if a user is subscribed to a channel
    #[cfg(test)]
    pub(crate) async fn is_subscribed(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Subscriptions pointing at a channel, newest first
    pub async fn find_subscriptions_by_channel(
        &self,
        channel_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let subscriptions = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE channel_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    /// Subscriptions made by a user, newest first
    pub async fn find_subscriptions_by_subscriber(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let subscriptions = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE subscriber_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    /// Subscriber counts for many channels
    ///
    /// Channels without subscribers are absent from the map.
    pub async fn count_subscribers_batch(
        &self,
        channel_ids: &[String],
    ) -> Result<HashMap<String, i64>, AppError> {
        if channel_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut counts = HashMap::with_capacity(channel_ids.len());
        for chunk in channel_ids.chunks(MAX_BATCH_IDS) {
            let mut query_builder = QueryBuilder::<Sqlite>::new(
                "SELECT channel_id, COUNT(*) FROM subscriptions WHERE channel_id",
            );
            push_id_list(&mut query_builder, chunk);
            query_builder.push(" GROUP BY channel_id");

            counts.extend(
                query_builder
                    .build_query_as::<(String, i64)>()
                    .fetch_all(&self.pool)
                    .await?,
            );
        }

        Ok(counts)
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Video, view, like and subscriber totals for a channel
    pub async fn channel_totals(&self, owner_id: &str) -> Result<ChannelTotals, AppError> {
        let (total_videos, total_views): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(views), 0) FROM videos WHERE owner_id = ?",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let total_likes: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM likes l
            INNER JOIN videos v ON l.target_kind = 'video' AND l.target_id = v.id
            WHERE v.owner_id = ?
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let total_subscribers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(ChannelTotals {
            total_videos,
            total_views,
            total_likes,
            total_subscribers,
        })
    }
}
