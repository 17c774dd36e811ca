//! Fixtures shared by service tests

use chrono::{Duration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tempfile::TempDir;

use super::context::{ActorId, RequestContext};
use crate::data::{Database, EntityId, User, Video};

static CLOCK: AtomicI64 = AtomicI64::new(0);

pub(crate) async fn create_test_db() -> (Arc<Database>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("service.db");
    let db = Database::connect(&db_path).await.unwrap();
    (Arc::new(db), temp_dir)
}

pub(crate) async fn seed_user(db: &Database, username: &str) -> User {
    let user = User {
        id: EntityId::new().0,
        username: username.to_string(),
        email: format!("{}@example.com", username),
        full_name: username.to_string(),
        avatar: format!("https://cdn.example.com/{}.png", username),
        cover_image: None,
        password_hash: "hashed-password".to_string(),
        refresh_token: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    db.insert_user(&user).await.unwrap();
    user
}

/// Insert a video; later calls get strictly later creation times
pub(crate) async fn seed_video(db: &Database, owner: &User, title: &str, published: bool) -> Video {
    let tick = CLOCK.fetch_add(1, Ordering::SeqCst);
    let created_at = Utc::now() - Duration::days(1) + Duration::milliseconds(tick);
    let video = Video {
        id: EntityId::new().0,
        video_file: format!("https://cdn.example.com/{}.mp4", title),
        thumbnail: format!("https://cdn.example.com/{}.jpg", title),
        title: title.to_string(),
        description: format!("About {}", title),
        duration: 60.0,
        views: 0,
        is_published: published,
        owner_id: owner.id.clone(),
        created_at,
        updated_at: created_at,
    };
    db.insert_video(&video).await.unwrap();
    video
}

pub(crate) fn ctx_for(user: &User) -> RequestContext {
    RequestContext::authenticated(ActorId::new(user.id.clone()), std::time::Duration::from_secs(5))
}

pub(crate) fn anonymous_ctx() -> RequestContext {
    RequestContext::anonymous(std::time::Duration::from_secs(5))
}
