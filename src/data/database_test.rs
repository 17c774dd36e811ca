//! Database tests

use super::*;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

async fn seed_user(db: &Database, username: &str) -> User {
    let user = User {
        id: EntityId::new().0,
        username: username.to_string(),
        email: format!("{}@example.com", username),
        full_name: username.to_uppercase(),
        avatar: format!("https://cdn.example.com/{}.png", username),
        cover_image: None,
        password_hash: "$argon2id$secret".to_string(),
        refresh_token: Some("refresh-secret".to_string()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    db.insert_user(&user).await.unwrap();
    user
}

/// Insert a video whose creation time is `minutes` after a fixed base
async fn seed_video(
    db: &Database,
    owner: &User,
    title: &str,
    published: bool,
    minutes: i64,
) -> Video {
    let created_at = Utc::now() - Duration::days(1) + Duration::minutes(minutes);
    let video = Video {
        id: EntityId::new().0,
        video_file: format!("https://cdn.example.com/{}.mp4", title),
        thumbnail: format!("https://cdn.example.com/{}.jpg", title),
        title: title.to_string(),
        description: format!("About {}", title),
        duration: 42.5,
        views: 10,
        is_published: published,
        owner_id: owner.id.clone(),
        created_at,
        updated_at: created_at,
    };
    db.insert_video(&video).await.unwrap();
    video
}

async fn seed_comment(db: &Database, video: &Video, owner: &User, content: &str) -> Comment {
    let comment = Comment {
        id: EntityId::new().0,
        content: content.to_string(),
        video_id: video.id.clone(),
        owner_id: owner.id.clone(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    db.insert_comment(&comment).await.unwrap();
    comment
}

async fn seed_playlist(db: &Database, owner: &User, name: &str) -> Playlist {
    let playlist = Playlist {
        id: EntityId::new().0,
        name: name.to_string(),
        description: "mix".to_string(),
        owner_id: owner.id.clone(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    db.insert_playlist(&playlist).await.unwrap();
    playlist
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
    // Connection successful if we get here without panicking
}

#[tokio::test]
async fn test_users_batch_lookup() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;

    let users = db
        .get_users_by_ids(&[alice.id.clone(), bob.id.clone(), EntityId::new().0])
        .await
        .unwrap();
    assert_eq!(users.len(), 2);

    assert!(db.get_users_by_ids(&[]).await.unwrap().is_empty());
    assert!(db.get_user(&EntityId::new().0).await.unwrap().is_none());
}

#[tokio::test]
async fn test_video_crud() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let video = seed_video(&db, &alice, "intro", true, 0).await;

    let fetched = db.get_video(&video.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "intro");
    assert!(fetched.is_published);

    let patch = VideoPatch {
        title: Some("intro v2".to_string()),
        ..Default::default()
    };
    let updated = db.update_video(&video.id, &patch).await.unwrap().unwrap();
    assert_eq!(updated.title, "intro v2");
    assert_eq!(updated.description, "About intro");

    let toggled = db.toggle_video_published(&video.id).await.unwrap().unwrap();
    assert!(!toggled.is_published);
    let toggled = db.toggle_video_published(&video.id).await.unwrap().unwrap();
    assert!(toggled.is_published);

    let deleted = db.delete_video(&video.id, false).await.unwrap();
    assert!(deleted.is_some());
    assert!(db.get_video(&video.id).await.unwrap().is_none());

    // Missing rows are reported as None, not as errors
    assert!(db.delete_video(&video.id, false).await.unwrap().is_none());
    assert!(db.update_video(&video.id, &patch).await.unwrap().is_none());
    assert!(db.toggle_video_published(&video.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_videos_filters_and_orders() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;

    seed_video(&db, &alice, "Cooking pasta", true, 1).await;
    seed_video(&db, &alice, "cooking rice", true, 2).await;
    seed_video(&db, &alice, "Draft", false, 3).await;
    seed_video(&db, &bob, "100% cooking_fun", true, 4).await;

    let published = VideoQuery::default();
    let videos = db.find_videos(&published, 0, 10).await.unwrap();
    assert_eq!(videos.len(), 3);
    assert_eq!(videos[0].title, "100% cooking_fun");
    assert_eq!(db.count_videos(&published).await.unwrap(), 3);

    let search = VideoQuery {
        search: Some("COOKING".to_string()),
        ..Default::default()
    };
    assert_eq!(db.count_videos(&search).await.unwrap(), 3);

    // Wildcards in the search term match literally
    let literal = VideoQuery {
        search: Some("0% c".to_string()),
        ..Default::default()
    };
    assert_eq!(db.count_videos(&literal).await.unwrap(), 1);
    let underscore = VideoQuery {
        search: Some("g_f".to_string()),
        ..Default::default()
    };
    assert_eq!(db.count_videos(&underscore).await.unwrap(), 1);

    let own_channel = VideoQuery {
        owner_id: Some(alice.id.clone()),
        include_unpublished: true,
        sort_key: VideoSortKey::Title,
        direction: SortDirection::Asc,
        ..Default::default()
    };
    let titles: Vec<String> = db
        .find_videos(&own_channel, 0, 10)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.title)
        .collect();
    assert_eq!(titles, vec!["Cooking pasta", "cooking rice", "Draft"]);
}

#[tokio::test]
async fn test_find_videos_pages_are_complete() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;

    let mut expected = Vec::new();
    for i in 0..7 {
        expected.push(seed_video(&db, &alice, &format!("video {}", i), true, i).await.id);
    }
    expected.reverse();

    let query = VideoQuery::default();
    let mut seen = Vec::new();
    for page in 0..3 {
        let videos = db.find_videos(&query, page * 3, 3).await.unwrap();
        seen.extend(videos.into_iter().map(|v| v.id));
    }
    assert_eq!(seen, expected);

    let beyond = db.find_videos(&query, 10, 5).await.unwrap();
    assert!(beyond.is_empty());
}

#[tokio::test]
async fn test_toggle_like_involution() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let video = seed_video(&db, &alice, "intro", true, 0).await;

    let first = db
        .toggle_like(&alice.id, LikeKind::Video, &video.id)
        .await
        .unwrap();
    let Toggled::Activated(like) = first else {
        panic!("first toggle must activate");
    };
    assert_eq!(like.target_kind, "video");
    assert_eq!(like.liked_by, alice.id);
    assert_eq!(db.count_likes(LikeKind::Video, &video.id).await.unwrap(), 1);
    assert!(db.is_liked(&alice.id, LikeKind::Video, &video.id).await.unwrap());

    let second = db
        .toggle_like(&alice.id, LikeKind::Video, &video.id)
        .await
        .unwrap();
    assert!(matches!(second, Toggled::Deactivated));
    assert_eq!(db.count_likes(LikeKind::Video, &video.id).await.unwrap(), 0);
    assert!(!db.is_liked(&alice.id, LikeKind::Video, &video.id).await.unwrap());
}

#[tokio::test]
async fn test_like_kinds_are_independent() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let shared_id = EntityId::new().0;

    db.toggle_like(&alice.id, LikeKind::Video, &shared_id)
        .await
        .unwrap();
    let tweet_like = db
        .toggle_like(&alice.id, LikeKind::Tweet, &shared_id)
        .await
        .unwrap();

    assert!(matches!(tweet_like, Toggled::Activated(_)));
    assert_eq!(db.count_likes(LikeKind::Video, &shared_id).await.unwrap(), 1);
    assert_eq!(db.count_likes(LikeKind::Tweet, &shared_id).await.unwrap(), 1);
    assert_eq!(db.count_likes(LikeKind::Comment, &shared_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_concurrent_like_toggles_never_duplicate() {
    let (db, _temp_dir) = create_test_db().await;
    let db = Arc::new(db);
    let alice = seed_user(&db, "alice").await;
    let video = seed_video(&db, &alice, "intro", true, 0).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let db = db.clone();
        let actor = alice.id.clone();
        let target = video.id.clone();
        handles.push(tokio::spawn(async move {
            db.toggle_like(&actor, LikeKind::Video, &target).await
        }));
    }

    let mut activated = 0;
    let mut deactivated = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            Toggled::Activated(_) => activated += 1,
            Toggled::Deactivated => deactivated += 1,
        }
    }

    // Serialized toggles alternate, so an even number ends inactive
    assert_eq!(activated, 5);
    assert_eq!(deactivated, 5);
    assert_eq!(db.count_likes(LikeKind::Video, &video.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_remove_absent_edges_is_not_an_error() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;

    assert!(!db
        .remove_like(&alice.id, LikeKind::Tweet, &EntityId::new().0)
        .await
        .unwrap());
    assert!(!db.remove_subscription(&alice.id, &bob.id).await.unwrap());

    db.toggle_subscription(&alice.id, &bob.id).await.unwrap();
    let (first, second) = tokio::join!(
        db.remove_subscription(&alice.id, &bob.id),
        db.remove_subscription(&alice.id, &bob.id)
    );
    let removed = [first.unwrap(), second.unwrap()];
    assert_eq!(removed.iter().filter(|r| **r).count(), 1);
}

#[tokio::test]
async fn test_like_batches() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;
    let v1 = seed_video(&db, &alice, "one", true, 0).await;
    let v2 = seed_video(&db, &alice, "two", true, 1).await;
    let v3 = seed_video(&db, &alice, "three", true, 2).await;

    db.toggle_like(&alice.id, LikeKind::Video, &v1.id).await.unwrap();
    db.toggle_like(&bob.id, LikeKind::Video, &v1.id).await.unwrap();
    db.toggle_like(&bob.id, LikeKind::Video, &v2.id).await.unwrap();

    let ids = vec![v1.id.clone(), v2.id.clone(), v3.id.clone()];
    let counts = db.count_likes_batch(LikeKind::Video, &ids).await.unwrap();
    assert_eq!(counts.get(&v1.id), Some(&2));
    assert_eq!(counts.get(&v2.id), Some(&1));
    assert_eq!(counts.get(&v3.id), None);

    let liked = db
        .liked_target_ids(&alice.id, LikeKind::Video, &ids)
        .await
        .unwrap();
    assert!(liked.contains(&v1.id));
    assert_eq!(liked.len(), 1);

    let likes = db.find_likes_by_actor(&bob.id, LikeKind::Video).await.unwrap();
    assert_eq!(likes.len(), 2);
    assert!(db
        .find_likes_by_actor(&bob.id, LikeKind::Comment)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_batches_accept_more_ids_than_sqlite_binds() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;
    let video = seed_video(&db, &alice, "intro", true, 0).await;
    db.toggle_like(&bob.id, LikeKind::Video, &video.id).await.unwrap();
    db.toggle_subscription(&bob.id, &alice.id).await.unwrap();

    // Well past SQLite's host parameter limit, real IDs at both ends
    let mut ids: Vec<String> = (0..40_000).map(|_| EntityId::new().0).collect();
    ids[0] = alice.id.clone();
    ids.push(bob.id.clone());

    let users = db.get_users_by_ids(&ids).await.unwrap();
    let mut names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["alice", "bob"]);

    let counts = db.count_subscribers_batch(&ids).await.unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts.get(&alice.id), Some(&1));

    ids.push(video.id.clone());
    let videos = db.get_videos_by_ids(&ids).await.unwrap();
    assert_eq!(videos.len(), 1);

    let likes = db.count_likes_batch(LikeKind::Video, &ids).await.unwrap();
    assert_eq!(likes.get(&video.id), Some(&1));

    let liked = db
        .liked_target_ids(&bob.id, LikeKind::Video, &ids)
        .await
        .unwrap();
    assert!(liked.contains(&video.id));

    let playlist_counts = db.count_playlist_videos_batch(&ids).await.unwrap();
    assert!(playlist_counts.is_empty());
}

#[tokio::test]
async fn test_subscriptions() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;
    let carol = seed_user(&db, "carol").await;

    let toggled = db.toggle_subscription(&alice.id, &carol.id).await.unwrap();
    assert!(matches!(toggled, Toggled::Activated(ref s) if s.channel_id == carol.id));
    db.toggle_subscription(&bob.id, &carol.id).await.unwrap();

    assert!(db.is_subscribed(&alice.id, &carol.id).await.unwrap());
    assert_eq!(
        db.find_subscriptions_by_channel(&carol.id).await.unwrap().len(),
        2
    );
    assert_eq!(
        db.find_subscriptions_by_subscriber(&alice.id)
            .await
            .unwrap()
            .len(),
        1
    );

    let counts = db
        .count_subscribers_batch(&[carol.id.clone(), alice.id.clone()])
        .await
        .unwrap();
    assert_eq!(counts.get(&carol.id), Some(&2));
    assert_eq!(counts.get(&alice.id), None);

    // Self-subscription is allowed
    let own = db.toggle_subscription(&alice.id, &alice.id).await.unwrap();
    assert!(matches!(own, Toggled::Activated(_)));

    let untoggled = db.toggle_subscription(&alice.id, &carol.id).await.unwrap();
    assert!(matches!(untoggled, Toggled::Deactivated));
    assert!(!db.is_subscribed(&alice.id, &carol.id).await.unwrap());
}

#[tokio::test]
async fn test_comments_paginate_newest_first() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let video = seed_video(&db, &alice, "intro", true, 0).await;

    let first = seed_comment(&db, &video, &alice, "first").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = seed_comment(&db, &video, &alice, "second").await;

    let page = db.find_comments_by_video(&video.id, 0, 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, second.id);
    let page = db.find_comments_by_video(&video.id, 1, 1).await.unwrap();
    assert_eq!(page[0].id, first.id);
    assert_eq!(db.count_comments_by_video(&video.id).await.unwrap(), 2);

    let updated = db
        .update_comment_content(&first.id, "edited")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.content, "edited");
}

#[tokio::test]
async fn test_delete_video_without_cascade_leaves_dependents() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let video = seed_video(&db, &alice, "intro", true, 0).await;
    let comment = seed_comment(&db, &video, &alice, "nice").await;
    let playlist = seed_playlist(&db, &alice, "mix").await;

    db.toggle_like(&alice.id, LikeKind::Video, &video.id).await.unwrap();
    db.add_video_to_playlist(&playlist.id, &video.id).await.unwrap();

    db.delete_video(&video.id, false).await.unwrap().unwrap();

    assert_eq!(db.count_likes(LikeKind::Video, &video.id).await.unwrap(), 1);
    assert!(db.get_comment(&comment.id).await.unwrap().is_some());
    assert_eq!(
        db.get_playlist_video_ids(&playlist.id).await.unwrap(),
        vec![video.id.clone()]
    );
    // Dangling membership rows are not counted
    let counts = db
        .count_playlist_videos_batch(&[playlist.id.clone()])
        .await
        .unwrap();
    assert_eq!(counts.get(&playlist.id), None);
}

#[tokio::test]
async fn test_delete_video_with_cascade_removes_dependents() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;
    let video = seed_video(&db, &alice, "intro", true, 0).await;
    let other = seed_video(&db, &alice, "other", true, 1).await;
    let comment = seed_comment(&db, &video, &bob, "nice").await;
    let playlist = seed_playlist(&db, &alice, "mix").await;

    db.toggle_like(&bob.id, LikeKind::Video, &video.id).await.unwrap();
    db.toggle_like(&bob.id, LikeKind::Video, &other.id).await.unwrap();
    db.toggle_like(&alice.id, LikeKind::Comment, &comment.id)
        .await
        .unwrap();
    db.add_video_to_playlist(&playlist.id, &video.id).await.unwrap();
    db.add_video_to_playlist(&playlist.id, &other.id).await.unwrap();

    db.delete_video(&video.id, true).await.unwrap().unwrap();

    assert_eq!(db.count_likes(LikeKind::Video, &video.id).await.unwrap(), 0);
    assert_eq!(
        db.count_likes(LikeKind::Comment, &comment.id).await.unwrap(),
        0
    );
    assert!(db.get_comment(&comment.id).await.unwrap().is_none());
    assert_eq!(
        db.get_playlist_video_ids(&playlist.id).await.unwrap(),
        vec![other.id.clone()]
    );
    // Unrelated content is untouched
    assert_eq!(db.count_likes(LikeKind::Video, &other.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_tweet_and_comment_cascade() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let video = seed_video(&db, &alice, "intro", true, 0).await;
    let comment = seed_comment(&db, &video, &alice, "nice").await;
    let tweet = Tweet {
        id: EntityId::new().0,
        content: "hello".to_string(),
        owner_id: alice.id.clone(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    db.insert_tweet(&tweet).await.unwrap();

    db.toggle_like(&alice.id, LikeKind::Tweet, &tweet.id).await.unwrap();
    db.toggle_like(&alice.id, LikeKind::Comment, &comment.id)
        .await
        .unwrap();

    db.delete_tweet(&tweet.id, true).await.unwrap().unwrap();
    db.delete_comment(&comment.id, false).await.unwrap().unwrap();

    assert_eq!(db.count_likes(LikeKind::Tweet, &tweet.id).await.unwrap(), 0);
    assert_eq!(
        db.count_likes(LikeKind::Comment, &comment.id).await.unwrap(),
        1
    );
    assert!(db.find_tweets_by_owner(&alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_playlist_membership_is_an_ordered_set() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let v1 = seed_video(&db, &alice, "one", true, 0).await;
    let v2 = seed_video(&db, &alice, "two", false, 1).await;
    let v3 = seed_video(&db, &alice, "three", true, 2).await;
    let playlist = seed_playlist(&db, &alice, "mix").await;

    assert!(db.add_video_to_playlist(&playlist.id, &v3.id).await.unwrap());
    assert!(db.add_video_to_playlist(&playlist.id, &v1.id).await.unwrap());
    assert!(db.add_video_to_playlist(&playlist.id, &v2.id).await.unwrap());
    assert!(!db.add_video_to_playlist(&playlist.id, &v1.id).await.unwrap());

    assert_eq!(
        db.get_playlist_video_ids(&playlist.id).await.unwrap(),
        vec![v3.id.clone(), v1.id.clone(), v2.id.clone()]
    );

    let published: Vec<String> = db
        .get_published_playlist_videos(&playlist.id)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.id)
        .collect();
    assert_eq!(published, vec![v3.id.clone(), v1.id.clone()]);

    let counts = db
        .count_playlist_videos_batch(&[playlist.id.clone()])
        .await
        .unwrap();
    assert_eq!(counts.get(&playlist.id), Some(&3));

    assert!(db
        .remove_video_from_playlist(&playlist.id, &v3.id)
        .await
        .unwrap());
    assert!(!db
        .remove_video_from_playlist(&playlist.id, &v3.id)
        .await
        .unwrap());

    db.delete_playlist(&playlist.id).await.unwrap().unwrap();
    assert!(db
        .get_playlist_video_ids(&playlist.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_channel_totals() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;

    let empty = db.channel_totals(&alice.id).await.unwrap();
    assert_eq!(empty, ChannelTotals::default());

    let v1 = seed_video(&db, &alice, "one", true, 0).await;
    let v2 = seed_video(&db, &alice, "two", false, 1).await;
    db.toggle_like(&bob.id, LikeKind::Video, &v1.id).await.unwrap();
    db.toggle_like(&alice.id, LikeKind::Video, &v2.id).await.unwrap();
    db.toggle_like(&bob.id, LikeKind::Tweet, &v1.id).await.unwrap();
    db.toggle_subscription(&bob.id, &alice.id).await.unwrap();

    let totals = db.channel_totals(&alice.id).await.unwrap();
    assert_eq!(totals.total_videos, 2);
    assert_eq!(totals.total_views, 20);
    assert_eq!(totals.total_likes, 2);
    assert_eq!(totals.total_subscribers, 1);
}
