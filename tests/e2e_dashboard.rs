//! E2E tests for the channel dashboard

mod common;

use common::TestServer;
use common::schema_validator::assert_matches_schema;

#[tokio::test]
async fn test_channel_stats() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let bob = server.create_user("bob").await;
    let published = server.create_video(&alice, "published", true).await;
    server.create_video(&alice, "draft", false).await;
    let alice_token = server.token_for(&alice);
    let bob_token = server.token_for(&bob);

    server
        .post(
            &format!("/api/v1/likes/toggle/video/{}", published.id),
            &bob_token,
            None,
        )
        .await;
    server
        .post(
            &format!("/api/v1/subscriptions/toggle/{}", alice.id),
            &bob_token,
            None,
        )
        .await;

    let (status, body) = server.get("/api/v1/dashboard/stats", Some(&alice_token)).await;
    assert_eq!(status, 200);
    assert_matches_schema(&body["data"], "channel_stats");
    assert_eq!(body["data"]["totalVideos"], 2);
    assert_eq!(body["data"]["totalLikes"], 1);
    assert_eq!(body["data"]["totalSubscribers"], 1);
    assert_eq!(body["data"]["totalViews"], 0);

    let (status, body) = server.get("/api/v1/dashboard/videos", Some(&alice_token)).await;
    assert_eq!(status, 200);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let liked = rows
        .iter()
        .find(|row| row["id"] == published.id.as_str())
        .unwrap();
    assert_eq!(liked["likes"], 1);

    // Another channel sees its own, empty, dashboard
    let (_, body) = server.get("/api/v1/dashboard/stats", Some(&bob_token)).await;
    assert_eq!(body["data"]["totalVideos"], 0);

    let (status, _) = server.get("/api/v1/dashboard/stats", None).await;
    assert_eq!(status, 401);
}
