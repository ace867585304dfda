//! Post, vote, and listing integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::{json, Value};

async fn create_post(harness: &TestHarness, author: &str, title: &str, tag: &str) -> String {
    let (name, value) = harness.auth(author);
    let response = harness
        .server
        .post("/posts")
        .add_header(name, value)
        .json(&json!({ "title": title, "body": "body text", "tag": tag }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

async fn vote(harness: &TestHarness, voter: &str, post_id: &str, vote_type: &str) -> Value {
    let (name, value) = harness.auth(voter);
    let response = harness
        .server
        .patch(&format!("/posts/{post_id}/vote"))
        .add_header(name, value)
        .json(&json!({ "vote_type": vote_type }))
        .await;
    response.assert_status_ok();
    response.json()
}

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn create_post_uses_stored_name() {
    let harness = TestHarness::new();
    harness.seed_user("alice@x.com", "Alice");

    let id = create_post(&harness, "alice@x.com", "Openings", "chess").await;

    let response = harness.server.get(&format!("/posts/{id}")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["author_email"], "alice@x.com");
    assert_eq!(body["author_name"], "Alice");
    assert_eq!(body["up_vote"], 0);
    assert_eq!(body["down_vote"], 0);
}

#[tokio::test]
async fn create_post_requires_title() {
    let harness = TestHarness::new();
    let (name, value) = harness.auth("alice@x.com");

    let response = harness
        .server
        .post("/posts")
        .add_header(name, value)
        .json(&json!({ "title": "  ", "body": "b", "tag": "t" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_post_id_is_bad_request() {
    let harness = TestHarness::new();

    let response = harness.server.get("/posts/not-a-ulid").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_post_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/posts/01ARZ3NDEKTSV4RRFFQ69G5FAV")
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
}

// ============================================================================
// Votes
// ============================================================================

#[tokio::test]
async fn vote_cast_repeat_and_switch() {
    let harness = TestHarness::new();
    let id = create_post(&harness, "alice@x.com", "Openings", "chess").await;

    let body = vote(&harness, "c@x.com", &id, "upvote").await;
    assert_eq!(body["outcome"], "cast");
    assert_eq!(body["up_vote"], 1);

    let body = vote(&harness, "c@x.com", &id, "upvote").await;
    assert_eq!(body["outcome"], "already_voted");
    assert_eq!(body["message"], "Already up voted");
    assert_eq!(body["up_vote"], 1);

    let body = vote(&harness, "c@x.com", &id, "downvote").await;
    assert_eq!(body["outcome"], "switched");
    assert_eq!(body["up_vote"], 0);
    assert_eq!(body["down_vote"], 1);

    let post: Value = harness.server.get(&format!("/posts/{id}")).await.json();
    assert_eq!(post["voted_by"]["up_voters"], json!([]));
    assert_eq!(post["voted_by"]["down_voters"], json!(["c@x.com"]));
}

#[tokio::test]
async fn unknown_vote_type_is_rejected() {
    let harness = TestHarness::new();
    let id = create_post(&harness, "alice@x.com", "Openings", "chess").await;
    let (name, value) = harness.auth("c@x.com");

    let response = harness
        .server
        .patch(&format!("/posts/{id}/vote"))
        .add_header(name, value)
        .json(&json!({ "vote_type": "sideways" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn vote_requires_session() {
    let harness = TestHarness::new();
    let id = create_post(&harness, "alice@x.com", "Openings", "chess").await;

    let response = harness
        .server
        .patch(&format!("/posts/{id}/vote"))
        .json(&json!({ "vote_type": "upvote" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn list_posts_filters_and_windows() {
    let harness = TestHarness::new();
    create_post(&harness, "alice@x.com", "one", "Chess").await;
    create_post(&harness, "bob@x.com", "two", "go").await;
    create_post(&harness, "alice@x.com", "three", "chess-variants").await;

    let body: Value = harness.server.get("/posts").await.json();
    let titles: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["three", "two", "one"]);
    assert_eq!(body["total"], 3);
    assert_eq!(body["has_more"], false);

    let body: Value = harness
        .server
        .get("/posts")
        .add_query_param("search", "CHESS")
        .await
        .json();
    assert_eq!(body["total"], 2);

    let body: Value = harness
        .server
        .get("/posts")
        .add_query_param("email", "bob@x.com")
        .await
        .json();
    assert_eq!(body["items"][0]["title"], "two");
    assert_eq!(body["total"], 1);

    let body: Value = harness
        .server
        .get("/posts")
        .add_query_param("page", 1)
        .add_query_param("size", 2)
        .await
        .json();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["title"], "one");

    let body: Value = harness
        .server
        .get("/posts")
        .add_query_param("limit", 1)
        .add_query_param("page", 2)
        .await
        .json();
    assert_eq!(body["items"][0]["title"], "three");
    assert_eq!(body["has_more"], true);
}

#[tokio::test]
async fn popular_sort_orders_by_score() {
    let harness = TestHarness::new();
    let low = create_post(&harness, "alice@x.com", "low", "t").await;
    let high = create_post(&harness, "alice@x.com", "high", "t").await;
    create_post(&harness, "alice@x.com", "flat", "t").await;

    vote(&harness, "a@x.com", &high, "upvote").await;
    vote(&harness, "b@x.com", &high, "upvote").await;
    vote(&harness, "a@x.com", &low, "downvote").await;

    let body: Value = harness
        .server
        .get("/posts")
        .add_query_param("sort", "popular")
        .await
        .json();
    let titles: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["high", "flat", "low"]);
}

#[tokio::test]
async fn counts_report_their_guarantee() {
    let harness = TestHarness::new();
    create_post(&harness, "alice@x.com", "one", "t").await;
    create_post(&harness, "bob@x.com", "two", "t").await;

    let body: Value = harness
        .server
        .get("/post-count")
        .add_query_param("email", "alice@x.com")
        .await
        .json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["estimated"], false);

    let body: Value = harness.server.get("/posts-count").await.json();
    assert_eq!(body["estimated"], true);
    assert!(body["count"].is_u64());
}

#[tokio::test]
async fn blank_author_counts_every_post() {
    let harness = TestHarness::new();
    create_post(&harness, "alice@x.com", "one", "t").await;
    create_post(&harness, "bob@x.com", "two", "t").await;

    let response = harness
        .server
        .get("/post-count")
        .add_query_param("email", "")
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["count"], 2);

    let listed: Value = harness
        .server
        .get("/posts")
        .add_query_param("email", "")
        .await
        .json();
    assert_eq!(listed["total"], 2);
}

// ============================================================================
// Deletion
// ============================================================================

#[tokio::test]
async fn only_author_or_admin_deletes() {
    let harness = TestHarness::new();
    harness.seed_admin("mod@x.com");
    let first = create_post(&harness, "alice@x.com", "one", "t").await;
    let second = create_post(&harness, "alice@x.com", "two", "t").await;

    let (name, value) = harness.auth("bob@x.com");
    let response = harness
        .server
        .delete(&format!("/posts/{first}"))
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let (name, value) = harness.auth("alice@x.com");
    harness
        .server
        .delete(&format!("/posts/{first}"))
        .add_header(name, value)
        .await
        .assert_status_ok();

    let (name, value) = harness.auth("mod@x.com");
    harness
        .server
        .delete(&format!("/posts/{second}"))
        .add_header(name, value)
        .await
        .assert_status_ok();

    harness
        .server
        .get(&format!("/posts/{first}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
