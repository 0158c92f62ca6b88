mod common;

use serde_json::{Value, json};

use common::{attrs, create_test_app};

const HIT: &str = "x-page-cache";

#[tokio::test]
async fn test_second_get_is_served_from_cache() {
    let app = create_test_app(true);
    app.articles.seed(attrs(json!({"title": "cached"}))).await;

    let first = app.server.get("/articles").await;
    first.assert_status_ok();
    assert!(first.maybe_header(HIT).is_none());

    let second = app.server.get("/articles").await;
    assert_eq!(second.header(HIT), "hit");
    assert_eq!(second.header("content-type"), "application/json");
    assert_eq!(second.text(), first.text());
}

#[tokio::test]
async fn test_query_string_is_part_of_the_key() {
    let app = create_test_app(true);

    app.server.get("/articles?page=1").await;
    let other = app.server.get("/articles?page=2").await;

    assert!(other.maybe_header(HIT).is_none());
}

#[tokio::test]
async fn test_write_forgets_group_pages() {
    let app = create_test_app(true);
    app.articles.seed(attrs(json!({"title": "one"}))).await;

    app.server.get("/articles").await;
    assert_eq!(app.server.get("/articles").await.header(HIT), "hit");

    app.server
        .post("/articles")
        .json(&json!({"title": "two"}))
        .await
        .assert_status_ok();

    let fresh = app.server.get("/articles").await;
    assert!(fresh.maybe_header(HIT).is_none());
    let body: Value = fresh.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_write_keeps_cached_pages() {
    let app = create_test_app(true);

    app.server.get("/articles").await;
    app.server
        .delete("/articles/404")
        .await
        .assert_status_ok();

    assert_eq!(app.server.get("/articles").await.header(HIT), "hit");
}

#[tokio::test]
async fn test_coded_failures_are_cached_like_any_ok_page() {
    let app = create_test_app(true);

    app.server.get("/articles?page=0").await;
    let again = app.server.get("/articles?page=0").await;

    assert_eq!(again.header(HIT), "hit");
    let body: Value = again.json();
    assert_eq!(body["code"], json!(1001));
}

#[tokio::test]
async fn test_non_ok_responses_are_not_cached() {
    let app = create_test_app(true);

    app.server.get("/articles/nope/deeper/path").expect_failure().await;
    assert!(app.cache.is_empty());
}

#[tokio::test]
async fn test_post_responses_are_never_cached() {
    let app = create_test_app(true);

    app.server
        .post("/articles")
        .json(&json!({"title": "a"}))
        .await;

    assert!(app.cache.is_empty());
}

#[tokio::test]
async fn test_user_meta_is_never_shared_through_the_cache() {
    let app = create_test_app(true);
    app.articles.seed(attrs(json!({"title": "shared"}))).await;
    app.state
        .meta
        .save("1", "secret", &json!("for-user-1"))
        .await
        .unwrap();
    app.state
        .meta
        .save("2", "notice", &json!("for-user-2"))
        .await
        .unwrap();

    // An anonymous page is cached and must not shadow identified requests.
    app.server.get("/articles").await;
    assert_eq!(app.server.get("/articles").await.header(HIT), "hit");

    let first = app.server.get("/articles").add_header("X-User", "1").await;
    assert!(first.maybe_header(HIT).is_none());
    let body: Value = first.json();
    assert_eq!(body["meta"]["secret"], json!("for-user-1"));

    let second = app.server.get("/articles").add_header("X-User", "2").await;
    assert!(second.maybe_header(HIT).is_none());
    let body: Value = second.json();
    assert!(body["meta"].get("secret").is_none());
    assert_eq!(body["meta"]["notice"], json!("for-user-2"));

    let anonymous: Value = app.server.get("/articles").await.json();
    assert!(anonymous.get("meta").is_none());

    let again: Value = app
        .server
        .get("/articles")
        .add_header("X-User", "2")
        .await
        .json();
    assert!(again.get("meta").is_none());
}
