//! PostgreSQL repository tests. Run with `DATABASE_URL` set and `--ignored`.

mod common;

use std::sync::Arc;

use rest_boot::domain::entities::{Filter, Listing};
use rest_boot::domain::repositories::{
    RecordRepository, Scope, SettingStore, Transaction, UpdateOutcome,
};
use rest_boot::infrastructure::persistence::{PgRecordRepository, PgSettingStore};
use serde_json::json;
use sqlx::PgPool;

use common::attrs;

fn articles(pool: PgPool) -> PgRecordRepository {
    PgRecordRepository::new(Arc::new(pool), "articles")
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_create_commit_and_find(pool: PgPool) {
    let repo = articles(pool);

    let mut tx = repo.begin().await.unwrap();
    let record = repo
        .create(&mut tx, attrs(json!({"title": "hello"})))
        .await
        .unwrap()
        .unwrap();
    tx.commit().await.unwrap();

    let found = repo.find(record.id, Scope::Active).await.unwrap().unwrap();
    assert_eq!(found.attributes["title"], json!("hello"));
    assert!(!found.is_trashed());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_dropped_transaction_rolls_back(pool: PgPool) {
    let repo = articles(pool);

    let id = {
        let mut tx = repo.begin().await.unwrap();
        let record = repo
            .create(&mut tx, attrs(json!({"title": "draft"})))
            .await
            .unwrap()
            .unwrap();
        record.id
    };

    assert!(repo.find(id, Scope::Active).await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_resources_are_isolated(pool: PgPool) {
    let pool = Arc::new(pool);
    let articles = PgRecordRepository::new(pool.clone(), "articles");
    let comments = PgRecordRepository::new(pool, "comments");

    let mut tx = articles.begin().await.unwrap();
    let record = articles
        .create(&mut tx, attrs(json!({"title": "a"})))
        .await
        .unwrap()
        .unwrap();
    tx.commit().await.unwrap();

    assert!(comments.find(record.id, Scope::Active).await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_update_merges_jsonb(pool: PgPool) {
    let repo = articles(pool);

    let mut tx = repo.begin().await.unwrap();
    let record = repo
        .create(&mut tx, attrs(json!({"title": "old", "body": "kept"})))
        .await
        .unwrap()
        .unwrap();
    let outcome = repo
        .update(&mut tx, &record, attrs(json!({"title": "new"})))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(outcome, UpdateOutcome::Saved);
    let fresh = repo.find(record.id, Scope::Active).await.unwrap().unwrap();
    assert_eq!(fresh.attributes["title"], json!("new"));
    assert_eq!(fresh.attributes["body"], json!("kept"));
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_soft_delete_lifecycle(pool: PgPool) {
    let repo = articles(pool);

    let mut tx = repo.begin().await.unwrap();
    let record = repo
        .create(&mut tx, attrs(json!({"title": "x"})))
        .await
        .unwrap()
        .unwrap();
    assert!(repo.delete(&mut tx, &record).await.unwrap());
    tx.commit().await.unwrap();

    assert!(repo.find(record.id, Scope::Active).await.unwrap().is_none());
    let trashed = repo.find(record.id, Scope::OnlyTrashed).await.unwrap().unwrap();
    assert!(trashed.is_trashed());

    let mut tx = repo.begin().await.unwrap();
    assert!(repo.restore(&mut tx, &trashed).await.unwrap());
    tx.commit().await.unwrap();
    let active = repo.find(record.id, Scope::Active).await.unwrap().unwrap();

    let mut tx = repo.begin().await.unwrap();
    assert!(!repo.force_delete(&mut tx, &active).await.unwrap());
    assert!(repo.delete(&mut tx, &active).await.unwrap());
    assert!(repo.force_delete(&mut tx, &active).await.unwrap());
    tx.commit().await.unwrap();

    assert!(repo.find(record.id, Scope::OnlyTrashed).await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_query_filters_and_paginates(pool: PgPool) {
    let repo = articles(pool);

    let mut tx = repo.begin().await.unwrap();
    for i in 0..5 {
        let lang = if i % 2 == 0 { "en" } else { "zh" };
        repo.create(&mut tx, attrs(json!({"title": format!("post {i}"), "lang": lang})))
            .await
            .unwrap();
    }
    tx.commit().await.unwrap();

    let filter = Filter::from_input(&attrs(json!({"lang": "en", "per_page": "2"})), &[]).unwrap();
    match repo.query(&filter, Scope::Active).await.unwrap() {
        Listing::Paginated { items, total, .. } => {
            assert_eq!(total, 3);
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].attributes["title"], json!("post 4"));
        }
        other => panic!("expected a paginated listing, got {other:?}"),
    }

    let found = repo
        .find_by("title", "post 1", &Filter::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.attributes["lang"], json!("zh"));
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_keyword_search(pool: PgPool) {
    let repo = articles(pool);

    let mut tx = repo.begin().await.unwrap();
    repo.create(&mut tx, attrs(json!({"title": "Rust 50% off"})))
        .await
        .unwrap();
    repo.create(&mut tx, attrs(json!({"title": "Go tips"})))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let fields = vec!["title".to_string()];
    let filter = Filter::from_input(&attrs(json!({"_keyword": "50%"})), &fields).unwrap();
    match repo.query(&filter, Scope::Active).await.unwrap() {
        Listing::Items(items) => assert_eq!(items.len(), 1),
        other => panic!("expected plain items, got {other:?}"),
    }
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_settings_upsert(pool: PgPool) {
    let store = PgSettingStore::new(Arc::new(pool));

    assert!(!store.set_setting(attrs(json!({}))).await.unwrap());
    assert!(
        store
            .set_setting(attrs(json!({"site": "a", "flags": {"beta": true}})))
            .await
            .unwrap()
    );
    store.set_setting(attrs(json!({"site": "b"}))).await.unwrap();

    assert_eq!(store.get_setting("site", None).await.unwrap(), json!("b"));
    assert_eq!(
        store.get_setting("flags", None).await.unwrap(),
        json!({"beta": true})
    );
    assert_eq!(store.get_setting("missing", None).await.unwrap(), json!(""));

    let all = store.all_to_array().await.unwrap();
    assert_eq!(all.keys().collect::<Vec<_>>(), vec!["flags", "site"]);
}
