//! Database store integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `rolapet_test`)
//!   `TEST_DB_PASSWORD` (default: `rolapet_test`)
//!   `TEST_DB_NAME` (default: `rolapet_test`)

#![allow(clippy::unwrap_used)]

use rolapet_db::KeyValueStore;
use rolapet_db::repositories::BannedWordRepository;
use rolapet_db::store::DatabaseStore;
use rolapet_db::test_utils::{TestDatabase, TestDbConfig};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let result = TestDatabase::with_config(TestDbConfig::default()).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_set_get_overwrite() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.unwrap();
    let kv = DatabaseStore::new(Arc::clone(&db.conn), "rolapet_");

    kv.set("bannedWords", json!(["odio"])).await.unwrap();
    kv.set("bannedWords", json!(["odio", "amenaza"])).await.unwrap();

    assert_eq!(
        kv.get("bannedWords").await.unwrap(),
        Some(json!(["odio", "amenaza"]))
    );
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_clear_keeps_other_namespaces() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.unwrap();
    let ours = DatabaseStore::new(Arc::clone(&db.conn), "rolapet_");
    let theirs = DatabaseStore::new(Arc::clone(&db.conn), "other_");

    ours.set("users", json!([])).await.unwrap();
    theirs.set("users", json!([])).await.unwrap();
    ours.clear().await.unwrap();

    assert!(ours.get("users").await.unwrap().is_none());
    assert!(theirs.get("users").await.unwrap().is_some());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_repository_over_database_store() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.unwrap();
    let repo = BannedWordRepository::new(&db.store("rolapet_"));

    repo.add("Violencia").await.unwrap();

    assert_eq!(repo.all().await.unwrap(), vec!["violencia"]);
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}
