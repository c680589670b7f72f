use config_engine::EngineConfig;
use habit_sync::{
    InMemoryDocumentStore, LocalCache, Session, SqliteCacheConfig, SqliteLocalCache, SyncCoordinator,
};
use shared_items::{Habit, Shareable};
use std::sync::Arc;
use tempfile::TempDir;

fn file_config(dir: &TempDir) -> SqliteCacheConfig {
    SqliteCacheConfig {
        db_path: dir.path().join("cache.db").to_str().unwrap().to_string(),
        max_connections: 2,
        enable_wal: true,
    }
}

#[tokio::test]
async fn test_values_survive_reopen() {
    let dir = TempDir::new().unwrap();

    let cache = SqliteLocalCache::new(file_config(&dir)).await.unwrap();
    cache.set("habitList", "[]").await.unwrap();
    cache.set("dailyCheckin", "{}").await.unwrap();
    cache.delete("dailyCheckin").await.unwrap();
    cache.close().await;

    let reopened = SqliteLocalCache::new(file_config(&dir)).await.unwrap();
    assert_eq!(reopened.get("habitList").await.unwrap().as_deref(), Some("[]"));
    assert!(reopened.get("dailyCheckin").await.unwrap().is_none());
    assert_eq!(reopened.len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_anonymous_session_over_sqlite() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(SqliteLocalCache::new(file_config(&dir)).await.unwrap());
    let coordinator = SyncCoordinator::new(
        Arc::new(InMemoryDocumentStore::new()),
        cache.clone(),
        EngineConfig::default(),
    );

    let anon = Session::Anonymous;
    assert!(coordinator.create_habit(&anon, Habit::new("Run", Some("km".into()))).await.ok);
    assert!(coordinator.sync_daily_checkin(&anon).await.ok);

    let habits = coordinator.list_habits(&anon).await.into_data().unwrap();
    assert_eq!(habits.len(), 1);
    assert_eq!(habits[0].name(), "Run");
    assert!(cache.get("habitList").await.unwrap().is_some());
    assert!(cache.get("dailyCheckin").await.unwrap().is_some());
}
