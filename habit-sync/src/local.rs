use config_engine::LocalKeysConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_items::{Habit, ItemError, ItemKind, Task};
use std::sync::Arc;

use crate::cache::LocalCache;
use crate::error::SyncResult;

/// Typed view over the local cache: the anonymous habit and task lists and
/// the daily check-in copy, each stored as one JSON value.
#[derive(Clone)]
pub struct LocalStore {
    cache: Arc<dyn LocalCache>,
    keys: LocalKeysConfig,
}

impl LocalStore {
    pub fn new(cache: Arc<dyn LocalCache>, keys: LocalKeysConfig) -> Self {
        Self { cache, keys }
    }

    pub async fn load_habits(&self) -> SyncResult<Vec<Habit>> {
        self.load_items(ItemKind::Habit).await
    }

    pub async fn save_habits(&self, habits: &[Habit]) -> SyncResult<()> {
        self.save_items(ItemKind::Habit, habits).await
    }

    pub async fn load_tasks(&self) -> SyncResult<Vec<Task>> {
        self.load_items(ItemKind::Task).await
    }

    pub async fn save_tasks(&self, tasks: &[Task]) -> SyncResult<()> {
        self.save_items(ItemKind::Task, tasks).await
    }

    /// The list stored for `kind`; a missing entry is an empty list
    pub(crate) async fn load_items<T: DeserializeOwned>(&self, kind: ItemKind) -> SyncResult<Vec<T>> {
        self.load_list(self.list_key(kind)).await
    }

    pub(crate) async fn save_items<T: Serialize>(&self, kind: ItemKind, items: &[T]) -> SyncResult<()> {
        self.save(self.list_key(kind), items).await
    }

    pub async fn load_checkin(&self) -> SyncResult<Option<Habit>> {
        match self.cache.get(&self.keys.daily_checkin).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn save_checkin(&self, habit: &Habit) -> SyncResult<()> {
        self.save(&self.keys.daily_checkin, habit).await
    }

    /// Drop the habit and task lists; the check-in copy is kept
    pub async fn clear_lists(&self) -> SyncResult<()> {
        self.cache.delete(&self.keys.habit_list).await?;
        self.cache.delete(&self.keys.task_list).await?;
        Ok(())
    }

    fn list_key(&self, kind: ItemKind) -> &str {
        match kind {
            ItemKind::Habit => &self.keys.habit_list,
            ItemKind::Task => &self.keys.task_list,
        }
    }

    async fn load_list<T: DeserializeOwned>(&self, key: &str) -> SyncResult<Vec<T>> {
        let Some(raw) = self.cache.get(key).await? else {
            return Ok(Vec::new());
        };

        let value: Value = serde_json::from_str(&raw)?;
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(_) => Ok(serde_json::from_value(value)?),
            _ => Err(ItemError::InvalidDocument(format!("local entry '{key}' is not an array")).into()),
        }
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> SyncResult<()> {
        let raw = serde_json::to_string(value)?;
        self.cache.set(key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryLocalCache;
    use error_common::{Categorized, ErrorCategory};

    fn store() -> (Arc<InMemoryLocalCache>, LocalStore) {
        let cache = Arc::new(InMemoryLocalCache::new());
        let local = LocalStore::new(cache.clone(), LocalKeysConfig::default());
        (cache, local)
    }

    #[tokio::test]
    async fn test_missing_lists_are_empty() {
        let (_, local) = store();
        assert!(local.load_habits().await.unwrap().is_empty());
        assert!(local.load_tasks().await.unwrap().is_empty());
        assert!(local.load_checkin().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_habits_round_trip() {
        let (_, local) = store();
        let habits = vec![Habit::new("Run", Some("km".into())).with_id("run")];
        local.save_habits(&habits).await.unwrap();

        let loaded = local.load_habits().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].unit(), Some("km"));
    }

    #[tokio::test]
    async fn test_non_array_list_is_validation_error() {
        let (cache, local) = store();
        cache.set("habitList", r#"{"name": "Run"}"#).await.unwrap();

        let err = local.load_habits().await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[tokio::test]
    async fn test_clear_keeps_checkin() {
        let (_, local) = store();
        local.save_tasks(&[Task::new("Report").with_id("t1")]).await.unwrap();
        local.save_checkin(&Habit::new("Daily Check-In", None).with_id("daily-check-in")).await.unwrap();

        local.clear_lists().await.unwrap();
        assert!(local.load_tasks().await.unwrap().is_empty());
        assert!(local.load_checkin().await.unwrap().is_some());
    }
}
