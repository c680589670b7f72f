//! Remote document layout and the conversions between items and documents

use config_engine::CollectionsConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_items::{DateCounter, Habit, ItemKind, Shareable, Task, TaskEdit, UNSET_IMPORTANCE};

use crate::error::{SyncError, SyncResult};
use crate::store::Document;

pub(crate) const ROLES_FIELD: &str = "sharedUsers";
pub(crate) const ACTIVITY_FIELD: &str = "activityLog";
pub(crate) const PRIORITY_FIELD: &str = "userPriority";
pub(crate) const FRIENDS_FIELD: &str = "friends";

/// Collection paths derived from the configured names
#[derive(Debug, Clone)]
pub struct RemotePaths {
    collections: CollectionsConfig,
}

impl RemotePaths {
    pub fn new(collections: CollectionsConfig) -> Self {
        Self { collections }
    }

    /// Shared entity documents: `habits` or `tasks`
    pub fn items(&self, kind: ItemKind) -> String {
        match kind {
            ItemKind::Habit => self.collections.habits.clone(),
            ItemKind::Task => self.collections.tasks.clone(),
        }
    }

    /// Membership documents of one account: `users/{account}/habits`
    pub fn user_items(&self, account: &str, kind: ItemKind) -> String {
        let sub = match kind {
            ItemKind::Habit => &self.collections.user_habits,
            ItemKind::Task => &self.collections.user_tasks,
        };
        self.user_collection(account, sub)
    }

    pub fn user_invites(&self, account: &str) -> String {
        self.user_collection(account, &self.collections.user_invites)
    }

    pub fn user_private(&self, account: &str) -> String {
        self.user_collection(account, &self.collections.user_private)
    }

    pub fn user_friend_requests(&self, account: &str) -> String {
        self.user_collection(account, &self.collections.user_friend_requests)
    }

    /// Account documents, keyed by account id
    pub fn users(&self) -> &str {
        &self.collections.users
    }

    /// Pending invitations of one item, keyed by recipient
    pub fn item_invites(&self, item_id: &str) -> String {
        format!("{}/{}", self.collections.item_invites, item_id)
    }

    fn user_collection(&self, account: &str, sub: &str) -> String {
        format!("{}/{}/{}", self.collections.users, account, sub)
    }
}

pub fn to_document<T: Serialize>(value: &T) -> SyncResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(SyncError::Serialization(format!(
            "expected an object document, got {}",
            json_kind(&other)
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(document: Document) -> SyncResult<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// A single-field document
pub(crate) fn field_document(field: &str, value: Value) -> Document {
    let mut document = Document::new();
    document.insert(field.to_string(), value);
    document
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// An item persisted as a shared document plus one membership document per
/// collaborator.
pub trait StoredItem: Shareable + Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Per-account state kept in `users/{account}/{kind}/{id}`
    fn membership_document(&self) -> SyncResult<Document>;

    /// Overlay the acting account's membership state onto the shared copy
    fn apply_membership(&mut self, membership: &Document) -> SyncResult<()>;
}

impl StoredItem for Habit {
    fn membership_document(&self) -> SyncResult<Document> {
        Ok(field_document(ACTIVITY_FIELD, serde_json::to_value(self.activity())?))
    }

    fn apply_membership(&mut self, membership: &Document) -> SyncResult<()> {
        if let Some(log) = membership.get(ACTIVITY_FIELD) {
            let activity: DateCounter = serde_json::from_value(log.clone())?;
            self.set_activity(activity);
        }
        Ok(())
    }
}

impl StoredItem for Task {
    fn membership_document(&self) -> SyncResult<Document> {
        Ok(field_document(PRIORITY_FIELD, Value::from(self.priority())))
    }

    fn apply_membership(&mut self, membership: &Document) -> SyncResult<()> {
        if let Some(priority) = membership.get(PRIORITY_FIELD).and_then(Value::as_i64) {
            let importance = i32::try_from(priority)
                .ok()
                .filter(|p| *p != UNSET_IMPORTANCE);
            self.apply(TaskEdit::Importance(importance));
        }
        Ok(())
    }
}
