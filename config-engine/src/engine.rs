use logger_redacted::LoggerConfig;
use serde::{Deserialize, Serialize};
use shared_items::NameMatching;

/// Remote collection names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionsConfig {
    pub habits: String,
    pub tasks: String,
    pub users: String,
    /// Per-user sub-collection holding habit membership documents
    pub user_habits: String,
    pub user_tasks: String,
    pub user_invites: String,
    /// Per-user sub-collection holding the daily check-in
    pub user_private: String,
    pub user_friend_requests: String,
    /// Pending invitations indexed by item: `{item_invites}/{itemId}/{recipient}`
    pub item_invites: String,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            habits: "habits".to_string(),
            tasks: "tasks".to_string(),
            users: "users".to_string(),
            user_habits: "habits".to_string(),
            user_tasks: "tasks".to_string(),
            user_invites: "invites".to_string(),
            user_private: "private".to_string(),
            user_friend_requests: "friendRequests".to_string(),
            item_invites: "invites".to_string(),
        }
    }
}

/// Keys used in the local cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalKeysConfig {
    pub habit_list: String,
    pub task_list: String,
    pub daily_checkin: String,
}

impl Default for LocalKeysConfig {
    fn default() -> Self {
        Self {
            habit_list: "habitList".to_string(),
            task_list: "taskList".to_string(),
            daily_checkin: "dailyCheckin".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyCheckinConfig {
    pub id: String,
    pub name: String,
}

impl Default for DailyCheckinConfig {
    fn default() -> Self {
        Self {
            id: "daily-check-in".to_string(),
            name: "Daily Check-In".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub name_matching: NameMatching,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// Days after completion before a task is purged
    pub expiry_days: u32,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self { expiry_days: 14 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    pub max_buckets: usize,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self { max_buckets: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Account id treated as "not signed in", compared case-insensitively
    pub anonymous_account: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            anonymous_account: "Anonymous".to_string(),
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub collections: CollectionsConfig,
    pub local_keys: LocalKeysConfig,
    pub daily_checkin: DailyCheckinConfig,
    pub merge: MergeConfig,
    pub tasks: TasksConfig,
    pub charts: ChartsConfig,
    pub session: SessionConfig,
    pub logging: LoggerConfig,
}
