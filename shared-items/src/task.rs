use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{ItemError, Result};
use crate::roles::RoleSet;
use crate::shareable::{ItemKind, Shareable};

/// Importance value meaning "not set"
pub const UNSET_IMPORTANCE: i32 = -1;

const UNNAMED_TASK: &str = "Unnamed Task";

/// A shared to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TaskDocument")]
pub struct Task {
    id: String,
    name: String,
    description: String,
    importance: i32,
    #[serde(with = "crate::dates::timestamp::option")]
    deadline: Option<DateTime<Utc>>,
    completed: bool,
    #[serde(with = "crate::dates::timestamp::option")]
    last_completion_date: Option<DateTime<Utc>>,
    shared_users: RoleSet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDocument {
    #[serde(default, alias = "taskID")]
    id: Option<String>,
    #[serde(default, alias = "taskName")]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    importance: Option<i32>,
    #[serde(default, with = "crate::dates::timestamp::option")]
    deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default, with = "crate::dates::timestamp::option")]
    last_completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    shared_users: RoleSet,
}

impl TryFrom<TaskDocument> for Task {
    type Error = ItemError;

    fn try_from(doc: TaskDocument) -> Result<Self> {
        let mut task = Self::created_at(doc.name, Utc::now());
        match doc.id {
            Some(id) if !id.is_empty() => task.id = id,
            _ => return Err(ItemError::InvalidDocument("task document without an id".to_string())),
        }
        task.description = doc.description.unwrap_or_default();
        task.importance = doc.importance.unwrap_or(UNSET_IMPORTANCE);
        task.deadline = doc.deadline;
        task.completed = doc.completed.unwrap_or(false);
        task.last_completion_date = if task.completed { doc.last_completion_date } else { None };
        task.shared_users = doc.shared_users;
        Ok(task)
    }
}

/// A single typed property edit
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEdit {
    Name(String),
    Description(String),
    Deadline(Option<DateTime<Utc>>),
    Importance(Option<i32>),
}

/// Orderings offered for task lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSort {
    DeadlineEarliest,
    DeadlineFurthest,
    ImportanceHighest,
    ImportanceLowest,
}

impl TaskSort {
    /// Stable sort; tasks without a deadline go last for both deadline orders
    pub fn sort(&self, tasks: &mut [Task]) {
        match self {
            Self::DeadlineEarliest => tasks.sort_by(|a, b| by_deadline(a, b, false)),
            Self::DeadlineFurthest => tasks.sort_by(|a, b| by_deadline(a, b, true)),
            Self::ImportanceHighest => tasks.sort_by(|a, b| b.importance.cmp(&a.importance)),
            Self::ImportanceLowest => tasks.sort_by(|a, b| a.importance.cmp(&b.importance)),
        }
    }
}

fn by_deadline(a: &Task, b: &Task, reverse: bool) -> Ordering {
    match (a.deadline, b.deadline) {
        (Some(x), Some(y)) if reverse => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self::created_at(name, Utc::now())
    }

    /// New task whose id is derived from the name and `created_at` in epoch milliseconds
    pub fn created_at(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        let name = name.into();
        let id = format!("{}{}", name, created_at.timestamp_millis());
        Self {
            id,
            name: display_name(name),
            description: String::new(),
            importance: UNSET_IMPORTANCE,
            deadline: None,
            completed: false,
            last_completion_date: None,
            shared_users: RoleSet::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_importance(mut self, importance: i32) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_roles(mut self, roles: RoleSet) -> Self {
        self.shared_users = roles;
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// `None` when unset
    pub fn importance(&self) -> Option<i32> {
        (self.importance != UNSET_IMPORTANCE).then_some(self.importance)
    }

    /// Raw importance, `-1` when unset
    pub fn priority(&self) -> i32 {
        self.importance
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn last_completion_date(&self) -> Option<DateTime<Utc>> {
        self.last_completion_date
    }

    pub fn set_roles(&mut self, roles: RoleSet) {
        self.shared_users = roles;
    }

    /// Completing stamps `now`; reopening clears the completion date
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        match (self.completed, completed) {
            (false, true) => self.last_completion_date = Some(now),
            (true, false) => self.last_completion_date = None,
            _ => {}
        }
        self.completed = completed;
    }

    /// Completed and at least `expiry_days` whole days since completion
    pub fn is_expired(&self, now: DateTime<Utc>, expiry_days: u32) -> bool {
        if !self.completed {
            return false;
        }
        match self.last_completion_date {
            Some(done) => (now - done).num_days() >= i64::from(expiry_days),
            None => false,
        }
    }

    pub fn apply(&mut self, edit: TaskEdit) {
        match edit {
            TaskEdit::Name(name) => self.name = display_name(name),
            TaskEdit::Description(description) => self.description = description,
            TaskEdit::Deadline(deadline) => self.deadline = deadline,
            TaskEdit::Importance(importance) => self.importance = importance.unwrap_or(UNSET_IMPORTANCE),
        }
    }
}

fn display_name(name: String) -> String {
    if name.is_empty() {
        UNNAMED_TASK.to_string()
    } else {
        name
    }
}

impl Shareable for Task {
    const KIND: ItemKind = ItemKind::Task;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn roles(&self) -> &RoleSet {
        &self.shared_users
    }

    fn roles_mut(&mut self) -> &mut RoleSet {
        &mut self.shared_users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_task_defaults() {
        let task = Task::created_at("", at(1));
        assert_eq!(task.name(), "Unnamed Task");
        assert_eq!(task.id(), "1704110400000");
        assert_eq!(task.importance(), None);
        assert_eq!(task.priority(), -1);

        let named = Task::created_at("Pay rent", at(1));
        assert_eq!(named.id(), "Pay rent1704110400000");
    }

    #[test]
    fn test_completion_transitions() {
        let mut task = Task::created_at("Pay rent", at(1));
        task.set_completed(true, at(2));
        assert_eq!(task.last_completion_date(), Some(at(2)));

        task.set_completed(true, at(3));
        assert_eq!(task.last_completion_date(), Some(at(2)));

        task.set_completed(false, at(4));
        assert!(!task.is_completed());
        assert_eq!(task.last_completion_date(), None);
    }

    #[test]
    fn test_expiry_after_fourteen_days() {
        let mut task = Task::created_at("Pay rent", at(1));
        task.set_completed(true, at(1));
        assert!(!task.is_expired(at(1) + Duration::days(13), 14));
        assert!(task.is_expired(at(1) + Duration::days(14), 14));

        let open = Task::created_at("Call mum", at(1));
        assert!(!open.is_expired(at(1) + Duration::days(100), 14));
    }

    #[test]
    fn test_edits() {
        let mut task = Task::created_at("Draft", at(1)).with_importance(3);
        task.apply(TaskEdit::Name(String::new()));
        task.apply(TaskEdit::Description("first pass".into()));
        task.apply(TaskEdit::Deadline(Some(at(9))));
        task.apply(TaskEdit::Importance(None));

        assert_eq!(task.name(), "Unnamed Task");
        assert_eq!(task.description(), "first pass");
        assert_eq!(task.deadline(), Some(at(9)));
        assert_eq!(task.importance(), None);
    }

    #[test]
    fn test_sort_orders() {
        let mut tasks = vec![
            Task::created_at("none", at(1)).with_importance(1),
            Task::created_at("late", at(1)).with_deadline(at(20)).with_importance(5),
            Task::created_at("soon", at(1)).with_deadline(at(5)),
        ];

        TaskSort::DeadlineEarliest.sort(&mut tasks);
        let names: Vec<&str> = tasks.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["soon", "late", "none"]);

        TaskSort::DeadlineFurthest.sort(&mut tasks);
        let names: Vec<&str> = tasks.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["late", "soon", "none"]);

        TaskSort::ImportanceHighest.sort(&mut tasks);
        assert_eq!(tasks[0].name(), "late");
        TaskSort::ImportanceLowest.sort(&mut tasks);
        assert_eq!(tasks[0].name(), "soon");
    }

    #[test]
    fn test_parses_legacy_document() {
        let json = r#"{
            "taskID": "t1",
            "taskName": "Water plants",
            "importance": null,
            "deadline": null,
            "completed": true,
            "lastCompletionDate": {"seconds": 1704110400, "nanoseconds": 0},
            "sharedUsers": {}
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id(), "t1");
        assert_eq!(task.importance(), None);
        assert_eq!(task.last_completion_date(), Some(at(1)));
        assert!(task.roles().is_empty());
    }

    #[test]
    fn test_round_trip() {
        let task = Task::created_at("Pay rent", at(1))
            .with_deadline(at(31))
            .with_description("landlord")
            .with_roles(RoleSet::with_owner("ana@example.com", at(1)));
        let json = serde_json::to_string(&task).unwrap();
        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, task);
    }

    #[test]
    fn test_document_without_id_is_rejected() {
        assert!(serde_json::from_str::<Task>(r#"{"name": "x"}"#).is_err());
    }
}
