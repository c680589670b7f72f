use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::date_counter::DateCounter;
use crate::dates::{elapsed_days, start_of_day, AggregateMode, TimeFrame};
use crate::error::{ItemError, Result};
use crate::goal::Goal;
use crate::roles::RoleSet;
use crate::shareable::{ItemKind, Shareable};

/// A tracked habit: per-day activity, an optional goal and its collaborators.
///
/// The creation date never lies after the first logged day; every mutation
/// that can move either re-applies that correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "HabitDocument")]
pub struct Habit {
    id: String,
    name: String,
    unit: Option<String>,
    activity_log: DateCounter,
    goal: Option<Goal>,
    #[serde(with = "crate::dates::timestamp")]
    creation_date: DateTime<Utc>,
    shared_users: RoleSet,
}

/// Persisted shape, including the field names older clients wrote
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HabitDocument {
    #[serde(default, alias = "habitID")]
    id: Option<String>,
    #[serde(alias = "habitName")]
    name: String,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    activity_log: DateCounter,
    #[serde(default)]
    goal: Option<Goal>,
    #[serde(default, with = "crate::dates::timestamp::option")]
    creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    shared_users: RoleSet,
}

impl TryFrom<HabitDocument> for Habit {
    type Error = ItemError;

    fn try_from(doc: HabitDocument) -> Result<Self> {
        if let Some(goal) = &doc.goal {
            goal.validate()?;
        }

        let created_at = doc.creation_date.unwrap_or_else(Utc::now);
        let mut habit = Self::created_at(doc.name, doc.unit, created_at);
        if let Some(id) = doc.id.filter(|id| !id.is_empty()) {
            habit.id = id;
        }
        habit.goal = doc.goal;
        habit.shared_users = doc.shared_users;
        habit.activity_log = doc.activity_log;
        habit.correct_creation_date();
        Ok(habit)
    }
}

impl Habit {
    pub fn new(name: impl Into<String>, unit: Option<String>) -> Self {
        Self::created_at(name, unit, Utc::now())
    }

    /// New habit whose id is derived from the name and `created_at` in epoch seconds
    pub fn created_at(name: impl Into<String>, unit: Option<String>, created_at: DateTime<Utc>) -> Self {
        let name = name.into();
        Self {
            id: format!("{}{}", name, created_at.timestamp()),
            name,
            unit,
            activity_log: DateCounter::new(),
            goal: None,
            creation_date: created_at,
            shared_users: RoleSet::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_activity(mut self, activity: DateCounter) -> Self {
        self.activity_log = activity;
        self.correct_creation_date();
        self
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = Some(goal);
        self
    }

    pub fn with_creation_date(mut self, creation_date: DateTime<Utc>) -> Self {
        self.creation_date = creation_date;
        self.correct_creation_date();
        self
    }

    pub fn with_roles(mut self, roles: RoleSet) -> Self {
        self.shared_users = roles;
        self
    }

    /// Parse a JSON array of habit documents
    pub fn parse_list(json: &str) -> Result<Vec<Self>> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_array() {
            return Err(ItemError::InvalidDocument(format!(
                "habit list is not an array: {}",
                json_type(&value)
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    fn correct_creation_date(&mut self) {
        if let Some(first) = self.activity_log.first_date() {
            if first < self.creation_date.date_naive() {
                self.creation_date = start_of_day(first);
            }
        }
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn activity(&self) -> &DateCounter {
        &self.activity_log
    }

    pub fn goal(&self) -> Option<&Goal> {
        self.goal.as_ref()
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_unit(&mut self, unit: Option<String>) {
        self.unit = unit;
    }

    pub fn set_goal(&mut self, goal: Option<Goal>) {
        self.goal = goal;
    }

    pub fn set_activity(&mut self, activity: DateCounter) {
        self.activity_log = activity;
        self.correct_creation_date();
    }

    pub fn set_roles(&mut self, roles: RoleSet) {
        self.shared_users = roles;
    }

    /// Add to (or with `overwrite`, replace) the count for `day`
    pub fn log(&mut self, day: NaiveDate, value: f64, overwrite: bool) {
        self.activity_log.record(day, value, overwrite);
        self.correct_creation_date();
    }

    pub fn count_on(&self, day: NaiveDate) -> f64 {
        self.activity_log.count_on(day)
    }

    /// Whole days since creation
    pub fn age_days(&self, today: NaiveDate) -> i64 {
        elapsed_days(self.creation_date.date_naive(), today)
    }

    /// Total over the goal's window ending today
    pub fn count_for_goal_window(&self, today: NaiveDate) -> Option<f64> {
        let goal = self.goal.as_ref()?;
        Some(
            self.activity_log
                .count_past_days(goal.duration_days(), AggregateMode::Total, today),
        )
    }

    /// Fraction of the goal reached over its window
    pub fn goal_progress(&self, today: NaiveDate) -> Option<f64> {
        let goal = self.goal.as_ref()?;
        let count = self.count_for_goal_window(today)?;
        Some(count / goal.target_count)
    }

    /// Expected count per `window` based on the daily average over the last
    /// `span`. `None` when the window is longer than the span.
    pub fn average_per_window_over(
        &self,
        window_count: u32,
        window_unit: TimeFrame,
        span_count: u32,
        span_unit: TimeFrame,
        today: NaiveDate,
    ) -> Option<f64> {
        let span_days = span_count.saturating_mul(span_unit.days());
        let window_days = window_count.saturating_mul(window_unit.days());
        if window_days > span_days {
            return None;
        }
        let per_day = self
            .activity_log
            .count_past_days(span_days, AggregateMode::Average, today);
        Some(f64::from(window_days) * per_day)
    }

    /// Expected count per `window` based on the all-time daily average
    pub fn average_per_window_all_time(&self, window_count: u32, window_unit: TimeFrame, today: NaiveDate) -> f64 {
        let window_days = window_count.saturating_mul(window_unit.days());
        f64::from(window_days) * self.activity_log.total(AggregateMode::Average, today)
    }

    pub fn is_daily_checkin(&self, checkin_id: &str) -> bool {
        self.id == checkin_id
    }
}

impl Shareable for Habit {
    const KIND: ItemKind = ItemKind::Habit;

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

pub(crate) fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_day;
    use crate::role::Role;
    use chrono::TimeZone;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_id_from_name_and_epoch_seconds() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let habit = Habit::created_at("Run", Some("km".into()), at);
        assert_eq!(habit.id(), "Run1704067200");
    }

    #[test]
    fn test_creation_date_self_corrects_on_parse() {
        let json = r#"{
            "habitName": "Read",
            "habitID": "Read1",
            "unit": "pages",
            "activityLog": {"2024-01-10": 5},
            "creationDate": "2024-02-01T00:00:00Z"
        }"#;
        let habit: Habit = serde_json::from_str(json).unwrap();
        assert_eq!(habit.creation_date().date_naive(), day(1, 10));
        assert_eq!(habit.id(), "Read1");
        assert_eq!(habit.count_on(day(1, 10)), 5.0);
    }

    #[test]
    fn test_logging_before_creation_moves_creation_back() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut habit = Habit::created_at("Swim", None, at);
        habit.log(day(3, 1), 1.0, false);
        assert_eq!(habit.creation_date(), at);

        habit.log(day(2, 20), 1.0, false);
        assert_eq!(habit.creation_date().date_naive(), day(2, 20));
        assert_eq!(habit.age_days(day(3, 1)), 10);
    }

    #[test]
    fn test_round_trip_preserves_identity() {
        let at = Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap();
        let mut habit = Habit::created_at("Run", Some("km".into()), at)
            .with_goal(Goal::new(10.0, "km", 1, TimeFrame::Week).unwrap())
            .with_roles(RoleSet::with_owner("ana@example.com", at));
        habit.log(parse_day("Mon Jan 08 2024").unwrap(), 3.0, false);

        let json = serde_json::to_string(&habit).unwrap();
        let parsed: Habit = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, habit);
        assert_eq!(parsed.role_of("ana@example.com").role, Role::Owner);
    }

    #[test]
    fn test_goal_aggregates() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut habit = Habit::created_at("Run", Some("km".into()), at)
            .with_goal(Goal::new(10.0, "km", 1, TimeFrame::Week).unwrap());
        for d in 1..=10 {
            habit.log(day(1, d), 1.0, false);
        }

        assert_eq!(habit.count_for_goal_window(day(1, 10)), Some(7.0));
        assert_eq!(habit.goal_progress(day(1, 10)), Some(0.7));
        assert_eq!(
            habit.average_per_window_over(1, TimeFrame::Week, 1, TimeFrame::Month, day(1, 10)),
            Some(7.0 * (10.0 / 30.0))
        );
        assert_eq!(
            habit.average_per_window_over(1, TimeFrame::Month, 1, TimeFrame::Week, day(1, 10)),
            None
        );
        assert_eq!(habit.average_per_window_all_time(1, TimeFrame::Week, day(1, 10)), 7.0);
    }

    #[test]
    fn test_no_goal_means_no_progress() {
        let habit = Habit::new("Meditate", None);
        assert_eq!(habit.goal_progress(day(1, 1)), None);
    }

    #[test]
    fn test_parse_list_rejects_non_array() {
        let err = Habit::parse_list(r#"{"habitName": "Run"}"#).unwrap_err();
        assert!(matches!(err, ItemError::InvalidDocument(_)));
        assert!(Habit::parse_list("[]").unwrap().is_empty());
    }
}
