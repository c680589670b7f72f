//! End-to-end behaviour of the domain types through the public API

use chrono::{NaiveDate, TimeZone, Utc};
use shared_items::dates::parse_day;
use shared_items::*;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn demoting_the_owner_promotes_the_earliest_member() {
    let a_joined = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
    let b_joined = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

    let mut roles = RoleSet::with_owner("a@example.com", a_joined);
    roles.add(Collaborator::new("b@example.com", Role::Member, b_joined)).unwrap();

    let changed = roles.set_role("a@example.com", Role::Member).unwrap();

    assert!(changed);
    assert_eq!(roles.role_of("a@example.com"), Some(Role::Member));
    assert_eq!(roles.role_of("b@example.com"), Some(Role::Owner));
}

#[test]
fn log_then_overwrite_on_the_same_day() {
    let day = parse_day("Mon Jan 01 2024").unwrap();
    let mut counter: DateCounter = serde_json::from_str(r#"{"Mon Jan 01 2024": 3}"#).unwrap();

    counter.log(day, 2.0);
    assert_eq!(counter.count_on(day), 5.0);

    counter.record(day, 2.0, true);
    assert_eq!(counter.count_on(day), 2.0);
}

#[test]
fn habit_creation_date_moves_back_to_first_activity() {
    let json = r#"{
        "name": "Read",
        "id": "read-1",
        "unit": "pages",
        "activityLog": {"2024-01-10": 5},
        "creationDate": "2024-02-01T00:00:00Z",
        "sharedUsers": {}
    }"#;
    let habit: Habit = serde_json::from_str(json).unwrap();
    assert_eq!(habit.creation_date().date_naive(), ymd(2024, 1, 10));
}

#[test]
fn merging_two_run_histories_adds_counts() {
    let d1 = ymd(2024, 1, 1);
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let mut local = Habit::created_at("Run", None, created).with_id("run-local");
    local.log(d1, 3.0, false);
    let mut cloud = Habit::created_at("Run", None, created).with_id("run-cloud");
    cloud.log(d1, 2.0, false);

    let merged = merge_habit_lists(&[local], &[cloud], NameMatching::CaseSensitive);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].name(), "Run");
    assert_eq!(merged[0].count_on(d1), 5.0);
}

#[test]
fn merging_a_list_with_itself_keeps_totals() {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut run = Habit::created_at("Run", None, created);
    run.log(ymd(2024, 1, 1), 3.0, false);
    run.log(ymd(2024, 1, 4), 1.0, false);
    let mut read = Habit::created_at("Read", None, created);
    read.log(ymd(2024, 1, 2), 20.0, false);
    let list = vec![run, read];

    let merged = merge_habit_lists(&list, &list, NameMatching::CaseSensitive);
    let today = ymd(2024, 1, 31);
    for (before, after) in list.iter().zip(&merged) {
        assert_eq!(before.id(), after.id());
        assert_eq!(
            before.activity().total(AggregateMode::Total, today),
            after.activity().total(AggregateMode::Total, today)
        );
    }
}

#[test]
fn shared_habit_document_round_trip() {
    let joined = Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap();
    let mut roles = RoleSet::with_owner("ana@example.com", joined);
    roles.add(Collaborator::new("ben@example.com", Role::Admin, joined)).unwrap();

    let mut habit = Habit::created_at("Stretch", Some("minutes".into()), joined)
        .with_goal(Goal::new(70.0, "minutes", 1, TimeFrame::Week).unwrap())
        .with_roles(roles);
    habit.log(ymd(2024, 1, 2), 15.0, false);

    let value = serde_json::to_value(&habit).unwrap();
    assert_eq!(value["activityLog"]["Tue Jan 02 2024"], 15.0);
    assert_eq!(value["sharedUsers"]["ben@example.com"]["role"], "admin");

    let parsed: Habit = serde_json::from_value(value).unwrap();
    assert_eq!(parsed.id(), habit.id());
    assert_eq!(parsed.name(), habit.name());
    assert_eq!(parsed.unit(), habit.unit());
    assert_eq!(parsed.roles(), habit.roles());
    assert_eq!(parsed.activity(), habit.activity());
}

#[test]
fn tasks_sort_with_missing_deadlines_last() {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut tasks = vec![
        Task::created_at("someday", base),
        Task::created_at("friday", base).with_deadline(base + chrono::Duration::days(4)),
        Task::created_at("today", base).with_deadline(base),
    ];
    TaskSort::DeadlineEarliest.sort(&mut tasks);
    let names: Vec<&str> = tasks.iter().map(|t| t.name()).collect();
    assert_eq!(names, ["today", "friday", "someday"]);
}
