//! Reconciliation of activity logs, role sets and habit lists.
//!
//! Used when an anonymous user's local habits are attached to an account and
//! when the daily check-in is synchronised between the local cache and the
//! remote store.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::date_counter::DateCounter;
use crate::dates::SortDirection;
use crate::habit::Habit;
use crate::roles::RoleSet;
use crate::shareable::Shareable;

/// How two activity logs combine on days both contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// The second log wins per day
    Overwrite,
    /// Counts are summed per day
    Additive,
}

/// How habit names are compared when deduplicating lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatching {
    #[default]
    CaseSensitive,
    CaseInsensitive,
}

impl NameMatching {
    pub fn key(&self, name: &str) -> String {
        match self {
            Self::CaseSensitive => name.to_string(),
            Self::CaseInsensitive => name.to_lowercase(),
        }
    }
}

pub fn merge_counters(a: &DateCounter, b: &DateCounter, mode: MergeMode) -> DateCounter {
    match mode {
        MergeMode::Overwrite => {
            let mut merged = a.clone();
            for (day, count) in b.iter() {
                merged.set(day, count);
            }
            merged
        }
        MergeMode::Additive => {
            let mut merged = DateCounter::new();
            for source in [a, b] {
                for entry in source.sorted_entries(SortDirection::Ascending) {
                    merged.log(entry.day, entry.count);
                }
            }
            merged
        }
    }
}

/// Union by account. On collision the higher role and the earlier join win.
pub fn merge_role_sets(a: &RoleSet, b: &RoleSet) -> RoleSet {
    let mut merged = a.clone();
    for theirs in b.iter() {
        let combined = match merged.get(&theirs.account) {
            Some(ours) => {
                let mut c = ours.clone();
                if theirs.role.power() > c.role.power() {
                    c.role = theirs.role;
                }
                if theirs.joined_at < c.joined_at {
                    c.joined_at = theirs.joined_at;
                }
                c
            }
            None => theirs.clone(),
        };
        merged.insert_raw(combined);
    }
    merged.ensure_owner_exists();
    merged
}

/// Combine two habits into one carrying `first`'s identity.
///
/// Keeps the earliest creation date and the union of collaborators; the goal
/// falls back to `second`'s when `first` has none.
pub fn merge_habits(first: &Habit, second: &Habit, mode: MergeMode) -> Habit {
    let creation = first.creation_date().min(second.creation_date());
    let activity = merge_counters(first.activity(), second.activity(), mode);
    let roles = merge_role_sets(first.roles(), second.roles());

    let mut merged = Habit::created_at(first.name(), first.unit().map(str::to_string), creation)
        .with_id(first.id())
        .with_activity(activity)
        .with_roles(roles);
    if let Some(goal) = first.goal().or_else(|| second.goal()) {
        merged = merged.with_goal(goal.clone());
    }
    merged
}

/// Deduplicate `primary` followed by `secondary` by habit name.
///
/// Habits sharing an id are versions of one history and are overwritten per
/// day; distinct ids under one name are summed. Merging a list with itself
/// therefore reproduces the list.
pub fn merge_habit_lists(primary: &[Habit], secondary: &[Habit], matching: NameMatching) -> Vec<Habit> {
    // name key -> versions keyed by id, in first-seen order
    let mut groups: Vec<(String, Vec<Habit>)> = Vec::new();

    for habit in primary.iter().chain(secondary) {
        let key = matching.key(habit.name());
        let idx = match groups.iter().position(|(k, _)| *k == key) {
            Some(idx) => idx,
            None => {
                groups.push((key, Vec::new()));
                groups.len() - 1
            }
        };
        let Some((_, group)) = groups.get_mut(idx) else {
            continue;
        };

        match group.iter_mut().find(|h| h.id() == habit.id()) {
            Some(existing) => *existing = merge_habits(existing, habit, MergeMode::Overwrite),
            None => group.push(habit.clone()),
        }
    }

    groups
        .into_iter()
        .filter_map(|(key, versions)| {
            if versions.len() > 1 {
                debug!(name = %key, versions = versions.len(), "merging habits with the same name");
            }
            let mut iter = versions.into_iter();
            let first = iter.next()?;
            Some(iter.fold(first, |acc, next| merge_habits(&acc, &next, MergeMode::Additive)))
        })
        .collect()
}
