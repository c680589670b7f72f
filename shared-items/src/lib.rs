//! Shareable habits and tasks
//!
//! The domain core of the HabitShare engine:
//!
//! - [`RoleSet`]: collaborators of an item with the single-owner invariant
//! - [`DateCounter`]: sparse per-day activity log with range aggregates
//! - [`Habit`] and [`Task`]: the two [`Shareable`] entities
//! - [`merge`]: reconciliation of logs, role sets and habit lists
//!
//! # Example
//!
//! ```rust
//! use chrono::{NaiveDate, Utc};
//! use shared_items::{Collaborator, Habit, Role, RoleSet, Shareable};
//!
//! let now = Utc::now();
//! let mut roles = RoleSet::with_owner("ana@example.com", now);
//! roles.add(Collaborator::new("ben@example.com", Role::Member, now)).unwrap();
//!
//! let mut habit = Habit::new("Run", Some("km".to_string())).with_roles(roles);
//! habit.log(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 5.0, false);
//! assert_eq!(habit.role_of("ben@example.com").role, Role::Member);
//! ```

pub mod date_counter;
pub mod dates;
pub mod error;
pub mod goal;
pub mod habit;
pub mod merge;
pub mod role;
pub mod roles;
pub mod shareable;
pub mod task;

pub use date_counter::{DateCounter, DayCount};
pub use dates::{AggregateMode, SortDirection, TimeFrame};
pub use error::{ItemError, Result};
pub use goal::Goal;
pub use habit::Habit;
pub use merge::{merge_counters, merge_habit_lists, merge_habits, merge_role_sets, MergeMode, NameMatching};
pub use role::Role;
pub use roles::{Collaborator, RoleLookup, RoleSet};
pub use shareable::{ItemKind, Shareable};
pub use task::{Task, TaskEdit, TaskSort, UNSET_IMPORTANCE};
