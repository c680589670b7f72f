use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::role::Role;
use crate::roles::{Collaborator, RoleLookup, RoleSet};

/// Kind of shareable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Habit,
    Task,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Habit => "habit",
            Self::Task => "task",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and collaborator operations shared by habits and tasks.
///
/// Implementors only expose their [`RoleSet`]; the role rules live there.
pub trait Shareable {
    const KIND: ItemKind;

    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn roles(&self) -> &RoleSet;

    fn roles_mut(&mut self) -> &mut RoleSet;

    fn kind(&self) -> ItemKind {
        Self::KIND
    }

    fn role_of(&self, account: &str) -> RoleLookup {
        self.roles().get_role(account)
    }

    fn add_collaborator(&mut self, account: &str, role: Role, joined_at: DateTime<Utc>) -> Result<()> {
        self.roles_mut().add(Collaborator::new(account, role, joined_at))
    }

    fn remove_collaborator(&mut self, account: &str) -> Option<Collaborator> {
        self.roles_mut().remove(account)
    }

    fn change_role(&mut self, account: &str, role: Role) -> Result<bool> {
        self.roles_mut().set_role(account, role)
    }

    fn is_shared_with(&self, account: &str) -> bool {
        self.roles().contains(account)
    }
}
