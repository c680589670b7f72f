//! Collaborator role sets.
//!
//! A non-empty [`RoleSet`] always has exactly one [`Role::Owner`] once a
//! mutating call returns. [`RoleSet::ensure_owner_exists`] is the single
//! normalisation pass every mutator goes through.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{ItemError, Result};
use crate::role::Role;

/// An account granted a role on a shared item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    #[serde(rename = "email")]
    pub account: String,
    pub role: Role,
    #[serde(rename = "joinDate", with = "crate::dates::timestamp")]
    pub joined_at: DateTime<Utc>,
}

impl Collaborator {
    pub fn new(account: impl Into<String>, role: Role, joined_at: DateTime<Utc>) -> Self {
        Self {
            account: account.into(),
            role,
            joined_at,
        }
    }
}

/// Result of a soft role lookup; `role` is `Member` when `found` is false
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleLookup {
    pub found: bool,
    pub role: Role,
}

/// Collaborators of one shared item keyed by account identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet {
    members: BTreeMap<String, Collaborator>,
}

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding only `account` as owner
    pub fn with_owner(account: impl Into<String>, joined_at: DateTime<Utc>) -> Self {
        let account = account.into();
        let mut set = Self::new();
        set.members
            .insert(account.clone(), Collaborator::new(account, Role::Owner, joined_at));
        set
    }

    pub fn get_role(&self, account: &str) -> RoleLookup {
        match self.members.get(account) {
            Some(c) => RoleLookup {
                found: true,
                role: c.role,
            },
            None => RoleLookup {
                found: false,
                role: Role::Member,
            },
        }
    }

    pub fn role_of(&self, account: &str) -> Option<Role> {
        self.members.get(account).map(|c| c.role)
    }

    pub fn get(&self, account: &str) -> Option<&Collaborator> {
        self.members.get(account)
    }

    pub fn contains(&self, account: &str) -> bool {
        self.members.contains_key(account)
    }

    /// Assign `role` to an existing collaborator and renormalise.
    ///
    /// Returns whether the stored role differs from the one held before the
    /// call. Assigning `Owner` transfers ownership: the previous owner is
    /// demoted to `Admin`.
    pub fn set_role(&mut self, account: &str, role: Role) -> Result<bool> {
        if role == Role::None {
            return Err(ItemError::InvalidRole(
                "none is not a storable role; remove the collaborator instead".to_string(),
            ));
        }

        let previous = self
            .role_of(account)
            .ok_or_else(|| ItemError::UnknownCollaborator(account.to_string()))?;

        if role == Role::Owner {
            for (key, c) in self.members.iter_mut() {
                if key != account && c.role == Role::Owner {
                    c.role = Role::Admin;
                }
            }
        }

        if let Some(c) = self.members.get_mut(account) {
            c.role = role;
        }
        self.ensure_owner_exists();

        let current = self.role_of(account).unwrap_or(previous);
        Ok(current != previous)
    }

    /// Upsert a collaborator by account
    pub fn add(&mut self, collaborator: Collaborator) -> Result<()> {
        if collaborator.role == Role::None {
            return Err(ItemError::InvalidRole(format!(
                "cannot add {} with role none",
                collaborator.account
            )));
        }
        self.members.insert(collaborator.account.clone(), collaborator);
        self.ensure_owner_exists();
        Ok(())
    }

    pub fn remove(&mut self, account: &str) -> Option<Collaborator> {
        let removed = self.members.remove(account);
        self.ensure_owner_exists();
        removed
    }

    /// Promote the top-ranked collaborator to owner and demote any other owner.
    ///
    /// Rank is role power descending, then join time ascending, then account.
    pub fn ensure_owner_exists(&mut self) {
        let Some(top) = self
            .members
            .values()
            .min_by(|a, b| {
                b.role
                    .power()
                    .cmp(&a.role.power())
                    .then(a.joined_at.cmp(&b.joined_at))
                    .then(a.account.cmp(&b.account))
            })
            .map(|c| c.account.clone())
        else {
            return;
        };

        for (key, c) in self.members.iter_mut() {
            if *key == top {
                if c.role != Role::Owner {
                    debug!(role = %c.role, "promoting collaborator to owner");
                    c.role = Role::Owner;
                }
            } else if c.role == Role::Owner {
                c.role = Role::Admin;
            }
        }
    }

    pub fn owner(&self) -> Option<&Collaborator> {
        self.members.values().find(|c| c.role == Role::Owner)
    }

    /// Whether `actor` may move `target` to `new_role`.
    ///
    /// The actor cannot grant a role above their own and must either outrank
    /// the target or be the owner.
    pub fn permits_change(&self, actor: &str, target: &str, new_role: Role) -> bool {
        let Some(actor_role) = self.role_of(actor) else {
            return false;
        };
        let target_role = self.get_role(target).role;

        if new_role.power() > actor_role.power() {
            return false;
        }
        actor_role.power() > target_role.power() || actor_role == Role::Owner
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collaborator> {
        self.members.values()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Insert without normalising; callers normalise once after a batch
    pub(crate) fn insert_raw(&mut self, collaborator: Collaborator) {
        self.members.insert(collaborator.account.clone(), collaborator);
    }
}

impl Serialize for RoleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.members.serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRoleSet {
    Map(BTreeMap<String, Collaborator>),
    List(Vec<Collaborator>),
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<RawRoleSet>::deserialize(deserializer)?;
        let entries: Vec<Collaborator> = match raw {
            None => Vec::new(),
            Some(RawRoleSet::Map(map)) => map
                .into_iter()
                .map(|(key, mut c)| {
                    if c.account.is_empty() {
                        c.account = key;
                    }
                    c
                })
                .collect(),
            Some(RawRoleSet::List(list)) => list,
        };

        let mut set = RoleSet::new();
        for c in entries {
            if c.account.trim().is_empty() {
                return Err(D::Error::custom("collaborator without an account"));
            }
            if c.role != Role::None {
                set.insert_raw(c);
            }
        }
        set.ensure_owner_exists();
        Ok(set)
    }
}
