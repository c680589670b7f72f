//! Routes item operations to the local cache or the remote store.
//!
//! Anonymous sessions read and write the local lists only. Authenticated
//! sessions treat the remote store as primary: every item lives in a shared
//! document plus one membership document per collaborator. The local cache
//! is then only used for the daily check-in copy and as the source of the
//! one-time anonymous data migration.

use chrono::NaiveDate;
use config_engine::EngineConfig;
use error_common::{log_error, Outcome};
use futures::future::join_all;
use logger_redacted::{account as redacted, redact_text};
use serde::{Deserialize, Serialize};
use shared_items::{
    merge_counters, merge_habits, DayCount, Habit, ItemError, ItemKind, MergeMode, Role, RoleSet, Shareable, Task,
};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::LocalCache;
use crate::clock::{Clock, SystemClock};
use crate::error::{SyncError, SyncResult};
use crate::friends::{friends_of, Friend, FriendList, FriendRequest};
use crate::invite::{Invite, InviteAction};
use crate::local::LocalStore;
use crate::remote::{field_document, from_document, to_document, RemotePaths, StoredItem, FRIENDS_FIELD, ROLES_FIELD};
use crate::session::Session;
use crate::store::DocumentStore;

/// Which part of a habit an update writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Only the acting account's activity log
    Log,
    /// The whole shared document
    Modify,
}

/// Result of a role change request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleChangeStatus {
    Changed,
    Removed,
    Unchanged,
    /// The target is the only owner and keeps the role
    LastOwner,
}

impl RoleChangeStatus {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Changed => "Role changed",
            Self::Removed => "Collaborator removed",
            Self::Unchanged => "Role unchanged",
            Self::LastOwner => "Role unchanged: the item needs at least one owner",
        }
    }
}

/// What an anonymous-to-account migration wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    /// Account habits that absorbed local activity
    pub merged_habits: usize,
    /// Local habits with no remote counterpart
    pub uploaded_habits: usize,
    pub uploaded_tasks: usize,
}

pub struct SyncCoordinator {
    store: Arc<dyn DocumentStore>,
    local: LocalStore,
    paths: RemotePaths,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl SyncCoordinator {
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<dyn LocalCache>, config: EngineConfig) -> Self {
        // failure text can name accounts
        error_common::set_message_filter(redact_text);
        Self {
            store,
            local: LocalStore::new(cache, config.local_keys.clone()),
            paths: RemotePaths::new(config.collections.clone()),
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Resolve an account id against the configured anonymous marker
    pub fn session(&self, account: &str) -> Session {
        Session::resolve(account, &self.config.session)
    }

    // ------------------------------------------------------------------
    // Create / read
    // ------------------------------------------------------------------

    pub async fn create_habit(&self, session: &Session, habit: Habit) -> Outcome<Habit> {
        Outcome::from_result(self.create(session, habit).await, "Habit created", "create_habit")
    }

    pub async fn create_task(&self, session: &Session, task: Task) -> Outcome<Task> {
        Outcome::from_result(self.create(session, task).await, "Task created", "create_task")
    }

    pub async fn get_habit(&self, session: &Session, id: &str) -> Outcome<Habit> {
        Outcome::from_result(self.get(session, id).await, "Habit loaded", "get_habit")
    }

    pub async fn get_task(&self, session: &Session, id: &str) -> Outcome<Task> {
        Outcome::from_result(self.get(session, id).await, "Task loaded", "get_task")
    }

    pub async fn list_habits(&self, session: &Session) -> Outcome<Vec<Habit>> {
        Outcome::from_result(self.list(session).await, "Habits loaded", "list_habits")
    }

    pub async fn list_tasks(&self, session: &Session) -> Outcome<Vec<Task>> {
        Outcome::from_result(self.list(session).await, "Tasks loaded", "list_tasks")
    }

    /// Activity of one habit between `start` and `end` in at most
    /// `charts.max_buckets` buckets
    pub async fn habit_chart(
        &self,
        session: &Session,
        id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Outcome<Vec<DayCount>> {
        let result = self.get::<Habit>(session, id).await.map(|habit| {
            habit
                .activity()
                .bucketed_for_chart(start, end, self.config.charts.max_buckets)
        });
        Outcome::from_result(result, "Chart computed", "habit_chart")
    }

    async fn create<T: StoredItem>(&self, session: &Session, mut item: T) -> SyncResult<T> {
        if item.id() == self.config.daily_checkin.id {
            return Err(SyncError::InvalidOperation(format!(
                "'{}' is reserved for the daily check-in",
                item.id()
            )));
        }

        let Some(account) = session.account() else {
            let mut items: Vec<T> = self.local.load_items(T::KIND).await?;
            if let Some(existing) = items.iter().find(|i| i.id() == item.id() || i.name() == item.name()) {
                return Err(SyncError::Duplicate(format!("{} '{}'", T::KIND, existing.name())));
            }
            items.push(item.clone());
            self.local.save_items(T::KIND, &items).await?;
            debug!(kind = %T::KIND, id = %item.id(), "item created locally");
            return Ok(item);
        };

        let collection = self.paths.items(T::KIND);
        if self.store.get(&collection, item.id()).await?.is_some() {
            return Err(SyncError::Duplicate(format!("{} id '{}'", T::KIND, item.id())));
        }

        if item.roles().is_empty() {
            item.add_collaborator(account, Role::Owner, self.clock.now())?;
        } else if !item.is_shared_with(account) {
            return Err(SyncError::PermissionDenied(format!(
                "creator is not a collaborator of {} '{}'",
                T::KIND,
                item.name()
            )));
        }

        self.store.set(&collection, item.id(), to_document(&item)?, false).await?;
        self.write_membership(account, &item, false).await?;

        info!(kind = %T::KIND, id = %item.id(), account = %redacted(account), "item created");
        Ok(item)
    }

    async fn get<T: StoredItem>(&self, session: &Session, id: &str) -> SyncResult<T> {
        let found = match session.account() {
            None => {
                let items: Vec<T> = self.local.load_items(T::KIND).await?;
                items.into_iter().find(|i| i.id() == id)
            }
            Some(account) => self.fetch_for(account, id).await?,
        };
        found.ok_or_else(|| SyncError::NotFound(format!("{} '{}'", T::KIND, id)))
    }

    async fn list<T: StoredItem>(&self, session: &Session) -> SyncResult<Vec<T>> {
        match session.account() {
            None => self.local.load_items(T::KIND).await,
            Some(account) => self.list_remote(account).await,
        }
    }

    /// The shared document with the account's membership state overlaid;
    /// `None` when the shared document is gone
    async fn fetch_for<T: StoredItem>(&self, account: &str, id: &str) -> SyncResult<Option<T>> {
        let Some(mut item) = self.fetch_shared::<T>(id).await? else {
            return Ok(None);
        };
        let membership_collection = self.paths.user_items(account, T::KIND);
        if let Some(membership) = self.store.get(&membership_collection, id).await? {
            item.apply_membership(&membership)?;
        }
        Ok(Some(item))
    }

    async fn fetch_shared<T: StoredItem>(&self, id: &str) -> SyncResult<Option<T>> {
        match self.store.get(&self.paths.items(T::KIND), id).await? {
            Some(document) => Ok(Some(from_document(document)?)),
            None => Ok(None),
        }
    }

    async fn list_remote<T: StoredItem>(&self, account: &str) -> SyncResult<Vec<T>> {
        let ids = self.store.list(&self.paths.user_items(account, T::KIND)).await?;
        let fetched = join_all(ids.iter().map(|id| self.fetch_for::<T>(account, id))).await;

        let mut items = Vec::with_capacity(ids.len());
        for (id, result) in ids.iter().zip(fetched) {
            match result? {
                Some(item) => items.push(item),
                None => warn!(kind = %T::KIND, id = %id, account = %redacted(account), "membership without a shared document, skipped"),
            }
        }
        Ok(items)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// `Log` writes only the account's activity; `Modify` writes the whole
    /// document. Anonymous sessions replace the local entry either way.
    pub async fn update_habit(&self, session: &Session, habit: &Habit, mode: UpdateMode) -> Outcome<()> {
        let result = match (session.account(), mode) {
            (None, _) => self.replace_local(habit).await,
            (Some(account), UpdateMode::Log) => self.log_activity(account, habit).await,
            (Some(account), UpdateMode::Modify) => self.persist(account, habit).await,
        };
        Outcome::from_result(result, "Habit updated", "update_habit")
    }

    pub async fn update_task(&self, session: &Session, task: &Task) -> Outcome<()> {
        Outcome::from_result(self.save_item(session, task).await, "Task updated", "update_task")
    }

    pub async fn set_task_completed(&self, session: &Session, task_id: &str, completed: bool) -> Outcome<Task> {
        let message = if completed { "Task completed" } else { "Task reopened" };
        Outcome::from_result(
            self.complete_inner(session, task_id, completed).await,
            message,
            "set_task_completed",
        )
    }

    async fn complete_inner(&self, session: &Session, task_id: &str, completed: bool) -> SyncResult<Task> {
        let mut task: Task = self.get(session, task_id).await?;
        task.set_completed(completed, self.clock.now());
        self.save_item(session, &task).await?;
        Ok(task)
    }

    async fn save_item<T: StoredItem>(&self, session: &Session, item: &T) -> SyncResult<()> {
        match session.account() {
            None => self.replace_local(item).await,
            Some(account) => self.persist(account, item).await,
        }
    }

    async fn replace_local<T: StoredItem>(&self, item: &T) -> SyncResult<()> {
        let mut items: Vec<T> = self.local.load_items(T::KIND).await?;
        let Some(slot) = items.iter_mut().find(|i| i.id() == item.id()) else {
            return Err(SyncError::NotFound(format!("{} '{}'", T::KIND, item.id())));
        };
        *slot = item.clone();
        self.local.save_items(T::KIND, &items).await
    }

    /// Shared document and the account's membership document
    async fn persist<T: StoredItem>(&self, account: &str, item: &T) -> SyncResult<()> {
        self.require_collaborator(account, item)?;
        self.store
            .set(&self.paths.items(T::KIND), item.id(), to_document(item)?, true)
            .await?;
        self.write_membership(account, item, true).await
    }

    async fn log_activity(&self, account: &str, habit: &Habit) -> SyncResult<()> {
        self.require_collaborator(account, habit)?;
        self.write_membership(account, habit, true).await
    }

    async fn write_membership<T: StoredItem>(&self, account: &str, item: &T, merge: bool) -> SyncResult<()> {
        self.store
            .set(
                &self.paths.user_items(account, T::KIND),
                item.id(),
                item.membership_document()?,
                merge,
            )
            .await
    }

    async fn persist_roles<T: StoredItem>(&self, item: &T) -> SyncResult<()> {
        let roles = serde_json::to_value(item.roles())?;
        self.store
            .set(&self.paths.items(T::KIND), item.id(), field_document(ROLES_FIELD, roles), true)
            .await
    }

    fn require_collaborator<T: StoredItem>(&self, account: &str, item: &T) -> SyncResult<()> {
        if item.is_shared_with(account) {
            Ok(())
        } else {
            Err(SyncError::PermissionDenied(format!(
                "{} '{}' is not shared with this account",
                T::KIND,
                item.name()
            )))
        }
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    pub async fn delete_habit(&self, session: &Session, id: &str) -> Outcome<()> {
        Outcome::from_result(self.delete::<Habit>(session, id).await, "Habit deleted", "delete_habit")
    }

    pub async fn delete_task(&self, session: &Session, id: &str) -> Outcome<()> {
        Outcome::from_result(self.delete::<Task>(session, id).await, "Task deleted", "delete_task")
    }

    /// Drop the account from the item. The shared document goes away with
    /// its last collaborator.
    async fn delete<T: StoredItem>(&self, session: &Session, id: &str) -> SyncResult<()> {
        let Some(account) = session.account() else {
            let mut items: Vec<T> = self.local.load_items(T::KIND).await?;
            let before = items.len();
            items.retain(|i| i.id() != id);
            if items.len() == before {
                return Err(SyncError::NotFound(format!("{} '{}'", T::KIND, id)));
            }
            return self.local.save_items(T::KIND, &items).await;
        };

        self.store.delete(&self.paths.user_items(account, T::KIND), id).await?;

        let Some(mut item) = self.fetch_shared::<T>(id).await? else {
            warn!(kind = %T::KIND, id = %id, "shared document already gone");
            return Ok(());
        };
        item.remove_collaborator(account);
        self.release_if_orphaned(&item).await?;

        info!(kind = %T::KIND, id = %id, account = %redacted(account), "membership deleted");
        Ok(())
    }

    /// Delete the shared document when nobody is left, else store the roles
    async fn release_if_orphaned<T: StoredItem>(&self, item: &T) -> SyncResult<()> {
        if item.roles().is_empty() {
            debug!(kind = %T::KIND, id = %item.id(), "last collaborator left, deleting shared document");
            self.store.delete(&self.paths.items(T::KIND), item.id()).await
        } else {
            self.persist_roles(item).await
        }
    }

    /// Delete completed tasks whose completion is at least
    /// `tasks.expiry_days` old. Returns how many were removed.
    pub async fn purge_expired_tasks(&self, session: &Session) -> Outcome<usize> {
        Outcome::from_result(self.purge_inner(session).await, "Expired tasks purged", "purge_expired_tasks")
    }

    async fn purge_inner(&self, session: &Session) -> SyncResult<usize> {
        let now = self.clock.now();
        let expiry_days = self.config.tasks.expiry_days;
        let tasks: Vec<Task> = self.list(session).await?;

        let mut purged = 0;
        for task in tasks.iter().filter(|t| t.is_expired(now, expiry_days)) {
            self.delete::<Task>(session, task.id()).await?;
            purged += 1;
        }
        debug!(purged, "expired tasks purged");
        Ok(purged)
    }

    // ------------------------------------------------------------------
    // Roles and invitations
    // ------------------------------------------------------------------

    /// Change `target`'s role on `item` on behalf of the session's account.
    ///
    /// `Role::None` removes the collaborator. Keeping the only owner is a
    /// soft success reported as [`RoleChangeStatus::LastOwner`]. `item` is
    /// only updated once the store accepted the change.
    pub async fn change_role<T: StoredItem>(
        &self,
        session: &Session,
        target: &str,
        new_role: Role,
        item: &mut T,
    ) -> Outcome<RoleChangeStatus> {
        match self.change_role_inner(session, target, new_role, item).await {
            Ok(status) => Outcome::success(status.message(), status),
            Err(err) => {
                log_error("change_role", &err);
                Outcome::from_error(&err)
            }
        }
    }

    async fn change_role_inner<T: StoredItem>(
        &self,
        session: &Session,
        target: &str,
        new_role: Role,
        item: &mut T,
    ) -> SyncResult<RoleChangeStatus> {
        let actor = signed_in(session, "change roles")?;
        let target = target.trim().to_lowercase();

        if !item.is_shared_with(&target) {
            return Err(ItemError::UnknownCollaborator(target).into());
        }
        if !item.roles().permits_change(actor, &target, new_role) {
            return Err(SyncError::PermissionDenied(format!(
                "cannot set role {} on {} '{}'",
                new_role,
                T::KIND,
                item.name()
            )));
        }

        let mut updated = item.clone();
        if new_role == Role::None {
            updated.remove_collaborator(&target);
            self.release_if_orphaned(&updated).await?;
            self.store.delete(&self.paths.user_items(&target, T::KIND), updated.id()).await?;
            *item = updated;
            info!(kind = %T::KIND, id = %item.id(), target = %redacted(&target), "collaborator removed");
            return Ok(RoleChangeStatus::Removed);
        }

        if updated.change_role(&target, new_role)? {
            self.store
                .set(&self.paths.items(T::KIND), updated.id(), to_document(&updated)?, true)
                .await?;
            *item = updated;
            info!(
                kind = %T::KIND,
                id = %item.id(),
                target = %redacted(&target),
                role = %new_role,
                "role changed"
            );
            return Ok(RoleChangeStatus::Changed);
        }

        if item.roles().role_of(&target) == Some(Role::Owner) {
            Ok(RoleChangeStatus::LastOwner)
        } else {
            Ok(RoleChangeStatus::Unchanged)
        }
    }

    /// Store an invitation under the recipient. The sender cannot grant a
    /// role above its own.
    pub async fn invite<T: StoredItem>(&self, session: &Session, item: &T, recipient: &str, role: Role) -> Outcome<Invite> {
        Outcome::from_result(
            self.invite_inner(session, item, recipient, role).await,
            "Invitation sent",
            "invite",
        )
    }

    async fn invite_inner<T: StoredItem>(&self, session: &Session, item: &T, recipient: &str, role: Role) -> SyncResult<Invite> {
        let sender = signed_in(session, "invite collaborators")?;
        let Some(recipient) = self.session(recipient).account().map(str::to_string) else {
            return Err(SyncError::InvalidOperation("cannot invite an anonymous account".to_string()));
        };

        if role == Role::None {
            return Err(ItemError::InvalidRole("cannot invite with role none".to_string()).into());
        }
        if recipient == sender {
            return Err(SyncError::InvalidOperation("cannot invite yourself".to_string()));
        }
        if item.is_shared_with(&recipient) {
            return Err(SyncError::Duplicate(format!("{} '{}' is already shared with the recipient", T::KIND, item.name())));
        }
        match item.roles().role_of(sender) {
            Some(sender_role) if role.power() <= sender_role.power() => {}
            Some(_) => {
                return Err(SyncError::PermissionDenied(format!("cannot grant role {role}")));
            }
            None => self.require_collaborator(sender, item)?,
        }

        let invite = Invite {
            item_id: item.id().to_string(),
            item_kind: T::KIND,
            item_name: item.name().to_string(),
            sender: sender.to_string(),
            recipient: recipient.clone(),
            role,
            sent_at: self.clock.now(),
        };
        let document = to_document(&invite)?;
        self.store
            .set(&self.paths.user_invites(&recipient), &invite.item_id, document.clone(), false)
            .await?;
        self.store
            .set(&self.paths.item_invites(&invite.item_id), &recipient, document, false)
            .await?;

        info!(
            kind = %T::KIND,
            id = %invite.item_id,
            sender = %redacted(sender),
            recipient = %redacted(&recipient),
            "invitation stored"
        );
        Ok(invite)
    }

    pub async fn list_invites(&self, session: &Session) -> Outcome<Vec<Invite>> {
        Outcome::from_result(self.invites_inner(session).await, "Invitations loaded", "list_invites")
    }

    async fn invites_inner(&self, session: &Session) -> SyncResult<Vec<Invite>> {
        let account = signed_in(session, "receive invitations")?;
        self.read_invites(&self.paths.user_invites(account)).await
    }

    /// Pending invitations for one item, for its collaborators
    pub async fn list_item_invites<T: StoredItem>(&self, session: &Session, item: &T) -> Outcome<Vec<Invite>> {
        Outcome::from_result(
            self.item_invites_inner(session, item).await,
            "Invitations loaded",
            "list_item_invites",
        )
    }

    async fn item_invites_inner<T: StoredItem>(&self, session: &Session, item: &T) -> SyncResult<Vec<Invite>> {
        let account = signed_in(session, "see invitations")?;
        self.require_collaborator(account, item)?;
        let invites = self.read_invites(&self.paths.item_invites(item.id())).await?;
        Ok(invites.into_iter().filter(|invite| invite.item_kind == T::KIND).collect())
    }

    async fn read_invites(&self, collection: &str) -> SyncResult<Vec<Invite>> {
        let ids = self.store.list(collection).await?;
        let documents = join_all(ids.iter().map(|id| self.store.get(collection, id))).await;

        let mut invites = Vec::with_capacity(ids.len());
        for document in documents {
            if let Some(document) = document? {
                invites.push(from_document(document)?);
            }
        }
        Ok(invites)
    }

    /// Accepting joins the item with the invited role. The invitation and its
    /// item index entry are deleted for both actions.
    pub async fn respond_to_invite(&self, session: &Session, item_id: &str, action: InviteAction) -> Outcome<()> {
        let result = self.respond_inner(session, item_id, action).await;
        let message = match action {
            InviteAction::Accept => "Invitation accepted",
            InviteAction::Reject => "Invitation rejected",
        };
        Outcome::from_result(result, message, "respond_to_invite")
    }

    async fn respond_inner(&self, session: &Session, item_id: &str, action: InviteAction) -> SyncResult<()> {
        let account = signed_in(session, "answer invitations")?;
        let collection = self.paths.user_invites(account);
        let Some(document) = self.store.get(&collection, item_id).await? else {
            return Err(SyncError::NotFound(format!("invitation for '{item_id}'")));
        };
        let invite: Invite = from_document(document)?;

        if action == InviteAction::Accept {
            match invite.item_kind {
                ItemKind::Habit => self.join::<Habit>(account, &invite).await?,
                ItemKind::Task => self.join::<Task>(account, &invite).await?,
            }
        }

        self.store.delete(&collection, item_id).await?;
        self.store.delete(&self.paths.item_invites(item_id), account).await?;
        info!(id = %item_id, action = action.as_str(), account = %redacted(account), "invitation answered");
        Ok(())
    }

    async fn join<T: StoredItem>(&self, account: &str, invite: &Invite) -> SyncResult<()> {
        let Some(mut item) = self.fetch_shared::<T>(&invite.item_id).await? else {
            return Err(SyncError::NotFound(format!("{} '{}'", T::KIND, invite.item_id)));
        };
        item.add_collaborator(account, invite.role, self.clock.now())?;
        self.persist_roles(&item).await?;
        self.write_membership(account, &item, false).await
    }

    // ------------------------------------------------------------------
    // Friends
    // ------------------------------------------------------------------

    /// Store a friend request under the recipient
    pub async fn send_friend_request(&self, session: &Session, recipient: &str) -> Outcome<FriendRequest> {
        Outcome::from_result(
            self.friend_request_inner(session, recipient).await,
            "Friend request sent",
            "send_friend_request",
        )
    }

    async fn friend_request_inner(&self, session: &Session, recipient: &str) -> SyncResult<FriendRequest> {
        let sender = signed_in(session, "send friend requests")?;
        let Some(recipient) = self.session(recipient).account().map(str::to_string) else {
            return Err(SyncError::InvalidOperation("cannot befriend an anonymous account".to_string()));
        };
        if recipient == sender {
            return Err(SyncError::InvalidOperation("cannot befriend yourself".to_string()));
        }
        if self.load_friends(sender).await?.contains_key(&recipient) {
            return Err(SyncError::Duplicate("already friends".to_string()));
        }

        let request = FriendRequest {
            sender: sender.to_string(),
            recipient: recipient.clone(),
            sent_at: self.clock.now(),
        };
        self.store
            .set(&self.paths.user_friend_requests(&recipient), sender, to_document(&request)?, false)
            .await?;

        info!(sender = %redacted(sender), recipient = %redacted(&recipient), "friend request stored");
        Ok(request)
    }

    pub async fn list_friend_requests(&self, session: &Session) -> Outcome<Vec<FriendRequest>> {
        Outcome::from_result(
            self.friend_requests_inner(session).await,
            "Friend requests loaded",
            "list_friend_requests",
        )
    }

    async fn friend_requests_inner(&self, session: &Session) -> SyncResult<Vec<FriendRequest>> {
        let account = signed_in(session, "receive friend requests")?;
        let collection = self.paths.user_friend_requests(account);
        let ids = self.store.list(&collection).await?;
        let documents = join_all(ids.iter().map(|id| self.store.get(&collection, id))).await;

        let mut requests = Vec::with_capacity(ids.len());
        for document in documents {
            if let Some(document) = document? {
                requests.push(from_document(document)?);
            }
        }
        Ok(requests)
    }

    /// Accepting makes both accounts friends. The request is deleted for
    /// both actions.
    pub async fn respond_to_friend_request(&self, session: &Session, sender: &str, action: InviteAction) -> Outcome<()> {
        let result = self.friend_response_inner(session, sender, action).await;
        let message = match action {
            InviteAction::Accept => "Friend request accepted",
            InviteAction::Reject => "Friend request rejected",
        };
        Outcome::from_result(result, message, "respond_to_friend_request")
    }

    async fn friend_response_inner(&self, session: &Session, sender: &str, action: InviteAction) -> SyncResult<()> {
        let account = signed_in(session, "answer friend requests")?;
        let sender = sender.trim().to_lowercase();
        let collection = self.paths.user_friend_requests(account);
        if self.store.get(&collection, &sender).await?.is_none() {
            return Err(SyncError::NotFound("friend request".to_string()));
        }

        if action == InviteAction::Accept {
            self.link_friends(account, &sender).await?;
            self.link_friends(&sender, account).await?;
        }

        self.store.delete(&collection, &sender).await?;
        info!(
            sender = %redacted(&sender),
            account = %redacted(account),
            action = action.as_str(),
            "friend request answered"
        );
        Ok(())
    }

    /// Friends of the session's account, sorted
    pub async fn list_friends(&self, session: &Session) -> Outcome<Vec<String>> {
        Outcome::from_result(self.friends_inner(session).await, "Friends loaded", "list_friends")
    }

    async fn friends_inner(&self, session: &Session) -> SyncResult<Vec<String>> {
        let account = signed_in(session, "list friends")?;
        Ok(self.load_friends(account).await?.into_keys().collect())
    }

    /// End a friendship on both sides
    pub async fn remove_friend(&self, session: &Session, friend: &str) -> Outcome<()> {
        Outcome::from_result(self.unfriend_inner(session, friend).await, "Friend removed", "remove_friend")
    }

    async fn unfriend_inner(&self, session: &Session, friend: &str) -> SyncResult<()> {
        let account = signed_in(session, "remove friends")?;
        let friend = friend.trim().to_lowercase();
        if !self.load_friends(account).await?.contains_key(&friend) {
            return Err(SyncError::NotFound("friend".to_string()));
        }
        self.unlink_friends(account, &friend).await?;
        self.unlink_friends(&friend, account).await?;
        info!(account = %redacted(account), friend = %redacted(&friend), "friendship removed");
        Ok(())
    }

    async fn load_friends(&self, account: &str) -> SyncResult<FriendList> {
        friends_of(self.store.get(self.paths.users(), account).await?)
    }

    async fn link_friends(&self, account: &str, friend: &str) -> SyncResult<()> {
        let mut friends = self.load_friends(account).await?;
        friends.insert(friend.to_string(), Friend { email: friend.to_string() });
        self.write_friends(account, &friends).await
    }

    async fn unlink_friends(&self, account: &str, friend: &str) -> SyncResult<()> {
        let mut friends = self.load_friends(account).await?;
        friends.remove(friend);
        self.write_friends(account, &friends).await
    }

    async fn write_friends(&self, account: &str, friends: &FriendList) -> SyncResult<()> {
        let value = serde_json::to_value(friends)?;
        self.store
            .set(self.paths.users(), account, field_document(FRIENDS_FIELD, value), true)
            .await
    }

    // ------------------------------------------------------------------
    // Daily check-in and migration
    // ------------------------------------------------------------------

    /// Mark today as checked in, reconciling the local and remote copies.
    ///
    /// The remote copy wins conflicting days and today's count is set rather
    /// than incremented, so repeated calls on one day change nothing.
    pub async fn sync_daily_checkin(&self, session: &Session) -> Outcome<Habit> {
        Outcome::from_result(self.checkin_inner(session).await, "Daily check-in synced", "sync_daily_checkin")
    }

    async fn checkin_inner(&self, session: &Session) -> SyncResult<Habit> {
        let settings = &self.config.daily_checkin;
        let now = self.clock.now();

        let mut checkin = match self.local.load_checkin().await? {
            Some(local) if local.is_daily_checkin(&settings.id) => local,
            Some(_) | None => Habit::created_at(settings.name.clone(), None, now).with_id(settings.id.clone()),
        };

        if let Some(account) = session.account() {
            let collection = self.paths.user_private(account);
            if let Some(document) = self.store.get(&collection, &settings.id).await? {
                let remote: Habit = from_document(document)?;
                checkin = merge_habits(&checkin, &remote, MergeMode::Overwrite);
            }
        }

        checkin.log(now.date_naive(), 1.0, true);
        self.local.save_checkin(&checkin).await?;

        if let Some(account) = session.account() {
            self.store
                .set(&self.paths.user_private(account), &settings.id, to_document(&checkin)?, false)
                .await?;
        }

        debug!(days = checkin.activity().len(), "daily check-in recorded");
        Ok(checkin)
    }

    /// Move the anonymous local lists into `account`.
    ///
    /// A local habit whose name matches one of the account's habits only adds
    /// its activity to the account's own log; that habit's collaborators stay
    /// as they are. Other local items are uploaded with the account as owner.
    /// Each item leaves the local lists as soon as it is written, so a retry
    /// after a failure never merges the same history twice.
    pub async fn migrate_anonymous_data(&self, account: &str) -> Outcome<MigrationReport> {
        Outcome::from_result(self.migrate_inner(account).await, "Local data migrated", "migrate_anonymous_data")
    }

    async fn migrate_inner(&self, account: &str) -> SyncResult<MigrationReport> {
        let session = self.session(account);
        let account = signed_in(&session, "migrate local data")?;
        let now = self.clock.now();
        let matching = self.config.merge.name_matching;

        let mut targets: Vec<MigrationTarget> = self
            .list_remote::<Habit>(account)
            .await?
            .into_iter()
            .map(|habit| MigrationTarget { habit, uploaded: false })
            .collect();
        let mut merged_ids = HashSet::new();
        let mut report = MigrationReport::default();

        let mut pending: VecDeque<Habit> = self.local.load_habits().await?.into();
        while let Some(local) = pending.pop_front() {
            let key = matching.key(local.name());
            match targets.iter_mut().find(|t| matching.key(t.habit.name()) == key) {
                Some(target) => {
                    let mode = if target.habit.id() == local.id() {
                        MergeMode::Overwrite
                    } else {
                        MergeMode::Additive
                    };
                    let activity = merge_counters(target.habit.activity(), local.activity(), mode);
                    if activity != *target.habit.activity() {
                        target.habit.set_activity(activity);
                        if target.uploaded {
                            self.upload(account, &target.habit).await?;
                        } else {
                            self.write_membership(account, &target.habit, true).await?;
                            if merged_ids.insert(target.habit.id().to_string()) {
                                report.merged_habits += 1;
                            }
                        }
                    }
                }
                None => {
                    let mut habit = local;
                    habit.set_roles(RoleSet::with_owner(account, now));
                    self.upload(account, &habit).await?;
                    report.uploaded_habits += 1;
                    targets.push(MigrationTarget { habit, uploaded: true });
                }
            }
            self.local.save_habits(pending.make_contiguous()).await?;
        }

        let mut pending: VecDeque<Task> = self.local.load_tasks().await?.into();
        while let Some(mut task) = pending.pop_front() {
            task.set_roles(RoleSet::with_owner(account, now));
            self.upload(account, &task).await?;
            report.uploaded_tasks += 1;
            self.local.save_tasks(pending.make_contiguous()).await?;
        }

        self.local.clear_lists().await?;

        info!(
            account = %redacted(account),
            merged = report.merged_habits,
            uploaded_habits = report.uploaded_habits,
            uploaded_tasks = report.uploaded_tasks,
            "anonymous data migrated"
        );
        Ok(report)
    }

    async fn upload<T: StoredItem>(&self, account: &str, item: &T) -> SyncResult<()> {
        self.store
            .set(&self.paths.items(T::KIND), item.id(), to_document(item)?, true)
            .await?;
        self.write_membership(account, item, false).await
    }
}

/// An account habit a local habit can merge into during migration
struct MigrationTarget {
    habit: Habit,
    /// Uploaded by this migration rather than already on the account
    uploaded: bool,
}

fn signed_in<'a>(session: &'a Session, action: &str) -> SyncResult<&'a str> {
    session
        .account()
        .ok_or_else(|| SyncError::InvalidOperation(format!("sign in to {action}")))
}
