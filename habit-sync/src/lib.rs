//! Local/remote synchronization for shared habits and tasks
//!
//! Provides:
//! - [`DocumentStore`]: the remote authoritative store, with an in-memory
//!   implementation
//! - [`LocalCache`]: the device-local key/value cache, in-memory or SQLite
//! - [`Session`]: anonymous vs. authenticated routing
//! - [`SyncCoordinator`]: create/read/update/delete, role changes,
//!   invitations, friends, daily check-in reconciliation and anonymous data
//!   migration,
//!   each returning an [`error_common::Outcome`]
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use config_engine::EngineConfig;
//! use habit_sync::{InMemoryDocumentStore, InMemoryLocalCache, SyncCoordinator};
//! use shared_items::Habit;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//!     let coordinator = SyncCoordinator::new(
//!         Arc::new(InMemoryDocumentStore::new()),
//!         Arc::new(InMemoryLocalCache::new()),
//!         EngineConfig::default(),
//!     );
//!     let session = coordinator.session("ana@example.com");
//!     let created = coordinator.create_habit(&session, Habit::new("Run", None)).await;
//!     assert!(created.ok);
//! # });
//! ```

pub mod cache;
pub mod clock;
pub mod coordinator;
pub mod error;
pub mod friends;
pub mod invite;
pub mod local;
pub mod remote;
pub mod session;
pub mod store;

pub use cache::{InMemoryLocalCache, LocalCache, SqliteCacheConfig, SqliteLocalCache};
pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinator::{MigrationReport, RoleChangeStatus, SyncCoordinator, UpdateMode};
pub use error::{SyncError, SyncResult};
pub use friends::{Friend, FriendList, FriendRequest};
pub use invite::{Invite, InviteAction};
pub use local::LocalStore;
pub use remote::{RemotePaths, StoredItem};
pub use session::Session;
pub use store::{Document, DocumentStore, InMemoryDocumentStore};
