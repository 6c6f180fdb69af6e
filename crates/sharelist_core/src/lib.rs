//! Core domain logic for shared to-do lists.
//!
//! Lists are owned by one user and shared by email as `admin` or
//! `viewer`. This crate owns the access rules, the merged live view of
//! visible lists, and the SQLite-backed document store behind them.

pub mod access;
pub mod config;
pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod sync;

pub use access::permission::{AccessLevel, ListAction, PermissionError};
pub use access::roster::{member_roster, MemberEntry};
pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use identity::{AuthEvent, IdentityProvider, SessionUser};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::list::{ListId, Role, TodoList};
pub use model::task::{NewTask, Task, TaskId, TaskPatch};
pub use model::user::{normalize_email, NormalizedEmail, UserId};
pub use model::validation::ValidationError;
pub use repo::list_repo::{ListRepository, RepoError, RepoResult, SqliteListRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use service::error::{ErrorKind, MissingEntity, ServiceError, ServiceResult};
pub use service::list_service::ListService;
pub use service::member_service::MemberService;
pub use service::notice::{Notice, NoticeLevel, UserAction};
pub use service::task_service::TaskService;
pub use store::live::{Subscription, Topic};
pub use store::DocumentStore;
pub use sync::feed::AccessibleListsFeed;
pub use sync::merge::{merge_lists, watch_accessible_lists, AccessibleListsSubscription};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
