//! List repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/rename/delete and membership writes for lists.
//! - Provide the two live queries behind the merged list view: lists a
//!   user owns and lists shared with an email.
//!
//! # Invariants
//! - A new list always has its owner as the sole `admin` member.
//! - Member writes touch only the addressed member row.
//! - The owner can never be demoted or removed through this repository.
//! - `delete_with_tasks` removes the list and every task or nothing.

use crate::db::DbError;
use crate::model::list::{ListId, Role, TodoList};
use crate::model::task::TaskId;
use crate::model::user::{NormalizedEmail, UserId};
use crate::model::validation::{normalize_list_title, ValidationError};
use crate::store::live::{Subscription, Topic};
use crate::store::{next_created_at, DocumentStore};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

const LIST_SELECT_SQL: &str = "SELECT
    id,
    title,
    owner_id,
    owner_email,
    created_at
FROM lists";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for list and task persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    ListNotFound(ListId),
    TaskNotFound { list_id: ListId, task_id: TaskId },
    /// Write would set the owner's role to something other than admin.
    OwnerDemotion(ListId),
    /// Write would remove the owner from the members map.
    OwnerRemoval(ListId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::TaskNotFound { list_id, task_id } => {
                write!(f, "task not found: {task_id} in list {list_id}")
            }
            Self::OwnerDemotion(id) => write!(f, "owner of list {id} must remain admin"),
            Self::OwnerRemoval(id) => write!(f, "owner of list {id} cannot be removed"),
            Self::InvalidData(message) => write!(f, "invalid persisted list data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for list documents and their membership.
pub trait ListRepository {
    /// Creates a list owned by `owner_id` and returns its store-assigned id.
    fn create_list(
        &self,
        owner_id: &UserId,
        owner_email: &NormalizedEmail,
        title: &str,
    ) -> RepoResult<ListId>;
    /// Loads one list with its members.
    fn get_list(&self, list_id: ListId) -> RepoResult<Option<TodoList>>;
    /// Replaces the title with its trimmed form.
    fn rename_list(&self, list_id: ListId, title: &str) -> RepoResult<()>;
    /// Deletes the list and all of its tasks atomically.
    fn delete_with_tasks(&self, list_id: ListId) -> RepoResult<()>;
    /// Upserts one member's role without touching other members.
    fn set_member_role(
        &self,
        list_id: ListId,
        email: &NormalizedEmail,
        role: Role,
    ) -> RepoResult<()>;
    /// Removes one member in a single conditional write.
    fn remove_member(&self, list_id: ListId, email: &NormalizedEmail) -> RepoResult<()>;
    /// Live query: lists owned by `owner_id`, newest first.
    fn watch_owned_lists<S>(&self, owner_id: &UserId, sink: S) -> RepoResult<Subscription>
    where
        S: Fn(Vec<TodoList>) + Send + Sync + 'static;
    /// Live query: lists whose members include `email`, newest first.
    fn watch_shared_lists<S>(&self, email: &NormalizedEmail, sink: S) -> RepoResult<Subscription>
    where
        S: Fn(Vec<TodoList>) + Send + Sync + 'static;
}

/// SQLite-backed list repository.
#[derive(Clone)]
pub struct SqliteListRepository {
    store: Arc<DocumentStore>,
}

impl SqliteListRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }
}

impl ListRepository for SqliteListRepository {
    fn create_list(
        &self,
        owner_id: &UserId,
        owner_email: &NormalizedEmail,
        title: &str,
    ) -> RepoResult<ListId> {
        let title = normalize_list_title(title)?;
        let list_id = Uuid::new_v4();

        self.store.write(&[Topic::Lists], |tx| {
            let created_at = next_created_at(tx, "lists")?;
            tx.execute(
                "INSERT INTO lists (id, title, owner_id, owner_email, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    list_id.to_string(),
                    title.as_str(),
                    owner_id.as_str(),
                    owner_email.as_str(),
                    created_at,
                ],
            )?;
            tx.execute(
                "INSERT INTO list_members (list_id, email, role) VALUES (?1, ?2, ?3);",
                params![
                    list_id.to_string(),
                    owner_email.as_str(),
                    Role::Admin.as_str()
                ],
            )?;
            Ok::<_, RepoError>(())
        })?;

        info!("event=list_create module=repo status=ok list_id={list_id}");
        Ok(list_id)
    }

    fn get_list(&self, list_id: ListId) -> RepoResult<Option<TodoList>> {
        self.store.read(|conn| load_list(conn, list_id))
    }

    fn rename_list(&self, list_id: ListId, title: &str) -> RepoResult<()> {
        let title = normalize_list_title(title)?;
        self.store.write(&[Topic::Lists], |tx| {
            let changed = tx.execute(
                "UPDATE lists SET title = ?2 WHERE id = ?1;",
                params![list_id.to_string(), title.as_str()],
            )?;
            if changed == 0 {
                return Err(RepoError::ListNotFound(list_id));
            }
            Ok(())
        })
    }

    fn delete_with_tasks(&self, list_id: ListId) -> RepoResult<()> {
        let deleted_tasks = self
            .store
            .write(&[Topic::Lists, Topic::Tasks(list_id)], |tx| {
                let id = list_id.to_string();
                if owner_email_of(tx, list_id)?.is_none() {
                    return Err(RepoError::ListNotFound(list_id));
                }
                let deleted_tasks = tx.execute("DELETE FROM tasks WHERE list_id = ?1;", [&id])?;
                tx.execute("DELETE FROM list_members WHERE list_id = ?1;", [&id])?;
                tx.execute("DELETE FROM lists WHERE id = ?1;", [&id])?;
                Ok(deleted_tasks)
            })?;

        info!(
            "event=list_delete module=repo status=ok list_id={list_id} deleted_tasks={deleted_tasks}"
        );
        Ok(())
    }

    fn set_member_role(
        &self,
        list_id: ListId,
        email: &NormalizedEmail,
        role: Role,
    ) -> RepoResult<()> {
        self.store.write(&[Topic::Lists], |tx| {
            let owner_email =
                owner_email_of(tx, list_id)?.ok_or(RepoError::ListNotFound(list_id))?;
            if owner_email == email.as_str() && role != Role::Admin {
                return Err(RepoError::OwnerDemotion(list_id));
            }
            tx.execute(
                "INSERT INTO list_members (list_id, email, role)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (list_id, email) DO UPDATE SET role = excluded.role;",
                params![list_id.to_string(), email.as_str(), role.as_str()],
            )?;
            Ok(())
        })
    }

    fn remove_member(&self, list_id: ListId, email: &NormalizedEmail) -> RepoResult<()> {
        self.store.write(&[Topic::Lists], |tx| {
            let owner_email =
                owner_email_of(tx, list_id)?.ok_or(RepoError::ListNotFound(list_id))?;
            if owner_email == email.as_str() {
                return Err(RepoError::OwnerRemoval(list_id));
            }
            // The owner guard is repeated in SQL so the delete stays a
            // single conditional statement.
            tx.execute(
                "DELETE FROM list_members
                 WHERE list_id = ?1
                   AND email = ?2
                   AND email <> (SELECT owner_email FROM lists WHERE id = ?1);",
                params![list_id.to_string(), email.as_str()],
            )?;
            Ok(())
        })
    }

    fn watch_owned_lists<S>(&self, owner_id: &UserId, sink: S) -> RepoResult<Subscription>
    where
        S: Fn(Vec<TodoList>) + Send + Sync + 'static,
    {
        let owner_id = owner_id.clone();
        self.store.subscribe(
            Topic::Lists,
            move |conn: &Connection| {
                query_lists(
                    conn,
                    &format!(
                        "{LIST_SELECT_SQL}
                         WHERE owner_id = ?1
                         ORDER BY created_at DESC, id ASC;"
                    ),
                    owner_id.as_str(),
                )
            },
            sink,
        )
    }

    fn watch_shared_lists<S>(&self, email: &NormalizedEmail, sink: S) -> RepoResult<Subscription>
    where
        S: Fn(Vec<TodoList>) + Send + Sync + 'static,
    {
        let email = email.clone();
        self.store.subscribe(
            Topic::Lists,
            move |conn: &Connection| {
                query_lists(
                    conn,
                    &format!(
                        "{LIST_SELECT_SQL}
                         WHERE id IN (SELECT list_id FROM list_members WHERE email = ?1)
                         ORDER BY created_at DESC, id ASC;"
                    ),
                    email.as_str(),
                )
            },
            sink,
        )
    }
}

fn load_list(conn: &Connection, list_id: ListId) -> RepoResult<Option<TodoList>> {
    let mut stmt = conn.prepare(&format!("{LIST_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([list_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_list_row(conn, row)?));
    }
    Ok(None)
}

fn query_lists(conn: &Connection, sql: &str, key: &str) -> RepoResult<Vec<TodoList>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([key])?;
    let mut lists = Vec::new();
    while let Some(row) = rows.next()? {
        lists.push(parse_list_row(conn, row)?);
    }
    Ok(lists)
}

fn parse_list_row(conn: &Connection, row: &Row<'_>) -> RepoResult<TodoList> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "lists.id")?;

    let owner_email_text: String = row.get("owner_email")?;
    let owner_email = NormalizedEmail::parse(&owner_email_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid owner email in lists.owner_email for {id}"))
    })?;

    let owner_id: String = row.get("owner_id")?;
    Ok(TodoList::from_parts(
        id,
        row.get("title")?,
        UserId::new(owner_id),
        owner_email,
        load_members(conn, &id_text)?,
        row.get("created_at")?,
    ))
}

fn load_members(conn: &Connection, list_id: &str) -> RepoResult<BTreeMap<NormalizedEmail, Role>> {
    let mut stmt = conn.prepare(
        "SELECT email, role
         FROM list_members
         WHERE list_id = ?1
         ORDER BY email ASC;",
    )?;
    let mut rows = stmt.query([list_id])?;
    let mut members = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let email_text: String = row.get("email")?;
        let role_text: String = row.get("role")?;
        let email = NormalizedEmail::parse(&email_text).map_err(|_| {
            RepoError::InvalidData(format!("empty email in list_members for list {list_id}"))
        })?;
        let role = Role::parse(&role_text).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid role `{role_text}` in list_members.role for list {list_id}"
            ))
        })?;
        members.insert(email, role);
    }
    Ok(members)
}

/// Owner email of `list_id`, or `None` when the list does not exist.
fn owner_email_of(conn: &Connection, list_id: ListId) -> RepoResult<Option<String>> {
    let owner = conn
        .query_row(
            "SELECT owner_email FROM lists WHERE id = ?1;",
            [list_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(owner)
}

pub(crate) fn list_exists(conn: &Connection, list_id: ListId) -> RepoResult<bool> {
    Ok(owner_email_of(conn, list_id)?.is_some())
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
