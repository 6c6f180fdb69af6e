//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the tasks nested under one list.
//! - Provide the per-list live task query.
//!
//! # Invariants
//! - Every write verifies the parent list still exists and reports
//!   `ListNotFound` before `TaskNotFound`.
//! - `update_task` only touches the fields present in the patch.
//! - Task listing order is `created_at DESC, id ASC`.

use crate::model::list::ListId;
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::model::user::UserId;
use crate::repo::list_repo::{list_exists, parse_uuid, RepoError, RepoResult};
use crate::store::live::{Subscription, Topic};
use crate::store::{next_created_at, DocumentStore};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::sync::Arc;
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    list_id,
    title,
    description,
    completed,
    created_by,
    created_at
FROM tasks";

/// Repository interface for tasks.
pub trait TaskRepository {
    /// Adds a task with `completed = false` and returns its id.
    fn add_task(&self, list_id: ListId, task: &NewTask) -> RepoResult<TaskId>;
    /// Loads one task.
    fn get_task(&self, list_id: ListId, task_id: TaskId) -> RepoResult<Option<Task>>;
    /// Applies a partial update.
    fn update_task(&self, list_id: ListId, task_id: TaskId, patch: &TaskPatch) -> RepoResult<()>;
    /// Sets the completion flag.
    fn toggle_task(&self, list_id: ListId, task_id: TaskId, completed: bool) -> RepoResult<()>;
    /// Deletes one task.
    fn delete_task(&self, list_id: ListId, task_id: TaskId) -> RepoResult<()>;
    /// Live query: tasks of `list_id`, newest first.
    fn watch_tasks<S>(&self, list_id: ListId, sink: S) -> RepoResult<Subscription>
    where
        S: Fn(Vec<Task>) + Send + Sync + 'static;
}

/// SQLite-backed task repository.
#[derive(Clone)]
pub struct SqliteTaskRepository {
    store: Arc<DocumentStore>,
}

impl SqliteTaskRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

impl TaskRepository for SqliteTaskRepository {
    fn add_task(&self, list_id: ListId, task: &NewTask) -> RepoResult<TaskId> {
        let task = task.normalized()?;
        let task_id = Uuid::new_v4();

        self.store.write(&[Topic::Tasks(list_id)], |tx| {
            if !list_exists(tx, list_id)? {
                return Err(RepoError::ListNotFound(list_id));
            }
            let created_at = next_created_at(tx, "tasks")?;
            tx.execute(
                "INSERT INTO tasks (
                    id,
                    list_id,
                    title,
                    description,
                    completed,
                    created_by,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6);",
                params![
                    task_id.to_string(),
                    list_id.to_string(),
                    task.title.as_str(),
                    task.description.as_str(),
                    task.created_by.as_str(),
                    created_at,
                ],
            )?;
            Ok(())
        })?;

        info!("event=task_add module=repo status=ok list_id={list_id} task_id={task_id}");
        Ok(task_id)
    }

    fn get_task(&self, list_id: ListId, task_id: TaskId) -> RepoResult<Option<Task>> {
        self.store.read(|conn| {
            let mut stmt =
                conn.prepare(&format!("{TASK_SELECT_SQL} WHERE list_id = ?1 AND id = ?2;"))?;
            let mut rows = stmt.query(params![list_id.to_string(), task_id.to_string()])?;
            if let Some(row) = rows.next()? {
                return Ok(Some(parse_task_row(row)?));
            }
            Ok(None)
        })
    }

    fn update_task(&self, list_id: ListId, task_id: TaskId, patch: &TaskPatch) -> RepoResult<()> {
        let patch = patch.normalized()?;
        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = vec![
            Value::Text(list_id.to_string()),
            Value::Text(task_id.to_string()),
        ];

        if let Some(title) = patch.title {
            bind_values.push(Value::Text(title));
            assignments.push(format!("title = ?{}", bind_values.len()));
        }
        if let Some(description) = patch.description {
            bind_values.push(Value::Text(description));
            assignments.push(format!("description = ?{}", bind_values.len()));
        }

        self.store.write(&[Topic::Tasks(list_id)], |tx| {
            ensure_task_exists(tx, list_id, task_id)?;
            if assignments.is_empty() {
                return Ok(());
            }
            tx.execute(
                &format!(
                    "UPDATE tasks SET {} WHERE list_id = ?1 AND id = ?2;",
                    assignments.join(", ")
                ),
                params_from_iter(bind_values),
            )?;
            Ok(())
        })
    }

    fn toggle_task(&self, list_id: ListId, task_id: TaskId, completed: bool) -> RepoResult<()> {
        self.store.write(&[Topic::Tasks(list_id)], |tx| {
            ensure_task_exists(tx, list_id, task_id)?;
            tx.execute(
                "UPDATE tasks SET completed = ?3 WHERE list_id = ?1 AND id = ?2;",
                params![list_id.to_string(), task_id.to_string(), bool_to_int(completed)],
            )?;
            Ok(())
        })
    }

    fn delete_task(&self, list_id: ListId, task_id: TaskId) -> RepoResult<()> {
        self.store.write(&[Topic::Tasks(list_id)], |tx| {
            ensure_task_exists(tx, list_id, task_id)?;
            tx.execute(
                "DELETE FROM tasks WHERE list_id = ?1 AND id = ?2;",
                params![list_id.to_string(), task_id.to_string()],
            )?;
            Ok::<_, RepoError>(())
        })?;

        info!("event=task_delete module=repo status=ok list_id={list_id} task_id={task_id}");
        Ok(())
    }

    fn watch_tasks<S>(&self, list_id: ListId, sink: S) -> RepoResult<Subscription>
    where
        S: Fn(Vec<Task>) + Send + Sync + 'static,
    {
        self.store.subscribe(
            Topic::Tasks(list_id),
            move |conn: &Connection| {
                let mut stmt = conn.prepare(&format!(
                    "{TASK_SELECT_SQL}
                     WHERE list_id = ?1
                     ORDER BY created_at DESC, id ASC;"
                ))?;
                let mut rows = stmt.query([list_id.to_string()])?;
                let mut tasks = Vec::new();
                while let Some(row) = rows.next()? {
                    tasks.push(parse_task_row(row)?);
                }
                Ok::<_, RepoError>(tasks)
            },
            sink,
        )
    }
}

fn ensure_task_exists(conn: &Connection, list_id: ListId, task_id: TaskId) -> RepoResult<()> {
    if !list_exists(conn, list_id)? {
        return Err(RepoError::ListNotFound(list_id));
    }
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM tasks WHERE list_id = ?1 AND id = ?2
        );",
        params![list_id.to_string(), task_id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(RepoError::TaskNotFound { list_id, task_id });
    }
    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let list_id_text: String = row.get("list_id")?;
    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in tasks.completed"
            )));
        }
    };
    let created_by: String = row.get("created_by")?;

    Ok(Task {
        id: parse_uuid(&id_text, "tasks.id")?,
        list_id: parse_uuid(&list_id_text, "tasks.list_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        completed,
        created_by: UserId::new(created_by),
        created_at: row.get("created_at")?,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
