//! Task use-case service.
//!
//! # Invariants
//! - Adding, editing and deleting tasks needs admin rights on the parent
//!   list; toggling completion only needs visibility.
//! - `created_by` is always the caller's user id.

use crate::access::permission::{ListAction, PermissionError};
use crate::identity::SessionUser;
use crate::model::list::ListId;
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::repo::list_repo::ListRepository;
use crate::repo::task_repo::TaskRepository;
use crate::service::error::ServiceResult;
use crate::service::list_service::{authorized_list, load_list_access};
use crate::store::live::Subscription;

pub struct TaskService<L: ListRepository, T: TaskRepository> {
    lists: L,
    tasks: T,
}

impl<L: ListRepository, T: TaskRepository> TaskService<L, T> {
    pub fn new(lists: L, tasks: T) -> Self {
        Self { lists, tasks }
    }

    pub fn add_task(
        &self,
        user: &SessionUser,
        list_id: ListId,
        title: &str,
        description: &str,
    ) -> ServiceResult<TaskId> {
        let task = NewTask::new(title, description, user.id.clone()).normalized()?;
        authorized_list(&self.lists, user, list_id, ListAction::AddTask)?;
        Ok(self.tasks.add_task(list_id, &task)?)
    }

    /// Applies the fields present in `patch`.
    pub fn edit_task(
        &self,
        user: &SessionUser,
        list_id: ListId,
        task_id: TaskId,
        patch: &TaskPatch,
    ) -> ServiceResult<()> {
        let patch = patch.normalized()?;
        authorized_list(&self.lists, user, list_id, ListAction::EditTask)?;
        self.tasks.update_task(list_id, task_id, &patch)?;
        Ok(())
    }

    pub fn toggle_task(
        &self,
        user: &SessionUser,
        list_id: ListId,
        task_id: TaskId,
        completed: bool,
    ) -> ServiceResult<()> {
        authorized_list(&self.lists, user, list_id, ListAction::ToggleTask)?;
        self.tasks.toggle_task(list_id, task_id, completed)?;
        Ok(())
    }

    pub fn delete_task(
        &self,
        user: &SessionUser,
        list_id: ListId,
        task_id: TaskId,
    ) -> ServiceResult<()> {
        authorized_list(&self.lists, user, list_id, ListAction::DeleteTask)?;
        self.tasks.delete_task(list_id, task_id)?;
        Ok(())
    }

    /// Live task snapshots for a list the caller can see.
    pub fn watch_tasks<S>(
        &self,
        user: &SessionUser,
        list_id: ListId,
        sink: S,
    ) -> ServiceResult<Subscription>
    where
        S: Fn(Vec<Task>) + Send + Sync + 'static,
    {
        let (_, access) = load_list_access(&self.lists, user, list_id)?;
        if !access.can_view() {
            return Err(PermissionError::NotVisible.into());
        }
        Ok(self.tasks.watch_tasks(list_id, sink)?)
    }
}
