//! List use-case service.
//!
//! # Responsibility
//! - Gate list-level mutations on the caller's re-derived access.
//! - Expose the merged live view of lists visible to the caller.
//!
//! # Invariants
//! - Access is evaluated against a fresh read of the list on every call.
//! - Validation runs before anything is read from the store.

use crate::access::permission::{AccessLevel, ListAction, PermissionError};
use crate::identity::SessionUser;
use crate::model::list::{ListId, TodoList};
use crate::model::validation::normalize_list_title;
use crate::repo::list_repo::ListRepository;
use crate::service::error::{MissingEntity, ServiceError, ServiceResult};
use crate::sync::merge::{watch_accessible_lists, AccessibleListsSubscription};
use log::{info, warn};

/// Use-case service for list documents.
pub struct ListService<R: ListRepository> {
    repo: R,
}

impl<R: ListRepository> ListService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a list owned by `user`, who becomes its sole admin.
    pub fn create_list(&self, user: &SessionUser, title: &str) -> ServiceResult<ListId> {
        let title = normalize_list_title(title)?;
        Ok(self.repo.create_list(&user.id, &user.email, &title)?)
    }

    /// Loads a list the caller can see, with the caller's access on it.
    pub fn open_list(
        &self,
        user: &SessionUser,
        list_id: ListId,
    ) -> ServiceResult<(TodoList, AccessLevel)> {
        let (list, access) = load_list_access(&self.repo, user, list_id)?;
        if !access.can_view() {
            return Err(PermissionError::NotVisible.into());
        }
        Ok((list, access))
    }

    /// Renames a list.
    ///
    /// Returns `false` without writing when the trimmed title equals the
    /// current one.
    pub fn rename_list(
        &self,
        user: &SessionUser,
        list_id: ListId,
        title: &str,
    ) -> ServiceResult<bool> {
        let title = normalize_list_title(title)?;
        let list = authorized_list(&self.repo, user, list_id, ListAction::Rename)?;
        if list.title == title {
            return Ok(false);
        }
        self.repo.rename_list(list_id, &title)?;
        info!("event=list_rename module=service status=ok list_id={list_id}");
        Ok(true)
    }

    /// Deletes a list and all of its tasks.
    pub fn delete_list(&self, user: &SessionUser, list_id: ListId) -> ServiceResult<()> {
        authorized_list(&self.repo, user, list_id, ListAction::Delete)?;
        self.repo.delete_with_tasks(list_id)?;
        Ok(())
    }

    /// Live merged view of every list `user` owns or is a member of.
    pub fn watch_lists<S>(
        &self,
        user: &SessionUser,
        sink: S,
    ) -> ServiceResult<AccessibleListsSubscription>
    where
        S: Fn(Vec<TodoList>) + Send + Sync + 'static,
    {
        Ok(watch_accessible_lists(&self.repo, user, sink)?)
    }
}

/// Fresh read of `list_id` plus the caller's access on it.
pub(crate) fn load_list_access<R: ListRepository>(
    repo: &R,
    user: &SessionUser,
    list_id: ListId,
) -> ServiceResult<(TodoList, AccessLevel)> {
    let list = repo
        .get_list(list_id)?
        .ok_or(ServiceError::NotFound(MissingEntity::List(list_id)))?;
    let access = AccessLevel::evaluate(&user.email, &list);
    Ok((list, access))
}

/// Loads the list and fails unless the caller may perform `action` on it.
pub(crate) fn authorized_list<R: ListRepository>(
    repo: &R,
    user: &SessionUser,
    list_id: ListId,
    action: ListAction,
) -> ServiceResult<TodoList> {
    let (list, access) = load_list_access(repo, user, list_id)?;
    if let Err(err) = access.authorize(action) {
        warn!(
            "event=permission_denied module=service status=error list_id={list_id} action={}",
            action.as_str()
        );
        return Err(err.into());
    }
    Ok(list)
}
