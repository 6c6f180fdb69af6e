//! One-shot user notifications for mutating actions.
//!
//! Every mutating call yields exactly one notice: a success message on
//! `Ok`, a failure message on `Err`. Inputs should only be cleared by the
//! caller when the notice is a success.

use crate::access::permission::PermissionError;
use crate::model::validation::ValidationError;
use crate::service::error::ServiceError;
use serde::Serialize;

/// Mutating action a notice reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserAction {
    CreateList,
    RenameList,
    DeleteList,
    AddTask,
    EditTask,
    ToggleTask,
    DeleteTask,
    InviteMember,
    ChangeMemberRole,
    RemoveMember,
}

impl UserAction {
    fn success_message(self) -> &'static str {
        match self {
            Self::CreateList => "List created",
            Self::RenameList => "List renamed",
            Self::DeleteList => "List deleted",
            Self::AddTask => "Task added",
            Self::EditTask => "Task updated",
            Self::ToggleTask => "Task status updated",
            Self::DeleteTask => "Task deleted",
            Self::InviteMember => "Member added",
            Self::ChangeMemberRole => "Role updated",
            Self::RemoveMember => "Member removed",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Self::CreateList => "Create failed",
            Self::RenameList => "Rename failed",
            Self::DeleteList => "Delete failed",
            Self::AddTask => "Add task failed",
            Self::EditTask => "Update failed",
            Self::ToggleTask => "Not allowed",
            Self::DeleteTask => "Delete failed",
            Self::InviteMember => "Failed to add member",
            Self::ChangeMemberRole => "Failed to update role",
            Self::RemoveMember => "Failed to remove member",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient message shown once to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Notice for the outcome of `action`.
    pub fn for_outcome<T>(action: UserAction, result: &Result<T, ServiceError>) -> Self {
        match result {
            Ok(_) => Self::success(action.success_message()),
            Err(err) => Self::error(failure_message(action, err)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.level == NoticeLevel::Success
    }
}

fn failure_message(action: UserAction, err: &ServiceError) -> &'static str {
    match err {
        ServiceError::Permission(PermissionError::OwnerMustRemainAdmin) => {
            "Owner must remain admin"
        }
        ServiceError::Permission(PermissionError::CannotRemoveOwner) => "Cannot remove owner",
        ServiceError::Permission(_) => "Not allowed",
        ServiceError::Validation(
            ValidationError::EmptyTaskTitle | ValidationError::EmptyListTitle,
        ) => "Title is required",
        ServiceError::Validation(ValidationError::EmptyEmail) => "Email is required",
        ServiceError::Validation(ValidationError::MalformedEmail(_)) => "Invalid email",
        _ => action.failure_message(),
    }
}
