//! Permission evaluator for list mutations.
//!
//! # Responsibility
//! - Derive the effective access of one email on one list.
//! - Gate every list/task/member mutation before it reaches a repository.
//!
//! # Invariants
//! - The owner always has admin rights, whatever `members` stores.
//! - Toggling task completion only requires seeing the list.
//! - The owner can never be demoted or removed, even by an admin.

use crate::model::list::{Role, TodoList};
use crate::model::user::NormalizedEmail;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Mutation that needs a permission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListAction {
    Rename,
    Delete,
    AddTask,
    EditTask,
    DeleteTask,
    ToggleTask,
    InviteMember,
    ChangeMemberRole,
    RemoveMember,
}

impl ListAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rename => "rename_list",
            Self::Delete => "delete_list",
            Self::AddTask => "add_task",
            Self::EditTask => "edit_task",
            Self::DeleteTask => "delete_task",
            Self::ToggleTask => "toggle_task",
            Self::InviteMember => "invite_member",
            Self::ChangeMemberRole => "change_member_role",
            Self::RemoveMember => "remove_member",
        }
    }

    /// Whether the action needs admin rights rather than mere visibility.
    pub fn requires_admin(self) -> bool {
        !matches!(self, Self::ToggleTask)
    }
}

/// Rejected mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// Caller lacks the rights `action` needs.
    NotAllowed(ListAction),
    /// Caller is neither owner nor member of the list.
    NotVisible,
    OwnerMustRemainAdmin,
    CannotRemoveOwner,
}

impl Display for PermissionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAllowed(action) => write!(f, "not allowed to {}", action.as_str()),
            Self::NotVisible => write!(f, "list is not visible to this user"),
            Self::OwnerMustRemainAdmin => write!(f, "owner must remain admin"),
            Self::CannotRemoveOwner => write!(f, "cannot remove owner"),
        }
    }
}

impl Error for PermissionError {}

/// Effective access of one user on one list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessLevel {
    pub is_owner: bool,
    /// Role stored in `members`, if any.
    pub role: Option<Role>,
    pub can_admin: bool,
}

impl AccessLevel {
    pub fn evaluate(email: &NormalizedEmail, list: &TodoList) -> Self {
        let is_owner = list.is_owner(email);
        let role = list.role_of(email);
        Self {
            is_owner,
            role,
            can_admin: is_owner || role == Some(Role::Admin),
        }
    }

    pub fn can_view(&self) -> bool {
        self.is_owner || self.role.is_some()
    }

    /// Role the user acts with; the owner is always admin.
    pub fn effective_role(&self) -> Option<Role> {
        if self.is_owner {
            Some(Role::Admin)
        } else {
            self.role
        }
    }

    pub fn allows(&self, action: ListAction) -> bool {
        if action.requires_admin() {
            self.can_admin
        } else {
            self.can_view()
        }
    }

    pub fn authorize(&self, action: ListAction) -> Result<(), PermissionError> {
        if self.allows(action) {
            Ok(())
        } else {
            Err(PermissionError::NotAllowed(action))
        }
    }
}

/// Rejects giving the owner any role other than admin.
pub fn guard_role_change(
    list: &TodoList,
    email: &NormalizedEmail,
    role: Role,
) -> Result<(), PermissionError> {
    if list.is_owner(email) && role != Role::Admin {
        return Err(PermissionError::OwnerMustRemainAdmin);
    }
    Ok(())
}

/// Rejects removing the owner from the members map.
pub fn guard_removal(list: &TodoList, email: &NormalizedEmail) -> Result<(), PermissionError> {
    if list.is_owner(email) {
        return Err(PermissionError::CannotRemoveOwner);
    }
    Ok(())
}
