//! Shared list domain model.
//!
//! # Responsibility
//! - Define the list document shape and the member role enum.
//! - Keep `member_emails` derived from `members` so the two cannot drift.
//!
//! # Invariants
//! - `id` is assigned by the store at creation and never changes.
//! - `owner_email` is stored as an `admin` entry of `members`.
//! - `member_emails` equals the key set of `members`.

use crate::model::user::{NormalizedEmail, UserId};
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Store-assigned list identifier.
pub type ListId = Uuid;

/// Permission level granted to a list member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full control: rename, delete, edit tasks, manage members.
    Admin,
    /// Read access plus toggling task completion.
    Viewer,
}

impl Role {
    /// Stable string form used in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Viewer => "viewer",
        }
    }

    /// Parses the storage string form.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            other => Err(ValidationError::UnknownRole(other.to_string())),
        }
    }
}

/// A named collection of tasks, owned by one user and shared by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    pub id: ListId,
    pub title: String,
    pub owner_id: UserId,
    pub owner_email: NormalizedEmail,
    pub members: BTreeMap<NormalizedEmail, Role>,
    /// Mirror of `members` keys; backs the "shared with me" lookup.
    pub member_emails: BTreeSet<NormalizedEmail>,
    /// Store-assigned epoch milliseconds, strictly increasing per store.
    pub created_at: i64,
}

impl TodoList {
    /// Builds a list from persisted parts, deriving `member_emails`.
    pub fn from_parts(
        id: ListId,
        title: String,
        owner_id: UserId,
        owner_email: NormalizedEmail,
        members: BTreeMap<NormalizedEmail, Role>,
        created_at: i64,
    ) -> Self {
        let member_emails = members.keys().cloned().collect();
        Self {
            id,
            title,
            owner_id,
            owner_email,
            members,
            member_emails,
            created_at,
        }
    }

    /// Stored role for `email`, if it is a member.
    pub fn role_of(&self, email: &NormalizedEmail) -> Option<Role> {
        self.members.get(email).copied()
    }

    pub fn is_owner(&self, email: &NormalizedEmail) -> bool {
        &self.owner_email == email
    }

    /// Returns whether the mirror still matches the members map.
    pub fn member_index_is_consistent(&self) -> bool {
        self.members.len() == self.member_emails.len()
            && self
                .members
                .keys()
                .all(|email| self.member_emails.contains(email))
    }
}
