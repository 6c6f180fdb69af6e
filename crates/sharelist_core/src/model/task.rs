//! Task domain model.
//!
//! # Invariants
//! - A task belongs to exactly one list and dies with it.
//! - `completed` starts as `false`.
//! - Titles are trimmed and never empty; descriptions are trimmed.

use crate::model::list::ListId;
use crate::model::user::UserId;
use crate::model::validation::{normalize_task_title, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned task identifier.
pub type TaskId = Uuid;

/// One item inside a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub list_id: ListId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_by: UserId,
    /// Store-assigned epoch milliseconds.
    pub created_at: i64,
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub created_by: UserId,
}

impl NewTask {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        created_by: UserId,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            created_by,
        }
    }

    /// Trims fields and rejects an empty title.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            title: normalize_task_title(&self.title)?,
            description: self.description.trim().to_string(),
            created_by: self.created_by.clone(),
        })
    }
}

/// Partial task update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl TaskPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: None,
        }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            title: None,
            description: Some(description.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    /// Trims provided fields and rejects a provided-but-empty title.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        let title = match self.title.as_deref() {
            Some(value) => Some(normalize_task_title(value)?),
            None => None,
        };
        Ok(Self {
            title,
            description: self
                .description
                .as_deref()
                .map(|value| value.trim().to_string()),
        })
    }
}
