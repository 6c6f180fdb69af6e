//! Input validation errors and title normalization.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected user input, detected before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// List title is empty after trimming.
    EmptyListTitle,
    /// Task title is empty after trimming.
    EmptyTaskTitle,
    /// Email is empty after trimming.
    EmptyEmail,
    /// Email does not look like `local@domain`.
    MalformedEmail(String),
    /// Role string is not `admin` or `viewer`.
    UnknownRole(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyListTitle => write!(f, "list title must not be empty"),
            Self::EmptyTaskTitle => write!(f, "task title must not be empty"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::MalformedEmail(value) => write!(f, "email is malformed: `{value}`"),
            Self::UnknownRole(value) => {
                write!(f, "unknown role `{value}`; expected admin|viewer")
            }
        }
    }
}

impl Error for ValidationError {}

/// Trims a list title and rejects it when nothing is left.
pub fn normalize_list_title(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyListTitle);
    }
    Ok(trimmed.to_string())
}

/// Trims a task title and rejects it when nothing is left.
pub fn normalize_task_title(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTaskTitle);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{normalize_list_title, normalize_task_title, ValidationError};

    #[test]
    fn list_title_is_trimmed() {
        assert_eq!(normalize_list_title("  Groceries \n").unwrap(), "Groceries");
    }

    #[test]
    fn blank_titles_are_rejected() {
        assert_eq!(
            normalize_list_title(" \t ").unwrap_err(),
            ValidationError::EmptyListTitle
        );
        assert_eq!(
            normalize_task_title("").unwrap_err(),
            ValidationError::EmptyTaskTitle
        );
    }
}
