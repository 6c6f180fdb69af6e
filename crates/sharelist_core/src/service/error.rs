//! Service-level error taxonomy.

use crate::access::permission::PermissionError;
use crate::model::list::ListId;
use crate::model::task::TaskId;
use crate::model::validation::ValidationError;
use crate::repo::list_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coarse error class surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Permission,
    NotFound,
    Transient,
}

/// Document a write addressed that no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingEntity {
    List(ListId),
    Task { list_id: ListId, task_id: TaskId },
}

impl Display for MissingEntity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List(id) => write!(f, "list {id}"),
            Self::Task { list_id, task_id } => write!(f, "task {task_id} in list {list_id}"),
        }
    }
}

/// Failure of one use-case call.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before reaching the store.
    Validation(ValidationError),
    /// Caller lacks rights or hit an owner-protection rule.
    Permission(PermissionError),
    NotFound(MissingEntity),
    /// Store failure, passed through as-is.
    Transient(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Permission(_) => ErrorKind::Permission,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Transient(_) => ErrorKind::Transient,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Permission(err) => write!(f, "{err}"),
            Self::NotFound(entity) => write!(f, "not found: {entity}"),
            Self::Transient(err) => write!(f, "store failure: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Permission(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Transient(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PermissionError> for ServiceError {
    fn from(value: PermissionError) -> Self {
        Self::Permission(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::ListNotFound(id) => Self::NotFound(MissingEntity::List(id)),
            RepoError::TaskNotFound { list_id, task_id } => {
                Self::NotFound(MissingEntity::Task { list_id, task_id })
            }
            RepoError::OwnerDemotion(_) => Self::Permission(PermissionError::OwnerMustRemainAdmin),
            RepoError::OwnerRemoval(_) => Self::Permission(PermissionError::CannotRemoveOwner),
            other @ (RepoError::Db(_) | RepoError::InvalidData(_)) => Self::Transient(other),
        }
    }
}
