use crate::handoff::{HandoffId, HandoffStatus};
use crate::persistence::PersistenceError;
use std::fmt;
use thiserror::Error;

/// Coarse error categories surfaced to callers so they can render a specific message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidTransition,
    ValidationError,
    Internal,
}

/// Which record a `NotFound` refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    LostItem,
    FoundItem,
    Handoff,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::LostItem => f.write_str("Lost item"),
            EntityKind::FoundItem => f.write_str("Found item"),
            EntityKind::Handoff => f.write_str("Handoff"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: String },

    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Invalid transition: cannot {operation} handoff {handoff} while it is {from}")]
    InvalidTransition {
        handoff: HandoffId,
        from: HandoffStatus,
        operation: &'static str,
    },

    #[error("Invalid transition: handoff {handoff} cannot become {status} without {field}")]
    MissingField {
        handoff: HandoffId,
        status: HandoffStatus,
        field: &'static str,
    },

    #[error("Validation failed for {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::NotFound { .. } => ErrorKind::NotFound,
            WorkflowError::Conflict { .. } => ErrorKind::Conflict,
            WorkflowError::InvalidTransition { .. } | WorkflowError::MissingField { .. } => {
                ErrorKind::InvalidTransition
            }
            WorkflowError::Validation { .. } => ErrorKind::ValidationError,
            WorkflowError::Persistence(_) => ErrorKind::Internal,
        }
    }

    pub fn not_found(entity: EntityKind, id: impl fmt::Display) -> Self {
        WorkflowError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        WorkflowError::Conflict {
            reason: reason.into(),
        }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        WorkflowError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
