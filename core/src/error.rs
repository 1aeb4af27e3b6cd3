use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("No financial context for company '{company_id}'")]
    NotFound { company_id: String },

    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Computation failed: {detail}")]
    Computation { detail: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Computation,
    Internal,
}

impl CoreError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            field:  field.into(),
            reason: reason.into(),
        }
    }

    pub fn computation(detail: impl Into<String>) -> Self {
        CoreError::Computation { detail: detail.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. }     => ErrorKind::NotFound,
            CoreError::InvalidInput { .. } => ErrorKind::InvalidInput,
            CoreError::Computation { .. }  => ErrorKind::Computation,
            CoreError::Database(_)
            | CoreError::Serialization(_)
            | CoreError::Other(_)          => ErrorKind::Internal,
        }
    }

    /// Text suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::NotFound { company_id } => format!(
                "No financial data found for '{company_id}'. Upload financial data first."
            ),
            other => other.to_string(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
