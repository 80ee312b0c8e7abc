//! crates/misinfo_core/src/error.rs
//!
//! The error taxonomy of the analysis pipeline.

use crate::ports::PortError;

/// Errors surfaced by the engine, batch coordinator, history, and analytics.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Bad input shape or bounds. Raised before any side effect.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The classifier could not produce a verdict.
    #[error("Classification failed: {0}")]
    Classification(String),

    /// The store rejected a read or write.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// A flat, copyable tag for an `AnalysisError`, used where only the category travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Classification,
    Persistence,
    NotFound,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Classification => "classification",
            Self::Persistence => "persistence",
            Self::NotFound => "not_found",
        }
    }
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Classification(_) => ErrorKind::Classification,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Maps a store failure; `NotFound` keeps its meaning, everything else is persistence.
    pub fn from_store(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => Self::NotFound(what),
            other => Self::Persistence(other.to_string()),
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
