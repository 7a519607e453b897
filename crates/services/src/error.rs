//! Shared error types for the services crate.

use std::fmt;

use thiserror::Error;

use quiz_core::model::QuizId;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::sessions::SessionState;

/// Coarse classification handed to the UI's error callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionErrorKind {
    QuizNotFound,
    QuizLoad,
    Persistence,
    InvalidState,
}

impl SessionErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QuizNotFound => "quiz-not-found",
            Self::QuizLoad => "quiz-load",
            Self::Persistence => "persistence",
            Self::InvalidState => "invalid-state",
        }
    }
}

impl fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors emitted by `QuizSession` and `SessionDriver`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz {quiz_id} not found")]
    QuizNotFound { quiz_id: QuizId },
    #[error("failed to load quiz {quiz_id}: {source}")]
    QuizLoad {
        quiz_id: QuizId,
        #[source]
        source: StorageError,
    },
    #[error("failed to save quiz result: {0}")]
    Persistence(#[source] StorageError),
    #[error("quiz result save did not finish: {0}")]
    SaveInterrupted(String),
    #[error("cannot {operation} while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
}

impl SessionError {
    /// Narrows a failed quiz fetch: a missing document is `QuizNotFound`,
    /// everything else is `QuizLoad`.
    #[must_use]
    pub fn from_load(quiz_id: QuizId, err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::QuizNotFound { quiz_id },
            source => Self::QuizLoad { quiz_id, source },
        }
    }

    #[must_use]
    pub fn kind(&self) -> SessionErrorKind {
        match self {
            Self::QuizNotFound { .. } => SessionErrorKind::QuizNotFound,
            Self::QuizLoad { .. } => SessionErrorKind::QuizLoad,
            Self::Persistence(_) | Self::SaveInterrupted(_) => SessionErrorKind::Persistence,
            Self::InvalidState { .. } => SessionErrorKind::InvalidState,
        }
    }
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("sign-out failed: {0}")]
    SignOut(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ResultHistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
