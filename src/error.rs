// src/error.rs
// Crate-wide error taxonomy shared by installer, reconciler and supervisor.

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Error kinds from spec section 7 ("Error Handling Design").
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("integrity check failed: {0}")]
    IntegrityError(String),

    #[error("size verification failed: {0}")]
    SizeVerificationFailed(String),

    #[error("subprocess failed (exit code {code:?}): {message}")]
    SubprocessFailed { code: Option<i32>, message: String },

    #[error("git error: {0}")]
    GitError(String),

    #[error("filesystem error: {0}")]
    FilesystemError(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("transient error: {0}")]
    Transient(String),

    #[error("operation cancelled by user")]
    UserCancelled,
}

impl AppError {
    /// Inside the reconciler, `Transient` and `FilesystemError` on a single
    /// cell are logged and counted rather than aborting the whole run.
    pub fn is_recoverable_in_reconciler(&self) -> bool {
        matches!(self, AppError::Transient(_) | AppError::FilesystemError(_))
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::FilesystemError(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::FilesystemError(format!("json: {e}"))
    }
}

impl From<git2::Error> for AppError {
    fn from(e: git2::Error) -> Self {
        AppError::GitError(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::NetworkError(e.to_string())
    }
}
