// src/installer/error_kind.rs
// Installer-facing error taxonomy (spec section 4.6), mapped onto the
// crate-wide AppError for a uniform propagation path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallerErrorKind {
    #[error("unknown app '{0}'")]
    UnknownApp(String),

    #[error("venv version '{0}' not available for this app")]
    VersionNotAvailable(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("integrity check failed: {0}")]
    IntegrityFailed(String),

    #[error("unpack failed: {0}")]
    UnpackFailed(String),

    #[error("clone failed: {0}")]
    CloneFailed(String),

    #[error("post-setup warning: {0}")]
    PostSetupWarning(String),

    #[error("refresh not allowed for '{0}'")]
    RefreshDisallowed(String),
}

impl From<InstallerErrorKind> for crate::error::AppError {
    fn from(kind: InstallerErrorKind) -> Self {
        use crate::error::AppError;
        match kind {
            InstallerErrorKind::UnknownApp(m) => AppError::NotFound(m),
            InstallerErrorKind::VersionNotAvailable(m) => AppError::PreconditionFailed(m),
            InstallerErrorKind::DownloadFailed(m) => AppError::NetworkError(m),
            InstallerErrorKind::IntegrityFailed(m) => AppError::IntegrityError(m),
            InstallerErrorKind::UnpackFailed(m) => AppError::SubprocessFailed { code: None, message: m },
            InstallerErrorKind::CloneFailed(m) => AppError::GitError(m),
            // Non-fatal: surfaced as a log line, never propagated as an error.
            InstallerErrorKind::PostSetupWarning(m) => AppError::Transient(m),
            InstallerErrorKind::RefreshDisallowed(m) => AppError::PreconditionFailed(m),
        }
    }
}
