use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub details: Option<String>,
}

/// Why a dependency installation was judged to have failed. Inferred from
/// the installer's exit status where possible and from its output text
/// otherwise; advisory, never authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallFailureReason {
    PlatformMismatch,
    UnknownPackage,
    VersionConflict,
    Network,
    Timeout,
    ResourceExhausted,
    Other,
}

impl InstallFailureReason {
    pub fn hint(&self) -> &'static str {
        match self {
            InstallFailureReason::PlatformMismatch => {
                "No binary wheel is available for the requested platform."
            }
            InstallFailureReason::UnknownPackage => {
                "One of the package names was not found; check for typos."
            }
            InstallFailureReason::VersionConflict => {
                "The requested package versions are incompatible with each other."
            }
            InstallFailureReason::Network => {
                "Network connectivity issue. Please try again in a few moments."
            }
            InstallFailureReason::Timeout => {
                "Installation timed out. Try with fewer dependencies or simpler packages."
            }
            InstallFailureReason::ResourceExhausted => {
                "Insufficient memory or disk space. Try installing fewer dependencies at once."
            }
            InstallFailureReason::Other => {
                "This may be due to a missing platform wheel, network issues, a package \
                 name typo, or incompatible versions. Check the service logs for details."
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum LayerError {
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Package not found: {key}")]
    NotFound { key: String },

    #[error("Failed to install dependencies: {}", .dependencies.join(", "))]
    DependencyInstallationFailed {
        dependencies: Vec<String>,
        reason: InstallFailureReason,
    },

    #[error("Failed to generate download URL: {reason}")]
    PresignFailed { reason: String },

    #[error("{operation} timed out after {timeout_secs}s")]
    Timeout { operation: String, timeout_secs: u64 },

    #[error("Insufficient resources: {reason}")]
    ResourceExhausted { reason: String },

    #[error("Storage error: {reason}")]
    Storage { reason: String },

    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

impl LayerError {
    pub fn http_status(&self) -> u16 {
        match self {
            LayerError::InvalidRequest { .. } => 400,
            LayerError::NotFound { .. } => 404,
            LayerError::DependencyInstallationFailed { .. } => 500,
            LayerError::PresignFailed { .. } => 500,
            LayerError::Timeout { .. } => 500,
            LayerError::ResourceExhausted { .. } => 500,
            LayerError::Storage { .. } => 500,
            LayerError::Internal { .. } => 500,
        }
    }

    /// Message surfaced to the user. More specific than the raw error where
    /// a known failure pattern is recognized; the raw text stays available in
    /// the `details` field of the error body.
    pub fn user_message(&self) -> String {
        match self {
            LayerError::DependencyInstallationFailed {
                dependencies,
                reason,
            } => {
                format!(
                    "Failed to install dependencies: {}. {}",
                    dependencies.join(", "),
                    reason.hint()
                )
            }
            LayerError::Timeout { .. } => InstallFailureReason::Timeout.hint().to_string(),
            LayerError::ResourceExhausted { .. } => {
                InstallFailureReason::ResourceExhausted.hint().to_string()
            }
            LayerError::NotFound { .. } => "Package not found".to_string(),
            LayerError::InvalidRequest { reason } => reason.clone(),
            LayerError::PresignFailed { .. } => self.to_string(),
            _ => format!("Package creation failed: {self}"),
        }
    }

    pub fn to_error_body(&self) -> ErrorBody {
        let error = self.user_message();
        let raw = self.to_string();
        let details = if raw == error { None } else { Some(raw) };
        ErrorBody {
            success: false,
            error,
            details,
        }
    }
}
