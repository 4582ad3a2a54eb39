//! Error handling for DOI publishing
//!
//! This module provides the error type shared by configuration, transport and
//! the publishing workflow, with recovery guidance attached to each variant.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for DOI publishing operations
#[derive(Error, Debug)]
pub enum PublishError {
    // Configuration errors
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    // Remote service errors
    #[error("remote service returned HTTP {status}: {body}")]
    RemoteServiceError { status: u16, body: String },

    #[error("unexpected response from remote service: {0}")]
    InvalidResponse(String),

    // Network errors
    #[error("network error: {0}")]
    NetworkError(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    // Local filesystem errors
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PublishError {
    /// HTTP status carried by a remote service error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteServiceError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error is recoverable by rerunning without code changes
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ConfigurationError(_) | Self::InvalidResponse(_))
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::ConfigurationError(_) => vec![
                "Set the ZENODO_TOKEN environment variable",
                "Check that the metadata file exists and is valid YAML or JSON",
            ],
            Self::RemoteServiceError { status, .. } => match status {
                401 | 403 => vec![
                    "Check that the token is valid for the selected environment",
                    "Sandbox and production tokens are not interchangeable",
                    "Make sure the token has the deposit:write and deposit:actions scopes",
                ],
                400 => vec![
                    "Check the metadata against the remote deposition schema",
                    "The response body lists the rejected fields",
                ],
                _ => vec![
                    "Check the response body for details",
                    "A draft may have been left behind; remove it through the web interface",
                ],
            },
            Self::InvalidResponse(_) => {
                vec!["Check that the base URL points to a deposition API"]
            }
            Self::NetworkError(_) => vec![
                "Check your internet connection",
                "Wait a while and run again",
            ],
            Self::Timeout(_) => vec![
                "Check your network environment",
                "Use --timeout to allow more time for large uploads",
            ],
            Self::Io { .. } => vec!["Check that the file exists and is readable"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigurationError(_) => "CONFIGURATION_ERROR",
            Self::RemoteServiceError { .. } => "REMOTE_SERVICE_ERROR",
            Self::InvalidResponse(_) => "INVALID_RESPONSE",
            Self::NetworkError(_) => "NETWORK_ERROR",
            Self::Timeout(_) => "TIMEOUT_ERROR",
            Self::Io { .. } => "IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error() {
        let error = PublishError::ConfigurationError("ZENODO_TOKEN is not set".to_string());

        assert!(!error.is_recoverable());
        assert_eq!(error.code(), "CONFIGURATION_ERROR");
        assert!(error.to_string().contains("ZENODO_TOKEN"));
        assert!(
            error
                .suggested_actions()
                .iter()
                .any(|a| a.contains("ZENODO_TOKEN"))
        );
    }

    #[test]
    fn test_remote_service_error_carries_status_and_body() {
        let error = PublishError::RemoteServiceError {
            status: 400,
            body: r#"{"message": "Validation error."}"#.to_string(),
        };

        assert_eq!(error.status(), Some(400));
        assert!(error.is_recoverable());
        assert_eq!(error.code(), "REMOTE_SERVICE_ERROR");
        let msg = error.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("Validation error."));
    }

    #[test]
    fn test_auth_failure_suggestions() {
        let error = PublishError::RemoteServiceError {
            status: 403,
            body: String::new(),
        };

        let actions = error.suggested_actions();
        assert!(actions.len() >= 3);
        assert!(actions.iter().any(|a| a.contains("Sandbox")));
    }

    #[test]
    fn test_io_error_display() {
        let error = PublishError::Io {
            path: PathBuf::from("/tmp/paper.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };

        assert_eq!(error.code(), "IO_ERROR");
        assert_eq!(error.status(), None);
        assert!(error.to_string().contains("/tmp/paper.pdf"));
    }

    #[test]
    fn test_invalid_response_not_recoverable() {
        let error = PublishError::InvalidResponse("missing id".to_string());
        assert!(!error.is_recoverable());
        assert_eq!(error.code(), "INVALID_RESPONSE");
    }

    #[test]
    fn test_timeout_error() {
        let error = PublishError::Timeout("operation timed out".to_string());
        assert!(error.is_recoverable());
        assert_eq!(error.code(), "TIMEOUT_ERROR");
    }
}
