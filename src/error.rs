//! Unified error types for the deploy-character workflow.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// MCP client errors
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Not connected")]
    NotConnected,

    #[error("Not initialized")]
    NotInitialized,

    #[error("Failed to spawn process: {0}")]
    SpawnFailed(String),

    #[error("RPC error (code {code}): {message}")]
    RpcError { code: i32, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Connection closed by server")]
    Closed,

    #[error("IO error: {0}")]
    IoError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to turn free text into a character specification
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("could not parse character details: {0}")]
    Unparseable(String),

    #[error("extractor service error: {0}")]
    Service(#[from] McpError),
}

/// Failure to persist a character artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("character \"{0}\" already exists")]
    AlreadyExists(String),

    #[error("invalid character name: {0:?}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode artifact: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure to submit a deployment to the backend
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("deployment API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("deployment rejected: {0}")]
    Rejected(String),
}

/// Failure of a single readiness probe. Always treated as transient.
#[derive(Debug, Error)]
pub enum HealthCheckError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("health check failed: {0}")]
    Unavailable(String),
}

/// Discriminant of a [`WorkflowError`], for callers that branch on the failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotTriggered,
    ExtractionFailed,
    ArtifactCreationFailed,
    DeploymentSubmitFailed,
    DeploymentTimeout,
    Cancelled,
    UnexpectedFailure,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotTriggered => "NotTriggered",
            Self::ExtractionFailed => "ExtractionFailed",
            Self::ArtifactCreationFailed => "ArtifactCreationFailed",
            Self::DeploymentSubmitFailed => "DeploymentSubmitFailed",
            Self::DeploymentTimeout => "DeploymentTimeout",
            Self::Cancelled => "Cancelled",
            Self::UnexpectedFailure => "UnexpectedFailure",
        };
        f.write_str(name)
    }
}

/// Errors raised by the deployment workflow itself.
///
/// Collaborator errors are kept as the `source` so the original message
/// survives in the display string and in the error chain.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Request is not a character deployment request")]
    NotTriggered,

    #[error("Failed to extract character details: {0}")]
    Extraction(#[source] ExtractionError),

    #[error("Failed to create character file: {0}")]
    ArtifactCreation(#[source] ArtifactError),

    #[error("Deployment failed: {0}")]
    DeploymentSubmit(#[source] SubmitError),

    #[error("Deployment timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("Deployment cancelled")]
    Cancelled,

    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotTriggered => ErrorKind::NotTriggered,
            Self::Extraction(_) => ErrorKind::ExtractionFailed,
            Self::ArtifactCreation(_) => ErrorKind::ArtifactCreationFailed,
            Self::DeploymentSubmit(_) => ErrorKind::DeploymentSubmitFailed,
            Self::Timeout { .. } => ErrorKind::DeploymentTimeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Unexpected(_) => ErrorKind::UnexpectedFailure,
        }
    }

    /// Create an unexpected-failure error from a string
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for MCP operations
pub type McpResult<T> = std::result::Result<T, McpError>;

/// Result type alias for workflow stages
pub type StageResult<T> = std::result::Result<T, WorkflowError>;
