//! Collaborators of the deployment workflow.
//!
//! This module contains the three seams the workflow calls through, plus
//! one real adapter for each:
//! - Extractor / McpExtractor: Text understanding over an MCP server
//! - ArtifactStore / FileArtifactStore: Character files on disk
//! - DeploymentBackend / HttpDeploymentBackend: Provisioning REST API

mod artifact;
mod backend;
mod extractor;
pub mod mcp;

pub use artifact::{CharacterFile, FileArtifactStore};
pub use backend::HttpDeploymentBackend;
pub use extractor::{parse_tool_result, McpExtractor};
pub use mcp::McpClient;

use crate::domain::CharacterSpec;
use crate::error::{ArtifactError, ExtractionError, HealthCheckError, SubmitError};
use async_trait::async_trait;

/// Turns free text into a character specification
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<CharacterSpec, ExtractionError>;
}

/// Persists the configuration artifact for a character
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn create(&self, name: &str, description: &str) -> Result<(), ArtifactError>;
}

/// Provisions characters and reports whether they are serving
#[async_trait]
pub trait DeploymentBackend: Send + Sync {
    async fn submit(&self, name: &str) -> Result<(), SubmitError>;

    /// `Ok(false)` and `Err(_)` both mean "not ready yet" to the workflow.
    async fn health_check(&self, url: &str) -> Result<bool, HealthCheckError>;
}
