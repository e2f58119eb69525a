//! The single terminal value produced by a workflow invocation.

use super::{CharacterSpec, DeploymentStatus};
use crate::error::{ErrorKind, WorkflowError};
use serde::{Deserialize, Serialize};

/// Action name reported back to the hosting message layer
pub const ACTION_NAME: &str = "DEPLOY_CHARACTER";

/// Outcome of one deployment workflow run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub message: String,
    pub success: bool,
    pub action: String,
    pub content: ResultContent,
}

/// Structured payload of a [`WorkflowResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultContent {
    pub character_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub status: DeploymentStatus,
}

impl WorkflowResult {
    pub fn completed(spec: &CharacterSpec, deployment_link: &str) -> Self {
        Self {
            message: format!("{} is now running at {}", spec.name, deployment_link),
            success: true,
            action: ACTION_NAME.to_string(),
            content: ResultContent {
                character_name: spec.name.clone(),
                deployment_link: Some(deployment_link.to_string()),
                description: Some(spec.description.clone()),
                error: None,
                error_kind: None,
                status: DeploymentStatus::Completed,
            },
        }
    }

    /// Build the failure result. `spec` is `None` when extraction never finished.
    pub fn failed(
        spec: Option<&CharacterSpec>,
        deployment_link: Option<&str>,
        error: &WorkflowError,
    ) -> Self {
        let character_name = spec.map(|s| s.name.clone()).unwrap_or_default();
        Self {
            message: format!(
                "Failed to deploy character \"{}\": {}",
                character_name, error
            ),
            success: false,
            action: ACTION_NAME.to_string(),
            content: ResultContent {
                character_name,
                deployment_link: deployment_link.map(str::to_string),
                description: spec.map(|s| s.description.clone()),
                error: Some(error.to_string()),
                error_kind: Some(error.kind()),
                status: DeploymentStatus::Failed,
            },
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.content.error_kind
    }
}
