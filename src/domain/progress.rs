//! Progress events and the sink that carries them to the caller.

use super::DeploymentStatus;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A human-readable status update emitted at a stage transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub text: String,
    pub status: DeploymentStatus,
    pub character_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl ProgressEvent {
    pub fn pending(name: &str) -> Self {
        Self::stage(
            DeploymentStatus::Pending,
            name,
            format!("Starting deployment for character \"{}\"...", name),
        )
    }

    pub fn file_created(name: &str) -> Self {
        Self::stage(
            DeploymentStatus::FileCreated,
            name,
            format!("Character file created for {}. Starting deployment...", name),
        )
    }

    pub fn deploying(name: &str) -> Self {
        Self::stage(
            DeploymentStatus::Deploying,
            name,
            format!("Deployment in progress for {}...", name),
        )
    }

    pub fn waiting(name: &str, attempt: u32, max_attempts: u32) -> Self {
        Self {
            text: format!(
                "Still waiting for deployment to be ready... (attempt {}/{})",
                attempt, max_attempts
            ),
            status: DeploymentStatus::Waiting,
            character_name: name.to_string(),
            attempt: Some(attempt),
            max_attempts: Some(max_attempts),
        }
    }

    fn stage(status: DeploymentStatus, name: &str, text: String) -> Self {
        Self {
            text,
            status,
            character_name: name.to_string(),
            attempt: None,
            max_attempts: None,
        }
    }
}

/// Write-only, ordered channel of [`ProgressEvent`]s.
///
/// A sink without a receiver, or whose receiver was dropped, swallows
/// events; emitting never fails and never blocks.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    /// A sink that discards every event
    pub fn none() -> Self {
        Self { tx: None }
    }

    /// Create a connected sink and the receiver the caller reads from
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn is_connected(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub fn emit(&self, event: ProgressEvent) {
        tracing::info!(
            status = %event.status,
            character = %event.character_name,
            "{}",
            event.text
        );
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                tracing::debug!("Progress receiver dropped; discarding event");
            }
        }
    }
}
