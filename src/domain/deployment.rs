//! Deployment attempt entity and its status machine.

use super::CharacterSpec;
use crate::error::WorkflowError;
use serde::{Deserialize, Serialize};

/// Stage a deployment has reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Pending,
    FileCreated,
    Deploying,
    Waiting,
    Completed,
    Failed,
}

impl DeploymentStatus {
    /// Position in the forward order. `Failed` sits outside it.
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::FileCreated => Some(1),
            Self::Deploying => Some(2),
            Self::Waiting => Some(3),
            Self::Completed => Some(4),
            Self::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether moving from `self` to `next` keeps the status order monotonic
    pub fn can_advance_to(&self, next: DeploymentStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(current), Some(target)) => match next {
                Self::Waiting => current == 2 || current == 3,
                Self::Completed => current >= 2,
                _ => target == current + 1,
            },
            (None, Some(_)) => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::FileCreated => "file_created",
            Self::Deploying => "deploying",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One run of the pipeline for one character.
///
/// Only the orchestrator mutates it, and only forward.
#[derive(Debug, Clone)]
pub struct DeploymentAttempt {
    spec: CharacterSpec,
    deployment_link: String,
    attempt: u32,
    max_attempts: u32,
    status: DeploymentStatus,
}

impl DeploymentAttempt {
    pub fn new(spec: CharacterSpec, deployment_link: String, max_attempts: u32) -> Self {
        Self {
            spec,
            deployment_link,
            attempt: 0,
            max_attempts,
            status: DeploymentStatus::Pending,
        }
    }

    pub fn spec(&self) -> &CharacterSpec {
        &self.spec
    }

    pub fn deployment_link(&self) -> &str {
        &self.deployment_link
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn status(&self) -> DeploymentStatus {
        self.status
    }

    /// Move to `next`, rejecting any backwards or skipping transition
    pub fn advance(&mut self, next: DeploymentStatus) -> Result<(), WorkflowError> {
        if !self.status.can_advance_to(next) {
            return Err(WorkflowError::unexpected(format!(
                "invalid status transition {} -> {} for {}",
                self.status, next, self.spec.name
            )));
        }
        self.status = next;
        Ok(())
    }

    /// Record a missed readiness check
    pub fn record_wait(&mut self, attempt: u32) -> Result<(), WorkflowError> {
        if attempt == 0 || attempt > self.max_attempts || attempt <= self.attempt {
            return Err(WorkflowError::unexpected(format!(
                "attempt {} out of order (last {}, max {})",
                attempt, self.attempt, self.max_attempts
            )));
        }
        self.advance(DeploymentStatus::Waiting)?;
        self.attempt = attempt;
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), WorkflowError> {
        self.advance(DeploymentStatus::Completed)
    }

    pub fn fail(&mut self) {
        if !self.status.is_terminal() {
            self.status = DeploymentStatus::Failed;
        }
    }
}
