//! The character deployment workflow.
//!
//! Drives one request through extract → create artifact → submit →
//! poll for readiness, reporting progress to a [`ProgressSink`] and always
//! ending in exactly one [`WorkflowResult`].

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, DeploymentConfig};
use crate::domain::{
    self, DeploymentAttempt, DeploymentRequest, DeploymentStatus, ProgressEvent, ProgressSink,
    WorkflowResult, ACTION_NAME,
};
use crate::error::{AppError, StageResult, WorkflowError};
use crate::retry::{retry_until, RetryOutcome, RetryPolicy};
use crate::services::{
    ArtifactStore, DeploymentBackend, Extractor, FileArtifactStore, HttpDeploymentBackend,
    McpExtractor,
};

/// Alternative action names the hosting layer may route here
pub const SIMILES: [&str; 5] = [
    "DEPLOY_NEW_CHARACTER",
    "CREATE_AND_DEPLOY_CHARACTER",
    "SPAWN_CHARACTER",
    "LAUNCH_CHARACTER",
    "CREATE_CHARACTER",
];

/// Orchestrates one character deployment per invocation.
///
/// Holds no per-run state, so a single instance can serve concurrent runs.
pub struct DeployCharacterWorkflow {
    extractor: Arc<dyn Extractor>,
    artifacts: Arc<dyn ArtifactStore>,
    backend: Arc<dyn DeploymentBackend>,
    policy: RetryPolicy,
    deployment: DeploymentConfig,
}

impl DeployCharacterWorkflow {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        artifacts: Arc<dyn ArtifactStore>,
        backend: Arc<dyn DeploymentBackend>,
        policy: RetryPolicy,
        deployment: DeploymentConfig,
    ) -> Self {
        Self {
            extractor,
            artifacts,
            backend,
            policy,
            deployment,
        }
    }

    /// Wire the MCP extractor, file store and HTTP backend from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let backend = HttpDeploymentBackend::new(&config.deployment)?;
        Ok(Self::new(
            Arc::new(McpExtractor::new(&config.extractor)),
            Arc::new(FileArtifactStore::new(config.artifacts.directory.clone())),
            Arc::new(backend),
            config.poll.retry_policy(),
            config.deployment.clone(),
        ))
    }

    /// Whether `action` names this workflow or one of its similes
    pub fn handles_action(action: &str) -> bool {
        action == ACTION_NAME || SIMILES.contains(&action)
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Trigger classifier: does `text` ask for a character deployment?
    pub fn accepts(&self, text: &str) -> bool {
        domain::accepts(text)
    }

    /// Run without external cancellation
    pub async fn handle(&self, text: &str, sink: &ProgressSink) -> WorkflowResult {
        self.run(text, sink, &CancellationToken::new()).await
    }

    /// Run the whole pipeline. Never fails: every error, including a
    /// collaborator panic, is folded into a failed [`WorkflowResult`].
    pub async fn run(
        &self,
        text: &str,
        sink: &ProgressSink,
        cancel: &CancellationToken,
    ) -> WorkflowResult {
        if !self.accepts(text) {
            tracing::warn!("Message is not a character deployment request");
            return WorkflowResult::failed(None, None, &WorkflowError::NotTriggered);
        }

        let request = DeploymentRequest::new(text);
        let mut deployment: Option<DeploymentAttempt> = None;

        let outcome = AssertUnwindSafe(self.execute(&request, sink, cancel, &mut deployment))
            .catch_unwind()
            .await;

        let error = match outcome {
            Ok(Ok(result)) => return result,
            Ok(Err(error)) => error,
            Err(panic) => WorkflowError::unexpected(panic_message(&*panic)),
        };

        let name = deployment
            .as_ref()
            .map(|d| d.spec().name.as_str())
            .unwrap_or_default();
        tracing::error!(
            character = %name,
            kind = %error.kind(),
            "Deployment failed for {}: {}",
            name,
            error
        );

        match deployment.as_mut() {
            Some(deployment) => {
                deployment.fail();
                WorkflowResult::failed(
                    Some(deployment.spec()),
                    Some(deployment.deployment_link()),
                    &error,
                )
            }
            None => WorkflowResult::failed(None, None, &error),
        }
    }

    async fn execute(
        &self,
        request: &DeploymentRequest,
        sink: &ProgressSink,
        cancel: &CancellationToken,
        slot: &mut Option<DeploymentAttempt>,
    ) -> StageResult<WorkflowResult> {
        tracing::info!("Starting character deployment process");

        let spec = cancellable(cancel, self.extractor.extract(request.raw_text()))
            .await?
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to extract character details");
                WorkflowError::Extraction(e)
            })?;
        tracing::info!(
            "Extracted character info - Name: {}, Description length: {}",
            spec.name,
            spec.description.len()
        );

        let link = self.deployment.deployment_link(&spec.name);
        let deployment = slot.insert(DeploymentAttempt::new(
            spec,
            link,
            self.policy.max_attempts,
        ));
        let name = deployment.spec().name.clone();

        sink.emit(ProgressEvent::pending(&name));

        tracing::info!("Starting character file creation for {}", name);
        cancellable(
            cancel,
            self.artifacts.create(&name, &deployment.spec().description),
        )
        .await?
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create character file");
            WorkflowError::ArtifactCreation(e)
        })?;
        deployment.advance(DeploymentStatus::FileCreated)?;
        sink.emit(ProgressEvent::file_created(&name));

        tracing::info!("Submitting deployment for {}", name);
        cancellable(cancel, self.backend.submit(&name))
            .await?
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to submit deployment");
                WorkflowError::DeploymentSubmit(e)
            })?;
        deployment.advance(DeploymentStatus::Deploying)?;
        sink.emit(ProgressEvent::deploying(&name));

        self.await_ready(deployment, sink, cancel).await?;

        tracing::info!("Deployment successful for {}", name);
        Ok(WorkflowResult::completed(
            deployment.spec(),
            deployment.deployment_link(),
        ))
    }

    /// Poll the deployment link until it answers ready or the budget runs out
    async fn await_ready(
        &self,
        deployment: &mut DeploymentAttempt,
        sink: &ProgressSink,
        cancel: &CancellationToken,
    ) -> StageResult<()> {
        let link = deployment.deployment_link().to_string();
        let name = deployment.spec().name.clone();
        let max_attempts = self.policy.max_attempts;
        let backend = &self.backend;
        let mut wait_error: Option<WorkflowError> = None;

        tracing::info!(
            "Starting deployment status checks for {} at {}",
            name,
            link
        );

        let outcome = retry_until(
            &self.policy,
            cancel,
            |attempt| {
                let link = link.as_str();
                async move {
                    tracing::debug!(
                        "Checking deployment status (attempt {}/{})",
                        attempt,
                        max_attempts
                    );
                    match backend.health_check(link).await {
                        Ok(true) => Some(()),
                        Ok(false) => None,
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                "Deployment check attempt {} failed",
                                attempt
                            );
                            None
                        }
                    }
                }
            },
            |attempt| {
                if let Err(e) = deployment.record_wait(attempt) {
                    wait_error.get_or_insert(e);
                }
                sink.emit(ProgressEvent::waiting(&name, attempt, max_attempts));
            },
        )
        .await;

        if let Some(e) = wait_error {
            return Err(e);
        }

        match outcome {
            RetryOutcome::Ready { attempts, .. } => {
                tracing::debug!(attempts, "Deployment reported ready");
                deployment.complete()
            }
            RetryOutcome::Exhausted { attempts } => {
                tracing::error!(
                    "Deployment timed out for {} after {} attempts",
                    name,
                    attempts
                );
                Err(WorkflowError::Timeout { attempts })
            }
            RetryOutcome::Cancelled { attempts } => {
                tracing::warn!(attempts, "Deployment polling cancelled");
                Err(WorkflowError::Cancelled)
            }
        }
    }
}

/// Race a collaborator call against cancellation
async fn cancellable<F>(cancel: &CancellationToken, call: F) -> StageResult<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WorkflowError::Cancelled),
        output = call => Ok(output),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("collaborator panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("collaborator panicked: {}", msg)
    } else {
        "collaborator panicked".to_string()
    }
}
