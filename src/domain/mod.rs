//! Domain entities for deploy-character.
//!
//! This module contains the per-invocation entities:
//! - DeploymentRequest: The inbound trigger text and its classifier
//! - CharacterSpec: Name and description extracted from the request
//! - DeploymentAttempt: The status machine driven by the workflow
//! - ProgressEvent / ProgressSink: Incremental status reporting
//! - WorkflowResult: The terminal outcome

mod character;
mod deployment;
mod progress;
mod request;
mod result;

pub use character::CharacterSpec;
pub use deployment::{DeploymentAttempt, DeploymentStatus};
pub use progress::{ProgressEvent, ProgressSink};
pub use request::{accepts, DeploymentRequest};
pub use result::{ResultContent, WorkflowResult, ACTION_NAME};
