//! deploy-character: natural-language character deployment workflow
//!
//! This crate turns a request such as "deploy a wise professor character
//! named Sage" into a running, health-checked deployment, streaming
//! progress events along the way.

pub mod config;
pub mod domain;
pub mod error;
pub mod retry;
pub mod services;
pub mod workflow;

pub use config::AppConfig;
pub use domain::{ProgressEvent, ProgressSink, WorkflowResult};
pub use error::{AppError, ErrorKind, Result, WorkflowError};
pub use workflow::DeployCharacterWorkflow;
