//! Scripted collaborators for workflow tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use deploy_character::config::DeploymentConfig;
use deploy_character::domain::{CharacterSpec, DeploymentStatus, ProgressEvent};
use deploy_character::error::{ArtifactError, ExtractionError, HealthCheckError, SubmitError};
use deploy_character::retry::RetryPolicy;
use deploy_character::services::{ArtifactStore, DeploymentBackend, Extractor};
use deploy_character::DeployCharacterWorkflow;
use tokio::sync::mpsc::UnboundedReceiver;

pub const SAGE_REQUEST: &str = "Please create and deploy a wise professor character named Sage";
pub const SAGE_LINK: &str = "https://mydomain.com/Sage";

pub struct ScriptedExtractor {
    reply: Result<CharacterSpec, String>,
    pub calls: AtomicUsize,
}

impl ScriptedExtractor {
    pub fn returning(name: &str, description: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(CharacterSpec::new(name, description)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn sage() -> Arc<Self> {
        Self::returning("Sage", "a wise professor")
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, _text: &str) -> Result<CharacterSpec, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .map_err(ExtractionError::Unparseable)
    }
}

#[derive(Default)]
pub struct RecordingStore {
    fail_with: Option<String>,
    pub created: Mutex<Vec<(String, String)>>,
}

impl RecordingStore {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(message.to_string()),
            created: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

#[async_trait]
impl ArtifactStore for RecordingStore {
    async fn create(&self, name: &str, description: &str) -> Result<(), ArtifactError> {
        self.created
            .lock()
            .unwrap()
            .push((name.to_string(), description.to_string()));
        match &self.fail_with {
            Some(message) => Err(ArtifactError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                message.clone(),
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Health {
    Ready,
    NotReady,
    Error,
}

/// Backend whose health checks follow a script; once the script runs out
/// every check reports not ready.
#[derive(Default)]
pub struct ScriptedBackend {
    submit_error: Option<String>,
    panic_on_submit: bool,
    script: Mutex<VecDeque<Health>>,
    pub submits: AtomicUsize,
    pub checked_urls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn with_health(script: &[Health]) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.iter().copied().collect()),
            ..Default::default()
        })
    }

    pub fn ready_on(attempt: usize) -> Arc<Self> {
        let mut script = vec![Health::NotReady; attempt - 1];
        script.push(Health::Ready);
        Self::with_health(&script)
    }

    pub fn never_ready() -> Arc<Self> {
        Self::with_health(&[])
    }

    pub fn rejecting_submit(message: &str) -> Arc<Self> {
        Arc::new(Self {
            submit_error: Some(message.to_string()),
            ..Default::default()
        })
    }

    pub fn panicking_submit() -> Arc<Self> {
        Arc::new(Self {
            panic_on_submit: true,
            ..Default::default()
        })
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn health_checks(&self) -> usize {
        self.checked_urls.lock().unwrap().len()
    }
}

#[async_trait]
impl DeploymentBackend for ScriptedBackend {
    async fn submit(&self, name: &str) -> Result<(), SubmitError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_submit {
            panic!("backend exploded while submitting {}", name);
        }
        match &self.submit_error {
            Some(message) => Err(SubmitError::Rejected(message.clone())),
            None => Ok(()),
        }
    }

    async fn health_check(&self, url: &str) -> Result<bool, HealthCheckError> {
        self.checked_urls.lock().unwrap().push(url.to_string());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Health::NotReady);
        match next {
            Health::Ready => Ok(true),
            Health::NotReady => Ok(false),
            Health::Error => Err(HealthCheckError::Unavailable("connection reset".to_string())),
        }
    }
}

pub fn workflow(
    extractor: Arc<ScriptedExtractor>,
    store: Arc<RecordingStore>,
    backend: Arc<ScriptedBackend>,
) -> DeployCharacterWorkflow {
    DeployCharacterWorkflow::new(
        extractor,
        store,
        backend,
        RetryPolicy::default(),
        DeploymentConfig::default(),
    )
}

/// Everything currently queued on the receiver
pub fn drain(rx: &mut UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn statuses(events: &[ProgressEvent]) -> Vec<DeploymentStatus> {
    events.iter().map(|e| e.status).collect()
}

/// Statuses never move backwards and only `waiting` repeats
pub fn assert_monotonic(statuses: &[DeploymentStatus]) {
    let order = [
        DeploymentStatus::Pending,
        DeploymentStatus::FileCreated,
        DeploymentStatus::Deploying,
        DeploymentStatus::Waiting,
        DeploymentStatus::Completed,
    ];
    let rank = |s: &DeploymentStatus| order.iter().position(|o| o == s).expect("forward status");
    for pair in statuses.windows(2) {
        let (a, b) = (rank(&pair[0]), rank(&pair[1]));
        assert!(
            b > a || (a == b && pair[0] == DeploymentStatus::Waiting),
            "status went {:?} -> {:?}",
            pair[0],
            pair[1]
        );
    }
}
