//! Configuration management for deploy-character.
//!
//! Supports layered configuration: defaults → project → user → env

use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project-level config file name, looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = ".deploy-character.toml";

/// Prefix for environment overrides (`DEPLOY_CHARACTER__POLL__MAX_ATTEMPTS`)
const ENV_PREFIX: &str = "DEPLOY_CHARACTER";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub deployment: DeploymentConfig,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

impl AppConfig {
    /// Load configuration with hierarchy: defaults → project → user → env
    ///
    /// An explicit `config_file` replaces the project file and must exist.
    pub fn load(
        project_root: Option<&Path>,
        config_file: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        use config::{Config, Environment, File};

        let mut builder = Config::builder();

        // 1. Start with defaults
        builder = builder.add_source(
            config::File::from_str(
                include_str!("../default_config.toml"),
                config::FileFormat::Toml,
            )
            .required(false),
        );

        // 2. Project-specific config, or the file given on the command line
        match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                builder = builder.add_source(File::from(path.to_path_buf()).required(true));
            }
            None => {
                if let Some(root) = project_root {
                    let project_config = root.join(PROJECT_CONFIG_FILE);
                    if project_config.exists() {
                        builder = builder.add_source(File::from(project_config).required(false));
                    }
                }
            }
        }

        // 3. User config (~/.config/deploy-character/config.toml)
        if let Some(config_dir) =
            directories::ProjectDirs::from("com", "deploy-character", "deploy-character")
        {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        // 4. Environment variables (DEPLOY_CHARACTER__*)
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject values the workflow cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "poll.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.deployment.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "deployment.api_url must not be empty".to_string(),
            ));
        }
        if self.deployment.public_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "deployment.public_base_url must not be empty".to_string(),
            ));
        }
        if self.extractor.command.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "extractor.command must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Readiness polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Health checks performed before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed delay between health checks in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl PollConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

fn default_max_attempts() -> u32 {
    10
}

fn default_retry_delay_ms() -> u64 {
    5000
}

/// Deployment backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Base URL of the provisioning API
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Base URL under which deployed characters are served
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Bearer token for the provisioning API
    #[serde(default)]
    pub api_token: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            public_base_url: default_public_base_url(),
            api_token: None,
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl DeploymentConfig {
    /// Public link for a deployed character
    pub fn deployment_link(&self, character_name: &str) -> String {
        format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            character_name
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn default_api_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_public_base_url() -> String {
    "https://mydomain.com".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    10
}

/// Character artifact storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Directory where character files are written
    #[serde(default = "default_artifact_directory")]
    pub directory: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            directory: default_artifact_directory(),
        }
    }
}

fn default_artifact_directory() -> PathBuf {
    PathBuf::from("characters")
}

/// Extraction service (MCP server) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Command that starts the MCP server
    #[serde(default = "default_extractor_command")]
    pub command: String,
    /// Arguments for the MCP server
    #[serde(default = "default_extractor_args")]
    pub args: Vec<String>,
    /// Tool invoked to extract character details
    #[serde(default = "default_extractor_tool")]
    pub tool: String,
    /// Request timeout in seconds
    #[serde(default = "default_extractor_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            command: default_extractor_command(),
            args: default_extractor_args(),
            tool: default_extractor_tool(),
            timeout_seconds: default_extractor_timeout_seconds(),
        }
    }
}

fn default_extractor_command() -> String {
    "claude".to_string()
}

fn default_extractor_args() -> Vec<String> {
    vec!["--mcp".to_string()]
}

fn default_extractor_tool() -> String {
    "extract_character".to_string()
}

fn default_extractor_timeout_seconds() -> u64 {
    60
}
