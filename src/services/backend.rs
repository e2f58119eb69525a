//! REST client for the deployment provisioning API.
//!
//! Submission is a `POST {api_url}/deploy`; readiness is a plain `GET`
//! against the public link, where any 2xx status counts as ready.

use super::DeploymentBackend;
use crate::config::DeploymentConfig;
use crate::error::{HealthCheckError, SubmitError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Body of a deployment submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub name: String,
}

/// HTTP client for a single provisioning API
pub struct HttpDeploymentBackend {
    client: reqwest::Client,
    api_url: String,
    api_token: Option<String>,
}

impl HttpDeploymentBackend {
    /// Build a client with the per-request timeout from `config`
    pub fn new(config: &DeploymentConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling)
    pub fn with_client(client: reqwest::Client, config: &DeploymentConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl DeploymentBackend for HttpDeploymentBackend {
    async fn submit(&self, name: &str) -> Result<(), SubmitError> {
        let body = SubmitRequest {
            name: name.to_string(),
        };

        let response = self
            .authorize(self.client.post(format!("{}/deploy", self.api_url)))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SubmitError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn health_check(&self, url: &str) -> Result<bool, HealthCheckError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        tracing::debug!(url, status = status.as_u16(), "Health check response");
        Ok(status.is_success())
    }
}
