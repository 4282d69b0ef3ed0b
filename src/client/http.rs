use super::{PipelineService, RunCreateResponse, RunListItem, SpecEnvelope, error_message};
use crate::error::ServiceError;
use crate::registry::BlockRecord;
use crate::spec::PipelineSpec;
use crate::trace::ExplainResponse;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
pub const API_BASE_ENV: &str = "BLOCKFLOW_API_BASE";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    /// No timeout unless set.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    /// Reads the base URL from `BLOCKFLOW_API_BASE`, falling back to the
    /// local default.
    pub fn from_env() -> Self {
        match std::env::var(API_BASE_ENV) {
            Ok(base) if !base.trim().is_empty() => Self::new(base.trim()),
            _ => Self::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

/// [`PipelineService`] over HTTP/JSON.
pub struct HttpPipelineService {
    client: Client,
    base_url: String,
}

impl HttpPipelineService {
    pub fn new(config: ClientConfig) -> Result<Self, ServiceError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ServiceError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| ServiceError::Decode(e.to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ServiceError::Api {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &body),
            })
        }
    }
}

#[async_trait]
impl PipelineService for HttpPipelineService {
    async fn list_blocks(&self) -> Result<Vec<BlockRecord>, ServiceError> {
        self.get("/blocks").await
    }

    async fn create_run(&self, spec: &PipelineSpec) -> Result<RunCreateResponse, ServiceError> {
        let response: RunCreateResponse = self.post("/runs", &SpecEnvelope { spec }).await?;
        info!(run_id = %response.run_id, status = %response.status, "Run submitted");
        Ok(response)
    }

    async fn explain(&self, spec: &PipelineSpec) -> Result<ExplainResponse, ServiceError> {
        let response: ExplainResponse = self.post("/explain", &SpecEnvelope { spec }).await?;
        info!(steps = response.steps.len(), "Trace received");
        Ok(response)
    }

    async fn list_runs(&self) -> Result<Vec<RunListItem>, ServiceError> {
        self.get("/runs").await
    }
}
