//! Interfaces to the registry, run and explain services.
//!
//! The core only builds request payloads and reads response shapes; how
//! blocks run is up to the service.

pub mod http;

pub use http::{ClientConfig, HttpPipelineService};

use crate::error::ServiceError;
use crate::registry::BlockRecord;
use crate::spec::PipelineSpec;
use crate::trace::ExplainResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The remote collaborators of a pipeline editor.
///
/// Each call is one request and one response: no retries, no cancellation.
#[async_trait]
pub trait PipelineService: Send + Sync {
    /// `GET /blocks`
    async fn list_blocks(&self) -> Result<Vec<BlockRecord>, ServiceError>;

    /// `POST /runs` with `{ "spec": ... }`
    async fn create_run(&self, spec: &PipelineSpec) -> Result<RunCreateResponse, ServiceError>;

    /// `POST /explain` with `{ "spec": ... }`
    async fn explain(&self, spec: &PipelineSpec) -> Result<ExplainResponse, ServiceError>;

    /// `GET /runs`
    async fn list_runs(&self) -> Result<Vec<RunListItem>, ServiceError>;
}

/// Request body shared by run submission and explain.
#[derive(Debug, Serialize)]
pub struct SpecEnvelope<'a> {
    pub spec: &'a PipelineSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCreateResponse {
    pub run_id: String,
    pub status: String,
    #[serde(default)]
    pub metrics: Option<Map<String, Value>>,
}

/// A row of the run history. Timestamps are kept as the service sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunListItem {
    pub run_id: String,
    pub status: String,
    pub created_at: String,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub metrics: Map<String, Value>,
}

/// Extracts the best message from an error response body: `detail.error`,
/// then `detail.message`, then a plain string `detail`, else `HTTP <status>`.
pub fn error_message(status: u16, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let detail = parsed.as_ref().and_then(|v| v.get("detail"));
    detail
        .and_then(|d| {
            d.get("error")
                .and_then(Value::as_str)
                .or_else(|| d.get("message").and_then(Value::as_str))
                .or_else(|| d.as_str())
        })
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_prefers_detail_error_then_message() {
        let body = r#"{"detail": {"message": "Invalid lockedBlocks", "error": "Unknown blockId"}}"#;
        assert_eq!(error_message(400, body), "Unknown blockId");

        let body = r#"{"detail": {"message": "Explain failed"}}"#;
        assert_eq!(error_message(400, body), "Explain failed");

        let body = r#"{"detail": "Run not found"}"#;
        assert_eq!(error_message(404, body), "Run not found");
    }

    #[test]
    fn error_falls_back_to_status_label() {
        assert_eq!(error_message(502, "<html>Bad gateway</html>"), "HTTP 502");
        assert_eq!(error_message(500, r#"{"detail": {"code": 7}}"#), "HTTP 500");
        assert_eq!(error_message(503, ""), "HTTP 503");
    }
}
