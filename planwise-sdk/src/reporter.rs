use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::error::PlannerError;

/// Payload posted to the client-error collector
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Name of the operation that failed (e.g., "send_message")
    pub context: String,
    /// Client-side epoch milliseconds
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl ErrorReport {
    /// Build a report for a classified error.
    pub fn for_error(error: &PlannerError, operation: &str) -> Self {
        Self {
            message: error.to_string(),
            stack: None,
            context: operation.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            url: None,
            user_agent: None,
        }
    }
}

/// Fire-and-forget sink for classified errors.
///
/// Reporting must never affect classification or retry: implementations
/// swallow their own failures.
pub trait ErrorSink: Send + Sync {
    fn report(&self, report: ErrorReport);
}

/// Sink that drops every report. Useful for tests and for callers that have
/// no collector configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopErrorSink;

impl ErrorSink for NoopErrorSink {
    fn report(&self, _report: ErrorReport) {}
}

/// Sink that POSTs each report to the collector endpoint from a spawned
/// task. Delivery failures are logged at debug level and otherwise ignored.
pub struct HttpErrorSink {
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpErrorSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http_client: reqwest::Client::new(),
        }
    }
}

impl ErrorSink for HttpErrorSink {
    fn report(&self, report: ErrorReport) {
        let client = self.http_client.clone();
        let endpoint = self.endpoint.clone();

        tokio::spawn(async move {
            let result = client.post(&endpoint).json(&report).send().await;
            if let Err(e) = result {
                tracing::debug!(error = %e, context = %report.context, "error report dropped");
            }
        });
    }
}

/// Classify-and-report helper: forwards the error to the sink and hands it
/// back unchanged so call sites stay a single expression.
pub fn report_error<'a>(
    sink: &Arc<dyn ErrorSink>,
    error: &'a PlannerError,
    operation: &str,
) -> &'a PlannerError {
    sink.report(ErrorReport::for_error(error, operation));
    error
}
