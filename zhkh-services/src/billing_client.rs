/// Client for the billing service
///
/// The payment service marks bills paid through `PUT /api/billings/paid`.
/// There is no retry: a transport failure and a refusal are reported to the
/// caller, which decides what the payment becomes.

use serde_json::json;
use tracing::{debug, warn};

/// Error calling the billing service
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The service could not be reached (connect error, timeout)
    #[error("billing service unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("billing service rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Thin billing service client
#[derive(Debug, Clone)]
pub struct BillingClient {
    http: reqwest::Client,
    base_url: String,
}

impl BillingClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Marks bills as paid
    pub async fn mark_paid(&self, billing_ids: &[i64]) -> Result<(), UpstreamError> {
        let url = format!("{}/api/billings/paid", self.base_url);
        debug!(url = %url, ?billing_ids, "Marking bills paid");

        let response = self
            .http
            .put(&url)
            .json(&json!({ "billing_ids": billing_ids }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "Billing service refused update");

        Err(UpstreamError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
