//! reqwest-backed [`ApprovalApi`] implementation.
//!
//! Read endpoints retry transient failures (transport errors and 5xx)
//! with a short linear backoff. The submit endpoint is never retried:
//! the backend offers no idempotency key, and a duplicate approval is
//! worse than a surfaced failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

use greenlight_core::config::ClientConfig;
use greenlight_core::domain::action::RawWorkflowAction;
use greenlight_core::domain::item::{DetailRecord, ItemKey, Moid, PendingItem};
use greenlight_core::domain::remarks::RemarksEntry;
use greenlight_core::payload::ApprovalPayload;

use crate::envelope;
use crate::{ApiError, ApprovalApi};

const RETRY_BACKOFF_MS: u64 = 200;

pub struct HttpApprovalApi {
    client: Client,
    base_url: String,
    module: String,
    max_attempts: u32,
}

impl HttpApprovalApi {
    pub fn new(config: &ClientConfig, module: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| ApiError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            module: module.into(),
            max_attempts: config.max_attempts.max(1),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{base}/api/v1/{path}", base = self.base_url)
    }

    /// Issues a GET with bounded retries, returning the decoded JSON
    /// body of the first non-5xx response.
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let mut last_error = ApiError::Transport("no attempt made".to_string());

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let backoff = Duration::from_millis(RETRY_BACKOFF_MS * u64::from(attempt - 1));
                debug!(url, attempt, backoff_ms = backoff.as_millis() as u64, "retrying request");
                tokio::time::sleep(backoff).await;
            }

            let result = self.client.get(url).query(query).send().await;
            match result {
                Ok(response) if response.status().is_server_error() => {
                    let status = response.status();
                    last_error = Self::status_error(response).await;
                    warn!(url, status = status.as_u16(), attempt, "server error, will retry");
                }
                Ok(response) if !response.status().is_success() => {
                    return Err(Self::status_error(response).await);
                }
                Ok(response) => {
                    return response
                        .json::<Value>()
                        .await
                        .map_err(|error| ApiError::Decode(error.to_string()));
                }
                Err(error) => {
                    last_error = Self::transport_error(error);
                    warn!(url, attempt, error = %last_error, "transport failure, will retry");
                }
            }
        }

        Err(last_error)
    }

    async fn status_error(response: Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ApiError::Http { status: status.as_u16(), message: envelope::error_message(&body) }
    }

    fn transport_error(error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl ApprovalApi for HttpApprovalApi {
    async fn pending_items(
        &self,
        role_id: &str,
        user_id: &str,
    ) -> Result<Vec<PendingItem>, ApiError> {
        let url = self.url(&format!("{}/pending", self.module));
        let query = [("role_id", role_id.to_string()), ("user_id", user_id.to_string())];
        let body = self.get_json(&url, &query).await?;

        envelope::rows(&body)?.iter().map(envelope::pending_item).collect()
    }

    async fn detail_record(&self, key: &ItemKey) -> Result<DetailRecord, ApiError> {
        let url = self.url(&format!("{}/items/{key}", self.module));
        let body = self.get_json(&url, &[]).await?;

        envelope::detail_record(&body, key)
    }

    async fn workflow_actions(
        &self,
        moid: &Moid,
        role_id: &str,
        check_amount: Decimal,
    ) -> Result<Vec<RawWorkflowAction>, ApiError> {
        let url = self.url("workflow/actions");
        let query = [
            ("moid", moid.to_string()),
            ("role_id", role_id.to_string()),
            ("check_amount", check_amount.to_string()),
        ];
        let body = self.get_json(&url, &query).await?;

        envelope::raw_actions(&body)
    }

    async fn remarks(&self, tr_no: &str, moid: &Moid) -> Result<Vec<RemarksEntry>, ApiError> {
        let url = self.url("workflow/remarks");
        let query = [("trno", tr_no.to_string()), ("moid", moid.to_string())];
        let body = self.get_json(&url, &query).await?;

        envelope::remarks_entries(&body)
    }

    async fn submit_approval(&self, payload: &ApprovalPayload) -> Result<String, ApiError> {
        let url = self.url(&format!("{}/approve", self.module));

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            // A submit that reached the server may have been applied even
            // when it reports 5xx, so it is surfaced rather than retried.
            if response.status() == StatusCode::GATEWAY_TIMEOUT {
                return Err(ApiError::Timeout);
            }
            return Err(Self::status_error(response).await);
        }

        response.text().await.map_err(|error| ApiError::Decode(error.to_string()))
    }
}
