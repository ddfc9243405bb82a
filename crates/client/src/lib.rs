//! Remote backend boundary for the approval workbench. Everything the
//! core depends on from the network comes through the [`ApprovalApi`]
//! trait; the reqwest implementation and the in-memory fake both live
//! here, as does the one place where the backend's inconsistent JSON
//! shapes are normalized into fixed internal types.

pub mod envelope;
pub mod fake;
pub mod http;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use greenlight_core::domain::action::RawWorkflowAction;
use greenlight_core::domain::item::{DetailRecord, ItemKey, Moid, PendingItem};
use greenlight_core::domain::remarks::RemarksEntry;
use greenlight_core::payload::ApprovalPayload;

pub use fake::{ApiCall, InMemoryApprovalApi};
pub use http::HttpApprovalApi;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("backend returned status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("response decode failed: {0}")]
    Decode(String),
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl ApiError {
    /// The most specific detail worth showing an operator: an explicit
    /// backend message beats a status line beats a transport error.
    /// Decode/shape problems carry nothing user-facing.
    pub fn user_detail(&self) -> Option<String> {
        match self {
            Self::Http { message, .. } if !message.trim().is_empty() => {
                Some(message.trim().to_string())
            }
            Self::Http { status, .. } => Some(format!("request failed with status {status}")),
            Self::Transport(message) => Some(message.clone()),
            Self::Timeout => Some("the request timed out".to_string()),
            Self::Decode(_) | Self::UnexpectedShape(_) => None,
        }
    }
}

/// The five backend contracts the workbench depends on. Timeouts are
/// the implementation's concern; callers treat a pending future like
/// any other unsettled request.
#[async_trait]
pub trait ApprovalApi: Send + Sync {
    async fn pending_items(
        &self,
        role_id: &str,
        user_id: &str,
    ) -> Result<Vec<PendingItem>, ApiError>;

    async fn detail_record(&self, key: &ItemKey) -> Result<DetailRecord, ApiError>;

    async fn workflow_actions(
        &self,
        moid: &Moid,
        role_id: &str,
        check_amount: Decimal,
    ) -> Result<Vec<RawWorkflowAction>, ApiError>;

    async fn remarks(&self, tr_no: &str, moid: &Moid) -> Result<Vec<RemarksEntry>, ApiError>;

    /// Returns the backend's raw result string; a `$` inside it carries
    /// a secondary message (interpreted by the core, not here).
    async fn submit_approval(&self, payload: &ApprovalPayload) -> Result<String, ApiError>;
}
