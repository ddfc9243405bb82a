//! Scripted in-memory [`ApprovalApi`] for driver and workflow tests.
//! Each endpoint pops its next scripted response (with an optional
//! artificial delay, which is how tests arrange out-of-order arrivals)
//! and records the call so assertions can check what went over the wire.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use greenlight_core::domain::action::RawWorkflowAction;
use greenlight_core::domain::item::{DetailRecord, ItemKey, Moid, PendingItem};
use greenlight_core::domain::remarks::RemarksEntry;
use greenlight_core::payload::ApprovalPayload;

use crate::{ApiError, ApprovalApi};

type Scripted<T> = Mutex<VecDeque<(Duration, Result<T, ApiError>)>>;

/// One observed call, in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiCall {
    Pending { role_id: String, user_id: String },
    Detail { key: ItemKey },
    Actions { moid: Moid, role_id: String, check_amount: Decimal },
    Remarks { tr_no: String, moid: Moid },
    Submit,
}

#[derive(Default)]
pub struct InMemoryApprovalApi {
    pending: Scripted<Vec<PendingItem>>,
    detail: Scripted<DetailRecord>,
    actions: Scripted<Vec<RawWorkflowAction>>,
    remarks: Scripted<Vec<RemarksEntry>>,
    submit: Scripted<String>,
    calls: Mutex<Vec<ApiCall>>,
    submissions: Mutex<Vec<ApprovalPayload>>,
}

impl InMemoryApprovalApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_pending(&self, delay: Duration, result: Result<Vec<PendingItem>, ApiError>) {
        lock(&self.pending).push_back((delay, result));
    }

    pub fn script_detail(&self, delay: Duration, result: Result<DetailRecord, ApiError>) {
        lock(&self.detail).push_back((delay, result));
    }

    pub fn script_actions(&self, delay: Duration, result: Result<Vec<RawWorkflowAction>, ApiError>) {
        lock(&self.actions).push_back((delay, result));
    }

    pub fn script_remarks(&self, delay: Duration, result: Result<Vec<RemarksEntry>, ApiError>) {
        lock(&self.remarks).push_back((delay, result));
    }

    pub fn script_submit(&self, delay: Duration, result: Result<String, ApiError>) {
        lock(&self.submit).push_back((delay, result));
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        lock(&self.calls).clone()
    }

    pub fn submissions(&self) -> Vec<ApprovalPayload> {
        lock(&self.submissions).clone()
    }

    fn record(&self, call: ApiCall) {
        lock(&self.calls).push(call);
    }

    async fn next<T>(queue: &Scripted<T>, fallback: impl FnOnce() -> Result<T, ApiError>) -> Result<T, ApiError> {
        let scripted = lock(queue).pop_front();
        match scripted {
            Some((delay, result)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => fallback(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ApprovalApi for InMemoryApprovalApi {
    async fn pending_items(
        &self,
        role_id: &str,
        user_id: &str,
    ) -> Result<Vec<PendingItem>, ApiError> {
        self.record(ApiCall::Pending {
            role_id: role_id.to_string(),
            user_id: user_id.to_string(),
        });
        Self::next(&self.pending, || Ok(Vec::new())).await
    }

    async fn detail_record(&self, key: &ItemKey) -> Result<DetailRecord, ApiError> {
        self.record(ApiCall::Detail { key: key.clone() });
        Self::next(&self.detail, || {
            Err(ApiError::UnexpectedShape("no scripted detail record".to_string()))
        })
        .await
    }

    async fn workflow_actions(
        &self,
        moid: &Moid,
        role_id: &str,
        check_amount: Decimal,
    ) -> Result<Vec<RawWorkflowAction>, ApiError> {
        self.record(ApiCall::Actions {
            moid: moid.clone(),
            role_id: role_id.to_string(),
            check_amount,
        });
        Self::next(&self.actions, || Ok(Vec::new())).await
    }

    async fn remarks(&self, tr_no: &str, moid: &Moid) -> Result<Vec<RemarksEntry>, ApiError> {
        self.record(ApiCall::Remarks { tr_no: tr_no.to_string(), moid: moid.clone() });
        Self::next(&self.remarks, || Ok(Vec::new())).await
    }

    async fn submit_approval(&self, payload: &ApprovalPayload) -> Result<String, ApiError> {
        self.record(ApiCall::Submit);
        lock(&self.submissions).push(payload.clone());
        Self::next(&self.submit, || Ok("OK".to_string())).await
    }
}
