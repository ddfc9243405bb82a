//! Owns one approval session at runtime. UI-facing methods translate
//! operator gestures into reducer events; completions of the spawned
//! fetches come back through the same path, so every state change goes
//! through [`SessionState::apply`] under one lock.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use greenlight_client::{ApiError, ApprovalApi};
use greenlight_core::config::ModulePolicy;
use greenlight_core::domain::action::{SubmitOutcome, WorkflowAction};
use greenlight_core::domain::item::{Actor, PendingItem};
use greenlight_core::errors::{submit_failure_message, DispatchError};
use greenlight_core::notify::{Notification, Notifier};
use greenlight_core::payload::{build_payload, ApprovalPayload, PayloadContext};
use greenlight_core::session::{Effect, SessionEvent, SessionState};

pub struct SessionDriver {
    inner: Arc<DriverInner>,
}

struct DriverInner {
    state: Mutex<SessionState>,
    api: Arc<dyn ApprovalApi>,
    notifier: Arc<dyn Notifier>,
    actor: Actor,
}

impl SessionDriver {
    pub fn new(
        policy: ModulePolicy,
        api: Arc<dyn ApprovalApi>,
        notifier: Arc<dyn Notifier>,
        actor: Actor,
    ) -> Self {
        Self {
            inner: Arc::new(DriverInner {
                state: Mutex::new(SessionState::new(policy)),
                api,
                notifier,
                actor,
            }),
        }
    }

    /// Point-in-time copy of the session state, for rendering and
    /// assertions. The live state may already have moved on.
    pub fn snapshot(&self) -> SessionState {
        lock(&self.inner.state).clone()
    }

    pub fn refresh_pending(&self) {
        DriverInner::process(&self.inner, SessionEvent::PendingRefreshRequested);
    }

    pub fn select(&self, item: PendingItem) {
        info!(event_name = "item_selected", key = %item.key, moid = %item.moid);
        DriverInner::process(&self.inner, SessionEvent::Selected { item });
    }

    pub fn clear(&self) {
        DriverInner::process(&self.inner, SessionEvent::Cleared);
    }

    pub fn set_comment(&self, text: impl Into<String>) {
        DriverInner::process(&self.inner, SessionEvent::CommentEdited { text: text.into() });
    }

    pub fn set_verified(&self, verified: bool) {
        DriverInner::process(&self.inner, SessionEvent::VerifiedToggled { verified });
    }

    pub fn toggle_remarks(&self) {
        DriverInner::process(&self.inner, SessionEvent::RemarksToggled);
    }

    /// Runs one action submission end to end. Guard failures (nothing
    /// selected, gate unsatisfied, another dispatch in flight) refuse
    /// before anything goes over the wire; the operator sees a toast
    /// either way.
    pub async fn dispatch(&self, action: WorkflowAction) -> Result<SubmitOutcome, DispatchError> {
        let payload = {
            let mut state = lock(&self.inner.state);
            match prepare_payload(&state, &self.inner.actor, &action.value) {
                Ok(payload) => {
                    let effects = state.apply(SessionEvent::DispatchStarted);
                    drop(state);
                    DriverInner::run_effects(&self.inner, effects);
                    payload
                }
                Err(error) => {
                    drop(state);
                    warn!(event_name = "dispatch_refused", action = %action.label, reason = %error);
                    self.inner.notifier.emit(Notification::error(error.to_string()));
                    return Err(error);
                }
            }
        };

        info!(event_name = "dispatch_started", action = %action.label);
        match self.inner.api.submit_approval(&payload).await {
            Ok(raw) => {
                let outcome = SubmitOutcome::parse(&raw);
                info!(event_name = "dispatch_succeeded", action = %action.label, status = %outcome.status);
                DriverInner::process(
                    &self.inner,
                    SessionEvent::DispatchSucceeded { action, outcome: outcome.clone() },
                );
                Ok(outcome)
            }
            Err(error) => {
                let message = submit_failure_message(error.user_detail().as_deref(), &action.label);
                warn!(event_name = "dispatch_failed", action = %action.label, error = %error);
                DriverInner::process(&self.inner, SessionEvent::DispatchFailed { message: message.clone() });
                Err(DispatchError::Submit { message })
            }
        }
    }
}

/// All pre-flight checks plus payload construction, done in one place
/// under the state lock so the submitted fields match exactly what the
/// operator saw.
fn prepare_payload(
    state: &SessionState,
    actor: &Actor,
    action_value: &str,
) -> Result<ApprovalPayload, DispatchError> {
    if state.dispatch_in_flight {
        return Err(DispatchError::InFlight);
    }
    let item = state.selected.as_ref().ok_or(DispatchError::NoSelection)?;
    state.gate.validate()?;

    let ctx = PayloadContext {
        item,
        detail: state.detail.ready(),
        actor,
        comment: state.gate.comment(),
        action_value,
    };
    Ok(build_payload(&state.policy().field_rules, &ctx))
}

impl DriverInner {
    /// Applies one event and executes whatever effects fall out. The
    /// lock is released before any effect runs.
    fn process(inner: &Arc<Self>, event: SessionEvent) {
        let effects = lock(&inner.state).apply(event);
        Self::run_effects(inner, effects);
    }

    /// Each fetch runs as its own task; responses race naturally and
    /// the reducer's epoch check settles who wins.
    fn run_effects(inner: &Arc<Self>, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Notify(notification) => inner.notifier.emit(notification),
                Effect::NotifyDelayed { delay_ms, notification } => {
                    let inner = Arc::clone(inner);
                    tokio::spawn(async move {
                        sleep(Duration::from_millis(delay_ms)).await;
                        inner.notifier.emit(notification);
                    });
                }
                Effect::FetchPending => {
                    let inner = Arc::clone(inner);
                    tokio::spawn(async move {
                        let result = inner
                            .api
                            .pending_items(&inner.actor.role_id, &inner.actor.user_id)
                            .await
                            .map_err(user_message);
                        Self::process(&inner, SessionEvent::PendingLoaded { result });
                    });
                }
                Effect::FetchDetail { epoch, key } => {
                    let inner = Arc::clone(inner);
                    tokio::spawn(async move {
                        let result = inner.api.detail_record(&key).await.map_err(user_message);
                        Self::process(&inner, SessionEvent::DetailLoaded { epoch, result });
                    });
                }
                Effect::FetchActions { epoch, moid, check_amount } => {
                    let inner = Arc::clone(inner);
                    tokio::spawn(async move {
                        let result = inner
                            .api
                            .workflow_actions(&moid, &inner.actor.role_id, check_amount)
                            .await
                            .map_err(user_message);
                        Self::process(&inner, SessionEvent::ActionsLoaded { epoch, result });
                    });
                }
                Effect::FetchRemarks { epoch, tr_no, moid } => {
                    let inner = Arc::clone(inner);
                    tokio::spawn(async move {
                        let result = inner.api.remarks(&tr_no, &moid).await.map_err(user_message);
                        Self::process(&inner, SessionEvent::RemarksLoaded { epoch, result });
                    });
                }
                Effect::ScheduleRefresh { delay_ms, epoch } => {
                    // The settle window: let the backend commit the
                    // workflow transition, then refresh the queue. The
                    // reducer decides whether the page still clears; the
                    // epoch belongs to the selection that was dispatched.
                    let inner = Arc::clone(inner);
                    tokio::spawn(async move {
                        sleep(Duration::from_millis(delay_ms)).await;
                        let result = inner
                            .api
                            .pending_items(&inner.actor.role_id, &inner.actor.user_id)
                            .await
                            .map_err(user_message);
                        Self::process(&inner, SessionEvent::PendingLoaded { result });
                        Self::process(&inner, SessionEvent::SettleCompleted { epoch });
                    });
                }
            }
        }
    }
}

fn user_message(error: ApiError) -> String {
    error.user_detail().unwrap_or_else(|| error.to_string())
}

fn lock<'a>(state: &'a Mutex<SessionState>) -> MutexGuard<'a, SessionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
