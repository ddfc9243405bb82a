//! End-to-end session scenarios against the scripted in-memory backend.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::sleep;

use greenlight_client::{ApiCall, ApiError, InMemoryApprovalApi};
use greenlight_core::config::ModulePolicy;
use greenlight_core::domain::action::{RawWorkflowAction, WorkflowAction};
use greenlight_core::domain::item::{Actor, DetailRecord, ItemKey, Moid, PendingItem};
use greenlight_core::domain::remarks::RemarksEntry;
use greenlight_core::errors::DispatchError;
use greenlight_core::notify::{InMemoryNotifier, NotificationLevel};
use greenlight_core::session::SessionState;
use greenlight_session::SessionDriver;

fn actor() -> Actor {
    Actor {
        user_id: "u-017".to_string(),
        user_name: "j.tan".to_string(),
        role_id: "finance_verifier".to_string(),
    }
}

fn item(key: &str) -> PendingItem {
    PendingItem {
        key: ItemKey(key.to_string()),
        moid: Moid(format!("CCBA-{key}")),
        title: format!("Amendment {key}"),
        code: key.to_string(),
        amount: None,
        submitted_at: None,
        fields: BTreeMap::new(),
    }
}

fn detail(key: &str) -> DetailRecord {
    DetailRecord {
        key: ItemKey(key.to_string()),
        moid: Moid(format!("CCBA-{key}")),
        ref_no: Some(format!("TR-{key}")),
        check_amount: Decimal::new(12_000, 0),
        fields: BTreeMap::new(),
        collections: BTreeMap::new(),
    }
}

fn raw_action(kind: &str) -> RawWorkflowAction {
    RawWorkflowAction { kind: kind.to_string(), label: kind.to_string(), ..Default::default() }
}

fn approve() -> WorkflowAction {
    WorkflowAction {
        kind: "approve".to_string(),
        label: "Approve".to_string(),
        value: "Approve".to_string(),
        class_name: None,
    }
}

fn policy() -> ModulePolicy {
    ModulePolicy { settle_delay_ms: 50, ..ModulePolicy::new("budget_amendment") }
}

/// Polls the driver until the predicate holds; panics after ~4s.
async fn wait_for(
    driver: &SessionDriver,
    what: &str,
    predicate: impl Fn(&SessionState) -> bool,
) {
    for _ in 0..400 {
        if predicate(&driver.snapshot()) {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {what}");
}

#[tokio::test]
async fn full_approval_cycle_settles_back_to_an_empty_page() {
    let api = Arc::new(InMemoryApprovalApi::new());
    api.script_pending(Duration::ZERO, Ok(vec![item("A"), item("B")]));
    api.script_detail(Duration::ZERO, Ok(detail("A")));
    api.script_actions(Duration::ZERO, Ok(vec![raw_action("Approve"), raw_action("Reject")]));
    api.script_remarks(
        Duration::ZERO,
        Ok(vec![RemarksEntry { action_by: "a.lee".to_string(), ..Default::default() }]),
    );
    api.script_submit(Duration::ZERO, Ok("Approved".to_string()));
    api.script_pending(Duration::ZERO, Ok(vec![item("B")]));

    let notifier = Arc::new(InMemoryNotifier::default());
    let driver = SessionDriver::new(policy(), api.clone(), notifier.clone(), actor());

    driver.refresh_pending();
    wait_for(&driver, "queue loaded", |s| s.pending.ready().map(Vec::len) == Some(2)).await;

    driver.select(item("A"));
    wait_for(&driver, "actions resolved", SessionState::has_actions).await;

    let snapshot = driver.snapshot();
    assert!(snapshot.list_collapsed);
    assert_eq!(snapshot.detail.ready().map(|d| d.key.0.as_str()), Some("A"));
    assert_eq!(snapshot.remarks.ready().map(Vec::len), Some(1));

    driver.set_comment("totals verified against ledger");
    driver.set_verified(true);
    assert!(driver.snapshot().action_enabled());

    let outcome = driver.dispatch(approve()).await.expect("dispatch succeeds");
    assert_eq!(outcome.status, "Approved");
    assert!(driver.snapshot().dispatch_in_flight, "held through the settle window");

    wait_for(&driver, "page cleared after settle", |s| {
        s.selected.is_none() && !s.dispatch_in_flight
    })
    .await;

    let snapshot = driver.snapshot();
    assert!(!snapshot.list_collapsed);
    assert!(snapshot.gate.comment().is_empty());
    assert!(!snapshot.gate.verified());
    assert_eq!(snapshot.pending.ready().map(Vec::len), Some(1), "queue was refreshed");

    let pending_calls = api
        .calls()
        .iter()
        .filter(|call| matches!(call, ApiCall::Pending { .. }))
        .count();
    assert_eq!(pending_calls, 2);

    let toasts = notifier.notifications();
    assert!(toasts
        .iter()
        .any(|t| t.level == NotificationLevel::Success && t.text == "Approve successful"));

    // The submitted payload carried the operator's exact inputs.
    let submissions = api.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].get("Action"), Some("Approve"));
    assert_eq!(submissions[0].get("ActionRemarks"), Some("totals verified against ledger"));
    assert_eq!(submissions[0].get("TrNo"), Some("TR-A"));
    assert_eq!(submissions[0].get("MOID"), Some("CCBA-A"));
}

#[tokio::test]
async fn failed_dispatch_preserves_the_operator_input() {
    let api = Arc::new(InMemoryApprovalApi::new());
    api.script_detail(Duration::ZERO, Ok(detail("A")));
    api.script_submit(
        Duration::ZERO,
        Err(ApiError::Http { status: 409, message: "budget period is closed".to_string() }),
    );

    let notifier = Arc::new(InMemoryNotifier::default());
    let driver = SessionDriver::new(policy(), api.clone(), notifier.clone(), actor());

    driver.select(item("A"));
    wait_for(&driver, "detail loaded", |s| s.detail.ready().is_some()).await;
    driver.set_comment("checked twice");
    driver.set_verified(true);

    let error = driver.dispatch(approve()).await.unwrap_err();
    assert!(matches!(&error, DispatchError::Submit { message } if message == "budget period is closed"));

    let snapshot = driver.snapshot();
    assert!(!snapshot.dispatch_in_flight);
    assert_eq!(snapshot.gate.comment(), "checked twice");
    assert!(snapshot.gate.verified());
    assert_eq!(snapshot.selected.as_ref().map(|i| i.key.0.as_str()), Some("A"));

    wait_for(&driver, "failure toast emitted", |_| {
        notifier
            .notifications()
            .iter()
            .any(|t| t.level == NotificationLevel::Error && t.text == "budget period is closed")
    })
    .await;
}

#[tokio::test]
async fn dollar_delimited_result_emits_a_delayed_secondary_notice() {
    let api = Arc::new(InMemoryApprovalApi::new());
    api.script_detail(Duration::ZERO, Ok(detail("A")));
    api.script_submit(Duration::ZERO, Ok("Approved$Budget updated to 50000".to_string()));

    let notifier = Arc::new(InMemoryNotifier::default());
    let driver = SessionDriver::new(policy(), api.clone(), notifier.clone(), actor());

    driver.select(item("A"));
    wait_for(&driver, "detail loaded", |s| s.detail.ready().is_some()).await;
    driver.set_comment("ok");
    driver.set_verified(true);

    let outcome = driver.dispatch(approve()).await.expect("dispatch succeeds");
    assert_eq!(outcome.status, "Approved");
    assert_eq!(outcome.additional_info.as_deref(), Some("Budget updated to 50000"));

    // The primary toast lands at once; the secondary one only after
    // its delay has elapsed.
    let toasts = notifier.notifications();
    assert!(toasts.iter().any(|t| t.text == "Approve successful"));
    assert!(!toasts.iter().any(|t| t.text == "Budget updated to 50000"));

    wait_for(&driver, "secondary notice emitted", |_| {
        notifier.notifications().iter().any(|t| {
            t.level == NotificationLevel::Info && t.text == "Budget updated to 50000"
        })
    })
    .await;
}

#[tokio::test]
async fn slow_response_for_a_superseded_selection_is_discarded() {
    let api = Arc::new(InMemoryApprovalApi::new());
    api.script_detail(Duration::from_millis(200), Ok(detail("A")));
    api.script_detail(Duration::from_millis(10), Ok(detail("B")));

    let notifier = Arc::new(InMemoryNotifier::default());
    let driver = SessionDriver::new(policy(), api.clone(), notifier.clone(), actor());

    driver.select(item("A"));
    driver.select(item("B"));

    wait_for(&driver, "B's detail loaded", |s| {
        s.detail.ready().map(|d| d.key.0.as_str()) == Some("B")
    })
    .await;

    // A's slower response arrives afterwards and must not win.
    sleep(Duration::from_millis(300)).await;
    let snapshot = driver.snapshot();
    assert_eq!(snapshot.detail.ready().map(|d| d.key.0.as_str()), Some("B"));
    assert_eq!(snapshot.selected.as_ref().map(|i| i.key.0.as_str()), Some("B"));
}

#[tokio::test]
async fn selection_made_during_the_settle_window_survives_it() {
    let api = Arc::new(InMemoryApprovalApi::new());
    api.script_detail(Duration::ZERO, Ok(detail("A")));
    api.script_detail(Duration::ZERO, Ok(detail("B")));
    api.script_submit(Duration::ZERO, Ok("Approved".to_string()));

    let notifier = Arc::new(InMemoryNotifier::default());
    let policy = ModulePolicy { settle_delay_ms: 200, ..ModulePolicy::new("budget_amendment") };
    let driver = SessionDriver::new(policy, api.clone(), notifier.clone(), actor());

    driver.select(item("A"));
    wait_for(&driver, "A's detail loaded", |s| s.detail.ready().is_some()).await;
    driver.set_comment("totals verified");
    driver.set_verified(true);
    driver.dispatch(approve()).await.expect("dispatch succeeds");

    // The operator moves on before the settle window elapses.
    driver.select(item("B"));

    sleep(Duration::from_millis(400)).await;
    let snapshot = driver.snapshot();
    assert_eq!(snapshot.selected.as_ref().map(|i| i.key.0.as_str()), Some("B"));
    assert_eq!(snapshot.detail.ready().map(|d| d.key.0.as_str()), Some("B"));
    assert!(!snapshot.dispatch_in_flight, "the flag drops when the window elapses");
}

#[tokio::test]
async fn clearing_mid_fetch_leaves_the_page_empty() {
    let api = Arc::new(InMemoryApprovalApi::new());
    api.script_detail(Duration::from_millis(100), Ok(detail("A")));

    let notifier = Arc::new(InMemoryNotifier::default());
    let driver = SessionDriver::new(policy(), api.clone(), notifier.clone(), actor());

    driver.select(item("A"));
    driver.clear();

    sleep(Duration::from_millis(250)).await;
    let snapshot = driver.snapshot();
    assert!(snapshot.selected.is_none());
    assert!(snapshot.detail.ready().is_none());
    assert!(!snapshot.list_collapsed);
}
