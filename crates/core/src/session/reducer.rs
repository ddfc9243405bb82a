//! The `(state, event) -> effects` transition function for an approval
//! session. Pure: all I/O happens in the runtime that executes the
//! returned effects and feeds results back as further events.

use tracing::debug;

use crate::actions::resolve_actions;
use crate::notify::Notification;
use crate::session::state::{Effect, Panel, SessionEvent, SessionState};

/// How long after the primary success toast the secondary informational
/// toast (the `$`-delimited tail of a submit result) is shown.
const SECONDARY_NOTICE_DELAY_MS: u64 = 1500;

impl SessionState {
    pub fn apply(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::PendingRefreshRequested => {
                self.pending = Panel::Loading;
                vec![Effect::FetchPending]
            }
            SessionEvent::PendingLoaded { result } => {
                // The queue is superseded wholesale, never patched.
                self.pending = match result {
                    Ok(items) => Panel::Ready(items),
                    Err(message) => Panel::Failed(message),
                };
                Vec::new()
            }
            SessionEvent::Selected { item } => {
                let epoch = self.bump_epoch();
                let key = item.key.clone();
                self.selected = Some(item);
                self.detail = Panel::Loading;
                // The status fetch cannot fire until the detail record
                // supplies the MOID, so these stay idle for now.
                self.actions = Panel::Idle;
                self.remarks = Panel::Idle;
                self.gate.reset();
                self.list_collapsed = true;
                vec![Effect::FetchDetail { epoch, key }]
            }
            SessionEvent::Cleared => {
                self.clear_page();
                Vec::new()
            }
            SessionEvent::DetailLoaded { epoch, result } => {
                if epoch != self.epoch() {
                    debug!(stale_epoch = epoch.0, current_epoch = self.epoch().0, "discarding stale detail response");
                    return Vec::new();
                }
                match result {
                    Ok(detail) => {
                        let mut effects = vec![Effect::FetchActions {
                            epoch,
                            moid: detail.moid.clone(),
                            check_amount: detail.check_amount,
                        }];
                        self.actions = Panel::Loading;
                        if let Some(tr_no) = detail.ref_no.clone() {
                            self.remarks = Panel::Loading;
                            effects.push(Effect::FetchRemarks {
                                epoch,
                                tr_no,
                                moid: detail.moid.clone(),
                            });
                        }
                        self.detail = Panel::Ready(detail);
                        effects
                    }
                    Err(message) => {
                        // Surfaced inline; the selection is kept so the
                        // operator can retry via an explicit refresh.
                        self.detail = Panel::Failed(message);
                        Vec::new()
                    }
                }
            }
            SessionEvent::ActionsLoaded { epoch, result } => {
                if epoch != self.epoch() {
                    debug!(stale_epoch = epoch.0, current_epoch = self.epoch().0, "discarding stale actions response");
                    return Vec::new();
                }
                self.actions = match result {
                    Ok(raw) => Panel::Ready(resolve_actions(raw)),
                    Err(message) => Panel::Failed(message),
                };
                Vec::new()
            }
            SessionEvent::RemarksLoaded { epoch, result } => {
                if epoch != self.epoch() {
                    debug!(stale_epoch = epoch.0, current_epoch = self.epoch().0, "discarding stale remarks response");
                    return Vec::new();
                }
                self.remarks = match result {
                    Ok(entries) => Panel::Ready(entries),
                    Err(message) => Panel::Failed(message),
                };
                Vec::new()
            }
            SessionEvent::CommentEdited { text } => match self.gate.set_comment(text) {
                Ok(()) => Vec::new(),
                Err(error) => vec![Effect::Notify(Notification::error(error.to_string()))],
            },
            SessionEvent::VerifiedToggled { verified } => {
                self.gate.set_verified(verified);
                Vec::new()
            }
            SessionEvent::RemarksToggled => {
                self.remarks_open = !self.remarks_open;
                // Opening the panel starts a fetch when none has run yet,
                // and retries after a failed one.
                if self.remarks_open && matches!(self.remarks, Panel::Idle | Panel::Failed(_)) {
                    if let Some(detail) = self.detail.ready() {
                        if let Some(tr_no) = detail.ref_no.clone() {
                            let moid = detail.moid.clone();
                            self.remarks = Panel::Loading;
                            return vec![Effect::FetchRemarks { epoch: self.epoch(), tr_no, moid }];
                        }
                    }
                }
                Vec::new()
            }
            SessionEvent::DispatchStarted => {
                self.dispatch_in_flight = true;
                Vec::new()
            }
            SessionEvent::DispatchSucceeded { action, outcome } => {
                let mut effects =
                    vec![Effect::Notify(Notification::success(format!("{} successful", action.label)))];
                if let Some(info) = outcome.additional_info {
                    effects.push(Effect::NotifyDelayed {
                        delay_ms: SECONDARY_NOTICE_DELAY_MS,
                        notification: Notification::info(info),
                    });
                }
                // The in-flight flag stays up through the settle window;
                // it drops when SettleCompleted comes back.
                effects.push(Effect::ScheduleRefresh {
                    delay_ms: self.policy().settle_delay_ms,
                    epoch: self.epoch(),
                });
                effects
            }
            SessionEvent::DispatchFailed { message } => {
                self.dispatch_in_flight = false;
                if self.policy().reset_gate_on_failure {
                    self.gate.reset();
                }
                vec![Effect::Notify(Notification::error(message))]
            }
            SessionEvent::SettleCompleted { epoch } => {
                // The dispatch is settled either way, so the flag drops.
                // The page only clears when the dispatched selection is
                // still the current one; a selection made during the
                // settle window must survive it.
                self.dispatch_in_flight = false;
                if epoch == self.epoch() {
                    self.clear_page();
                } else {
                    debug!(stale_epoch = epoch.0, current_epoch = self.epoch().0, "settle window outlived its selection, keeping the page");
                }
                Vec::new()
            }
        }
    }

    fn clear_page(&mut self) {
        self.bump_epoch();
        self.selected = None;
        self.detail = Panel::Idle;
        self.actions = Panel::Idle;
        self.remarks = Panel::Idle;
        self.gate.reset();
        self.list_collapsed = false;
        self.dispatch_in_flight = false;
    }
}
