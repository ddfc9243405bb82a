use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ModulePolicy;
use crate::domain::action::{RawWorkflowAction, SubmitOutcome, WorkflowAction};
use crate::domain::item::{DetailRecord, ItemKey, Moid, PendingItem};
use crate::domain::remarks::RemarksEntry;
use crate::gate::VerificationGate;
use crate::notify::Notification;

/// Monotonic token identifying one selection. Responses carry the epoch
/// they were fetched under; anything older than the current epoch is
/// discarded on arrival.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SelectionEpoch(pub u64);

impl SelectionEpoch {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Lifecycle of one independently fetched UI region. A failing region
/// never blanks out another region's already-loaded data.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Panel<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Panel<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// All state owned by one live approval page instance.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    policy: ModulePolicy,
    epoch: SelectionEpoch,
    pub pending: Panel<Vec<PendingItem>>,
    pub selected: Option<PendingItem>,
    pub detail: Panel<DetailRecord>,
    pub actions: Panel<Vec<WorkflowAction>>,
    pub remarks: Panel<Vec<RemarksEntry>>,
    pub gate: VerificationGate,
    pub list_collapsed: bool,
    pub remarks_open: bool,
    pub dispatch_in_flight: bool,
}

impl SessionState {
    pub fn new(policy: ModulePolicy) -> Self {
        let gate = VerificationGate::new(policy.comment_max_len);
        Self {
            policy,
            epoch: SelectionEpoch::default(),
            pending: Panel::Idle,
            selected: None,
            detail: Panel::Idle,
            actions: Panel::Idle,
            remarks: Panel::Idle,
            gate,
            list_collapsed: false,
            remarks_open: false,
            dispatch_in_flight: false,
        }
    }

    pub fn policy(&self) -> &ModulePolicy {
        &self.policy
    }

    pub fn epoch(&self) -> SelectionEpoch {
        self.epoch
    }

    pub(crate) fn bump_epoch(&mut self) -> SelectionEpoch {
        self.epoch = self.epoch.next();
        self.epoch
    }

    /// True iff the resolved, filtered action list is non-empty.
    pub fn has_actions(&self) -> bool {
        self.actions.ready().is_some_and(|actions| !actions.is_empty())
    }

    /// Whether a given action button should be enabled. The dispatcher
    /// re-checks the gate on entry; this is the UX half of the guard.
    pub fn action_enabled(&self) -> bool {
        self.has_actions() && self.gate.can_submit() && !self.dispatch_in_flight
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    PendingRefreshRequested,
    PendingLoaded { result: Result<Vec<PendingItem>, String> },
    Selected { item: PendingItem },
    Cleared,
    DetailLoaded { epoch: SelectionEpoch, result: Result<DetailRecord, String> },
    ActionsLoaded { epoch: SelectionEpoch, result: Result<Vec<RawWorkflowAction>, String> },
    RemarksLoaded { epoch: SelectionEpoch, result: Result<Vec<RemarksEntry>, String> },
    CommentEdited { text: String },
    VerifiedToggled { verified: bool },
    RemarksToggled,
    DispatchStarted,
    DispatchSucceeded { action: WorkflowAction, outcome: SubmitOutcome },
    DispatchFailed { message: String },
    /// The settle window after a successful dispatch has elapsed and the
    /// queue refresh has been applied. Carries the epoch of the selection
    /// that was dispatched.
    SettleCompleted { epoch: SelectionEpoch },
}

/// Work the runtime must carry out after a transition. Fetch effects
/// carry the epoch their results must be applied under.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    FetchPending,
    FetchDetail { epoch: SelectionEpoch, key: ItemKey },
    FetchActions { epoch: SelectionEpoch, moid: Moid, check_amount: Decimal },
    FetchRemarks { epoch: SelectionEpoch, tr_no: String, moid: Moid },
    Notify(Notification),
    NotifyDelayed { delay_ms: u64, notification: Notification },
    ScheduleRefresh { delay_ms: u64, epoch: SelectionEpoch },
}
