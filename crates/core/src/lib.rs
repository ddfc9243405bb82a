pub mod actions;
pub mod config;
pub mod domain;
pub mod errors;
pub mod gate;
pub mod notify;
pub mod payload;
pub mod session;

pub use actions::{default_value_for, resolve_actions};
pub use config::{AppConfig, ClientConfig, ConfigError, ConfigOverrides, LoadOptions, ModulePolicy};
pub use domain::action::{RawWorkflowAction, SubmitOutcome, WorkflowAction};
pub use domain::item::{Actor, DetailRecord, ItemKey, Moid, PendingItem};
pub use domain::remarks::RemarksEntry;
pub use errors::{DispatchError, GateError, ValidationFailure};
pub use gate::VerificationGate;
pub use notify::{InMemoryNotifier, Notification, NotificationLevel, Notifier};
pub use payload::{ApprovalPayload, FieldRule, FieldSource, PayloadContext};
pub use session::{Effect, Panel, SelectionEpoch, SessionEvent, SessionState};
