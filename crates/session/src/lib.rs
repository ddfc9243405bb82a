//! Async runtime for an approval session. The core reducer decides what
//! happens; this crate owns the state behind a lock, executes the
//! effects the reducer returns against an [`ApprovalApi`], and feeds
//! completions back in as further events.
//!
//! [`ApprovalApi`]: greenlight_client::ApprovalApi

pub mod driver;
pub mod telemetry;

pub use driver::SessionDriver;
pub use telemetry::init_telemetry;
