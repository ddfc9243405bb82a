pub mod reducer;
pub mod state;

pub use state::{Effect, Panel, SelectionEpoch, SessionEvent, SessionState};
