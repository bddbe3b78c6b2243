//! Per-session result state shared by the dispatcher and its clients.
//!
//! The dispatcher builds one [`SessionDelta`] per answered panel request;
//! the client applies deltas to its local [`SessionState`] mirror. Deltas
//! carry the id of the query that produced them, and [`SessionState::apply`]
//! refuses deltas older than what the state already reflects, so replies
//! arriving out of order can never roll a newer result back.

pub mod merge;
pub mod panel;
pub mod state;

pub use merge::SessionDelta;
pub use panel::{PanelMode, PanelResult, PanelStatus};
pub use state::SessionState;
