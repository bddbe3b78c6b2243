#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One logical search request, created per user interaction.
///
/// Carried in the session state so that what the panels currently show can
/// always be traced back to the input and paging that produced it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Query {
    /// Interaction-level query id, increases with every input change.
    pub id: u64,
    /// Transport-level request id echoed back by the dispatcher.
    pub request_id: u64,
    /// The raw text exactly as typed.
    pub raw_input: String,
    /// First hit to show, 1-based.
    pub first_hit: u32,
    pub hits_per_page: u32,
    pub completions_per_box: u32,
}

impl Query {
    pub fn new(raw_input: impl Into<String>) -> Self {
        Self {
            id: 0,
            request_id: 0,
            raw_input: raw_input.into(),
            first_hit: 1,
            hits_per_page: 5,
            completions_per_box: 4,
        }
    }
}
