use std::collections::BTreeMap;

use query::PanelKey;
use serde::{Deserialize, Serialize};
use session::{PanelMode, SessionDelta};

/// One panel request from a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelRequest {
    /// Client-chosen id, echoed verbatim in the reply so the client can
    /// match replies to its outstanding slots.
    pub request_id: u64,
    /// Id of the query this request belongs to. All panels of one
    /// interaction share it; the server uses it to guard session writes.
    pub query_id: u64,
    /// The user's input, untouched.
    pub raw_input: String,
    pub panel: PanelKey,
    /// One-based rank of the first hit wanted; only the hits panel pages.
    pub first_hit: u32,
    /// Upper bound on entries this request may return.
    pub max_to_show: u32,
    pub mode: PanelMode,
    /// Per-request preference overrides, e.g. a ranking choice.
    pub prefs: BTreeMap<String, String>,
}

impl PanelRequest {
    pub fn new(request_id: u64, query_id: u64, raw_input: impl Into<String>, panel: PanelKey) -> Self {
        Self {
            request_id,
            query_id,
            raw_input: raw_input.into(),
            panel,
            first_hit: 1,
            max_to_show: 0,
            mode: PanelMode::Replace,
            prefs: BTreeMap::new(),
        }
    }
}

/// The reply to one [`PanelRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelReply {
    /// The request's id, echoed first so even an errored reply can be
    /// matched to its slot.
    pub request_id: u64,
    pub delta: SessionDelta,
}
