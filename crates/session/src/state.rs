use std::collections::BTreeMap;

use query::{PanelKey, Query};
use serde::{Deserialize, Serialize};

use crate::panel::PanelResult;

/// Everything one session currently shows, plus its timing tallies.
///
/// Held authoritatively by the dispatcher and mirrored by each client; both
/// sides mutate it only through [`SessionState::apply`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// The query the shown panels belong to.
    pub last_query: Option<Query>,
    /// Id of the newest query whose results have been applied.
    pub last_query_id: u64,
    pub panels: BTreeMap<PanelKey, PanelResult>,
    /// Resolved translation blocks, keyed by the token they resolve.
    pub translation_memo: BTreeMap<String, String>,
    /// Backend-reported processing time for the last interaction.
    pub backend_ms: f64,
    /// Wall-clock time for the last interaction, dispatch included.
    pub total_ms: f64,
    pub bytes_transferred: u64,
    /// `@total` of the hits panel, the collection-wide match count.
    pub total_documents: u64,
    /// Last interaction-level failure, if any.
    pub error: Option<String>,
}

impl SessionState {
    /// Drop all results and tallies, as when the user clears the input.
    pub fn reset(&mut self) {
        *self = Self {
            last_query_id: self.last_query_id,
            ..Self::default()
        };
    }
}
