use std::collections::BTreeMap;

use query::{PanelKey, Query};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::panel::{PanelMode, PanelResult, PanelStatus};
use crate::state::SessionState;

/// The state change one answered panel request produces.
///
/// Scalar fields are `Option` so a delta only touches what its request
/// actually changed; keyed maps merge entry by entry, leaving the other
/// panels of the same interaction alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionDelta {
    /// Id of the query this delta answers. Deltas older than the state's
    /// watermark are dropped unapplied.
    pub query_id: u64,
    pub query: Option<Query>,
    pub panels: BTreeMap<PanelKey, PanelResult>,
    pub translation_memo: BTreeMap<String, String>,
    pub backend_ms: Option<f64>,
    pub total_ms: Option<f64>,
    pub bytes_transferred: Option<u64>,
    pub total_documents: Option<u64>,
    pub error: Option<String>,
}

impl SessionDelta {
    pub fn for_query(query_id: u64) -> Self {
        Self {
            query_id,
            ..Self::default()
        }
    }

    pub fn with_panel(mut self, key: PanelKey, result: PanelResult) -> Self {
        self.panels.insert(key, result);
        self
    }
}

impl SessionState {
    /// Merge a delta in. Returns false (and changes nothing) when the delta
    /// belongs to a query older than what the state already shows.
    pub fn apply(&mut self, delta: SessionDelta) -> bool {
        if delta.query_id < self.last_query_id {
            debug!(
                delta = delta.query_id,
                current = self.last_query_id,
                "dropping stale session delta"
            );
            return false;
        }
        // Deltas of one interaction share a query id; their tallies add up.
        // A newer interaction starts its tallies over.
        let same_interaction = delta.query_id == self.last_query_id;
        self.last_query_id = delta.query_id;

        if let Some(query) = delta.query {
            self.last_query = Some(query);
        }
        for (key, result) in delta.panels {
            // An append-mode page extends what the panel already shows.
            let append = result.mode == PanelMode::Append
                && result.status == PanelStatus::Ok
                && self
                    .panels
                    .get(&key)
                    .is_some_and(|shown| shown.status == PanelStatus::Ok);
            if append {
                if let Some(shown) = self.panels.get_mut(&key) {
                    shown.extend(result);
                }
                continue;
            }
            self.panels.insert(key, result);
        }
        for (token, block) in delta.translation_memo {
            self.translation_memo.insert(token, block);
        }
        if let Some(ms) = delta.backend_ms {
            self.backend_ms = if same_interaction { self.backend_ms + ms } else { ms };
        }
        if let Some(ms) = delta.total_ms {
            self.total_ms = if same_interaction { self.total_ms + ms } else { ms };
        }
        if let Some(bytes) = delta.bytes_transferred {
            self.bytes_transferred = if same_interaction {
                self.bytes_transferred + bytes
            } else {
                bytes
            };
        }
        if let Some(total) = delta.total_documents {
            self.total_documents = total;
        }
        // An error is per-interaction; a newer delta without one clears it.
        self.error = delta.error;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query::QueryType;

    fn panel(title: &str) -> PanelResult {
        PanelResult::empty(title)
    }

    #[test]
    fn deltas_merge_by_panel_key() {
        let mut state = SessionState::default();
        assert!(state.apply(
            SessionDelta::for_query(1).with_panel(PanelKey::of(QueryType::Hits), panel("Hits"))
        ));
        assert!(state.apply(
            SessionDelta::for_query(1).with_panel(PanelKey::of(QueryType::Words), panel("Words"))
        ));

        assert_eq!(state.panels.len(), 2);
        assert_eq!(state.panels[&PanelKey::of(QueryType::Hits)].title, "Hits");
    }

    #[test]
    fn stale_delta_is_dropped_whole() {
        let mut state = SessionState::default();
        assert!(state.apply(
            SessionDelta::for_query(5).with_panel(PanelKey::of(QueryType::Hits), panel("new"))
        ));

        let mut stale = SessionDelta::for_query(3)
            .with_panel(PanelKey::of(QueryType::Hits), panel("old"));
        stale.total_documents = Some(999);
        assert!(!state.apply(stale));

        assert_eq!(state.panels[&PanelKey::of(QueryType::Hits)].title, "new");
        assert_eq!(state.total_documents, 0);
        assert_eq!(state.last_query_id, 5);
    }

    #[test]
    fn equal_query_id_still_applies() {
        // Several panels of one interaction share a query id; none of them
        // may shadow the others out.
        let mut state = SessionState::default();
        assert!(state.apply(SessionDelta::for_query(2)));
        assert!(state.apply(
            SessionDelta::for_query(2).with_panel(PanelKey::of(QueryType::Facets), panel("F"))
        ));
        assert_eq!(state.panels.len(), 1);
    }

    #[test]
    fn append_mode_keeps_the_earlier_pages() {
        let mut state = SessionState::default();
        let first_page = PanelResult {
            title: "Hits 1 - 5 of 312".to_string(),
            body: "alpha\nbravo\ncharlie\ndelta\necho\n".to_string(),
            first_shown: 1,
            sent_count: 5,
            total_count: 312,
            ..PanelResult::default()
        };
        state.apply(
            SessionDelta::for_query(1).with_panel(PanelKey::of(QueryType::Hits), first_page),
        );

        let second_page = PanelResult {
            title: "Hits 6 - 10 of 312".to_string(),
            body: "foxtrot\ngolf\nhotel\nindia\njuliett\n".to_string(),
            first_shown: 6,
            sent_count: 5,
            total_count: 312,
            mode: PanelMode::Append,
            ..PanelResult::default()
        };
        state.apply(
            SessionDelta::for_query(1).with_panel(PanelKey::of(QueryType::Hits), second_page),
        );

        let hits = &state.panels[&PanelKey::of(QueryType::Hits)];
        assert!(hits.body.contains("alpha"));
        assert!(hits.body.contains("juliett"));
        assert_eq!(hits.sent_count, 10);
        assert_eq!(hits.first_shown, 1);
        assert_eq!(hits.title, "Hits 6 - 10 of 312");
    }

    #[test]
    fn append_onto_a_failed_panel_replaces_it() {
        let mut state = SessionState::default();
        let mut failed = PanelResult::empty("backend error");
        failed.status = PanelStatus::TransportFailed;
        state.apply(
            SessionDelta::for_query(1).with_panel(PanelKey::of(QueryType::Hits), failed),
        );

        let mut page = PanelResult::empty("Hits 6 - 10 of 312");
        page.body = "foxtrot\n".to_string();
        page.sent_count = 5;
        page.mode = PanelMode::Append;
        state.apply(SessionDelta::for_query(1).with_panel(PanelKey::of(QueryType::Hits), page));

        let hits = &state.panels[&PanelKey::of(QueryType::Hits)];
        assert_eq!(hits.status, PanelStatus::Ok);
        assert_eq!(hits.body, "foxtrot\n");
        assert_eq!(hits.sent_count, 5);
    }

    #[test]
    fn scalars_replace_only_when_present() {
        let mut state = SessionState::default();
        let mut first = SessionDelta::for_query(1);
        first.backend_ms = Some(12.4);
        first.total_documents = Some(312);
        state.apply(first);

        let mut second = SessionDelta::for_query(2);
        second.bytes_transferred = Some(4096);
        state.apply(second);

        assert_eq!(state.backend_ms, 12.4);
        assert_eq!(state.total_documents, 312);
        assert_eq!(state.bytes_transferred, 4096);
    }

    #[test]
    fn tallies_add_up_within_one_interaction() {
        let mut state = SessionState::default();
        let mut first = SessionDelta::for_query(1);
        first.backend_ms = Some(3.0);
        first.bytes_transferred = Some(100);
        state.apply(first);

        let mut second = SessionDelta::for_query(1);
        second.backend_ms = Some(2.0);
        second.bytes_transferred = Some(50);
        state.apply(second);
        assert_eq!(state.backend_ms, 5.0);
        assert_eq!(state.bytes_transferred, 150);

        // The next interaction starts its tallies over.
        let mut next = SessionDelta::for_query(2);
        next.backend_ms = Some(1.0);
        next.bytes_transferred = Some(10);
        state.apply(next);
        assert_eq!(state.backend_ms, 1.0);
        assert_eq!(state.bytes_transferred, 10);
    }

    #[test]
    fn newer_delta_clears_previous_error() {
        let mut state = SessionState::default();
        let mut failed = SessionDelta::for_query(1);
        failed.error = Some("backend unreachable".to_string());
        state.apply(failed);
        assert!(state.error.is_some());

        state.apply(SessionDelta::for_query(2));
        assert!(state.error.is_none());
    }

    #[test]
    fn applied_ids_never_regress() {
        let mut state = SessionState::default();
        for id in [1, 4, 2, 6, 3, 6] {
            state.apply(SessionDelta::for_query(id));
        }
        assert_eq!(state.last_query_id, 6);
    }
}
