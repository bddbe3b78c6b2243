//! Client-side interaction fan-out and reply handling.
//!
//! Every input change opens a new generation: one request per active panel
//! goes out, replies come back in whatever order the dispatcher finishes
//! them. A reply is matched to its slot by the echoed request id; replies
//! from an older generation release their slot and are otherwise ignored,
//! so a slow panel from three keystrokes ago can never overwrite the
//! current results.

use futures::stream::{FuturesUnordered, StreamExt};
use query::{PanelKey, QueryType, history};
use rpc::panels::{PanelReply, PanelRequest};
use session::{PanelMode, SessionState};
use tracing::{debug, warn};

use crate::pool::SlotPool;
use crate::transport::PanelTransport;

/// What became of one incoming reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Applied to the session mirror; `complete` once the whole current
    /// generation has been answered.
    Applied { complete: bool },
    /// Belonged to a superseded generation; slot freed, delta dropped.
    Stale,
    /// Echoed an id no slot is waiting for; dropped.
    Unmatched,
}

pub struct Orchestrator {
    state: SessionState,
    pool: SlotPool,
    generation: u64,
    query_seq: u64,
    active: Vec<QueryType>,
    raw_input: String,
    hits_per_page: u32,
    completions_per_box: u32,
}

impl Orchestrator {
    pub fn new(active: Vec<QueryType>) -> Self {
        Self {
            state: SessionState::default(),
            pool: SlotPool::default(),
            generation: 0,
            query_seq: 0,
            active,
            raw_input: String::new(),
            hits_per_page: 5,
            completions_per_box: 4,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Open a new generation for `input` and build one request per active
    /// panel. Requests from older generations stay outstanding; their
    /// replies will be recognized as stale when they land.
    pub fn start_interaction(&mut self, input: &str) -> Vec<PanelRequest> {
        self.generation += 1;
        self.query_seq += 1;
        self.raw_input = input.to_string();

        self.active
            .iter()
            .map(|&query_type| {
                let panel = PanelKey::of(query_type);
                let request_id = self.pool.acquire(self.generation, panel);
                PanelRequest::new(request_id, self.query_seq, input, panel)
            })
            .collect()
    }

    /// A continuation request appending the next page of hits to the
    /// current interaction.
    pub fn more_hits(&mut self) -> Option<PanelRequest> {
        let hits = self.state.panels.get(&PanelKey::of(QueryType::Hits))?;
        let next_first = hits.first_shown + hits.sent_count;
        if u64::from(next_first) > u64::from(hits.total_count) {
            return None;
        }
        let panel = PanelKey::of(QueryType::Hits);
        let request_id = self.pool.acquire(self.generation, panel);
        let mut req = PanelRequest::new(request_id, self.query_seq, self.raw_input.clone(), panel);
        req.first_hit = next_first;
        req.mode = PanelMode::Append;
        Some(req)
    }

    /// Whether the hits panel still has room and the backend more to give.
    pub fn hits_page_incomplete(&self) -> bool {
        match self.state.panels.get(&PanelKey::of(QueryType::Hits)) {
            Some(hits) => {
                hits.sent_count < self.hits_per_page && hits.sent_count < hits.total_count
            }
            None => false,
        }
    }

    pub fn handle_reply(&mut self, reply: PanelReply) -> ReplyOutcome {
        let Some(slot) = self.pool.release(reply.request_id) else {
            warn!(request_id = reply.request_id, "reply matches no outstanding request");
            return ReplyOutcome::Unmatched;
        };
        if slot.generation != self.generation {
            debug!(
                request_id = reply.request_id,
                generation = slot.generation,
                current = self.generation,
                "discarding reply from superseded interaction"
            );
            return ReplyOutcome::Stale;
        }
        self.state.apply(reply.delta);
        ReplyOutcome::Applied {
            complete: self.pool.outstanding(self.generation) == 0,
        }
    }

    /// The history token for what is currently shown. Cursors record the
    /// requested page size, not the (possibly shorter) returned count, so
    /// replaying the token re-requests the same shape.
    pub fn history_token(&self) -> String {
        let cursors: Vec<history::PanelCursor> = self
            .state
            .panels
            .iter()
            .filter(|(_, panel)| panel.sent_count > 0)
            .map(|(key, panel)| {
                let shown = match key.query_type {
                    QueryType::Hits | QueryType::Joins | QueryType::Relations => {
                        self.hits_per_page
                    }
                    _ => self.completions_per_box,
                };
                history::PanelCursor::with_first(*key, shown, panel.first_shown)
            })
            .collect();
        history::encode(&self.raw_input, &cursors)
    }

    /// Drive one full interaction: fan out, collect replies in completion
    /// order, then top up a short hits page while the backend has more.
    pub async fn interact<T: PanelTransport>(&mut self, transport: &T, input: &str) {
        let requests = self.start_interaction(input);
        self.exchange_all(transport, requests).await;

        // A panel that deduplicated or filtered entries can come back with
        // a short page; refill it while more hits exist.
        let mut refills = 0;
        while self.hits_page_incomplete() && refills < 3 {
            let Some(req) = self.more_hits() else { break };
            self.exchange_all(transport, vec![req]).await;
            refills += 1;
        }
    }

    async fn exchange_all<T: PanelTransport>(&mut self, transport: &T, requests: Vec<PanelRequest>) {
        let mut in_flight: FuturesUnordered<_> = requests
            .into_iter()
            .map(|req| transport.panel(req))
            .collect();
        while let Some(result) = in_flight.next().await {
            match result {
                Ok(reply) => {
                    self.handle_reply(reply);
                }
                Err(e) => warn!(error = %e, "panel request failed in transport"),
            }
        }
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.raw_input.clear();
    }
}
