use super::Command;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::Result;

use protocol::BackendClient;
use query::{PanelKey, QueryType, history};
use rpc::panels::PanelRequest;
use session::SessionState;

/// Runs one input through the full pipeline against the configured backend
/// and prints the resulting panels. Useful when setting up a new index.
pub struct ProbeCommand {
    config: Config,
    input: String,
}

impl ProbeCommand {
    pub fn new(cfg: Config, input: String) -> Self {
        Self { config: cfg, input }
    }
}

#[async_trait::async_trait]
impl Command for ProbeCommand {
    async fn execute(&self) -> Result<()> {
        let backend = BackendClient::new(
            self.config.backend_host.clone(),
            self.config.backend_port,
        )
        .with_timeouts(self.config.connect_timeout(), self.config.read_timeout());
        let dispatcher = Dispatcher::new(backend, self.config.clone());

        let mut state = SessionState::default();
        let panels = [
            PanelKey::of(QueryType::Hits),
            PanelKey::of(QueryType::Words),
            PanelKey::of(QueryType::Facets),
        ];
        for (i, panel) in panels.iter().enumerate() {
            let req = PanelRequest::new(i as u64 + 1, 1, self.input.clone(), *panel);
            state.apply(dispatcher.answer(&req));
        }

        for (key, panel) in &state.panels {
            println!("== {key}: {}", panel.title);
            if !panel.body.is_empty() {
                println!("{}", panel.body);
            }
        }
        println!(
            "backend {:.1} ms, {} bytes",
            state.backend_ms, state.bytes_transferred
        );

        let cursors: Vec<history::PanelCursor> = state
            .panels
            .iter()
            .filter(|(_, p)| p.sent_count > 0)
            .map(|(key, p)| {
                let shown = match key.query_type {
                    QueryType::Hits => self.config.hits_per_page,
                    _ => self.config.completions_per_box,
                };
                history::PanelCursor::with_first(*key, shown, p.first_shown)
            })
            .collect();
        println!("history token: {}", history::encode(&self.input, &cursors));

        Ok(())
    }
}
