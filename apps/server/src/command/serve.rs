use super::Command;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use futures::{future, prelude::*};
use std::fs;
use std::sync::{Arc, Mutex};
use tracing::info;

use protocol::BackendClient;
use rpc::{
    Panels,
    panels::{PanelReply, PanelRequest},
};
use session::SessionState;
use tarpc::{
    context::Context,
    server::{self, Channel},
    tokio_serde::formats::Bincode,
};

async fn spawn(fut: impl Future<Output = ()> + Send + 'static) {
    tokio::spawn(fut);
}

#[derive(Clone)]
struct Server {
    dispatcher: Arc<Dispatcher<BackendClient>>,
    session: Arc<Mutex<SessionState>>,
}

impl Panels for Server {
    async fn ping(self, _c: Context) -> String {
        "Pong".to_string()
    }

    async fn panel(self, _c: Context, req: PanelRequest) -> PanelReply {
        let request_id = req.request_id;
        let dispatcher = self.dispatcher.clone();
        let delta = tokio::task::spawn_blocking(move || dispatcher.answer(&req))
            .await
            .unwrap_or_default();

        // The authoritative copy refuses deltas older than what it holds,
        // but the reply still carries them so the client can account for
        // the finished request.
        {
            let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
            session.apply(delta.clone());
        }
        PanelReply { request_id, delta }
    }

    async fn reset(self, _c: Context) -> bool {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        session.reset();
        true
    }
}

pub struct ServeCommand {
    config: Config,
}

impl ServeCommand {
    pub fn new(cfg: Config) -> Self {
        Self { config: cfg }
    }
}

#[async_trait::async_trait]
impl Command for ServeCommand {
    async fn execute(&self) -> Result<()> {
        let unix_socket_path = self
            .config
            .runtime_dir
            .join(config::constants::UNIX_SOCKET_FILE_NAME);

        if let Some(parent) = unix_socket_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if unix_socket_path.exists() {
            fs::remove_file(&unix_socket_path)?;
        }

        let backend = BackendClient::new(
            self.config.backend_host.clone(),
            self.config.backend_port,
        )
        .with_timeouts(self.config.connect_timeout(), self.config.read_timeout());

        info!(
            backend = format!("{}:{}", self.config.backend_host, self.config.backend_port),
            "dispatcher ready"
        );
        info!("listening on {:?}", unix_socket_path);

        let mut listener =
            tarpc::serde_transport::unix::listen(&unix_socket_path, Bincode::default).await?;
        listener.config_mut().max_frame_length(usize::MAX);

        let server = Server {
            dispatcher: Arc::new(Dispatcher::new(backend, self.config.clone())),
            session: Arc::new(Mutex::new(SessionState::default())),
        };

        listener
            .filter_map(|r| future::ready(r.ok()))
            .map(server::BaseChannel::with_defaults)
            .map(|channel| {
                let server = server.clone();
                channel.execute(server.serve()).for_each(spawn)
            })
            .buffer_unordered(10)
            .for_each(|_| async {})
            .await;

        Ok(())
    }
}
