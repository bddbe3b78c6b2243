use std::path::Path;

use rpc::PanelsClient;
use rpc::panels::{PanelRequest, PanelReply};
use tarpc::{client, context, tokio_serde::formats::Bincode};

pub type TransportResult<T> = Result<T, tarpc::client::RpcError>;

/// The dispatcher connection seam. Production talks tarpc over the unix
/// socket; tests substitute scripted transports.
#[async_trait::async_trait]
pub trait PanelTransport {
    async fn panel(&self, req: PanelRequest) -> TransportResult<PanelReply>;
    async fn reset(&self) -> TransportResult<bool>;
}

pub struct DispatcherTransport {
    client: PanelsClient,
}

impl DispatcherTransport {
    /// Connect to the dispatcher's unix socket.
    pub async fn connect(socket_path: &Path) -> color_eyre::Result<Self> {
        let transport = tarpc::serde_transport::unix::connect(socket_path, Bincode::default).await?;
        let client = PanelsClient::new(client::Config::default(), transport).spawn();
        Ok(Self { client })
    }

    pub async fn ping(&self) -> TransportResult<String> {
        self.client.ping(context::current()).await
    }
}

#[async_trait::async_trait]
impl PanelTransport for DispatcherTransport {
    async fn panel(&self, req: PanelRequest) -> TransportResult<PanelReply> {
        self.client.panel(context::current(), req).await
    }

    async fn reset(&self) -> TransportResult<bool> {
        self.client.reset(context::current()).await
    }
}
