pub mod panels;

use panels::{PanelReply, PanelRequest};

#[tarpc::service]
pub trait Panels {
    /// Heartbeat
    async fn ping() -> String;

    /// Answer one panel request: rewrite, fetch from the backend, format,
    /// and return the session delta.
    async fn panel(req: PanelRequest) -> PanelReply;

    /// Clear the session state, as when the user empties the input.
    async fn reset() -> bool;
}
