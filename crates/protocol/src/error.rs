use std::io;

/// Transport-level failures of one backend exchange.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connect to completion backend failed: {0}")]
    ConnectFailed(#[source] io::Error),

    /// The peer neither sent data nor closed before the read timeout.
    #[error("read from completion backend timed out")]
    ReadTimeout,

    #[error("backend i/o error: {0}")]
    Io(#[from] io::Error),
}

/// The payload arrived but could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("response carries no structured payload marker")]
    MissingPayload,

    #[error("response payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response payload is missing {0:?}")]
    MissingField(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
