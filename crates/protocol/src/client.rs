use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::TransportError;
use crate::request::WireRequest;

/// Bytes read back from the backend, split at the payload marker.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Everything from the first structured-markup start marker on.
    pub payload: String,
    /// Transport preamble bytes before the marker (discarded, but counted).
    pub preamble_bytes: usize,
    pub total_bytes: usize,
}

/// The blocking request/response seam. The production implementation is
/// [`BackendClient`]; tests substitute canned exchanges.
pub trait Exchange {
    fn exchange(&self, request: &WireRequest) -> Result<RawResponse, TransportError>;
}

/// Blocking TCP client for the completion backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    host: String,
    port: u16,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl BackendClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_millis(500),
            read_timeout: Duration::from_millis(2500),
        }
    }

    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    fn connect(&self) -> Result<TcpStream, TransportError> {
        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(TransportError::ConnectFailed)?;
        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(TransportError::ConnectFailed(last_err.unwrap_or_else(
            || std::io::Error::new(ErrorKind::NotFound, "no address resolved"),
        )))
    }
}

impl Exchange for BackendClient {
    fn exchange(&self, request: &WireRequest) -> Result<RawResponse, TransportError> {
        let mut stream = self.connect()?;
        stream.set_read_timeout(Some(self.read_timeout))?;

        let line = request.request_line();
        debug!(bytes = line.len(), "sending backend request");
        stream.write_all(line.as_bytes())?;
        stream.flush()?;
        let _ = stream.shutdown(Shutdown::Write);

        // End of response is peer close; there is no length header.
        let mut buf = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    // The socket is dropped before we report the timeout.
                    drop(stream);
                    return Err(TransportError::ReadTimeout);
                }
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        Ok(split_payload(&buf))
    }
}

/// The payload starts at the first `{`; everything before it is transport
/// preamble (status line, headers) and is discarded.
fn split_payload(buf: &[u8]) -> RawResponse {
    match buf.iter().position(|&b| b == b'{') {
        Some(at) => RawResponse {
            payload: String::from_utf8_lossy(&buf[at..]).into_owned(),
            preamble_bytes: at,
            total_bytes: buf.len(),
        },
        None => RawResponse {
            payload: String::new(),
            preamble_bytes: buf.len(),
            total_bytes: buf.len(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn payload_starts_at_first_marker() {
        let raw = split_payload(b"HTTP/1.0 200 OK\r\nContent-Type: json\r\n\r\n{\"result\": {}}");
        assert_eq!(raw.payload, "{\"result\": {}}");
        assert_eq!(raw.preamble_bytes, 40);
        assert_eq!(raw.total_bytes, 54);
    }

    #[test]
    fn response_without_marker_is_all_preamble() {
        let raw = split_payload(b"HTTP/1.0 500 oops\r\n\r\n");
        assert!(raw.payload.is_empty());
        assert_eq!(raw.preamble_bytes, raw.total_bytes);
    }

    #[test]
    fn exchange_against_loopback_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut req = [0u8; 1024];
            let n = socket.read(&mut req).unwrap();
            assert!(String::from_utf8_lossy(&req[..n]).starts_with("GET /?q="));
            socket
                .write_all(b"HTTP/1.0 200 OK\r\n\r\n{\"result\": {\"query\": \"inf*\"}}")
                .unwrap();
        });

        let client = BackendClient::new("127.0.0.1", port);
        let raw = client.exchange(&WireRequest::hits("inf*", 0, 5)).unwrap();
        let body = crate::response::decode(&raw.payload).unwrap();
        assert_eq!(body.query, "inf*");
        assert!(raw.total_bytes > raw.preamble_bytes);
        server.join().unwrap();
    }

    #[test]
    fn silent_peer_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            // Accept, then say nothing until the client gives up.
            let (socket, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(200));
            drop(socket);
        });

        let client = BackendClient::new("127.0.0.1", port)
            .with_timeouts(Duration::from_millis(500), Duration::from_millis(50));
        let err = client.exchange(&WireRequest::hits("inf*", 0, 5)).unwrap_err();
        assert!(matches!(err, TransportError::ReadTimeout));
        server.join().unwrap();
    }

    #[test]
    fn unreachable_backend_is_connect_failed() {
        // Port 1 on loopback is about as reliably closed as it gets.
        let client = BackendClient::new("127.0.0.1", 1)
            .with_timeouts(Duration::from_millis(200), Duration::from_millis(200));
        let err = client.exchange(&WireRequest::hits("x*", 0, 1)).unwrap_err();
        assert!(matches!(err, TransportError::ConnectFailed(_)));
    }
}
