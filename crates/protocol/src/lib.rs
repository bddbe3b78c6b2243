//! Wire protocol between the dispatcher and the completion backend.
//!
//! The backend speaks a narrow line-oriented protocol: one request line in,
//! a transport preamble plus one structured JSON payload out, end of
//! response signaled by peer close. This crate owns encoding the request
//! line, the blocking exchange with connect/read timeouts, and the tolerant
//! decoder for the payload.

pub mod client;
pub mod error;
pub mod request;
pub mod response;

pub use client::{BackendClient, Exchange, RawResponse};
pub use error::{ParseError, ProtocolError, TransportError};
pub use request::WireRequest;
pub use response::{Completion, Hit, ResponseBody, Section, decode};
