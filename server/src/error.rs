//! Fatal, process-ending errors.
//!
//! Only the **fatal transport** class from the error-handling design lives
//! here: socket setup at startup, and short sends at runtime. Malformed
//! ingress is handled entirely through `shared::protocol::IngressRejection`
//! and never escapes the receive loop as a `Result::Err`; `WouldBlock` on
//! `recv` isn't an error at all, just the drain loop's exit condition.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to create UDP socket: {0}")]
    SocketCreate(#[source] io::Error),

    #[error("failed to set socket non-blocking: {0}")]
    SetNonBlocking(#[source] io::Error),

    #[error("failed to bind UDP socket on port {port}: {source}")]
    Bind { port: u16, source: io::Error },

    #[error("send to {peer} was short: sent {sent} of {expected} bytes")]
    ShortSend {
        peer: std::net::SocketAddr,
        sent: usize,
        expected: usize,
    },

    #[error("send to {peer} failed: {source}")]
    SendFailed {
        peer: std::net::SocketAddr,
        source: io::Error,
    },
}
