//! Non-blocking UDP endpoint.
//!
//! Grounded on `examples/original_source/src/cpsock.h`/`.c`: non-blocking
//! mode, IPv6-primary with IPv4 fallback, and peer-address equality.
//! Re-expressed over `std::net::UdpSocket` instead of the C sockets API,
//! and over `tokio::net::UdpSocket` instead of the teacher's — the single-
//! threaded mandate (SPEC_FULL.md §5) rules out tokio's multi-task runtime
//! for this socket.

use std::io;
use std::net::{SocketAddr, UdpSocket};

use crate::error::ServerError;

/// A bound, non-blocking UDP socket.
pub struct Socket {
    udp: UdpSocket,
    local_addr: SocketAddr,
}

impl Socket {
    /// Binds on IPv6 `[::]:port`, falling back to IPv4 `0.0.0.0:port` if the
    /// IPv6 bind fails (disabled hosts, IPv6-less containers, ...) or if
    /// `ipv4_only` is set. Puts the socket into non-blocking mode before
    /// returning it.
    pub fn bind(port: u16, ipv4_only: bool) -> Result<Self, ServerError> {
        let udp = if ipv4_only {
            UdpSocket::bind(("0.0.0.0", port)).map_err(|source| ServerError::Bind { port, source })?
        } else {
            match UdpSocket::bind(("::", port)) {
                Ok(udp) => udp,
                Err(_) => UdpSocket::bind(("0.0.0.0", port))
                    .map_err(|source| ServerError::Bind { port, source })?,
            }
        };
        udp.set_nonblocking(true)
            .map_err(ServerError::SetNonBlocking)?;
        let local_addr = udp.local_addr().map_err(|source| ServerError::Bind { port, source })?;
        Ok(Socket { udp, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receives one datagram without blocking. `Ok(None)` means there was
    /// nothing to read (`WouldBlock`), which is not an error: it's the
    /// drain loop's termination condition.
    pub fn recv_nonblocking(&self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        match self.udp.recv_from(buf) {
            Ok((len, peer)) => Ok(Some((len, peer))),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Sends `bytes` to `peer`. A short write is treated as a fatal
    /// transport error: UDP sends are atomic, so any shortfall means the
    /// transport is broken in a way that isn't safe to paper over.
    pub fn send(&self, peer: SocketAddr, bytes: &[u8]) -> Result<(), ServerError> {
        let sent = self
            .udp
            .send_to(bytes, peer)
            .map_err(|source| ServerError::SendFailed { peer, source })?;
        if sent != bytes.len() {
            return Err(ServerError::ShortSend {
                peer,
                sent,
                expected: bytes.len(),
            });
        }
        Ok(())
    }
}

/// `std::net::SocketAddr`'s derived equality already compares address
/// family, port, address bytes, and (for IPv6) flowinfo and scope id — the
/// exact rule the protocol's equality invariant calls for — so peer
/// identity is just `==` on `SocketAddr`. Kept as a named function so call
/// sites read the same way the distilled spec's `peers_equal` does.
pub fn peers_equal(a: SocketAddr, b: SocketAddr) -> bool {
    a == b
}

pub fn peer_to_string(peer: SocketAddr) -> String {
    peer.to_string()
}
