//! Oscine Transport Layer
//!
//! Byte-moving bindings for OSC packets:
//! - UDP (the protocol's native transport, datagram-framed)
//! - Unix datagram sockets (same framing, local only)
//! - TCP (length-prefixed stream framing)
//!
//! Transports carry opaque packet bytes; parsing and dispatch live in
//! `oscine-core` and `oscine-server`.

pub mod error;
pub mod tcp;
pub mod traits;
pub mod udp;

#[cfg(unix)]
pub mod unix;

pub use error::{Result, TransportError};
pub use tcp::{TcpConfig, TcpReceiver, TcpSender, TcpServer, TcpTransport};
pub use traits::{TransportEvent, TransportReceiver, TransportSender};
pub use udp::{UdpConfig, UdpEndpoint, UdpReceiver, UdpSender};

#[cfg(unix)]
pub use unix::{temp_socket_path, UnixEndpoint, UnixReceiver};
