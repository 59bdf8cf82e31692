//! Transport trait definitions

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Events that can occur on a transport
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Packet bytes received
    Data(Bytes),
    /// Connection closed (clean or error)
    Disconnected { reason: Option<String> },
    /// Error occurred
    Error(String),
}

/// Trait for sending packet bytes
#[async_trait]
pub trait TransportSender: Send + Sync {
    /// Send one packet's bytes
    async fn send(&self, data: Bytes) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Close the sender
    async fn close(&self) -> Result<()>;
}

/// Trait for receiving transport events
#[async_trait]
pub trait TransportReceiver: Send {
    /// Receive the next event; `None` once the source is gone
    async fn recv(&mut self) -> Option<TransportEvent>;
}
