//! UDP transport implementation
//!
//! OSC's native transport. Datagram boundaries frame packets, so no
//! further framing is applied.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use oscine_core::Packet;
use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::{Result, TransportError};
use crate::traits::{TransportEvent, TransportReceiver, TransportSender};

/// UDP configuration
#[derive(Debug, Clone)]
pub struct UdpConfig {
    /// Receive buffer size per datagram
    pub recv_buffer_size: usize,
    /// Maximum packet size
    pub max_packet_size: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            recv_buffer_size: 65536,
            max_packet_size: 65507, // Max UDP payload
        }
    }
}

/// UDP endpoint (connectionless)
pub struct UdpEndpoint {
    socket: Arc<UdpSocket>,
    config: UdpConfig,
}

impl UdpEndpoint {
    /// Bind to a local address
    pub async fn bind(addr: &str) -> Result<Self> {
        Self::bind_with_config(addr, UdpConfig::default()).await
    }

    /// Bind with config
    pub async fn bind_with_config(addr: &str, config: UdpConfig) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        if let Ok(local) = socket.local_addr() {
            info!("UDP bound to {}", local);
        }

        Ok(Self {
            socket: Arc::new(socket),
            config,
        })
    }

    /// Bind an ephemeral local port and direct plain `send` calls at
    /// `remote`.
    pub async fn connect(remote: &str) -> Result<Self> {
        let endpoint = Self::bind("0.0.0.0:0").await?;
        endpoint
            .socket
            .connect(remote)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(endpoint)
    }

    /// Get local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(TransportError::Io)
    }

    /// Receive one datagram and its source address
    pub async fn recv_from(&self) -> Result<(Bytes, SocketAddr)> {
        let mut buf = vec![0u8; self.config.max_packet_size];
        let (len, from) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;
        debug!("UDP received {} bytes from {}", len, from);
        buf.truncate(len);
        Ok((Bytes::from(buf), from))
    }

    /// Send to the connected remote
    pub async fn send(&self, data: &[u8]) -> Result<()> {
        self.socket
            .send(data)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }

    /// Send to a specific address
    pub async fn send_to(&self, data: &[u8], target: SocketAddr) -> Result<()> {
        self.socket
            .send_to(data, target)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }

    /// Encode and send a packet to the connected remote
    pub async fn send_packet(&self, packet: &Packet) -> Result<()> {
        self.send(&packet.encode()).await
    }

    /// Encode and send a packet to a specific address
    pub async fn send_packet_to(&self, packet: &Packet, target: SocketAddr) -> Result<()> {
        self.send_to(&packet.encode(), target).await
    }

    /// Enable broadcast
    pub fn set_broadcast(&self, enable: bool) -> Result<()> {
        self.socket
            .set_broadcast(enable)
            .map_err(TransportError::Io)
    }

    /// Join an IPv4 multicast group on the given interface
    pub fn join_multicast_v4(&self, group: Ipv4Addr, interface: Ipv4Addr) -> Result<()> {
        self.socket
            .join_multicast_v4(group, interface)
            .map_err(TransportError::Io)
    }

    /// Create a sender for a specific remote address
    pub fn sender_to(&self, remote: SocketAddr) -> UdpSender {
        UdpSender {
            socket: self.socket.clone(),
            remote,
            connected: Arc::new(Mutex::new(true)),
        }
    }

    /// Start receiving datagrams on a background task
    pub fn start_receiver(&self) -> UdpReceiver {
        let (tx, rx) = mpsc::channel(100);
        let socket = self.socket.clone();
        let max_size = self.config.max_packet_size;

        tokio::spawn(async move {
            let mut buf = vec![0u8; max_size];

            loop {
                match socket.recv_from(&mut buf).await {
                    Ok((len, from)) => {
                        debug!("UDP received {} bytes from {}", len, from);
                        let data = Bytes::copy_from_slice(&buf[..len]);
                        if tx.send((TransportEvent::Data(data), from)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("UDP receive error: {}", e);
                        if tx
                            .send((
                                TransportEvent::Error(e.to_string()),
                                SocketAddr::from(([0, 0, 0, 0], 0)),
                            ))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }
        });

        UdpReceiver { rx }
    }
}

/// UDP sender (to a specific remote)
pub struct UdpSender {
    socket: Arc<UdpSocket>,
    remote: SocketAddr,
    connected: Arc<Mutex<bool>>,
}

#[async_trait]
impl TransportSender for UdpSender {
    async fn send(&self, data: Bytes) -> Result<()> {
        self.socket
            .send_to(&data, self.remote)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn close(&self) -> Result<()> {
        *self.connected.lock() = false;
        Ok(())
    }
}

/// UDP receiver
pub struct UdpReceiver {
    rx: mpsc::Receiver<(TransportEvent, SocketAddr)>,
}

impl UdpReceiver {
    /// Receive the next event with source address
    pub async fn recv_from(&mut self) -> Option<(TransportEvent, SocketAddr)> {
        self.rx.recv().await
    }
}

#[async_trait]
impl TransportReceiver for UdpReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await.map(|(event, _)| event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ephemeral() {
        let endpoint = UdpEndpoint::bind("127.0.0.1:0").await.unwrap();
        assert!(endpoint.local_addr().unwrap().port() > 0);
    }

    #[tokio::test]
    async fn test_send_recv() {
        let server = UdpEndpoint::bind("127.0.0.1:0").await.unwrap();
        let client = UdpEndpoint::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();

        client.send_to(b"/ping\0\0\0", server_addr).await.unwrap();

        let (data, from) = server.recv_from().await.unwrap();
        assert_eq!(data.as_ref(), b"/ping\0\0\0");
        assert_eq!(from.port(), client.local_addr().unwrap().port());
    }
}
