//! Unix datagram transport implementation
//!
//! Same datagram framing as UDP, restricted to the local host. Useful
//! for talking to synthesis engines over the filesystem namespace.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use oscine_core::Packet;
use tokio::net::UnixDatagram;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::{Result, TransportError};
use crate::traits::{TransportEvent, TransportReceiver};
use crate::udp::UdpConfig;

/// Unix datagram endpoint
pub struct UnixEndpoint {
    socket: Arc<UnixDatagram>,
    config: UdpConfig,
}

impl UnixEndpoint {
    /// Bind to a socket path
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let socket = UnixDatagram::bind(path.as_ref())
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        info!("unix datagram bound to {}", path.as_ref().display());

        Ok(Self {
            socket: Arc::new(socket),
            config: UdpConfig::default(),
        })
    }

    /// Create an unbound socket directed at `remote`
    pub fn dial(remote: impl AsRef<Path>) -> Result<Self> {
        let socket = UnixDatagram::unbound()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        socket
            .connect(remote.as_ref())
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            socket: Arc::new(socket),
            config: UdpConfig::default(),
        })
    }

    /// Receive one datagram and its source path, if the sender bound
    /// one
    pub async fn recv_from(&self) -> Result<(Bytes, Option<PathBuf>)> {
        let mut buf = vec![0u8; self.config.max_packet_size];
        let (len, from) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;
        debug!("unix datagram received {} bytes", len);
        buf.truncate(len);
        Ok((
            Bytes::from(buf),
            from.as_pathname().map(Path::to_path_buf),
        ))
    }

    /// Send to the connected remote
    pub async fn send(&self, data: &[u8]) -> Result<()> {
        self.socket
            .send(data)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }

    /// Send to a specific socket path
    pub async fn send_to(&self, data: &[u8], target: impl AsRef<Path>) -> Result<()> {
        self.socket
            .send_to(data, target.as_ref())
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }

    /// Encode and send a packet to the connected remote
    pub async fn send_packet(&self, packet: &Packet) -> Result<()> {
        self.send(&packet.encode()).await
    }

    /// Encode and send a packet to a specific socket path
    pub async fn send_packet_to(&self, packet: &Packet, target: impl AsRef<Path>) -> Result<()> {
        self.send_to(&packet.encode(), target).await
    }

    /// Start receiving datagrams on a background task
    pub fn start_receiver(&self) -> UnixReceiver {
        let (tx, rx) = mpsc::channel(100);
        let socket = self.socket.clone();
        let max_size = self.config.max_packet_size;

        tokio::spawn(async move {
            let mut buf = vec![0u8; max_size];

            loop {
                match socket.recv(&mut buf).await {
                    Ok(len) => {
                        let data = Bytes::copy_from_slice(&buf[..len]);
                        if tx.send(TransportEvent::Data(data)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("unix datagram receive error: {}", e);
                        if tx.send(TransportEvent::Error(e.to_string())).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        UnixReceiver { rx }
    }
}

/// Unix datagram receiver
pub struct UnixReceiver {
    rx: mpsc::Receiver<TransportEvent>,
}

#[async_trait]
impl TransportReceiver for UnixReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}

/// An unused socket path under the system temp directory.
pub fn temp_socket_path() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("oscine-{}-{}.sock", std::process::id(), nanos))
}
