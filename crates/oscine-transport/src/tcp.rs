//! TCP transport implementation
//!
//! OSC over a stream needs its own framing: each packet is preceded
//! by a 4-byte big-endian length word. Codec sniffing and dispatch
//! stay identical to the datagram transports.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use oscine_core::Packet;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::{Result, TransportError};
use crate::traits::{TransportEvent, TransportReceiver, TransportSender};

/// Maximum packet size (64KB)
const MAX_PACKET_SIZE: usize = 64 * 1024;

/// Default channel buffer size for TCP connections
const DEFAULT_CHANNEL_BUFFER_SIZE: usize = 1000;

/// TCP configuration
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Maximum framed packet size in bytes
    pub max_packet_size: usize,
    /// Read buffer size
    pub read_buffer_size: usize,
    /// Keep-alive interval in seconds (0 = disabled)
    pub keepalive_secs: u64,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            max_packet_size: MAX_PACKET_SIZE,
            read_buffer_size: 8192,
            keepalive_secs: 30,
        }
    }
}

/// TCP transport
pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self {
            config: TcpConfig::default(),
        }
    }

    pub fn with_config(config: TcpConfig) -> Self {
        Self { config }
    }

    /// Connect to a TCP server
    pub async fn connect(&self, addr: &str) -> Result<(TcpSender, TcpReceiver)> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        // Enable TCP keepalive if configured
        if self.config.keepalive_secs > 0 {
            let socket = socket2::SockRef::from(&stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(std::time::Duration::from_secs(self.config.keepalive_secs));
            let _ = socket.set_tcp_keepalive(&keepalive);
        }

        info!("TCP connected to {}", addr);
        Ok(spawn_connection(stream, self.config.max_packet_size))
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire a connected stream to sender/receiver channel halves.
fn spawn_connection(stream: TcpStream, max_size: usize) -> (TcpSender, TcpReceiver) {
    let connected = Arc::new(Mutex::new(true));
    let (outgoing_tx, outgoing_rx) = mpsc::channel::<Bytes>(DEFAULT_CHANNEL_BUFFER_SIZE);
    let (incoming_tx, incoming_rx) = mpsc::channel::<TransportEvent>(DEFAULT_CHANNEL_BUFFER_SIZE);

    let sender = TcpSender {
        tx: outgoing_tx,
        connected: connected.clone(),
    };
    let receiver = TcpReceiver { rx: incoming_rx };

    let connected_clone = connected.clone();
    tokio::spawn(async move {
        let (reader, writer) = stream.into_split();
        run_tcp_io_loop(reader, writer, outgoing_rx, incoming_tx, max_size, connected_clone)
            .await;
    });

    (sender, receiver)
}

/// Shared io loop for TCP connections.
///
/// The write half lives only here, so concurrent `send` calls
/// serialize through the outgoing channel and frames never interleave.
async fn run_tcp_io_loop(
    mut reader: OwnedReadHalf,
    mut writer: OwnedWriteHalf,
    mut outgoing_rx: mpsc::Receiver<Bytes>,
    incoming_tx: mpsc::Sender<TransportEvent>,
    max_size: usize,
    connected: Arc<Mutex<bool>>,
) {
    let mut read_buf = BytesMut::with_capacity(8192);

    loop {
        tokio::select! {
            Some(data) = outgoing_rx.recv() => {
                let mut frame = BytesMut::with_capacity(4 + data.len());
                frame.put_u32(data.len() as u32);
                frame.extend_from_slice(&data);

                if let Err(e) = writer.write_all(&frame).await {
                    error!("TCP write error: {}", e);
                    break;
                }
            }

            result = reader.read_buf(&mut read_buf) => {
                match result {
                    Ok(0) => {
                        debug!("TCP connection closed");
                        let _ = incoming_tx.send(TransportEvent::Disconnected { reason: None }).await;
                        break;
                    }
                    Ok(_) => {
                        while read_buf.len() >= 4 {
                            let len = (&read_buf[..4]).get_u32() as usize;

                            if len > max_size {
                                error!("TCP frame too large: {} > {}", len, max_size);
                                let _ = incoming_tx.send(TransportEvent::Disconnected {
                                    reason: Some(format!("frame too large: {len}"))
                                }).await;
                                return;
                            }

                            if read_buf.len() >= 4 + len {
                                read_buf.advance(4);
                                let data = read_buf.split_to(len).freeze();
                                if incoming_tx.send(TransportEvent::Data(data)).await.is_err() {
                                    break;
                                }
                            } else {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        error!("TCP read error: {}", e);
                        let _ = incoming_tx.send(TransportEvent::Error(e.to_string())).await;
                        break;
                    }
                }
            }
        }
    }

    *connected.lock() = false;
}

/// TCP sender for writing framed packets
pub struct TcpSender {
    tx: mpsc::Sender<Bytes>,
    connected: Arc<Mutex<bool>>,
}

impl TcpSender {
    /// Encode and send a packet
    pub async fn send_packet(&self, packet: &Packet) -> Result<()> {
        self.send(packet.encode()).await
    }
}

#[async_trait]
impl TransportSender for TcpSender {
    async fn send(&self, data: Bytes) -> Result<()> {
        if !*self.connected.lock() {
            return Err(TransportError::NotConnected);
        }

        self.tx
            .send(data)
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn close(&self) -> Result<()> {
        *self.connected.lock() = false;
        Ok(())
    }
}

/// TCP receiver for reading framed packets
pub struct TcpReceiver {
    rx: mpsc::Receiver<TransportEvent>,
}

#[async_trait]
impl TransportReceiver for TcpReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}

/// TCP server for accepting connections
pub struct TcpServer {
    listener: TcpListener,
    config: TcpConfig,
}

impl TcpServer {
    /// Bind to an address
    pub async fn bind(addr: &str) -> Result<Self> {
        Self::bind_with_config(addr, TcpConfig::default()).await
    }

    /// Bind with custom configuration
    pub async fn bind_with_config(addr: &str, config: TcpConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        info!("TCP server listening on {}", addr);

        Ok(Self { listener, config })
    }

    /// Accept one connection
    pub async fn accept(&mut self) -> Result<(TcpSender, TcpReceiver, SocketAddr)> {
        let (stream, peer_addr) = self
            .listener
            .accept()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        info!("TCP connection accepted from {}", peer_addr);

        let (sender, receiver) = spawn_connection(stream, self.config.max_packet_size);
        Ok((sender, receiver, peer_addr))
    }

    /// Get the listener's local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(TransportError::Io)
    }
}
