//! Serve loops
//!
//! One reader task per transport feeds a bounded channel; a fixed
//! pool of workers drains it, sniffs each datagram's leading byte,
//! parses, and hands the packet to the dispatcher. Datagrams from
//! different sources may be handled in any order; packets inside one
//! bundle keep their encoded order.

use std::sync::Arc;

use bytes::Bytes;
use oscine_core::Packet;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error, info, warn};

use oscine_transport::{TcpServer, TransportEvent, TransportReceiver, UdpEndpoint};

#[cfg(unix)]
use oscine_transport::UnixEndpoint;

use crate::dispatcher::Dispatcher;
use crate::error::{Result, ServerError};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Number of dispatch workers (default: 4)
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Capacity of the datagram queue feeding the workers
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// OSC server: an immutable dispatcher plus a worker pool.
pub struct Server {
    dispatcher: Arc<Dispatcher>,
    config: ServerConfig,
    shutdown_tx: watch::Sender<bool>,
}

impl Server {
    /// Create a server with default config.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::with_config(dispatcher, ServerConfig::default())
    }

    /// Create a server with explicit config.
    pub fn with_config(dispatcher: Dispatcher, config: ServerConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            dispatcher: Arc::new(dispatcher),
            config,
            shutdown_tx,
        }
    }

    /// Signal every serve loop and pending bundle delay to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// A receiver that observes [`Server::shutdown`].
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Serve OSC over UDP until the socket fails or shutdown fires.
    pub async fn serve_udp(&self, endpoint: UdpEndpoint) -> Result<()> {
        if let Ok(local) = endpoint.local_addr() {
            info!(addr = %local, workers = self.config.workers, "serving OSC over UDP");
        }
        self.serve(endpoint.start_receiver()).await
    }

    /// Serve OSC over a Unix datagram socket.
    #[cfg(unix)]
    pub async fn serve_unix(&self, endpoint: UnixEndpoint) -> Result<()> {
        info!(workers = self.config.workers, "serving OSC over unix datagram socket");
        self.serve(endpoint.start_receiver()).await
    }

    /// Serve OSC over TCP, accepting connections until shutdown.
    ///
    /// Each accepted connection gets a pump task that forwards its
    /// framed packets into the shared worker queue.
    pub async fn serve_tcp(&self, mut listener: TcpServer) -> Result<()> {
        if let Ok(local) = listener.local_addr() {
            info!(addr = %local, workers = self.config.workers, "serving OSC over TCP");
        }

        let (tx, rx) = mpsc::channel::<Bytes>(self.config.queue_capacity);
        let workers = self.spawn_workers(rx);
        let mut shutdown = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                accepted = listener.accept() => {
                    let (_conn_tx, mut conn_rx, peer) = accepted?;
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        while let Some(event) = conn_rx.recv().await {
                            match event {
                                TransportEvent::Data(data) => {
                                    if tx.send(data).await.is_err() {
                                        break;
                                    }
                                }
                                TransportEvent::Disconnected { .. } => break,
                                TransportEvent::Error(e) => {
                                    error!(peer = %peer, error = %e, "TCP receive error");
                                    break;
                                }
                            }
                        }
                        debug!(peer = %peer, "TCP connection done");
                    });
                }
            }
        }

        drop(tx);
        for worker in workers {
            let _ = worker.await;
        }
        Ok(())
    }

    /// Drive any transport receiver through the worker pool.
    pub async fn serve<R: TransportReceiver>(&self, mut receiver: R) -> Result<()> {
        let (tx, rx) = mpsc::channel::<Bytes>(self.config.queue_capacity);
        let workers = self.spawn_workers(rx);
        let mut shutdown = self.shutdown_tx.subscribe();

        let result = loop {
            tokio::select! {
                _ = shutdown.changed() => break Ok(()),
                event = receiver.recv() => match event {
                    Some(TransportEvent::Data(data)) => {
                        if tx.send(data).await.is_err() {
                            break Ok(());
                        }
                    }
                    Some(TransportEvent::Disconnected { reason }) => {
                        debug!(?reason, "transport disconnected");
                        break Ok(());
                    }
                    Some(TransportEvent::Error(e)) => {
                        error!(error = %e, "transport read error");
                        break Err(ServerError::Transport(
                            oscine_transport::TransportError::ReceiveFailed(e),
                        ));
                    }
                    None => break Ok(()),
                },
            }
        };

        drop(tx);
        for worker in workers {
            let _ = worker.await;
        }
        result
    }

    fn spawn_workers(&self, rx: mpsc::Receiver<Bytes>) -> Vec<tokio::task::JoinHandle<()>> {
        let queue = Arc::new(Mutex::new(rx));
        (0..self.config.workers.max(1))
            .map(|id| {
                let worker = Worker {
                    id,
                    dispatcher: self.dispatcher.clone(),
                    queue: queue.clone(),
                    shutdown: self.shutdown_tx.subscribe(),
                };
                tokio::spawn(worker.run())
            })
            .collect()
    }
}

/// One dispatch worker pulling datagrams off the shared queue.
struct Worker {
    id: usize,
    dispatcher: Arc<Dispatcher>,
    queue: Arc<Mutex<mpsc::Receiver<Bytes>>>,
    shutdown: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            let data = tokio::select! {
                _ = self.shutdown.changed() => break,
                data = async { self.queue.lock().await.recv().await } => data,
            };
            let Some(data) = data else { break };
            if let Err(e) = self.handle(&data).await {
                warn!(worker = self.id, error = %e, "dispatch failed");
            }
        }
        debug!(worker = self.id, "worker stopped");
    }

    async fn handle(&mut self, data: &[u8]) -> Result<()> {
        let packet = Packet::parse(data)?;
        self.dispatcher.dispatch(&packet, &mut self.shutdown).await
    }
}
