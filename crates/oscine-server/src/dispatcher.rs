//! Address dispatch
//!
//! Handlers register under literal addresses, validated against the
//! OSC disallowed-character set. Incoming message addresses carry the
//! pattern syntax; the first registered address the pattern matches
//! wins, walked in registration order so dispatch is reproducible.

use oscine_core::{pattern, Bundle, Message, Packet, Timetag};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{Result, ServerError};

/// Result type returned by message handlers.
pub type HandlerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Handler = Box<dyn Fn(&Message) -> HandlerResult + Send + Sync>;

struct Method {
    address: String,
    handler: Handler,
}

/// Registration-ordered table of OSC methods.
///
/// The table is built once at setup and read concurrently while
/// serving; no mutation API exists after that, so no locking either.
#[derive(Default)]
pub struct Dispatcher {
    methods: Vec<Method>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a literal address.
    ///
    /// The address must start with `/` and may not contain any of
    /// `* ? , [ ] { } #` or space. Addresses are unique; a second
    /// registration under the same one is rejected.
    pub fn register<F>(&mut self, address: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(&Message) -> HandlerResult + Send + Sync + 'static,
    {
        let address = address.into();
        pattern::validate_address(&address)?;
        if self.methods.iter().any(|m| m.address == address) {
            return Err(ServerError::DuplicateAddress(address));
        }
        self.methods.push(Method {
            address,
            handler: Box::new(handler),
        });
        Ok(())
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Invoke the first handler whose address the message's pattern
    /// matches. Unmatched messages are dropped silently.
    pub fn invoke(&self, msg: &Message) -> Result<()> {
        for method in &self.methods {
            if msg.matches(&method.address)? {
                return (method.handler)(msg).map_err(|source| ServerError::Handler {
                    address: method.address.clone(),
                    source,
                });
            }
        }
        debug!(address = %msg.address, "no handler matched");
        Ok(())
    }

    /// Dispatch a packet, honoring bundle time tags.
    ///
    /// A bundle whose tag lies in the future suspends the calling
    /// task until it is due; the `shutdown` signal interrupts that
    /// suspension with [`ServerError::ShuttingDown`].
    pub async fn dispatch(
        &self,
        packet: &Packet,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<()> {
        match packet {
            Packet::Message(msg) => self.invoke(msg),
            Packet::Bundle(bundle) => self.dispatch_bundle(bundle, shutdown).await,
        }
    }

    /// Dispatch a packet without an external shutdown signal.
    pub async fn dispatch_packet(&self, packet: &Packet) -> Result<()> {
        let (tx, mut rx) = watch::channel(false);
        let result = self.dispatch(packet, &mut rx).await;
        drop(tx);
        result
    }

    async fn dispatch_bundle(
        &self,
        bundle: &Bundle,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<()> {
        wait_until_due(bundle.timetag, shutdown).await?;

        let mut errors = Vec::new();
        for packet in &bundle.packets {
            let result = match packet {
                Packet::Message(msg) => self.invoke(msg),
                Packet::Bundle(nested) => {
                    if nested.timetag < bundle.timetag {
                        Err(ServerError::Core(oscine_core::Error::EarlyTimetag))
                    } else {
                        Box::pin(self.dispatch_bundle(nested, shutdown)).await
                    }
                }
            };
            if let Err(e) = result {
                errors.push(e);
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ServerError::Aggregate(errors)),
        }
    }
}

/// Suspend until `timetag` is due, or until shutdown fires.
async fn wait_until_due(timetag: Timetag, shutdown: &mut watch::Receiver<bool>) -> Result<()> {
    let wait = timetag.expires_in();
    if wait.is_zero() {
        return Ok(());
    }
    if *shutdown.borrow() {
        return Err(ServerError::ShuttingDown);
    }
    tokio::select! {
        _ = sleep(wait) => Ok(()),
        _ = shutdown.changed() => Err(ServerError::ShuttingDown),
    }
}
