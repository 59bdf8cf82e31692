//! Oscine Server
//!
//! Address dispatch and serve loops for OSC:
//! - [`Dispatcher`]: a registration-ordered table mapping literal
//!   addresses to handlers, matched against incoming address patterns
//! - Bundle scheduling that honors embedded time tags and stays
//!   responsive to shutdown
//! - [`Server`]: worker-pool serve loops over the transport bindings
//!
//! # Example
//!
//! ```no_run
//! use oscine_server::{Dispatcher, Server};
//! use oscine_transport::UdpEndpoint;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut dispatcher = Dispatcher::new();
//!     dispatcher.register("/synth/freq", |msg| {
//!         println!("freq -> {:?}", msg.args);
//!         Ok(())
//!     })?;
//!
//!     let endpoint = UdpEndpoint::bind("0.0.0.0:57120").await?;
//!     Server::new(dispatcher).serve_udp(endpoint).await?;
//!     Ok(())
//! }
//! ```

pub mod dispatcher;
pub mod error;
pub mod server;

pub use dispatcher::{Dispatcher, HandlerResult};
pub use error::{Result, ServerError};
pub use server::{Server, ServerConfig};
