//! Server error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    /// Codec or address error
    #[error(transparent)]
    Core(#[from] oscine_core::Error),

    /// Transport failure
    #[error(transparent)]
    Transport(#[from] oscine_transport::TransportError),

    /// A handler returned an error
    #[error("handler for {address} failed: {source}")]
    Handler {
        address: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Several handlers failed while dispatching one bundle
    #[error("{} handler error(s) while dispatching bundle", .0.len())]
    Aggregate(Vec<ServerError>),

    /// Registration under an address that already has a handler
    #[error("duplicate handler address: {0}")]
    DuplicateAddress(String),

    /// Dispatch abandoned because the server is shutting down
    #[error("server is shutting down")]
    ShuttingDown,
}
