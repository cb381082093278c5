use std::fmt::Debug;
use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::domain::federation_model::intercomponent::protocol::Envelope;
use crate::error::Error;

/// Failures of the transport itself, never of the remote operation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Peer {0} is unreachable")]
    Unreachable(String),

    #[error("No answer from peer {peer} within {timeout:?}")]
    Timeout { peer: String, timeout: Duration },

    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Transport I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<TransportError> for Error {
    fn from(error: TransportError) -> Self {
        Error::UnavailableProvider(error.to_string())
    }
}

/// Blocking request/response channel to peer members. Every call is bounded by a timeout.
pub trait RpcChannel: Send + Sync + Debug {
    /// Delivers `envelope` to `envelope.target` and waits for the matching response envelope.
    fn call(&self, envelope: Envelope) -> Result<Envelope, TransportError>;
}

/// Server side of a channel: turns a request envelope into its response envelope.
pub trait EnvelopeHandler: Send + Sync + Debug {
    fn handle(&self, envelope: Envelope) -> Envelope;
}
