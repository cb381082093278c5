use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::future::Future;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio_util::codec::{Decoder, Framed};

use crate::domain::federation_model::intercomponent::codec::EnvelopeCodec;
use crate::domain::federation_model::intercomponent::protocol::Envelope;
use crate::domain::federation_model::intercomponent::rpc_channel::{EnvelopeHandler, RpcChannel, TransportError};
use crate::domain::federation_model::utils::id::MemberId;

const READ_CHUNK: usize = 8 * 1024;

/// Client side of the TCP transport: one short-lived blocking connection per call.
#[derive(Debug, Clone)]
pub struct TcpRpcChannel {
    peers: HashMap<MemberId, String>,
    timeout: Duration,
}

impl TcpRpcChannel {
    pub fn new(peers: HashMap<MemberId, String>, timeout: Duration) -> Self {
        Self { peers, timeout }
    }

    fn resolve(&self, peer: &MemberId) -> Result<SocketAddr, TransportError> {
        let address = self.peers.get(peer).ok_or_else(|| TransportError::Unreachable(format!("{} (no known address)", peer)))?;
        address
            .to_socket_addrs()
            .map_err(|e| TransportError::Unreachable(format!("{} ({}: {})", peer, address, e)))?
            .next()
            .ok_or_else(|| TransportError::Unreachable(format!("{} ({} does not resolve)", peer, address)))
    }

    fn classify(&self, peer: &MemberId, error: io::Error) -> TransportError {
        match error.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportError::Timeout { peer: peer.to_string(), timeout: self.timeout },
            io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted | io::ErrorKind::NotConnected => {
                TransportError::Unreachable(format!("{} ({})", peer, error))
            }
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => TransportError::Malformed(error.to_string()),
            _ => TransportError::Io(error),
        }
    }

    /// Writes the request and reads one reply, all before `deadline`. A peer trickling bytes
    /// cannot stretch the call past it.
    fn exchange(&self, stream: &mut TcpStream, envelope: Envelope, deadline: Instant) -> io::Result<Envelope> {
        stream.set_write_timeout(Some(remaining(deadline)?))?;
        let frame = EnvelopeCodec::encode_frame(envelope)?;
        stream.write_all(&frame)?;
        stream.flush()?;

        let mut codec = EnvelopeCodec::new();
        let mut buffer = BytesMut::with_capacity(READ_CHUNK);
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(reply) = codec.decode(&mut buffer)? {
                return Ok(reply);
            }

            stream.set_read_timeout(Some(remaining(deadline)?))?;
            let read = stream.read(&mut chunk)?;
            if read == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Connection closed before a full response arrived"));
            }
            buffer.extend_from_slice(&chunk[..read]);
        }
    }
}

/// Time left until `deadline`, `TimedOut` once it has passed. Never zero, sockets reject a zero timeout.
fn remaining(deadline: Instant) -> io::Result<Duration> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        return Err(io::Error::new(io::ErrorKind::TimedOut, "Call deadline passed"));
    }
    Ok(left)
}

impl RpcChannel for TcpRpcChannel {
    fn call(&self, envelope: Envelope) -> Result<Envelope, TransportError> {
        let peer = envelope.target.clone();
        let address = self.resolve(&peer)?;
        let deadline = Instant::now() + self.timeout;

        let mut stream = TcpStream::connect_timeout(&address, self.timeout).map_err(|e| self.classify(&peer, e))?;
        log::trace!("Sending {:?} to {} at {}", envelope.id, peer, address);

        self.exchange(&mut stream, envelope, deadline).map_err(|e| self.classify(&peer, e))
    }
}

/// Server side of the TCP transport.
///
/// Accepts connections until `shutdown` completes. Each connection is a `Framed` stream of
/// envelopes, every request is handed to `handler` on the blocking pool since handlers may in
/// turn block on cloud plugins.
pub async fn serve<F>(listener: TcpListener, handler: Arc<dyn EnvelopeHandler>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("RPC server stopped.");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, remote)) => {
                        log::debug!("Accepted RPC connection from {}", remote);
                        tokio::spawn(handle_connection(stream, handler.clone()));
                    }
                    Err(e) => log::warn!("Failed to accept RPC connection: {}", e),
                }
            }
        }
    }
}

async fn handle_connection(stream: tokio::net::TcpStream, handler: Arc<dyn EnvelopeHandler>) {
    let mut framed = Framed::new(stream, EnvelopeCodec::new());

    while let Some(frame) = framed.next().await {
        let request = match frame {
            Ok(request) => request,
            Err(e) => {
                log::error!("Codec error on RPC connection: {}", e);
                break;
            }
        };

        let handler = handler.clone();
        let reply = match tokio::task::spawn_blocking(move || handler.handle(request)).await {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("RPC handler task failed: {}", e);
                break;
            }
        };

        if let Err(e) = framed.send(reply).await {
            log::error!("Failed to send RPC response: {}", e);
            break;
        }
    }
}
