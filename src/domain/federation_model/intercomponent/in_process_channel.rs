use bytes::BytesMut;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, mpsc};
use std::thread;
use std::time::Duration;

use crate::domain::federation_model::intercomponent::codec::EnvelopeCodec;
use crate::domain::federation_model::intercomponent::protocol::Envelope;
use crate::domain::federation_model::intercomponent::rpc_channel::{EnvelopeHandler, RpcChannel, TransportError};
use crate::domain::federation_model::utils::id::MemberId;

enum MailboxMessage {
    Deliver { frame: BytesMut, reply_to: mpsc::Sender<BytesMut> },
    Shutdown,
}

/// Federation of members living in one process, e.g. for tests and local demos.
///
/// Each member's handler runs on its own thread and is reached through a mailbox. Envelopes cross
/// the mailbox as encoded frames, so the serialization path is the same as over TCP.
#[derive(Debug, Clone)]
pub struct InProcessNetwork {
    directory: Arc<RwLock<HashMap<MemberId, mpsc::Sender<MailboxMessage>>>>,
    timeout: Duration,
}

impl std::fmt::Debug for MailboxMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailboxMessage::Deliver { frame, .. } => write!(f, "Deliver({} bytes)", frame.len()),
            MailboxMessage::Shutdown => write!(f, "Shutdown"),
        }
    }
}

impl InProcessNetwork {
    pub fn new(timeout: Duration) -> Self {
        Self { directory: Arc::new(RwLock::new(HashMap::new())), timeout }
    }

    /// Starts the actor thread of `member_id`. A member registered twice replaces its old actor.
    pub fn spawn_member(&self, member_id: MemberId, handler: Arc<dyn EnvelopeHandler>) -> Result<(), TransportError> {
        let (tx, rx) = mpsc::channel::<MailboxMessage>();

        let actor_id = member_id.clone();
        thread::Builder::new().name(format!("Member-{}", member_id)).spawn(move || {
            log::info!("Member actor {} started.", actor_id);
            Self::run_actor_loop(handler, rx);
            log::info!("Member actor {} stopped.", actor_id);
        })?;

        let previous = self.directory.write().expect("Directory lock poisoned").insert(member_id, tx);
        if let Some(previous) = previous {
            let _ = previous.send(MailboxMessage::Shutdown);
        }
        Ok(())
    }

    /// Stops the actor of `member_id`, later calls to it fail as unreachable.
    pub fn disconnect(&self, member_id: &MemberId) {
        if let Some(tx) = self.directory.write().expect("Directory lock poisoned").remove(member_id) {
            let _ = tx.send(MailboxMessage::Shutdown);
        }
    }

    fn run_actor_loop(handler: Arc<dyn EnvelopeHandler>, rx: mpsc::Receiver<MailboxMessage>) {
        while let Ok(msg) = rx.recv() {
            match msg {
                MailboxMessage::Deliver { frame, reply_to } => {
                    let request = match EnvelopeCodec::decode_frame(frame) {
                        Ok(request) => request,
                        Err(e) => {
                            log::error!("Dropping undecodable request: {}", e);
                            continue;
                        }
                    };

                    match EnvelopeCodec::encode_frame(handler.handle(request)) {
                        Ok(reply) => {
                            let _ = reply_to.send(reply);
                        }
                        Err(e) => log::error!("Could not encode response: {}", e),
                    }
                }
                MailboxMessage::Shutdown => break,
            }
        }
    }
}

impl RpcChannel for InProcessNetwork {
    fn call(&self, envelope: Envelope) -> Result<Envelope, TransportError> {
        let peer = envelope.target.to_string();
        let mailbox = self.directory.read().expect("Directory lock poisoned").get(&envelope.target).cloned();
        let mailbox = mailbox.ok_or_else(|| TransportError::Unreachable(peer.clone()))?;

        let frame = EnvelopeCodec::encode_frame(envelope)?;
        let (reply_tx, reply_rx) = mpsc::channel();
        mailbox.send(MailboxMessage::Deliver { frame, reply_to: reply_tx }).map_err(|_| TransportError::Unreachable(peer.clone()))?;

        let reply = match reply_rx.recv_timeout(self.timeout) {
            Ok(reply) => reply,
            Err(mpsc::RecvTimeoutError::Timeout) => return Err(TransportError::Timeout { peer, timeout: self.timeout }),
            Err(mpsc::RecvTimeoutError::Disconnected) => return Err(TransportError::Unreachable(peer)),
        };

        EnvelopeCodec::decode_frame(reply).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}
