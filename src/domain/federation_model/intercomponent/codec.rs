use bytes::{Bytes, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use crate::domain::federation_model::intercomponent::protocol::Envelope;

/// Length-delimited framing around bincode, used for TCP streams and for the in-process mailboxes.
#[derive(Debug)]
pub struct EnvelopeCodec {
    codec: LengthDelimitedCodec,
}

impl EnvelopeCodec {
    pub fn new() -> Self {
        Self { codec: LengthDelimitedCodec::new() }
    }

    /// Encodes one envelope into a standalone frame.
    pub fn encode_frame(envelope: Envelope) -> io::Result<BytesMut> {
        let mut buffer = BytesMut::new();
        EnvelopeCodec::new().encode(envelope, &mut buffer)?;
        Ok(buffer)
    }

    /// Decodes a buffer that must hold exactly one complete frame.
    pub fn decode_frame(mut frame: BytesMut) -> io::Result<Envelope> {
        let envelope = EnvelopeCodec::new().decode(&mut frame)?;
        match envelope {
            Some(envelope) if frame.is_empty() => Ok(envelope),
            Some(_) => Err(io::Error::new(io::ErrorKind::InvalidData, "Trailing bytes after envelope frame")),
            None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Incomplete envelope frame")),
        }
    }
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<Envelope> for EnvelopeCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Envelope, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes = bincode::serialize(&item).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.codec.encode(Bytes::from(bytes), dst)
    }
}

impl Decoder for EnvelopeCodec {
    type Item = Envelope;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.codec.decode(src)? {
            Some(bytes) => {
                let item = bincode::deserialize(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }
}
