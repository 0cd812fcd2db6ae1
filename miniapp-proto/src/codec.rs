//! Framing for the channel's byte transports.
//!
//! The browser hands messages over whole; a byte stream does not. Frames
//! are length-prefixed (4 bytes) with a JSON body and capped at
//! [`MAX_FRAME_BYTES`], so the same codec runs over pipes, sockets, or
//! in-process duplexes without letting a peer declare a runaway frame.
//!
//! Decode failures come in two kinds and readers must treat them
//! differently: a frame that arrived intact but holds bad JSON was consumed
//! and the stream is still usable ([`is_recoverable`]); an oversized or
//! truncated frame poisons the stream and the channel must close.

use std::io;
use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};
use tokio_util::bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

/// Hard cap on one frame's body.
///
/// Channel traffic is context objects, transaction payloads, and resize
/// notices - small JSON. Anything near this limit is a bug or an attack.
pub const MAX_FRAME_BYTES: usize = 256 * 1024;

/// A frame arrived whole but its body did not parse as the expected type.
///
/// The underlying frame was consumed, so a reader may skip the message and
/// keep going.
#[derive(Debug, thiserror::Error)]
#[error("frame body did not decode: {0}")]
pub struct BodyDecodeError(#[from] serde_json::Error);

/// Whether a decode failure consumed its frame and left the stream usable.
pub fn is_recoverable(error: &io::Error) -> bool {
    error
        .get_ref()
        .is_some_and(|inner| inner.is::<BodyDecodeError>())
}

/// Length-prefixed JSON codec for one message type.
pub struct FrameCodec<T> {
    inner: LengthDelimitedCodec,
    _phantom: PhantomData<T>,
}

impl<T> Default for FrameCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameCodec<T> {
    pub fn new() -> Self {
        Self {
            inner: LengthDelimitedCodec::builder()
                .length_field_length(4)
                .max_frame_length(MAX_FRAME_BYTES)
                .new_codec(),
            _phantom: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> Decoder for FrameCodec<T> {
    type Item = T;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.inner.decode(src)? {
            Some(bytes) => {
                let message = serde_json::from_slice(&bytes).map_err(|e| {
                    io::Error::new(io::ErrorKind::InvalidData, BodyDecodeError::from(e))
                })?;
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }
}

impl<T: Serialize> Encoder<T> for FrameCodec<T> {
    type Error = io::Error;

    fn encode(&mut self, message: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let body = serde_json::to_vec(&message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        tracing::trace!(frame_bytes = body.len(), "encoding frame");
        self.inner.encode(Bytes::from(body), dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Envelope, Method, Request, Response};
    use serde_json::json;

    #[test]
    fn request_roundtrips() {
        let mut codec = FrameCodec::<Request>::new();
        let mut buf = BytesMut::new();

        let req = Request::call(9, Method::RequestTransaction, json!({"data": {}}));
        codec.encode(req, &mut buf).unwrap();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();

        assert_eq!(decoded.id, Some(9));
        assert_eq!(decoded.method, "requestTransaction");
    }

    #[test]
    fn enveloped_response_roundtrips() {
        let mut codec = FrameCodec::<Envelope<Response>>::new();
        let mut buf = BytesMut::new();

        let env = Envelope::new(
            "https://apps.movefeed.xyz",
            Response::ok(9, json!({"hash": "0xfeed"})),
        );
        codec.encode(env, &mut buf).unwrap();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();

        assert_eq!(decoded.origin, "https://apps.movefeed.xyz");
        assert_eq!(decoded.message.result, Some(json!({"hash": "0xfeed"})));
    }

    #[test]
    fn partial_frame_yields_none() {
        let mut codec = FrameCodec::<Request>::new();
        let mut buf = BytesMut::new();

        codec
            .encode(Request::call(1, Method::GetContext, json!({})), &mut buf)
            .unwrap();
        let full = buf.split();
        let mut partial = BytesMut::from(&full[..full.len() - 3]);

        assert!(codec.decode(&mut partial).unwrap().is_none());
    }

    #[test]
    fn malformed_body_is_recoverable() {
        let mut raw = LengthDelimitedCodec::builder()
            .length_field_length(4)
            .new_codec();
        let mut buf = BytesMut::new();
        raw.encode(Bytes::from_static(b"not json"), &mut buf).unwrap();

        let mut codec = FrameCodec::<Request>::new();
        let err = codec.decode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(is_recoverable(&err));
    }

    #[test]
    fn oversized_frame_poisons_the_stream() {
        let declared = (MAX_FRAME_BYTES + 1) as u32;
        let mut buf = BytesMut::from(&declared.to_be_bytes()[..]);

        let mut codec = FrameCodec::<Request>::new();
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(!is_recoverable(&err));
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let mut codec = FrameCodec::<Request>::new();
        let mut buf = BytesMut::new();

        let huge = "x".repeat(MAX_FRAME_BYTES + 1);
        let req = Request::call(1, Method::RequestTransaction, json!({"blob": huge}));
        assert!(codec.encode(req, &mut buf).is_err());
    }
}
