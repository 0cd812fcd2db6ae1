//! Sandbox link: the trusted embedding boundary between host and guest.
//!
//! In a browser this boundary is the messaging layer itself: it stamps each
//! delivered message with the sender's true origin and refuses to deliver a
//! reply whose target origin does not match the receiving window. For
//! in-process frames and tests, [`sandbox_pair`] reproduces both rules over
//! a pair of duplex byte pipes.
//!
//! The guest cannot influence its stamped origin - it writes bare requests,
//! and the boundary wraps them. Spoofing therefore requires writing to the
//! host's side of the boundary directly, which is exactly the attack the
//! host's own origin check exists for.

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::DuplexStream;
use tokio_util::codec::{FramedRead, FramedWrite};

use miniapp_proto::{Envelope, FrameCodec, Request, Response};

const PIPE_CAPACITY: usize = 64 * 1024;

/// Wire a host and a guest together through an origin-stamping boundary.
///
/// Returns `(host_io, guest_io)`: the host end speaks
/// `Envelope<Value>` in / `Envelope<Response>` out, the guest end speaks
/// bare `Request` out / `Response` in. The pump tasks live until either
/// pipe closes.
pub fn sandbox_pair(guest_origin: &str) -> (DuplexStream, DuplexStream) {
    let (host_io, host_boundary) = tokio::io::duplex(PIPE_CAPACITY);
    let (guest_io, guest_boundary) = tokio::io::duplex(PIPE_CAPACITY);

    let (host_read, host_write) = tokio::io::split(host_boundary);
    let (guest_read, guest_write) = tokio::io::split(guest_boundary);

    // Guest -> host: stamp every request with the guest's true origin.
    let origin = guest_origin.to_string();
    tokio::spawn(async move {
        let mut from_guest = FramedRead::new(guest_read, FrameCodec::<Request>::new());
        let mut to_host = FramedWrite::new(host_write, FrameCodec::<Envelope<Value>>::new());
        while let Some(frame) = from_guest.next().await {
            let request = match frame {
                Ok(request) => request,
                Err(e) => {
                    tracing::warn!(error = %e, "guest frame unreadable, boundary closing");
                    break;
                }
            };
            let Ok(body) = serde_json::to_value(&request) else {
                continue;
            };
            if to_host.send(Envelope::new(origin.clone(), body)).await.is_err() {
                break;
            }
        }
    });

    // Host -> guest: deliver only envelopes addressed to the guest's origin.
    let origin = guest_origin.to_string();
    tokio::spawn(async move {
        let mut from_host = FramedRead::new(host_read, FrameCodec::<Envelope<Response>>::new());
        let mut to_guest = FramedWrite::new(guest_write, FrameCodec::<Response>::new());
        while let Some(frame) = from_host.next().await {
            let envelope = match frame {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::warn!(error = %e, "host frame unreadable, boundary closing");
                    break;
                }
            };
            if envelope.origin != origin {
                tracing::trace!(target = %envelope.origin, "response addressed elsewhere dropped");
                continue;
            }
            if to_guest.send(envelope.message).await.is_err() {
                break;
            }
        }
    });

    (host_io, guest_io)
}
