//! Guest side of the capability channel.
//!
//! Runs inside the sandboxed frame. [`GuestClient::connect`] performs the
//! `getContext` handshake; a connected client can then request transactions
//! and resize its frame. Responses are correlated to requests purely by id.
//!
//! Every tracked request carries a timeout, so an outstanding call is
//! always resolvable: the host going silent fails the caller instead of
//! leaving a pending entry behind for the life of the page. `resize` is a
//! one-way notification and is never tracked at all - the host does not
//! answer it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};

use miniapp_proto::{FrameCodec, Method, MiniAppContext, Request, Response};

#[derive(Debug, thiserror::Error)]
pub enum GuestError {
    /// The `getContext` handshake failed. The frame is probably not
    /// embedded in a compatible host.
    #[error("Failed to connect to host environment")]
    HostUnreachable,

    /// The host did not answer within the request timeout.
    #[error("request timed out")]
    Timeout,

    /// Error string sent back by the host, verbatim.
    #[error("{0}")]
    Rpc(String),

    /// The channel to the host is gone (frame torn down, host navigated).
    #[error("channel to host closed")]
    ChannelClosed,

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The host answered with a shape this client does not understand.
    #[error("malformed response: {0}")]
    BadResponse(String),
}

#[derive(Debug, Clone, Copy)]
pub struct GuestOptions {
    /// Timeout for tracked requests after the handshake.
    pub request_timeout: Duration,
    /// Timeout for the initial `getContext` handshake.
    pub connect_timeout: Duration,
}

impl Default for GuestOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

struct Shared {
    pending: DashMap<u64, oneshot::Sender<Result<Value, String>>>,
    next_id: AtomicU64,
    writer: Mutex<FramedWrite<Box<dyn AsyncWrite + Send + Unpin>, FrameCodec<Request>>>,
    request_timeout: Duration,
}

/// A connected guest. Dropping it stops the background response reader, so
/// a torn-down frame leaves no listener behind.
pub struct GuestClient {
    shared: Arc<Shared>,
    context: MiniAppContext,
    reader_task: JoinHandle<()>,
}

impl std::fmt::Debug for GuestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestClient")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl GuestClient {
    /// Issue the `getContext` handshake over the given channel halves.
    ///
    /// On success the returned client is ready and holds the context. On
    /// failure there is no client and no background task; the caller may
    /// retry with a fresh channel if it wants to (this client never does).
    pub async fn connect<R, W>(
        reader: R,
        writer: W,
        options: GuestOptions,
    ) -> Result<Self, GuestError>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let shared = Arc::new(Shared {
            pending: DashMap::new(),
            next_id: AtomicU64::new(1),
            writer: Mutex::new(FramedWrite::new(
                Box::new(writer) as Box<dyn AsyncWrite + Send + Unpin>,
                FrameCodec::new(),
            )),
            request_timeout: options.request_timeout,
        });

        let reader_task = tokio::spawn(read_responses(reader, Arc::clone(&shared)));

        match call(&shared, Method::GetContext, json!({}), options.connect_timeout).await {
            Ok(value) => match serde_json::from_value::<MiniAppContext>(value) {
                Ok(context) => {
                    tracing::debug!(post_id = %context.post_id, "connected to host");
                    Ok(Self {
                        shared,
                        context,
                        reader_task,
                    })
                }
                Err(e) => {
                    tracing::warn!(error = %e, "host context did not parse");
                    reader_task.abort();
                    Err(GuestError::HostUnreachable)
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "handshake with host failed");
                reader_task.abort();
                Err(GuestError::HostUnreachable)
            }
        }
    }

    /// Context cached from the handshake.
    pub fn context(&self) -> &MiniAppContext {
        &self.context
    }

    /// Ask the host to sign and submit a transaction; returns the hash.
    ///
    /// Host-side failures (`"User not connected"`, wallet errors) come back
    /// as [`GuestError::Rpc`] with the original message.
    pub async fn request_transaction(&self, payload: Value) -> Result<String, GuestError> {
        let timeout = self.shared.request_timeout;
        let result = call(&self.shared, Method::RequestTransaction, payload, timeout).await?;
        match result.get("hash").and_then(Value::as_str) {
            Some(hash) => Ok(hash.to_string()),
            None => Err(GuestError::BadResponse(result.to_string())),
        }
    }

    /// Tell the host to resize the frame. One-way: no id, no response, no
    /// pending entry. Send failures are logged and swallowed.
    pub async fn resize(&self, height: u32) {
        let request = Request::notification(Method::Resize, json!({ "height": height }));
        let mut writer = self.shared.writer.lock().await;
        if let Err(e) = writer.send(request).await {
            tracing::warn!(error = %e, "resize notification failed");
        }
    }

    /// Number of requests currently awaiting a response.
    pub fn in_flight(&self) -> usize {
        self.shared.pending.len()
    }
}

impl Drop for GuestClient {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

/// Send one tracked request and wait for its response or the timeout.
async fn call(
    shared: &Shared,
    method: Method,
    params: Value,
    timeout: Duration,
) -> Result<Value, GuestError> {
    let id = shared.next_id.fetch_add(1, Ordering::Relaxed);
    let (tx, rx) = oneshot::channel();
    shared.pending.insert(id, tx);

    let sent = {
        let mut writer = shared.writer.lock().await;
        writer.send(Request::call(id, method, params)).await
    };
    if let Err(e) = sent {
        shared.pending.remove(&id);
        return Err(GuestError::Transport(e));
    }

    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(Ok(value))) => Ok(value),
        Ok(Ok(Err(message))) => Err(GuestError::Rpc(message)),
        Ok(Err(_)) => Err(GuestError::ChannelClosed),
        Err(_) => {
            // Drain the entry so nothing pends past its deadline.
            shared.pending.remove(&id);
            tracing::warn!(id, %method, "request timed out");
            Err(GuestError::Timeout)
        }
    }
}

/// Background reader: completes pending entries by id, ignores strangers.
async fn read_responses<R: AsyncRead + Unpin>(reader: R, shared: Arc<Shared>) {
    let mut inbound = FramedRead::new(reader, FrameCodec::<Response>::new());
    while let Some(frame) = inbound.next().await {
        match frame {
            Ok(response) => match shared.pending.remove(&response.id) {
                Some((_, tx)) => {
                    let _ = tx.send(response.into_result());
                }
                None => tracing::trace!(id = response.id, "response for unknown id ignored"),
            },
            Err(e) if miniapp_proto::codec::is_recoverable(&e) => {
                tracing::trace!(error = %e, "undecodable frame dropped");
            }
            Err(e) => {
                tracing::warn!(error = %e, "channel read failed");
                break;
            }
        }
    }
    // Channel gone: dropping the senders fails every waiting caller with
    // ChannelClosed instead of leaving them to their timeouts.
    shared.pending.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use miniapp_proto::protocol::ERR_HOST_UNREACHABLE;

    #[test]
    fn unreachable_error_matches_wire_string() {
        assert_eq!(GuestError::HostUnreachable.to_string(), ERR_HOST_UNREACHABLE);
    }

    #[test]
    fn rpc_error_is_verbatim() {
        let err = GuestError::Rpc("User not connected".to_string());
        assert_eq!(err.to_string(), "User not connected");
    }
}
