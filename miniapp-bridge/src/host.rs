//! Host side of the capability channel.
//!
//! One bridge per embedded frame. The expected origin is resolved from the
//! configured app URL when the bridge is built and never recomputed; every
//! inbound envelope is checked against it, and everything else on the page's
//! message stream (other windows, extensions) is treated as noise, not as a
//! protocol violation.

use std::io;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite};

use miniapp_proto::origin::OriginError;
use miniapp_proto::protocol::{
    ERR_INTERNAL, ERR_METHOD_NOT_FOUND, ERR_NOT_CONNECTED, ResizeParams,
};
use miniapp_proto::{Envelope, FrameCodec, FrameOrigin, Method, MiniAppContext, Response};

use crate::frame::{FrameSurface, HostConfig};
use crate::wallet::WalletCapability;

type SharedWriter<W> = Arc<Mutex<FramedWrite<W, FrameCodec<Envelope<Response>>>>>;

/// Mediator between an untrusted embedded frame and the page's wallet.
pub struct HostBridge<W, F> {
    config: HostConfig,
    expected_origin: FrameOrigin,
    wallet: Arc<W>,
    frame: Arc<F>,
}

impl<W: WalletCapability, F: FrameSurface> HostBridge<W, F> {
    /// Build a bridge for one frame. Fails fast on an unusable app URL so
    /// the trust boundary is fixed before any message flows.
    pub fn new(config: HostConfig, wallet: Arc<W>, frame: Arc<F>) -> Result<Self, OriginError> {
        let expected_origin = FrameOrigin::resolve(&config.app_url, &config.page_origin)?;
        tracing::debug!(origin = %expected_origin, post_id = %config.post_id, "host bridge ready");
        Ok(Self {
            config,
            expected_origin,
            wallet,
            frame,
        })
    }

    pub fn expected_origin(&self) -> &FrameOrigin {
        &self.expected_origin
    }

    /// Context handed to the frame via `getContext`. Always succeeds;
    /// `user_address` reflects the wallet at call time.
    fn context(&self) -> MiniAppContext {
        MiniAppContext {
            user_address: self.wallet.account(),
            post_id: self.config.post_id.clone(),
            theme: self.config.theme,
            language: self.config.language.clone(),
        }
    }

    /// Drive the dispatch loop until the inbound stream closes.
    ///
    /// Signing requests run on their own tasks so the loop stays free while
    /// a wallet prompt is up; concurrent `requestTransaction` calls race
    /// against the wallet and complete in whatever order it produces.
    pub async fn run<R, Wr>(self, reader: R, writer: Wr) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        Wr: AsyncWrite + Send + Unpin + 'static,
    {
        let mut inbound = FramedRead::new(reader, FrameCodec::<Envelope<Value>>::new());
        let outbound: SharedWriter<Wr> =
            Arc::new(Mutex::new(FramedWrite::new(writer, FrameCodec::new())));

        while let Some(frame) = inbound.next().await {
            let envelope = match frame {
                Ok(envelope) => envelope,
                Err(e) if miniapp_proto::codec::is_recoverable(&e) => {
                    tracing::trace!(error = %e, "undecodable frame dropped");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if !self.expected_origin.matches(&envelope.origin) {
                tracing::trace!(origin = %envelope.origin, "unexpected origin dropped");
                continue;
            }

            self.dispatch(envelope.message, &outbound).await?;
        }

        tracing::debug!(origin = %self.expected_origin, "frame channel closed");
        Ok(())
    }

    async fn dispatch<Wr>(&self, data: Value, outbound: &SharedWriter<Wr>) -> io::Result<()>
    where
        Wr: AsyncWrite + Send + Unpin + 'static,
    {
        // Only {id, method, params} matter here; a message without a method
        // string is noise from some other sender sharing the page.
        let Some(method) = data.get("method").and_then(Value::as_str) else {
            tracing::trace!("message without method ignored");
            return Ok(());
        };
        let id = data.get("id").and_then(Value::as_u64);
        let params = data.get("params").cloned().unwrap_or(Value::Null);

        match Method::parse(method) {
            Some(Method::GetContext) => {
                let Some(id) = id else { return Ok(()) };
                let context = serde_json::to_value(self.context())
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                self.reply(outbound, Response::ok(id, context)).await
            }

            Some(Method::RequestTransaction) => {
                let Some(id) = id else { return Ok(()) };
                let wallet = Arc::clone(&self.wallet);
                let outbound = Arc::clone(outbound);
                let target = self.expected_origin.clone();
                tokio::spawn(async move {
                    let response = sign_and_submit(wallet.as_ref(), id, params).await;
                    let mut writer = outbound.lock().await;
                    if let Err(e) = writer
                        .send(Envelope::new(target.as_str(), response))
                        .await
                    {
                        tracing::warn!(id, error = %e, "failed to deliver transaction response");
                    }
                });
                Ok(())
            }

            Some(Method::Resize) => {
                // Side effect only, never answered.
                let params: ResizeParams = serde_json::from_value(params).unwrap_or_default();
                if params.height > 0 {
                    tracing::trace!(height = params.height, "resizing frame");
                    self.frame.set_height(params.height);
                }
                Ok(())
            }

            None => {
                tracing::debug!(method, "unknown method");
                let Some(id) = id else { return Ok(()) };
                self.reply(outbound, Response::err(id, ERR_METHOD_NOT_FOUND))
                    .await
            }
        }
    }

    async fn reply<Wr>(&self, outbound: &SharedWriter<Wr>, response: Response) -> io::Result<()>
    where
        Wr: AsyncWrite + Send + Unpin + 'static,
    {
        let mut writer = outbound.lock().await;
        writer
            .send(Envelope::new(self.expected_origin.as_str(), response))
            .await
    }
}

/// `requestTransaction` handling: connection check first, then the wallet.
///
/// The connection check gates the signing capability, so a disconnected
/// wallet is never asked to sign.
async fn sign_and_submit<W: WalletCapability>(wallet: &W, id: u64, params: Value) -> Response {
    if wallet.account().is_none() {
        return Response::err(id, ERR_NOT_CONNECTED);
    }

    match wallet.sign_and_submit(params).await {
        Ok(tx) => Response::ok(id, serde_json::json!({ "hash": tx.hash })),
        Err(e) => {
            tracing::warn!(id, error = %e, "wallet call failed");
            Response::err(id, error_text(&e.to_string()))
        }
    }
}

/// Wallet failures surface their own message; an empty one falls back to
/// the generic internal-error string.
fn error_text(message: &str) -> String {
    if message.is_empty() {
        ERR_INTERNAL.to_string()
    } else {
        message.to_string()
    }
}
