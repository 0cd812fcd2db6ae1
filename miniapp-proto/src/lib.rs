//! miniapp-proto: wire protocol for the MoveFeed mini-app capability channel.
//!
//! A mini-app is third-party content running in a sandboxed frame. It talks
//! to the page embedding it over a JSON-RPC-shaped message channel and is
//! granted a small set of wallet capabilities through that channel. This
//! crate holds everything both sides must agree on:
//!
//! - **protocol**: request/response envelopes and capability methods
//! - **codec**: length-prefixed JSON framing for byte transports
//! - **origin**: trust-boundary resolution for the embedded frame
//! - **payload**: entry-function transaction payload builders

pub mod codec;
pub mod origin;
pub mod payload;
pub mod protocol;

pub use codec::FrameCodec;
pub use origin::{FrameOrigin, OriginError};
pub use payload::{EntryFunction, GasOptions, PayloadError, TransactionPayload};
pub use protocol::{Envelope, Method, MiniAppContext, Request, Response, Theme};
