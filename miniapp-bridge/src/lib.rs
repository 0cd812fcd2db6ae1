//! miniapp-bridge: both ends of the mini-app capability channel.
//!
//! The **host bridge** runs in the trusted page. It owns an embedded frame,
//! validates every inbound message against the frame's frozen origin,
//! dispatches capability calls, and answers only to that origin. The
//! **guest client** runs inside the frame: it issues JSON-RPC-shaped
//! requests to the host, correlates responses by id, and never touches the
//! wallet directly.
//!
//! Wallet access and frame geometry are behind traits ([`WalletCapability`],
//! [`FrameSurface`]) so the bridge itself stays independent of any wallet
//! adapter. [`transport::sandbox_pair`] models the embedding boundary for
//! in-process frames and tests; both ends otherwise run over any
//! `AsyncRead`/`AsyncWrite` pair.

pub mod frame;
pub mod guest;
pub mod host;
pub mod transport;
pub mod wallet;

pub use frame::{FrameSurface, HostConfig};
pub use guest::{GuestClient, GuestError, GuestOptions};
pub use host::HostBridge;
pub use wallet::{SubmittedTransaction, WalletCapability, WalletError};
