//! Full in-process embedding: a host page with a toy wallet on one side of
//! the sandbox boundary, a tipping mini-app on the other.
//!
//! Run with `RUST_LOG=miniapp_bridge=debug cargo run --example embedded_frame`.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

use miniapp_bridge::transport::sandbox_pair;
use miniapp_bridge::{
    FrameSurface, GuestClient, GuestOptions, HostBridge, HostConfig, SubmittedTransaction,
    WalletCapability, WalletError,
};
use miniapp_proto::payload;

struct DemoWallet;

#[async_trait]
impl WalletCapability for DemoWallet {
    fn account(&self) -> Option<String> {
        Some("0xc0ffee".to_string())
    }

    async fn sign_and_submit(
        &self,
        payload: serde_json::Value,
    ) -> Result<SubmittedTransaction, WalletError> {
        tracing::info!(function = %payload["data"]["function"], "wallet signing");
        Ok(SubmittedTransaction {
            hash: "0x6d6f7665666565640000".to_string(),
        })
    }
}

struct DemoFrame;

impl FrameSurface for DemoFrame {
    fn set_height(&self, px: u32) {
        tracing::info!(px, "frame resized");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = HostConfig::new("/apps/tip-jar", "https://movefeed.xyz", "post_42");
    let bridge = HostBridge::new(config, Arc::new(DemoWallet), Arc::new(DemoFrame))?;

    let (host_io, guest_io) = sandbox_pair(bridge.expected_origin().as_str());
    let (host_read, host_write) = tokio::io::split(host_io);
    tokio::spawn(bridge.run(host_read, host_write));

    let (guest_read, guest_write) = tokio::io::split(guest_io);
    let guest = GuestClient::connect(guest_read, guest_write, GuestOptions::default()).await?;
    println!("embedded under post {}", guest.context().post_id);

    let tip = payload::tip_post("0xfeed", "0xab", "42", payload::move_to_octas(0.1))?;
    let hash = guest.request_transaction(tip.to_value()).await?;
    println!("tip submitted: {hash}");

    guest.resize(450).await;
    Ok(())
}
