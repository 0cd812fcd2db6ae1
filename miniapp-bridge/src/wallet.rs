//! Wallet capability seam.
//!
//! The bridge never talks to a wallet adapter directly; the host page hands
//! it this trait. The guest's transaction params reach `sign_and_submit`
//! verbatim, exactly as they crossed the channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Receipt for a signed-and-submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTransaction {
    pub hash: String,
}

/// Failures from the signing flow.
///
/// The `Display` text is what crosses the channel back to the guest, so
/// variants carry the underlying message as-is.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// The user declined the signing prompt.
    #[error("{0}")]
    Rejected(String),

    /// The wallet signed but the network rejected or dropped the submission.
    #[error("{0}")]
    Submission(String),

    /// Anything else the adapter threw.
    #[error("{0}")]
    Internal(String),
}

impl WalletError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    pub fn submission(message: impl Into<String>) -> Self {
        Self::Submission(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// The two things the host page exposes about its wallet: who is connected,
/// and a sign-and-submit flow.
#[async_trait]
pub trait WalletCapability: Send + Sync + 'static {
    /// Address of the currently connected account, if any.
    fn account(&self) -> Option<String>;

    /// Sign and submit a transaction. `payload` is the guest's params,
    /// unmodified.
    async fn sign_and_submit(
        &self,
        payload: serde_json::Value,
    ) -> Result<SubmittedTransaction, WalletError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_the_raw_message() {
        let err = WalletError::rejected("User rejected the request");
        assert_eq!(err.to_string(), "User rejected the request");
    }
}
