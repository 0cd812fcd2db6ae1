//! Entry-function transaction payloads.
//!
//! `requestTransaction` forwards its params to the wallet verbatim, so the
//! wire treats them as opaque JSON. This module is the typed surface a
//! mini-app uses to *build* those params: Aptos-style entry-function calls
//! against the MoveFeed tip-jar contract, plus the unit and address
//! conventions of the Movement network.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Movement uses 8 decimals: 1 MOVE = 100,000,000 octas.
pub const OCTAS_PER_MOVE: u64 = 100_000_000;

pub fn move_to_octas(amount: f64) -> u64 {
    (amount * OCTAS_PER_MOVE as f64).floor() as u64
}

pub fn octas_to_move(octas: u64) -> f64 {
    octas as f64 / OCTAS_PER_MOVE as f64
}

/// Pad an address to the 32-byte form the Move side requires.
///
/// Shorter addresses (EVM-style 20-byte ones included) are zero-extended on
/// the left: `0x` + 64 hex digits.
pub fn normalize_address(address: &str) -> Result<String, PayloadError> {
    let hex = address.strip_prefix("0x").unwrap_or(address);
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(PayloadError::InvalidAddress(address.to_string()));
    }
    if hex.len() > 64 {
        return Err(PayloadError::AddressTooLong(address.to_string()));
    }
    Ok(format!("0x{hex:0>64}"))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("address {0:?} is not hex")]
    InvalidAddress(String),

    #[error("address {0:?} is longer than 32 bytes")]
    AddressTooLong(String),
}

/// Entry-function call data, camelCase on the wire to match the wallet SDK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFunction {
    /// Fully qualified: `{address}::{module}::{function}`.
    pub function: String,
    pub type_arguments: Vec<String>,
    pub function_arguments: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasOptions {
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
}

/// Payload for the `requestTransaction` capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub data: EntryFunction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<GasOptions>,
}

impl TransactionPayload {
    pub fn entry_function(function: impl Into<String>) -> Self {
        Self {
            data: EntryFunction {
                function: function.into(),
                type_arguments: Vec::new(),
                function_arguments: Vec::new(),
            },
            options: None,
        }
    }

    pub fn type_arg(mut self, ty: impl Into<String>) -> Self {
        self.data.type_arguments.push(ty.into());
        self
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.data.function_arguments.push(value.into());
        self
    }

    pub fn gas(mut self, options: GasOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// The raw JSON form sent as request params.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Tip a post through the deployed tip-jar contract.
///
/// Numeric contract arguments travel as strings, matching the wallet SDK's
/// u64 encoding.
pub fn tip_post(
    module_address: &str,
    creator: &str,
    post_id: &str,
    octas: u64,
) -> Result<TransactionPayload, PayloadError> {
    let creator = normalize_address(creator)?;
    Ok(
        TransactionPayload::entry_function(format!("{module_address}::MoveFeedV3::tip_post"))
            .arg(creator)
            .arg(post_id)
            .arg(octas.to_string()),
    )
}

/// Visual style of an on-chain post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStyle {
    Minimal,
    Gradient,
    Bold,
}

impl PostStyle {
    fn index(self) -> u8 {
        match self {
            Self::Minimal => 0,
            Self::Gradient => 1,
            Self::Bold => 2,
        }
    }
}

/// Create a post on chain. Content crosses as `vector<u8>`.
pub fn create_post(module_address: &str, content: &str, style: PostStyle) -> TransactionPayload {
    let bytes: Vec<Value> = content.bytes().map(Value::from).collect();
    TransactionPayload::entry_function(format!("{module_address}::MoveFeed::create_post"))
        .arg(Value::Array(bytes))
        .arg(style.index().to_string())
}
