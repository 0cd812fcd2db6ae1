//! Message types for host-guest communication.
//!
//! Two shapes traverse the channel, both JSON-RPC 2.0 flavored:
//! - **Request** (guest to host): capability call, correlated by `id`
//! - **Response** (host to guest): exactly one of `result`/`error` is set
//!
//! Between the untrusted frame and the host sits the embedding boundary,
//! which stamps every delivered message with the sender's origin. That
//! stamped form is [`Envelope`].

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error string for `requestTransaction` without a connected account.
pub const ERR_NOT_CONNECTED: &str = "User not connected";

/// Error string for a method the host does not expose.
pub const ERR_METHOD_NOT_FOUND: &str = "Method not found";

/// Error string when a capability fails without a message of its own.
pub const ERR_INTERNAL: &str = "Internal error";

/// Error string surfaced by the guest when the initial handshake fails.
pub const ERR_HOST_UNREACHABLE: &str = "Failed to connect to host environment";

/// Version marker that serializes as the literal string `"2.0"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct V2;

impl Serialize for V2 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("2.0")
    }
}

impl<'de> Deserialize<'de> for V2 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let version = String::deserialize(deserializer)?;
        if version == "2.0" {
            Ok(V2)
        } else {
            Err(D::Error::custom(format!(
                "unsupported jsonrpc version {version:?}"
            )))
        }
    }
}

/// Capabilities the host exposes to an embedded frame.
///
/// Unknown method strings are a defined error case (`"Method not found"`),
/// not a decode failure, so this parses from the raw string rather than
/// living in the serde envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Read-only view of the host context (account, post, theme, language).
    GetContext,
    /// Ask the connected wallet to sign and submit a transaction.
    RequestTransaction,
    /// Adjust the displayed frame height. Fire-and-forget.
    Resize,
}

impl Method {
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "getContext" => Some(Self::GetContext),
            "requestTransaction" => Some(Self::RequestTransaction),
            "resize" => Some(Self::Resize),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetContext => "getContext",
            Self::RequestTransaction => "requestTransaction",
            Self::Resize => "resize",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability call from guest to host.
///
/// `id` is absent for notifications (`resize`): the guest tracks no pending
/// entry for them and the host never answers them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: V2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl Request {
    /// A tracked call expecting exactly one response with the same id.
    pub fn call(id: u64, method: Method, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: V2,
            id: Some(id),
            method: method.as_str().to_string(),
            params,
        }
    }

    /// A one-way notification. No id, no response, nothing pending.
    pub fn notification(method: Method, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: V2,
            id: None,
            method: method.as_str().to_string(),
            params,
        }
    }
}

/// Host answer to a tracked request, correlated solely by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: V2,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(id: u64, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: V2,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: u64, error: impl Into<String>) -> Self {
        Self {
            jsonrpc: V2,
            id,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Presence of `error` wins over any `result` value.
    pub fn into_result(self) -> Result<serde_json::Value, String> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(serde_json::Value::Null)),
        }
    }
}

/// Message as delivered across the embedding boundary.
///
/// Inbound to the host, `origin` is the sender's true origin as stamped by
/// the boundary. Outbound from the host, `origin` is the *target* origin
/// the response may be delivered to - never a wildcard, so wallet context
/// cannot leak to other frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub origin: String,
    pub message: T,
}

impl<T> Envelope<T> {
    pub fn new(origin: impl Into<String>, message: T) -> Self {
        Self {
            origin: origin.into(),
            message,
        }
    }
}

/// What `getContext` returns to the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniAppContext {
    /// Absent when no wallet is connected at call time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_address: Option<String>,
    pub post_id: String,
    pub theme: Theme,
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

/// Parameters of the `resize` capability.
///
/// A missing or zero height is ignored by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeParams {
    #[serde(default)]
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_call_serializes() {
        let req = Request::call(7, Method::GetContext, json!({}));
        insta::assert_json_snapshot!(req, @r###"
        {
          "jsonrpc": "2.0",
          "id": 7,
          "method": "getContext",
          "params": {}
        }
        "###);
    }

    #[test]
    fn notification_omits_id() {
        let req = Request::notification(Method::Resize, json!({"height": 450}));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "method": "resize", "params": {"height": 450}})
        );
    }

    #[test]
    fn response_ok_omits_error() {
        let resp = Response::ok(3, json!({"hash": "0xabc"}));
        insta::assert_json_snapshot!(resp, @r###"
        {
          "jsonrpc": "2.0",
          "id": 3,
          "result": {
            "hash": "0xabc"
          }
        }
        "###);
    }

    #[test]
    fn response_err_carries_message() {
        let resp = Response::err(3, ERR_NOT_CONNECTED);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": 3, "error": "User not connected"})
        );
    }

    #[test]
    fn error_wins_over_result() {
        let resp = Response {
            jsonrpc: V2,
            id: 1,
            result: Some(json!("ignored")),
            error: Some("boom".to_string()),
        };
        assert_eq!(resp.into_result(), Err("boom".to_string()));
    }

    #[test]
    fn wrong_version_rejected() {
        let err = serde_json::from_value::<Request>(
            json!({"jsonrpc": "1.0", "id": 1, "method": "getContext", "params": {}}),
        );
        assert!(err.is_err());
    }

    #[test]
    fn method_parses_known_names_only() {
        assert_eq!(Method::parse("getContext"), Some(Method::GetContext));
        assert_eq!(
            Method::parse("requestTransaction"),
            Some(Method::RequestTransaction)
        );
        assert_eq!(Method::parse("resize"), Some(Method::Resize));
        assert_eq!(Method::parse("stealFunds"), None);
    }

    #[test]
    fn context_omits_missing_address() {
        let ctx = MiniAppContext {
            user_address: None,
            post_id: "post_42".to_string(),
            theme: Theme::Dark,
            language: "en".to_string(),
        };
        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(
            value,
            json!({"postId": "post_42", "theme": "dark", "language": "en"})
        );
    }

    #[test]
    fn context_includes_connected_address() {
        let ctx = MiniAppContext {
            user_address: Some("0x1".to_string()),
            post_id: "post_42".to_string(),
            theme: Theme::Dark,
            language: "en".to_string(),
        };
        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value["userAddress"], json!("0x1"));
    }

    #[test]
    fn resize_params_default_height() {
        let params: ResizeParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params.height, 0);
    }

    #[test]
    fn envelope_roundtrips() {
        let env = Envelope::new(
            "https://apps.movefeed.xyz",
            Request::call(1, Method::GetContext, json!({})),
        );
        let json = serde_json::to_string(&env).unwrap();
        let parsed: Envelope<Request> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.origin, "https://apps.movefeed.xyz");
        assert_eq!(parsed.message.id, Some(1));
    }
}
