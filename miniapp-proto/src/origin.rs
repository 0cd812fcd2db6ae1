//! Trust-boundary origin resolution for an embedded frame.
//!
//! The expected origin is resolved exactly once, when the channel is set
//! up, and compared against the stamped origin of every inbound message.
//! Recomputing it per message from a mutable URL string would let the trust
//! boundary drift while messages are in flight.

use std::fmt;

use url::Url;

/// The one origin an embedded frame is allowed to speak from.
///
/// Resolution rules:
/// - an app URL starting with `/` is hosted by the page itself, so the
///   expected origin is the page's own origin;
/// - an absolute app URL contributes its own origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOrigin(String);

impl FrameOrigin {
    pub fn resolve(app_url: &str, page_origin: &str) -> Result<Self, OriginError> {
        if app_url.starts_with('/') {
            let url = Url::parse(page_origin).map_err(|source| OriginError::InvalidPageOrigin {
                origin: page_origin.to_string(),
                source,
            })?;
            Self::from_url(&url, page_origin)
        } else {
            let url = Url::parse(app_url).map_err(|source| OriginError::InvalidAppUrl {
                url: app_url.to_string(),
                source,
            })?;
            Self::from_url(&url, app_url)
        }
    }

    fn from_url(url: &Url, raw: &str) -> Result<Self, OriginError> {
        let origin = url.origin();
        if !origin.is_tuple() {
            // data:, file: and friends serialize as the opaque origin "null",
            // which would match any other opaque sender.
            return Err(OriginError::OpaqueOrigin(raw.to_string()));
        }
        Ok(Self(origin.ascii_serialization()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact match against a stamped message origin.
    pub fn matches(&self, origin: &str) -> bool {
        self.0 == origin
    }
}

impl fmt::Display for FrameOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OriginError {
    #[error("invalid app url {url:?}: {source}")]
    InvalidAppUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("invalid page origin {origin:?}: {source}")]
    InvalidPageOrigin {
        origin: String,
        source: url::ParseError,
    },

    /// The URL has no tuple origin to pin the trust boundary to.
    #[error("url {0:?} has an opaque origin")]
    OpaqueOrigin(String),
}
