//! Frame surface seam and host-side configuration.

use miniapp_proto::Theme;

/// The one thing the host bridge does to the embedded frame: resize it.
///
/// Fire-and-forget; the guest gets no acknowledgement.
pub trait FrameSurface: Send + Sync + 'static {
    /// Set the displayed frame height in pixels.
    fn set_height(&self, px: u32);
}

/// Per-frame configuration for a [`crate::HostBridge`].
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Where the mini-app is loaded from. A leading `/` means the page
    /// hosts it itself; the expected origin is derived from this once, at
    /// bridge construction.
    pub app_url: String,
    /// Origin of the hosting page, e.g. `https://movefeed.xyz`.
    pub page_origin: String,
    /// Post the mini-app is embedded under; handed out via `getContext`.
    pub post_id: String,
    pub theme: Theme,
    pub language: String,
}

impl HostConfig {
    pub fn new(
        app_url: impl Into<String>,
        page_origin: impl Into<String>,
        post_id: impl Into<String>,
    ) -> Self {
        Self {
            app_url: app_url.into(),
            page_origin: page_origin.into(),
            post_id: post_id.into(),
            theme: Theme::Dark,
            language: "en".to_string(),
        }
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}
