//! Driver traits between the render sequence and a concrete browser.
//!
//! The render sequence only ever talks to these traits, so the Chromium
//! backend and the in-memory recorder are interchangeable.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::types::{EmulationMedia, LaunchSettings, LoadSettings, NavigationSettings, PdfSpec};
use crate::{Result, Viewport};

/// Main-frame response of a successful navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationResponse {
    pub url: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl NavigationResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Starts browser sessions.
pub trait BrowserLauncher: Send + Sync {
    fn launch<'a>(&'a self, settings: &'a LaunchSettings) -> BoxFuture<'a, Result<Box<dyn BrowserSession>>>;
}

impl<L: BrowserLauncher + ?Sized> BrowserLauncher for Box<L> {
    fn launch<'a>(&'a self, settings: &'a LaunchSettings) -> BoxFuture<'a, Result<Box<dyn BrowserSession>>> {
        (**self).launch(settings)
    }
}

/// A running browser process.
pub trait BrowserSession: Send {
    fn new_page(&mut self) -> BoxFuture<'_, Result<Box<dyn PageSession>>>;

    /// Shut the browser down.
    fn close(self: Box<Self>) -> BoxFuture<'static, Result<()>>;
}

/// One browser tab.
pub trait PageSession: Send {
    fn set_viewport<'a>(&'a mut self, viewport: &'a Viewport) -> BoxFuture<'a, Result<()>>;

    fn set_extra_http_headers<'a>(
        &'a mut self,
        headers: &'a BTreeMap<String, String>,
    ) -> BoxFuture<'a, Result<()>>;

    /// Navigate and wait for the configured conditions. `None` means the
    /// browser produced no main-frame response.
    fn goto<'a>(
        &'a mut self,
        url: &'a str,
        settings: &'a NavigationSettings,
    ) -> BoxFuture<'a, Result<Option<NavigationResponse>>>;

    fn set_content<'a>(
        &'a mut self,
        html: &'a str,
        settings: &'a LoadSettings,
    ) -> BoxFuture<'a, Result<()>>;

    fn emulate_media_type(&mut self, media: EmulationMedia) -> BoxFuture<'_, Result<()>>;

    /// Evaluate a JavaScript expression in the page; promises are awaited.
    fn evaluate<'a>(&'a mut self, expression: &'a str) -> BoxFuture<'a, Result<serde_json::Value>>;

    fn pdf<'a>(&'a mut self, spec: &'a PdfSpec) -> BoxFuture<'a, Result<Vec<u8>>>;

    fn close(self: Box<Self>) -> BoxFuture<'static, Result<()>>;
}
