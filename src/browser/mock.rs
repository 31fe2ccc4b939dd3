//! In-memory browser that records every driver call.
//!
//! Used by the test-suite and by the CLI when `HTML2PDF_MOCK_BROWSER` is set,
//! so the full render sequence can run without a Chromium install.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;

use super::driver::{BrowserLauncher, BrowserSession, NavigationResponse, PageSession};
use super::scripts::CONTENT_HEIGHT_SCRIPT;
use crate::types::{EmulationMedia, LaunchSettings, LoadSettings, NavigationSettings, PdfSpec};
use crate::{Html2PdfError, Result, Viewport};

/// Environment variable that swaps Chromium for [`RecordingLauncher`] in the CLI.
pub const MOCK_BROWSER_ENV: &str = "HTML2PDF_MOCK_BROWSER";

/// Bytes returned by the recorder's `pdf` call unless overridden.
pub const MOCK_PDF_BYTES: &[u8] = b"%PDF-1.7\n%mock\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n";

#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Launch(LaunchSettings),
    NewPage,
    SetViewport(Viewport),
    SetExtraHttpHeaders(BTreeMap<String, String>),
    Goto {
        url: String,
        settings: NavigationSettings,
    },
    SetContent {
        html: String,
        settings: LoadSettings,
    },
    EmulateMediaType(EmulationMedia),
    Evaluate(String),
    Pdf(Box<PdfSpec>),
    ClosePage,
    CloseBrowser,
}

/// Step at which the recorder should fail or stall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Launch,
    Goto,
    Evaluate,
    Pdf,
}

#[derive(Debug, Clone)]
struct Behaviour {
    content_height: u32,
    navigation: Option<NavigationResponse>,
    script_result: serde_json::Value,
    pdf_bytes: Vec<u8>,
    fail_at: Option<FailAt>,
    stall_at: Option<FailAt>,
}

/// Launcher whose browsers only record what they were asked to do.
#[derive(Debug, Clone)]
pub struct RecordingLauncher {
    calls: Arc<Mutex<Vec<DriverCall>>>,
    behaviour: Behaviour,
}

impl Default for RecordingLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            behaviour: Behaviour {
                content_height: 1000,
                navigation: Some(NavigationResponse {
                    url: String::new(),
                    status: 200,
                    status_text: "OK".to_string(),
                    mime_type: Some("text/html".to_string()),
                }),
                script_result: serde_json::Value::Null,
                pdf_bytes: MOCK_PDF_BYTES.to_vec(),
                fail_at: None,
                stall_at: None,
            },
        }
    }

    /// Value reported for `document.documentElement.scrollHeight`.
    pub fn with_content_height(mut self, height: u32) -> Self {
        self.behaviour.content_height = height;
        self
    }

    /// Response produced by `goto`; `None` simulates a navigation without response.
    pub fn with_navigation_response(mut self, response: Option<NavigationResponse>) -> Self {
        self.behaviour.navigation = response;
        self
    }

    /// Value returned for any evaluated expression other than the height probe.
    pub fn with_script_result(mut self, value: serde_json::Value) -> Self {
        self.behaviour.script_result = value;
        self
    }

    pub fn with_pdf_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.behaviour.pdf_bytes = bytes.into();
        self
    }

    pub fn failing_at(mut self, step: FailAt) -> Self {
        self.behaviour.fail_at = Some(step);
        self
    }

    /// Make `step` hang forever after it has been recorded.
    pub fn stalling_at(mut self, step: FailAt) -> Self {
        self.behaviour.stall_at = Some(step);
        self
    }

    /// Snapshot of the calls recorded so far, across all sessions.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

fn record(calls: &Arc<Mutex<Vec<DriverCall>>>, call: DriverCall) {
    if let Ok(mut calls) = calls.lock() {
        calls.push(call);
    }
}

impl Behaviour {
    async fn stall_if(&self, step: FailAt) {
        if self.stall_at == Some(step) {
            futures::future::pending::<()>().await;
        }
    }
}

impl BrowserLauncher for RecordingLauncher {
    fn launch<'a>(
        &'a self,
        settings: &'a LaunchSettings,
    ) -> BoxFuture<'a, Result<Box<dyn BrowserSession>>> {
        async move {
            record(&self.calls, DriverCall::Launch(settings.clone()));
            self.behaviour.stall_if(FailAt::Launch).await;
            if self.behaviour.fail_at == Some(FailAt::Launch) {
                return Err(Html2PdfError::browser(
                    "Failed to launch browser: mock launch failure",
                ));
            }
            let session: Box<dyn BrowserSession> = Box::new(RecordingSession {
                calls: Arc::clone(&self.calls),
                behaviour: self.behaviour.clone(),
            });
            Ok(session)
        }
        .boxed()
    }
}

struct RecordingSession {
    calls: Arc<Mutex<Vec<DriverCall>>>,
    behaviour: Behaviour,
}

impl BrowserSession for RecordingSession {
    fn new_page(&mut self) -> BoxFuture<'_, Result<Box<dyn PageSession>>> {
        async move {
            record(&self.calls, DriverCall::NewPage);
            let page: Box<dyn PageSession> = Box::new(RecordingPage {
                calls: Arc::clone(&self.calls),
                behaviour: self.behaviour.clone(),
            });
            Ok(page)
        }
        .boxed()
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
        async move {
            record(&self.calls, DriverCall::CloseBrowser);
            Ok(())
        }
        .boxed()
    }
}

struct RecordingPage {
    calls: Arc<Mutex<Vec<DriverCall>>>,
    behaviour: Behaviour,
}

impl PageSession for RecordingPage {
    fn set_viewport<'a>(&'a mut self, viewport: &'a Viewport) -> BoxFuture<'a, Result<()>> {
        async move {
            record(&self.calls, DriverCall::SetViewport(*viewport));
            Ok(())
        }
        .boxed()
    }

    fn set_extra_http_headers<'a>(
        &'a mut self,
        headers: &'a BTreeMap<String, String>,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            record(&self.calls, DriverCall::SetExtraHttpHeaders(headers.clone()));
            Ok(())
        }
        .boxed()
    }

    fn goto<'a>(
        &'a mut self,
        url: &'a str,
        settings: &'a NavigationSettings,
    ) -> BoxFuture<'a, Result<Option<NavigationResponse>>> {
        async move {
            record(
                &self.calls,
                DriverCall::Goto {
                    url: url.to_string(),
                    settings: settings.clone(),
                },
            );
            self.behaviour.stall_if(FailAt::Goto).await;
            if self.behaviour.fail_at == Some(FailAt::Goto) {
                return Err(Html2PdfError::navigation(format!(
                    "net::ERR_NAME_NOT_RESOLVED at {url}"
                )));
            }
            Ok(self.behaviour.navigation.clone().map(|mut res| {
                if res.url.is_empty() {
                    res.url = url.to_string();
                }
                res
            }))
        }
        .boxed()
    }

    fn set_content<'a>(
        &'a mut self,
        html: &'a str,
        settings: &'a LoadSettings,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            record(
                &self.calls,
                DriverCall::SetContent {
                    html: html.to_string(),
                    settings: settings.clone(),
                },
            );
            Ok(())
        }
        .boxed()
    }

    fn emulate_media_type(&mut self, media: EmulationMedia) -> BoxFuture<'_, Result<()>> {
        async move {
            record(&self.calls, DriverCall::EmulateMediaType(media));
            Ok(())
        }
        .boxed()
    }

    fn evaluate<'a>(&'a mut self, expression: &'a str) -> BoxFuture<'a, Result<serde_json::Value>> {
        async move {
            record(&self.calls, DriverCall::Evaluate(expression.to_string()));
            if expression == CONTENT_HEIGHT_SCRIPT {
                return Ok(serde_json::Value::from(self.behaviour.content_height));
            }
            self.behaviour.stall_if(FailAt::Evaluate).await;
            if self.behaviour.fail_at == Some(FailAt::Evaluate) {
                return Err(Html2PdfError::script("Uncaught ReferenceError: boom is not defined"));
            }
            Ok(self.behaviour.script_result.clone())
        }
        .boxed()
    }

    fn pdf<'a>(&'a mut self, spec: &'a PdfSpec) -> BoxFuture<'a, Result<Vec<u8>>> {
        async move {
            record(&self.calls, DriverCall::Pdf(Box::new(spec.clone())));
            self.behaviour.stall_if(FailAt::Pdf).await;
            if self.behaviour.fail_at == Some(FailAt::Pdf) {
                return Err(Html2PdfError::browser("Printing failed"));
            }
            Ok(self.behaviour.pdf_bytes.clone())
        }
        .boxed()
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
        async move {
            record(&self.calls, DriverCall::ClosePage);
            Ok(())
        }
        .boxed()
    }
}
