//! Chromium backend speaking the DevTools protocol through `chromiumoxide`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chromiumoxide::cdp::browser_protocol::emulation::{
    ScreenOrientation, ScreenOrientationType, SetDeviceMetricsOverrideParams,
    SetEmulatedMediaParams, SetTouchEmulationEnabledParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent, Headers,
    SetExtraHttpHeadersParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    NavigateParams, PrintToPdfParams, ReferrerPolicy as CdpReferrerPolicy,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::listeners::EventStream;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::driver::{BrowserLauncher, BrowserSession, NavigationResponse, PageSession};
use super::network_idle::InflightTracker;
use super::scripts::{WAIT_FOR_DOM_CONTENT_SCRIPT, WAIT_FOR_LOAD_SCRIPT};
use crate::types::{
    EmulationMedia, HeadlessMode, LaunchSettings, LoadSettings, NavigationSettings, PdfSpec,
    ReferrerPolicy, WaitUntil, NETWORK_IDLE_WINDOW,
};
use crate::{Html2PdfError, Result, Viewport};

/// Launches a local Chrome/Chromium.
///
/// Uses `executable_path` from the launch settings when given, otherwise
/// `$CHROME_BIN`, a few well-known install locations, and finally
/// `chromiumoxide`'s own lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumLauncher;

impl ChromiumLauncher {
    pub fn new() -> Self {
        Self
    }

    /// Tries to locate the real Chrome/Chromium binary.
    ///
    /// Snap-packaged Chromium ships a wrapper at `/snap/bin/chromium` that
    /// strips unknown flags, so the binary inside the snap is preferred.
    pub fn find_chrome_binary() -> Option<PathBuf> {
        if let Ok(p) = std::env::var("CHROME_BIN") {
            let path = PathBuf::from(&p);
            if path.exists() {
                return Some(path);
            }
        }

        let candidates: &[&str] = &[
            "/snap/chromium/current/usr/lib/chromium-browser/chrome",
            "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        ];

        candidates.iter().map(PathBuf::from).find(|p| p.exists())
    }

    fn browser_config(settings: &LaunchSettings) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(settings.request_timeout)
            .with_head();

        builder = match settings.headless {
            HeadlessMode::New => builder.arg("--headless=new"),
            HeadlessMode::Legacy => builder.arg("--headless=old"),
            HeadlessMode::Off => builder,
        };

        if let Some(bin) = settings
            .executable_path
            .clone()
            .or_else(Self::find_chrome_binary)
        {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }
        if let Some(dir) = &settings.user_data_dir {
            builder = builder.user_data_dir(dir);
        }
        if settings.ignore_https_errors {
            builder = builder.arg("--ignore-certificate-errors");
        }
        for arg in &settings.args {
            builder = builder.arg(arg.clone());
        }

        builder
            .build()
            .map_err(|e| Html2PdfError::browser(format!("Browser config error: {e}")))
    }
}

impl BrowserLauncher for ChromiumLauncher {
    fn launch<'a>(
        &'a self,
        settings: &'a LaunchSettings,
    ) -> BoxFuture<'a, Result<Box<dyn BrowserSession>>> {
        async move {
            let config = Self::browser_config(settings)?;
            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| Html2PdfError::browser(format!("Failed to launch browser: {e}")))?;

            // Nothing reaches the page unless the handler keeps being polled.
            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(err) = event {
                        tracing::debug!("Browser CDP handler error: {err}");
                    }
                }
            });

            let session: Box<dyn BrowserSession> = Box::new(ChromiumSession { browser, handler });
            Ok(session)
        }
        .boxed()
    }
}

struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession for ChromiumSession {
    fn new_page(&mut self) -> BoxFuture<'_, Result<Box<dyn PageSession>>> {
        async move {
            let page = self
                .browser
                .new_page("about:blank")
                .await
                .map_err(|e| Html2PdfError::browser(format!("Failed to open page: {e}")))?;
            let page: Box<dyn PageSession> = Box::new(ChromiumPage { page });
            Ok(page)
        }
        .boxed()
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
        let ChromiumSession {
            mut browser,
            handler,
        } = *self;
        async move {
            let closed = browser
                .close()
                .await
                .map(|_| ())
                .map_err(|e| Html2PdfError::browser(format!("Failed to close browser: {e}")));
            if let Err(err) = browser.wait().await {
                tracing::debug!("Waiting for browser exit failed: {err}");
            }
            handler.abort();
            closed
        }
        .boxed()
    }
}

struct ChromiumPage {
    page: Page,
}

/// Network events needed to decide when a page went quiet.
struct NetworkWatch {
    started: EventStream<EventRequestWillBeSent>,
    finished: EventStream<EventLoadingFinished>,
    failed: EventStream<EventLoadingFailed>,
}

impl NetworkWatch {
    async fn subscribe(page: &Page) -> Result<Self> {
        let listen_err = |e: chromiumoxide::error::CdpError| {
            Html2PdfError::browser(format!("Failed to subscribe to network events: {e}"))
        };
        Ok(Self {
            started: page
                .event_listener::<EventRequestWillBeSent>()
                .await
                .map_err(listen_err)?,
            finished: page
                .event_listener::<EventLoadingFinished>()
                .await
                .map_err(listen_err)?,
            failed: page
                .event_listener::<EventLoadingFailed>()
                .await
                .map_err(listen_err)?,
        })
    }

    async fn wait_for_idle(mut self, max_inflight: usize) {
        let mut tracker = InflightTracker::new(max_inflight, NETWORK_IDLE_WINDOW, Instant::now());
        loop {
            let deadline = tracker.idle_deadline();
            // Starts buffered during `goto` are drained before completions.
            tokio::select! {
                biased;
                Some(event) = self.started.next() => {
                    tracker.request_started(event.request_id.inner().clone(), Instant::now());
                }
                Some(event) = self.finished.next() => {
                    tracker.request_done(event.request_id.inner(), Instant::now());
                }
                Some(event) = self.failed.next() => {
                    tracker.request_done(event.request_id.inner(), Instant::now());
                }
                _ = sleep_until(deadline) => {
                    if tracker.is_idle(Instant::now()) {
                        tracing::debug!(inflight = tracker.inflight(), "Network idle");
                        return;
                    }
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => futures::future::pending::<()>().await,
    }
}

impl ChromiumPage {
    async fn evaluate_value(&self, expression: &str) -> Result<serde_json::Value> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(Html2PdfError::script)?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| Html2PdfError::script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn watch_if_needed(&self, settings: &LoadSettings) -> Result<Option<NetworkWatch>> {
        match settings.network_idle_budget() {
            Some(_) => NetworkWatch::subscribe(&self.page).await.map(Some),
            None => Ok(None),
        }
    }

    /// Wait for every requested lifecycle condition.
    async fn await_conditions(
        &self,
        settings: &LoadSettings,
        watch: Option<NetworkWatch>,
    ) -> Result<()> {
        for condition in &settings.wait_until {
            match condition {
                WaitUntil::Load => {
                    self.evaluate_value(WAIT_FOR_LOAD_SCRIPT).await?;
                }
                WaitUntil::DomContentLoaded => {
                    self.evaluate_value(WAIT_FOR_DOM_CONTENT_SCRIPT).await?;
                }
                WaitUntil::NetworkIdle0 | WaitUntil::NetworkIdle2 => {}
            }
        }
        if let (Some(watch), Some(budget)) = (watch, settings.network_idle_budget()) {
            watch.wait_for_idle(budget).await;
        }
        Ok(())
    }
}

fn cdp_referrer_policy(policy: ReferrerPolicy) -> CdpReferrerPolicy {
    match policy {
        ReferrerPolicy::NoReferrer => CdpReferrerPolicy::NoReferrer,
        ReferrerPolicy::NoReferrerWhenDowngrade => CdpReferrerPolicy::NoReferrerWhenDowngrade,
        ReferrerPolicy::Origin => CdpReferrerPolicy::Origin,
        ReferrerPolicy::OriginWhenCrossOrigin => CdpReferrerPolicy::OriginWhenCrossOrigin,
        ReferrerPolicy::SameOrigin => CdpReferrerPolicy::SameOrigin,
        ReferrerPolicy::StrictOrigin => CdpReferrerPolicy::StrictOrigin,
        ReferrerPolicy::StrictOriginWhenCrossOrigin => {
            CdpReferrerPolicy::StrictOriginWhenCrossOrigin
        }
        ReferrerPolicy::UnsafeUrl => CdpReferrerPolicy::UnsafeUrl,
    }
}

fn print_params(spec: &PdfSpec) -> PrintToPdfParams {
    PrintToPdfParams {
        landscape: Some(spec.landscape),
        display_header_footer: Some(spec.display_header_footer),
        print_background: Some(spec.print_background),
        scale: Some(spec.scale),
        paper_width: Some(spec.paper.width_in),
        paper_height: Some(spec.paper.height_in),
        margin_top: Some(spec.margin.top),
        margin_bottom: Some(spec.margin.bottom),
        margin_left: Some(spec.margin.left),
        margin_right: Some(spec.margin.right),
        page_ranges: spec.page_ranges.clone(),
        header_template: spec.header_template.clone(),
        footer_template: spec.footer_template.clone(),
        prefer_css_page_size: Some(spec.prefer_css_page_size),
        ..Default::default()
    }
}

impl PageSession for ChromiumPage {
    fn set_viewport<'a>(&'a mut self, viewport: &'a Viewport) -> BoxFuture<'a, Result<()>> {
        async move {
            let orientation = if viewport.is_landscape {
                ScreenOrientation::new(ScreenOrientationType::LandscapePrimary, 90)
            } else {
                ScreenOrientation::new(ScreenOrientationType::PortraitPrimary, 0)
            };
            let metrics = SetDeviceMetricsOverrideParams::builder()
                .width(i64::from(viewport.width))
                .height(i64::from(viewport.height))
                .device_scale_factor(viewport.device_scale_factor)
                .mobile(viewport.is_mobile)
                .screen_orientation(orientation)
                .build()
                .map_err(Html2PdfError::browser)?;
            self.page
                .execute(metrics)
                .await
                .map_err(|e| Html2PdfError::browser(format!("Failed to set viewport: {e}")))?;
            self.page
                .execute(SetTouchEmulationEnabledParams::new(viewport.has_touch))
                .await
                .map_err(|e| Html2PdfError::browser(format!("Failed to set touch emulation: {e}")))?;
            Ok(())
        }
        .boxed()
    }

    fn set_extra_http_headers<'a>(
        &'a mut self,
        headers: &'a BTreeMap<String, String>,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let headers = Headers::new(serde_json::to_value(headers)?);
            self.page
                .execute(SetExtraHttpHeadersParams::new(headers))
                .await
                .map_err(|e| Html2PdfError::browser(format!("Failed to set HTTP headers: {e}")))?;
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
            let mut builder = NavigateParams::builder().url(url);
            if let Some(referer) = &settings.referer {
                builder = builder.referrer(referer.clone());
            }
            if let Some(policy) = settings.referrer_policy {
                builder = builder.referrer_policy(cdp_referrer_policy(policy));
            }
            let params = builder.build().map_err(Html2PdfError::navigation)?;

            let watch = self.watch_if_needed(&settings.load).await?;
            self.page
                .goto(params)
                .await
                .map_err(|e| Html2PdfError::navigation(format!("{url}: {e}")))?;
            let request = self
                .page
                .wait_for_navigation_response()
                .await
                .map_err(|e| Html2PdfError::navigation(format!("{url}: {e}")))?;
            self.await_conditions(&settings.load, watch).await?;

            Ok(request.and_then(|request| {
                request.response.as_ref().map(|response| NavigationResponse {
                    url: response.url.clone(),
                    status: u16::try_from(response.status).unwrap_or_default(),
                    status_text: response.status_text.clone(),
                    mime_type: Some(response.mime_type.clone()),
                })
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
            let watch = self.watch_if_needed(settings).await?;
            self.page
                .set_content(html)
                .await
                .map_err(|e| Html2PdfError::browser(format!("Failed to set page content: {e}")))?;
            self.await_conditions(settings, watch).await
        }
        .boxed()
    }

    fn emulate_media_type(&mut self, media: EmulationMedia) -> BoxFuture<'_, Result<()>> {
        async move {
            let params = SetEmulatedMediaParams::builder()
                .media(media.as_str())
                .build();
            self.page
                .execute(params)
                .await
                .map_err(|e| Html2PdfError::browser(format!("Failed to emulate media: {e}")))?;
            Ok(())
        }
        .boxed()
    }

    fn evaluate<'a>(&'a mut self, expression: &'a str) -> BoxFuture<'a, Result<serde_json::Value>> {
        async move { self.evaluate_value(expression).await }.boxed()
    }

    fn pdf<'a>(&'a mut self, spec: &'a PdfSpec) -> BoxFuture<'a, Result<Vec<u8>>> {
        async move {
            self.page
                .pdf(print_params(spec))
                .await
                .map_err(|e| Html2PdfError::browser(format!("Failed to print PDF: {e}")))
        }
        .boxed()
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
        let page = self.page;
        async move {
            page.close()
                .await
                .map_err(|e| Html2PdfError::browser(format!("Failed to close page: {e}")))
        }
        .boxed()
    }
}
