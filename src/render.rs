use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::browser::scripts::{parse_content_height, CONTENT_HEIGHT_SCRIPT};
use crate::browser::{BrowserLauncher, BrowserSession, NavigationResponse, PageSession};
use crate::config::Config;
use crate::options::{Html2PdfParams, RenderPlan};
use crate::source::{ContentSource, SourceKind};
use crate::types::PaperSize;
use crate::{Html2PdfError, Result, Viewport};

/// A rendered PDF plus what was learned while producing it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfDocument {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub path: PathBuf,
    pub source_kind: SourceKind,
    pub source: String,
    pub viewport: Viewport,
    pub paper: PaperSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationResponse>,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

/// Drives a browser through the fixed render sequence.
pub struct PdfRenderer<L> {
    launcher: L,
    config: Config,
}

impl<L: BrowserLauncher> PdfRenderer<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Render `params` to a PDF, write it to the output path and return it.
    ///
    /// The browser is closed before this returns, whether rendering
    /// succeeded or not.
    pub async fn render(&self, params: Html2PdfParams) -> Result<PdfDocument> {
        let started = Instant::now();
        let plan = RenderPlan::resolve(&params, &self.config)?;
        tracing::info!(
            source = %plan.source.describe(),
            viewport = %plan.viewport,
            output = %plan.output_path.display(),
            "Rendering PDF"
        );

        let rendered = self.run(&plan, &params).await?;

        write_pdf(&rendered.path, &rendered.bytes).await?;
        let elapsed = started.elapsed();
        tracing::info!(
            bytes = rendered.bytes.len(),
            path = %rendered.path.display(),
            elapsed_ms = elapsed.as_millis() as u64,
            "PDF written"
        );

        Ok(PdfDocument {
            bytes: rendered.bytes,
            path: rendered.path,
            source_kind: plan.source.kind(),
            source: plan.source.describe(),
            viewport: plan.viewport,
            paper: rendered.paper,
            content_height: rendered.content_height,
            navigation: rendered.navigation,
            elapsed,
        })
    }

    async fn run(&self, plan: &RenderPlan, params: &Html2PdfParams) -> Result<Rendered> {
        let budget = RenderBudget::start(self.config.timeouts.render);
        let mut browser = budget.bound(self.launcher.launch(&plan.launch)).await?;
        tracing::debug!(headless = ?plan.launch.headless, "Browser launched");

        let result = render_in_browser(browser.as_mut(), plan, params, &budget).await;
        match tokio::time::timeout(CLOSE_TIMEOUT, browser.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!("Closing browser failed: {err}"),
            Err(_) => tracing::warn!("Closing browser timed out after {CLOSE_TIMEOUT:?}"),
        }
        result
    }
}

#[cfg(feature = "chromium")]
impl PdfRenderer<crate::browser::ChromiumLauncher> {
    pub fn chromium() -> Self {
        Self::new(crate::browser::ChromiumLauncher::new())
    }
}

/// Render with a local Chromium and default configuration.
#[cfg(feature = "chromium")]
pub async fn html_to_pdf(params: Html2PdfParams) -> Result<PdfDocument> {
    PdfRenderer::chromium().render(params).await
}

struct Rendered {
    bytes: Vec<u8>,
    path: PathBuf,
    paper: PaperSize,
    content_height: Option<u32>,
    navigation: Option<NavigationResponse>,
}

/// Upper bound for each close call once rendering is over.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline shared by every stage of one render. A zero limit disables it.
struct RenderBudget {
    limit: Duration,
    deadline: Option<tokio::time::Instant>,
}

impl RenderBudget {
    fn start(limit: Duration) -> Self {
        let deadline = (!limit.is_zero()).then(|| tokio::time::Instant::now() + limit);
        Self { limit, deadline }
    }

    async fn bound<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| Html2PdfError::timeout("rendering the page", self.limit))?,
            None => fut.await,
        }
    }
}

async fn render_in_browser(
    browser: &mut dyn BrowserSession,
    plan: &RenderPlan,
    params: &Html2PdfParams,
    budget: &RenderBudget,
) -> Result<Rendered> {
    let mut page = budget.bound(browser.new_page()).await?;
    let result = budget.bound(render_page(page.as_mut(), plan, params)).await;
    match tokio::time::timeout(CLOSE_TIMEOUT, page.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::debug!("Closing page failed: {err}"),
        Err(_) => tracing::debug!("Closing page timed out after {CLOSE_TIMEOUT:?}"),
    }
    result
}

async fn render_page(
    page: &mut dyn PageSession,
    plan: &RenderPlan,
    params: &Html2PdfParams,
) -> Result<Rendered> {
    page.set_viewport(&plan.viewport).await?;
    if let Some(headers) = &plan.http_headers {
        page.set_extra_http_headers(headers).await?;
    }

    let navigation = match &plan.source {
        ContentSource::Url(url) => {
            let limit = plan.navigation.load.timeout;
            let response = within(
                limit,
                &format!("navigating to {url}"),
                page.goto(url.as_str(), &plan.navigation),
            )
            .await?
            .ok_or_else(|| Html2PdfError::navigation(format!("no response from {url}")))?;
            tracing::debug!(status = response.status, url = %response.url, "Navigation finished");
            if !response.ok() {
                tracing::warn!(status = response.status, "Page answered with a non-2xx status");
            }
            if let Some(hook) = &params.on_navigation {
                hook(&response, &mut *page).await?;
            }
            Some(response)
        }
        ContentSource::Html(html) => {
            within(
                plan.content.timeout,
                "loading HTML content",
                page.set_content(html, &plan.content),
            )
            .await?;
            tracing::debug!(bytes = html.len(), "HTML content loaded");
            None
        }
    };

    page.emulate_media_type(plan.emulation_media).await?;

    let content_height = if plan.measures_content() {
        let value = page.evaluate(CONTENT_HEIGHT_SCRIPT).await?;
        let height = parse_content_height(&value).ok_or_else(|| {
            Html2PdfError::script(format!("unexpected document height: {value}"))
        })?;
        tracing::debug!(height, "Measured document height");
        Some(height)
    } else {
        None
    };

    if let Some(function) = &plan.page_function {
        page.evaluate(&function.expression()).await?;
    }
    if let Some(hook) = &params.on_page {
        hook(&mut *page).await?;
    }

    let spec = plan.pdf_spec(content_height);
    tracing::debug!(
        width_in = spec.paper.width_in,
        height_in = spec.paper.height_in,
        format = ?spec.format,
        "Printing"
    );
    let bytes = page.pdf(&spec).await?;

    Ok(Rendered {
        bytes,
        path: spec.path,
        paper: spec.paper,
        content_height,
        navigation,
    })
}

/// Await `fut` for at most `limit`; a zero limit waits indefinitely.
async fn within<T>(limit: Duration, stage: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
    if limit.is_zero() {
        return fut.await;
    }
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Html2PdfError::timeout(stage, limit))?
}

async fn write_pdf(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;

    #[tokio::test]
    async fn zero_limit_never_times_out() {
        let value = within(Duration::ZERO, "waiting", async { Ok(7) }).await;
        assert_eq!(value.unwrap(), 7);
    }

    #[tokio::test]
    async fn limit_turns_into_timeout_error() {
        let err = within(Duration::from_millis(20), "navigating to x", pending::<Result<()>>())
            .await
            .unwrap_err();
        match err {
            Html2PdfError::Timeout { stage, after } => {
                assert_eq!(stage, "navigating to x");
                assert_eq!(after, Duration::from_millis(20));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn budget_is_shared_across_stages() {
        let budget = RenderBudget::start(Duration::from_millis(100));
        let nap = || async {
            tokio::time::sleep(Duration::from_millis(60)).await;
            Ok(())
        };
        budget.bound(nap()).await.unwrap();
        let err = budget.bound(nap()).await.unwrap_err();
        assert!(matches!(err, Html2PdfError::Timeout { after, .. } if after == Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn write_pdf_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.pdf");
        write_pdf(&path, b"%PDF-1.7").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
    }
}
