//! Caller-facing render parameters and their normalization into a plan.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::browser::scripts::call_expression;
use crate::browser::{NavigationResponse, PageSession};
use crate::config::Config;
use crate::source::{resolve_source, ContentSource};
use crate::types::{
    ContentOptions, EmulationMedia, LaunchOptions, LaunchSettings, Length, LoadSettings,
    MarginInches, NavigationOptions, NavigationSettings, PaperFormat, PaperSize, PdfHeight,
    PdfOptions, PdfSpec, WaitUntil,
};
use crate::viewport::ViewportOverrides;
use crate::{Html2PdfError, Result, Viewport};

/// Callback receiving the page right before it is printed.
pub type PageHook =
    Arc<dyn for<'a> Fn(&'a mut dyn PageSession) -> BoxFuture<'a, Result<()>> + Send + Sync>;

/// Callback receiving the navigation response and the page after a URL loaded.
pub type NavigationHook = Arc<
    dyn for<'a> Fn(&'a NavigationResponse, &'a mut dyn PageSession) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync,
>;

/// Wrap a closure as a [`PageHook`].
///
/// ```
/// use html2pdf_lib::{page_hook, Html2PdfError};
///
/// let hook = page_hook(|page| {
///     Box::pin(async move {
///         page.evaluate("document.body.classList.add('printing')").await?;
///         Ok::<(), Html2PdfError>(())
///     })
/// });
/// # let _ = hook;
/// ```
pub fn page_hook<F>(f: F) -> PageHook
where
    F: for<'a> Fn(&'a mut dyn PageSession) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`NavigationHook`].
pub fn navigation_hook<F>(f: F) -> NavigationHook
where
    F: for<'a> Fn(&'a NavigationResponse, &'a mut dyn PageSession) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// JavaScript function run inside the page after it loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFunction {
    /// Function source, e.g. `(title) => { document.title = title }`.
    pub function: String,
    /// Values passed positionally, JSON encoded.
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl PageFunction {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn expression(&self) -> String {
        call_expression(&self.function, &self.args)
    }
}

/// Everything a caller may set for one render. Unset fields take the
/// defaults from [`Config`].
#[derive(Clone, Default)]
pub struct Html2PdfParams {
    /// Page to load. A bare host such as `example.com` gets `https://`.
    pub url: Option<String>,
    /// Markup to render instead of a URL. Exactly one of the two is required.
    pub html: Option<String>,
    /// Page width; the fallback for `viewport_width` and `pdf_width`.
    pub width: Option<u32>,
    /// Viewport width in CSS pixels.
    pub viewport_width: Option<u32>,
    /// Viewport height in CSS pixels.
    pub viewport_height: Option<u32>,
    /// Width of the PDF page in pixels.
    pub pdf_width: Option<u32>,
    /// Fixed pixel height, or `bodyHeight` to measure the document.
    pub pdf_height: Option<PdfHeight>,
    /// Extra pixels appended to a measured body height.
    pub padding: Option<u32>,
    /// CSS media type applied before measuring and printing.
    pub emulation_media_type: Option<EmulationMedia>,
    /// Load conditions for both navigation and HTML content. Empty means default.
    pub wait_until: Option<Vec<WaitUntil>>,
    /// Sent with every request; merged over the configured headers.
    pub http_headers: Option<BTreeMap<String, String>>,
    /// Script evaluated in the page after the height is measured.
    pub page_function: Option<PageFunction>,
    /// Where the PDF is written. `pdf_options.path` takes precedence.
    pub file_name: Option<PathBuf>,
    pub launch_options: Option<LaunchOptions>,
    /// Overrides for URL navigation only.
    pub goto_options: Option<NavigationOptions>,
    /// Overrides for HTML content loading only.
    pub html_content_options: Option<ContentOptions>,
    pub viewport_options: Option<ViewportOverrides>,
    /// Print options; any field set here wins over the derived values.
    pub pdf_options: Option<PdfOptions>,
    /// Named paper size; wins over width/height.
    pub format: Option<PaperFormat>,
    /// Called right before printing.
    pub on_page: Option<PageHook>,
    /// Called after a URL has loaded, with its main response.
    pub on_navigation: Option<NavigationHook>,
}

impl Html2PdfParams {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn from_html(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            ..Self::default()
        }
    }

    pub fn with_page_hook<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut dyn PageSession) -> BoxFuture<'a, Result<()>>
            + Send
            + Sync
            + 'static,
    {
        self.on_page = Some(page_hook(f));
        self
    }

    pub fn with_navigation_hook<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a NavigationResponse, &'a mut dyn PageSession) -> BoxFuture<'a, Result<()>>
            + Send
            + Sync
            + 'static,
    {
        self.on_navigation = Some(navigation_hook(f));
        self
    }
}

impl fmt::Debug for Html2PdfParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Html2PdfParams")
            .field("url", &self.url)
            .field("html", &self.html.as_ref().map(|h| format!("<{} bytes>", h.len())))
            .field("width", &self.width)
            .field("viewport_width", &self.viewport_width)
            .field("viewport_height", &self.viewport_height)
            .field("pdf_width", &self.pdf_width)
            .field("pdf_height", &self.pdf_height)
            .field("padding", &self.padding)
            .field("emulation_media_type", &self.emulation_media_type)
            .field("wait_until", &self.wait_until)
            .field("http_headers", &self.http_headers)
            .field("page_function", &self.page_function)
            .field("file_name", &self.file_name)
            .field("launch_options", &self.launch_options)
            .field("goto_options", &self.goto_options)
            .field("html_content_options", &self.html_content_options)
            .field("viewport_options", &self.viewport_options)
            .field("pdf_options", &self.pdf_options)
            .field("format", &self.format)
            .field("on_page", &self.on_page.is_some())
            .field("on_navigation", &self.on_navigation.is_some())
            .finish()
    }
}

/// Parameters merged with defaults and validated; nothing left optional
/// except what is genuinely optional for the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub source: ContentSource,
    pub launch: LaunchSettings,
    pub viewport: Viewport,
    /// `None` when neither config nor params set any header.
    pub http_headers: Option<BTreeMap<String, String>>,
    /// Used for URL sources.
    pub navigation: NavigationSettings,
    /// Used for HTML sources.
    pub content: LoadSettings,
    pub emulation_media: EmulationMedia,
    pub pdf_width: u32,
    pub pdf_height: PdfHeight,
    /// Only applied when `pdf_height` is measured.
    pub padding: u32,
    pub format: Option<PaperFormat>,
    pub print_background: bool,
    /// Caller overrides applied last by [`RenderPlan::pdf_spec`].
    pub pdf_options: PdfOptions,
    pub page_function: Option<PageFunction>,
    pub output_path: PathBuf,
}

impl RenderPlan {
    pub fn resolve(params: &Html2PdfParams, config: &Config) -> Result<Self> {
        let source = resolve_source(params.url.as_deref(), params.html.as_deref())?;

        let width = params.width.unwrap_or(config.page.width);
        let viewport = Viewport {
            width: params.viewport_width.unwrap_or(width),
            height: params.viewport_height.unwrap_or(config.page.viewport_height),
            ..Viewport::default()
        };
        let viewport = match &params.viewport_options {
            Some(overrides) => viewport.with_overrides(overrides),
            None => viewport,
        };

        let launch = match &params.launch_options {
            Some(overrides) => config.launch_settings().with_overrides(overrides),
            None => config.launch_settings(),
        };

        let wait_until = params
            .wait_until
            .clone()
            .filter(|w| !w.is_empty())
            .or_else(|| Some(config.page.wait_until.clone()).filter(|w| !w.is_empty()))
            .unwrap_or_else(|| vec![WaitUntil::NetworkIdle0]);
        let load = LoadSettings::new(wait_until, config.timeouts.navigation);
        let navigation = match &params.goto_options {
            Some(overrides) => NavigationSettings::new(load.clone()).with_overrides(overrides),
            None => NavigationSettings::new(load.clone()),
        };
        let content = match &params.html_content_options {
            Some(overrides) => load.with_overrides(overrides),
            None => load,
        };

        let mut headers = config.page.headers.clone();
        if let Some(extra) = &params.http_headers {
            headers.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        let http_headers = (!headers.is_empty()).then_some(headers);

        let pdf_options = params.pdf_options.clone().unwrap_or_default();
        let output_path = pdf_options
            .path
            .clone()
            .or_else(|| params.file_name.clone())
            .unwrap_or_else(|| config.pdf.file_name.clone());

        let plan = Self {
            source,
            launch,
            viewport,
            http_headers,
            navigation,
            content,
            emulation_media: params
                .emulation_media_type
                .unwrap_or(config.page.emulation_media),
            pdf_width: params.pdf_width.or(config.pdf.width).unwrap_or(width),
            pdf_height: params.pdf_height.unwrap_or(config.pdf.height),
            padding: params.padding.unwrap_or(config.pdf.padding),
            format: params.format.or(config.pdf.format),
            print_background: pdf_options
                .print_background
                .unwrap_or(config.pdf.print_background),
            pdf_options,
            page_function: params.page_function.clone(),
            output_path,
        };
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> Result<()> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Html2PdfError::invalid_option(format!(
                "viewport must be non-zero, got {}",
                self.viewport
            )));
        }
        if !(self.viewport.device_scale_factor > 0.0) {
            return Err(Html2PdfError::invalid_option(
                "device scale factor must be positive",
            ));
        }
        if self.pdf_width == 0 {
            return Err(Html2PdfError::invalid_option("PDF width must be positive"));
        }
        if self.pdf_height == PdfHeight::Pixels(0) {
            return Err(Html2PdfError::invalid_option("PDF height must be positive"));
        }
        if let Some(scale) = self.pdf_options.scale {
            if !(0.1..=2.0).contains(&scale) {
                return Err(Html2PdfError::invalid_option(format!(
                    "PDF scale must be between 0.1 and 2, got {scale}"
                )));
            }
        }
        if let Some(function) = &self.page_function {
            if function.function.trim().is_empty() {
                return Err(Html2PdfError::invalid_option("page function is empty"));
            }
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(Html2PdfError::invalid_option("output file name is empty"));
        }
        Ok(())
    }

    /// Whether the document height must be measured before printing.
    pub fn measures_content(&self) -> bool {
        self.pdf_height == PdfHeight::BodyHeight
    }

    /// Final print request. `content_height` is the measured scroll height,
    /// used only when the plan asks for a body-height page.
    pub fn pdf_spec(&self, content_height: Option<u32>) -> PdfSpec {
        let opts = &self.pdf_options;

        let width = opts.width.unwrap_or(Length::px(f64::from(self.pdf_width)));
        let height = opts.height.unwrap_or_else(|| match self.pdf_height {
            PdfHeight::BodyHeight => Length::px(f64::from(
                content_height.unwrap_or(0).saturating_add(self.padding),
            )),
            PdfHeight::Pixels(px) => Length::px(f64::from(px)),
        });
        let format = opts.format.or(self.format);
        let paper = match format {
            Some(format) => {
                let (width_in, height_in) = format.size_inches();
                PaperSize {
                    width_in,
                    height_in,
                }
            }
            None => PaperSize {
                width_in: width.to_inches(),
                height_in: height.to_inches(),
            },
        };

        PdfSpec {
            paper,
            format,
            landscape: opts.landscape.unwrap_or(false),
            scale: opts.scale.unwrap_or(1.0),
            print_background: self.print_background,
            display_header_footer: opts.display_header_footer.unwrap_or(false),
            header_template: opts.header_template.clone(),
            footer_template: opts.footer_template.clone(),
            margin: opts.margin.as_ref().map(MarginInches::from).unwrap_or_default(),
            page_ranges: opts.page_ranges.clone(),
            prefer_css_page_size: opts.prefer_css_page_size.unwrap_or(false),
            path: self.output_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HeadlessMode, PdfMargin};
    use std::time::Duration;

    fn resolve(params: Html2PdfParams) -> RenderPlan {
        RenderPlan::resolve(&params, &Config::default()).expect("valid params")
    }

    #[test]
    fn defaults_follow_the_documented_values() {
        let plan = resolve(Html2PdfParams::from_url("example.com"));

        assert_eq!(
            plan.source,
            ContentSource::Url(url::Url::parse("https://example.com/").unwrap())
        );
        assert_eq!(plan.viewport, Viewport::new(1280, 720));
        assert_eq!(plan.navigation.load.wait_until, vec![WaitUntil::NetworkIdle0]);
        assert_eq!(plan.navigation.load.timeout, Duration::from_secs(30));
        assert_eq!(plan.emulation_media, EmulationMedia::Screen);
        assert_eq!(plan.pdf_width, 1280);
        assert_eq!(plan.pdf_height, PdfHeight::BodyHeight);
        assert_eq!(plan.padding, 100);
        assert!(plan.print_background);
        assert!(plan.http_headers.is_none());
        assert_eq!(plan.output_path, PathBuf::from("website.pdf"));
        assert_eq!(plan.launch.args, vec!["--no-sandbox".to_string()]);
        assert!(plan.measures_content());
    }

    #[test]
    fn width_is_the_fallback_for_viewport_and_pdf() {
        let plan = resolve(Html2PdfParams {
            width: Some(800),
            ..Html2PdfParams::from_html("<p>x</p>")
        });
        assert_eq!(plan.viewport.width, 800);
        assert_eq!(plan.pdf_width, 800);

        let plan = resolve(Html2PdfParams {
            width: Some(800),
            viewport_width: Some(390),
            pdf_width: Some(1000),
            ..Html2PdfParams::from_html("<p>x</p>")
        });
        assert_eq!(plan.viewport.width, 390);
        assert_eq!(plan.pdf_width, 1000);
    }

    #[test]
    fn viewport_options_override_computed_viewport() {
        let plan = resolve(Html2PdfParams {
            viewport_height: Some(900),
            viewport_options: Some(ViewportOverrides {
                width: Some(375),
                is_mobile: Some(true),
                has_touch: Some(true),
                ..ViewportOverrides::default()
            }),
            ..Html2PdfParams::from_url("example.com")
        });
        assert_eq!(plan.viewport.width, 375);
        assert_eq!(plan.viewport.height, 900);
        assert!(plan.viewport.is_mobile);
        assert!(plan.viewport.has_touch);
    }

    #[test]
    fn goto_and_content_options_override_wait_conditions_separately() {
        let plan = resolve(Html2PdfParams {
            wait_until: Some(vec![WaitUntil::Load]),
            goto_options: Some(NavigationOptions {
                wait_until: Some(vec![WaitUntil::NetworkIdle2]),
                timeout: Some(Duration::ZERO),
                ..NavigationOptions::default()
            }),
            ..Html2PdfParams::from_url("example.com")
        });
        assert_eq!(plan.navigation.load.wait_until, vec![WaitUntil::NetworkIdle2]);
        assert_eq!(plan.navigation.load.timeout, Duration::ZERO);
        assert_eq!(plan.content.wait_until, vec![WaitUntil::Load]);
    }

    #[test]
    fn empty_wait_list_falls_back_to_default() {
        let plan = resolve(Html2PdfParams {
            wait_until: Some(Vec::new()),
            ..Html2PdfParams::from_url("example.com")
        });
        assert_eq!(plan.content.wait_until, vec![WaitUntil::NetworkIdle0]);
    }

    #[test]
    fn empty_config_wait_list_falls_back_to_default() {
        let config = Config::from_toml_str("[page]\nwait-until = []\n").expect("config");
        assert!(config.page.wait_until.is_empty());

        let plan =
            RenderPlan::resolve(&Html2PdfParams::from_url("example.com"), &config).expect("plan");
        assert_eq!(plan.navigation.load.wait_until, vec![WaitUntil::NetworkIdle0]);
        assert_eq!(plan.content.wait_until, vec![WaitUntil::NetworkIdle0]);
    }

    #[test]
    fn launch_options_merge_over_defaults() {
        let plan = resolve(Html2PdfParams {
            launch_options: Some(LaunchOptions {
                headless: Some(HeadlessMode::Off),
                ..LaunchOptions::default()
            }),
            ..Html2PdfParams::from_url("example.com")
        });
        assert_eq!(plan.launch.headless, HeadlessMode::Off);
        assert_eq!(plan.launch.args, vec!["--no-sandbox".to_string()]);
    }

    #[test]
    fn headers_merge_config_and_params() {
        let mut config = Config::default();
        config
            .page
            .headers
            .insert("X-Team".to_string(), "docs".to_string());
        config
            .page
            .headers
            .insert("Accept-Language".to_string(), "en".to_string());
        let params = Html2PdfParams {
            http_headers: Some(BTreeMap::from([(
                "Accept-Language".to_string(),
                "de".to_string(),
            )])),
            ..Html2PdfParams::from_url("example.com")
        };
        let plan = RenderPlan::resolve(&params, &config).unwrap();
        let headers = plan.http_headers.unwrap();
        assert_eq!(headers.get("X-Team").map(String::as_str), Some("docs"));
        assert_eq!(headers.get("Accept-Language").map(String::as_str), Some("de"));
    }

    #[test]
    fn body_height_spec_adds_padding() {
        let plan = resolve(Html2PdfParams::from_html("<p>x</p>"));
        let spec = plan.pdf_spec(Some(1820));
        assert!((spec.paper.width_in - 1280.0 / 96.0).abs() < 1e-9);
        assert!((spec.paper.height_in - 1920.0 / 96.0).abs() < 1e-9);
        assert!(spec.print_background);
        assert_eq!(spec.scale, 1.0);
        assert_eq!(spec.path, PathBuf::from("website.pdf"));
    }

    #[test]
    fn fixed_height_ignores_padding_and_measurement() {
        let plan = resolve(Html2PdfParams {
            pdf_height: Some(PdfHeight::Pixels(960)),
            padding: Some(500),
            ..Html2PdfParams::from_html("<p>x</p>")
        });
        assert!(!plan.measures_content());
        let spec = plan.pdf_spec(None);
        assert!((spec.paper.height_in - 10.0).abs() < 1e-9);
    }

    #[test]
    fn paper_format_wins_over_dimensions() {
        let plan = resolve(Html2PdfParams {
            format: Some(PaperFormat::A4),
            pdf_options: Some(PdfOptions {
                width: Some(Length::inches(3.0)),
                ..PdfOptions::default()
            }),
            ..Html2PdfParams::from_html("<p>x</p>")
        });
        let spec = plan.pdf_spec(Some(5000));
        assert_eq!(spec.format, Some(PaperFormat::A4));
        assert_eq!(spec.paper.width_in, 8.27);
        assert_eq!(spec.paper.height_in, 11.7);
    }

    #[test]
    fn pdf_options_override_everything_else() {
        let plan = resolve(Html2PdfParams {
            file_name: Some(PathBuf::from("report.pdf")),
            pdf_options: Some(PdfOptions {
                height: Some(Length::inches(4.0)),
                print_background: Some(false),
                landscape: Some(true),
                margin: Some(PdfMargin::uniform(Length::px(48.0))),
                path: Some(PathBuf::from("override.pdf")),
                ..PdfOptions::default()
            }),
            ..Html2PdfParams::from_html("<p>x</p>")
        });
        assert_eq!(plan.output_path, PathBuf::from("override.pdf"));
        let spec = plan.pdf_spec(Some(100));
        assert_eq!(spec.paper.height_in, 4.0);
        assert!(!spec.print_background);
        assert!(spec.landscape);
        assert_eq!(spec.margin.left, 0.5);
    }

    #[test]
    fn rejects_out_of_range_scale() {
        let params = Html2PdfParams {
            pdf_options: Some(PdfOptions {
                scale: Some(3.0),
                ..PdfOptions::default()
            }),
            ..Html2PdfParams::from_html("<p>x</p>")
        };
        let err = RenderPlan::resolve(&params, &Config::default()).unwrap_err();
        assert!(matches!(err, Html2PdfError::InvalidOption(msg) if msg.contains("scale")));
    }

    #[test]
    fn rejects_zero_widths_and_empty_scripts() {
        let params = Html2PdfParams {
            width: Some(0),
            ..Html2PdfParams::from_html("<p>x</p>")
        };
        assert!(RenderPlan::resolve(&params, &Config::default()).is_err());

        let params = Html2PdfParams {
            page_function: Some(PageFunction::new("  ")),
            ..Html2PdfParams::from_html("<p>x</p>")
        };
        assert!(RenderPlan::resolve(&params, &Config::default()).is_err());
    }

    #[test]
    fn missing_source_fails_before_anything_else() {
        let err = RenderPlan::resolve(&Html2PdfParams::default(), &Config::default()).unwrap_err();
        assert!(matches!(err, Html2PdfError::MissingSource));
    }

    #[test]
    fn page_function_builds_call_expression() {
        let function = PageFunction::new("(a, b) => a + b").with_arg(1).with_arg("two");
        assert_eq!(function.expression(), r#"((a, b) => a + b)(1, "two")"#);
    }

    #[test]
    fn debug_output_hides_hooks_and_markup() {
        let params = Html2PdfParams::from_html("<p>secret</p>")
            .with_page_hook(|_page| Box::pin(async { Ok::<(), Html2PdfError>(()) }));
        let rendered = format!("{params:?}");
        assert!(rendered.contains("<13 bytes>"));
        assert!(rendered.contains("on_page: true"));
        assert!(!rendered.contains("secret"));
    }
}
