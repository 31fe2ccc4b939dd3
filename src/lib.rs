//! html2pdf library
//!
//! Renders a web page, given either as a URL or as a literal HTML string, to a
//! PDF document by driving a headless Chromium.
//!
//! # Module Overview
//!
//! - [`source`] - content source validation and URL normalization
//! - [`options`] - caller parameters and their resolution into a [`RenderPlan`]
//! - [`render`] - the render sequence and the resulting [`PdfDocument`]
//! - [`browser`] - driver traits, the Chromium backend and a recording backend
//! - [`config`] - TOML configuration with built-in defaults
//! - [`types`] - wait conditions, media, paper and launch vocabulary
//! - [`output`] - JSON report schemas
//!
//! # Example
//!
//! ```no_run
//! use html2pdf_lib::{html_to_pdf, Html2PdfParams, PaperFormat};
//!
//! # async fn example() -> html2pdf_lib::Result<()> {
//! let params = Html2PdfParams {
//!     format: Some(PaperFormat::A4),
//!     file_name: Some("invoice.pdf".into()),
//!     ..Html2PdfParams::from_html("<h1>Invoice #42</h1>")
//! };
//! let doc = html_to_pdf(params).await?;
//! assert!(doc.bytes.starts_with(b"%PDF"));
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod options;
pub mod output;
pub mod render;
pub mod source;
pub mod types;
pub mod viewport;

pub use browser::{
    BrowserLauncher, BrowserSession, NavigationResponse, PageSession, RecordingLauncher,
};
#[cfg(feature = "chromium")]
pub use browser::ChromiumLauncher;
pub use config::Config;
pub use error::{ErrorCategory, ErrorPayload, Html2PdfError, Result};
pub use options::{
    navigation_hook, page_hook, Html2PdfParams, NavigationHook, PageFunction, PageHook,
    RenderPlan,
};
pub use output::{
    ConfigOutput, ErrorOutput, Html2PdfOutput, RenderOutput, SourceDescriptor,
    HTML2PDF_OUTPUT_VERSION,
};
#[cfg(feature = "chromium")]
pub use render::html_to_pdf;
pub use render::{PdfDocument, PdfRenderer};
pub use source::{normalize_url, resolve_source, ContentSource, SourceKind};
pub use types::{
    EmulationMedia, HeadlessMode, LaunchOptions, Length, NavigationOptions, PaperFormat,
    PdfHeight, PdfMargin, PdfOptions, ReferrerPolicy, WaitUntil,
};
pub use viewport::{Viewport, ViewportOverrides};
