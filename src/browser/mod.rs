//! Browser automation behind the render sequence.
//!
//! # Module Structure
//!
//! - [`driver`] - launcher/session/page traits the render sequence drives
//! - [`chromium`] - Chromium backend over the DevTools protocol (feature `chromium`)
//! - [`mock`] - recording backend for tests and dry runs
//! - [`scripts`] - JavaScript evaluated inside the page
//! - [`network_idle`] - in-flight request accounting for network-idle waits
//!
//! # Example
//!
//! ```no_run
//! use html2pdf_lib::{Html2PdfParams, PdfRenderer};
//! use html2pdf_lib::browser::ChromiumLauncher;
//!
//! # async fn example() -> html2pdf_lib::Result<()> {
//! let renderer = PdfRenderer::new(ChromiumLauncher::new());
//! let doc = renderer.render(Html2PdfParams::from_url("example.com")).await?;
//! println!("wrote {} bytes to {}", doc.bytes.len(), doc.path.display());
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "chromium")]
pub mod chromium;
pub mod driver;
pub mod mock;
pub mod network_idle;
pub mod scripts;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumLauncher;
pub use driver::{BrowserLauncher, BrowserSession, NavigationResponse, PageSession};
pub use mock::{DriverCall, FailAt, RecordingLauncher, MOCK_BROWSER_ENV, MOCK_PDF_BYTES};
