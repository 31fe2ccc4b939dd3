//! Option vocabulary shared by the normalizer, the drivers and the CLI.
//!
//! - [`lifecycle`] - wait conditions, media emulation, navigation settings
//! - [`pdf`] - lengths, paper formats and print options
//! - [`launch`] - browser launch options

pub mod launch;
pub mod lifecycle;
pub mod pdf;

pub use launch::{HeadlessMode, LaunchOptions, LaunchSettings, DEFAULT_REQUEST_TIMEOUT};
pub use lifecycle::{
    ContentOptions, EmulationMedia, LoadSettings, NavigationOptions, NavigationSettings,
    ReferrerPolicy, UnknownVariant, WaitUntil, NETWORK_IDLE_WINDOW,
};
pub use pdf::{
    Length, LengthParseError, LengthUnit, MarginInches, PaperFormat, PaperSize, PdfHeight,
    PdfMargin, PdfOptions, PdfSpec, PX_PER_INCH,
};
