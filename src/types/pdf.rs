//! Paper geometry and the PDF print options passed through to the browser.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use super::lifecycle::UnknownVariant;

/// CSS reference pixels per inch.
pub const PX_PER_INCH: f64 = 96.0;

#[derive(Debug, Error, PartialEq)]
pub enum LengthParseError {
    #[error("Empty length value")]
    Empty,
    #[error("Invalid length '{0}': expected a number with an optional px/in/cm/mm unit")]
    Invalid(String),
    #[error("Length must not be negative: {0}")]
    Negative(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Px,
    In,
    Cm,
    Mm,
}

impl LengthUnit {
    fn pixels_per_unit(&self) -> f64 {
        match self {
            LengthUnit::Px => 1.0,
            LengthUnit::In => PX_PER_INCH,
            LengthUnit::Cm => 37.8,
            LengthUnit::Mm => 3.78,
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            LengthUnit::Px => "px",
            LengthUnit::In => "in",
            LengthUnit::Cm => "cm",
            LengthUnit::Mm => "mm",
        }
    }
}

/// A page dimension such as `1280px`, `8.5in` or `2cm`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

impl Length {
    pub fn px(value: f64) -> Self {
        Self {
            value,
            unit: LengthUnit::Px,
        }
    }

    pub fn inches(value: f64) -> Self {
        Self {
            value,
            unit: LengthUnit::In,
        }
    }

    pub fn to_pixels(&self) -> f64 {
        self.value * self.unit.pixels_per_unit()
    }

    pub fn to_inches(&self) -> f64 {
        self.to_pixels() / PX_PER_INCH
    }
}

impl FromStr for Length {
    type Err = LengthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(LengthParseError::Empty);
        }
        let lower = trimmed.to_ascii_lowercase();
        let (number, unit) = [LengthUnit::Px, LengthUnit::In, LengthUnit::Cm, LengthUnit::Mm]
            .into_iter()
            .find_map(|unit| lower.strip_suffix(unit.suffix()).map(|n| (n, unit)))
            .unwrap_or((lower.as_str(), LengthUnit::Px));
        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| LengthParseError::Invalid(trimmed.to_string()))?;
        if !value.is_finite() {
            return Err(LengthParseError::Invalid(trimmed.to_string()));
        }
        if value < 0.0 {
            return Err(LengthParseError::Negative(trimmed.to_string()));
        }
        Ok(Self { value, unit })
    }
}

impl TryFrom<String> for Length {
    type Error = LengthParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Length> for String {
    fn from(value: Length) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Named paper sizes; when set they win over explicit width/height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaperFormat {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
}

impl PaperFormat {
    /// Width and height in inches, portrait orientation.
    pub fn size_inches(&self) -> (f64, f64) {
        match self {
            PaperFormat::Letter => (8.5, 11.0),
            PaperFormat::Legal => (8.5, 14.0),
            PaperFormat::Tabloid => (11.0, 17.0),
            PaperFormat::Ledger => (17.0, 11.0),
            PaperFormat::A0 => (33.1, 46.8),
            PaperFormat::A1 => (23.4, 33.1),
            PaperFormat::A2 => (16.54, 23.4),
            PaperFormat::A3 => (11.7, 16.54),
            PaperFormat::A4 => (8.27, 11.7),
            PaperFormat::A5 => (5.83, 8.27),
            PaperFormat::A6 => (4.13, 5.83),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaperFormat::Letter => "letter",
            PaperFormat::Legal => "legal",
            PaperFormat::Tabloid => "tabloid",
            PaperFormat::Ledger => "ledger",
            PaperFormat::A0 => "a0",
            PaperFormat::A1 => "a1",
            PaperFormat::A2 => "a2",
            PaperFormat::A3 => "a3",
            PaperFormat::A4 => "a4",
            PaperFormat::A5 => "a5",
            PaperFormat::A6 => "a6",
        }
    }
}

impl FromStr for PaperFormat {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "letter" => Ok(PaperFormat::Letter),
            "legal" => Ok(PaperFormat::Legal),
            "tabloid" => Ok(PaperFormat::Tabloid),
            "ledger" => Ok(PaperFormat::Ledger),
            "a0" => Ok(PaperFormat::A0),
            "a1" => Ok(PaperFormat::A1),
            "a2" => Ok(PaperFormat::A2),
            "a3" => Ok(PaperFormat::A3),
            "a4" => Ok(PaperFormat::A4),
            "a5" => Ok(PaperFormat::A5),
            "a6" => Ok(PaperFormat::A6),
            _ => Err(UnknownVariant {
                kind: "paper format",
                value: s.to_string(),
                expected: "letter, legal, tabloid, ledger, a0-a6",
            }),
        }
    }
}

impl TryFrom<String> for PaperFormat {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PaperFormat> for String {
    fn from(value: PaperFormat) -> Self {
        value.as_str().to_string()
    }
}

/// Height of the single PDF page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPdfHeight", into = "String")]
pub enum PdfHeight {
    /// Measure the document's scroll height so the page fits on one sheet.
    #[default]
    BodyHeight,
    Pixels(u32),
}

impl FromStr for PdfHeight {
    type Err = LengthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" => Err(LengthParseError::Empty),
            "body" | "bodyheight" | "auto" => Ok(PdfHeight::BodyHeight),
            other => other
                .trim_end_matches("px")
                .trim()
                .parse::<u32>()
                .map(PdfHeight::Pixels)
                .map_err(|_| LengthParseError::Invalid(trimmed.to_string())),
        }
    }
}

/// Config and JSON accept `height = 960` as well as `height = "960px"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPdfHeight {
    Pixels(u32),
    Text(String),
}

impl TryFrom<RawPdfHeight> for PdfHeight {
    type Error = LengthParseError;

    fn try_from(value: RawPdfHeight) -> Result<Self, Self::Error> {
        match value {
            RawPdfHeight::Pixels(px) => Ok(PdfHeight::Pixels(px)),
            RawPdfHeight::Text(text) => text.parse(),
        }
    }
}

impl From<PdfHeight> for String {
    fn from(value: PdfHeight) -> Self {
        match value {
            PdfHeight::BodyHeight => "bodyHeight".to_string(),
            PdfHeight::Pixels(px) => px.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfMargin {
    pub top: Option<Length>,
    pub right: Option<Length>,
    pub bottom: Option<Length>,
    pub left: Option<Length>,
}

impl PdfMargin {
    /// Same margin on every side.
    pub fn uniform(length: Length) -> Self {
        Self {
            top: Some(length),
            right: Some(length),
            bottom: Some(length),
            left: Some(length),
        }
    }
}

/// Print options forwarded to the browser; every field set here wins over
/// the values derived from the top-level parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PdfOptions {
    /// Paper width with units, e.g. `"8.5in"` or `"1280px"`.
    pub width: Option<Length>,
    pub height: Option<Length>,
    /// Named paper size; wins over `width` and `height`.
    pub format: Option<PaperFormat>,
    pub landscape: Option<bool>,
    /// Rendering scale between 0.1 and 2.
    pub scale: Option<f64>,
    /// Print background colours and images.
    pub print_background: Option<bool>,
    pub display_header_footer: Option<bool>,
    /// HTML for the page header; needs `display_header_footer`.
    pub header_template: Option<String>,
    /// HTML for the page footer; needs `display_header_footer`.
    pub footer_template: Option<String>,
    pub margin: Option<PdfMargin>,
    /// Pages to print, e.g. `"1-5, 8"`. Empty prints everything.
    pub page_ranges: Option<String>,
    /// Let CSS `@page` size win over `width`, `height` and `format`.
    pub prefer_css_page_size: Option<bool>,
    /// Output file; overrides the `file_name` parameter.
    pub path: Option<PathBuf>,
}

/// Paper dimensions in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperSize {
    pub width_in: f64,
    pub height_in: f64,
}

/// Margins in inches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginInches {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl From<&PdfMargin> for MarginInches {
    fn from(margin: &PdfMargin) -> Self {
        let inches = |l: Option<Length>| l.map(|l| l.to_inches()).unwrap_or(0.0);
        Self {
            top: inches(margin.top),
            right: inches(margin.right),
            bottom: inches(margin.bottom),
            left: inches(margin.left),
        }
    }
}

/// Fully resolved print request handed to the page driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfSpec {
    pub paper: PaperSize,
    pub format: Option<PaperFormat>,
    pub landscape: bool,
    pub scale: f64,
    pub print_background: bool,
    pub display_header_footer: bool,
    pub header_template: Option<String>,
    pub footer_template: Option<String>,
    pub margin: MarginInches,
    pub page_ranges: Option<String>,
    pub prefer_css_page_size: bool,
    pub path: PathBuf,
}
