use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum Html2PdfError {
    #[error("a Url or Html is required")]
    MissingSource,

    #[error("Both a Url and Html were provided; pass exactly one content source")]
    ConflictingSources,

    #[error("URL is invalid: '{value}' ({message})")]
    InvalidUrl { value: String, message: String },

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Couldn't navigate to url: {0}")]
    Navigation(String),

    #[error("Page script failed: {0}")]
    Script(String),

    #[error("Page hook failed: {0}")]
    Hook(String),

    #[error("Timed out after {after:?} while {stage}")]
    Timeout { stage: String, after: Duration },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Html2PdfError {
    pub fn browser(message: impl Into<String>) -> Self {
        Html2PdfError::Browser(message.into())
    }

    pub fn navigation(message: impl Into<String>) -> Self {
        Html2PdfError::Navigation(message.into())
    }

    pub fn script(message: impl Into<String>) -> Self {
        Html2PdfError::Script(message.into())
    }

    pub fn hook(message: impl Into<String>) -> Self {
        Html2PdfError::Hook(message.into())
    }

    pub fn invalid_option(message: impl Into<String>) -> Self {
        Html2PdfError::InvalidOption(message.into())
    }

    pub fn timeout(stage: impl Into<String>, after: Duration) -> Self {
        Html2PdfError::Timeout {
            stage: stage.into(),
            after,
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            Html2PdfError::MissingSource => ErrorPayload::new(
                ErrorCategory::Input,
                self.to_string(),
                "Pass --url <URL>, --html <MARKUP> or --html-file <PATH>.",
            ),
            Html2PdfError::ConflictingSources => ErrorPayload::new(
                ErrorCategory::Input,
                self.to_string(),
                "Drop either the URL or the HTML input; only one source is rendered.",
            ),
            Html2PdfError::InvalidUrl { .. } => ErrorPayload::new(
                ErrorCategory::Input,
                self.to_string(),
                "Verify the URL (e.g., https://example.com); bare hostnames get https:// prepended.",
            ),
            Html2PdfError::InvalidOption(_) => ErrorPayload::new(
                ErrorCategory::Input,
                self.to_string(),
                "Check flag values (e.g., --viewport WIDTHxHEIGHT, --scale between 0.1 and 2).",
            ),
            Html2PdfError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("toml") || lower.contains("parse") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        self.to_string(),
                        "Fix the TOML syntax in the config file; run `html2pdf config` to inspect effective values.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        self.to_string(),
                        "Check the config file passed via --config or ~/.config/html2pdf/config.toml.",
                    )
                }
            }
            Html2PdfError::Io(e) => ErrorPayload::new(
                ErrorCategory::Io,
                e.to_string(),
                "Check output paths and permissions.",
            ),
            Html2PdfError::Browser(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("launch") || lower.contains("executable") {
                    ErrorPayload::new(
                        ErrorCategory::Browser,
                        self.to_string(),
                        "Install Chrome/Chromium or point --chrome (or CHROME_BIN) at the browser binary.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Browser,
                        self.to_string(),
                        "Re-run with --verbose to see the DevTools exchange; the browser may have crashed.",
                    )
                }
            }
            Html2PdfError::Navigation(_) => ErrorPayload::new(
                ErrorCategory::Navigation,
                self.to_string(),
                "Check connectivity and that the page is reachable; try --wait-until load for chatty pages.",
            ),
            Html2PdfError::Script(_) | Html2PdfError::Hook(_) => ErrorPayload::new(
                ErrorCategory::Script,
                self.to_string(),
                "Check the page script for exceptions; it runs inside the page after loading.",
            ),
            Html2PdfError::Timeout { .. } => ErrorPayload::new(
                ErrorCategory::Timeout,
                self.to_string(),
                "Increase --nav-timeout/--render-timeout or relax --wait-until (e.g., networkidle2).",
            ),
            Html2PdfError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Unknown,
                e.to_string(),
                "Check JSON script arguments; run with --verbose for details.",
            ),
        }
    }
}

impl From<SourceError> for Html2PdfError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Missing => Html2PdfError::MissingSource,
            SourceError::Conflicting => Html2PdfError::ConflictingSources,
            SourceError::InvalidUrl { value, message } => {
                Html2PdfError::InvalidUrl { value, message }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Html2PdfError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Input,
    Config,
    Io,
    Browser,
    Navigation,
    Script,
    Timeout,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
