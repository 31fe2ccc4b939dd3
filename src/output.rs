use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::browser::NavigationResponse;
use crate::config::Config;
use crate::error::ErrorPayload;
use crate::render::PdfDocument;
use crate::source::SourceKind;
use crate::types::PaperSize;
use crate::Viewport;

/// Schema version for report payloads.
pub const HTML2PDF_OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum Html2PdfOutput {
    Render(RenderOutput),
    Config(ConfigOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    pub kind: SourceKind,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutput {
    pub version: String,
    pub source: SourceDescriptor,
    pub output_path: PathBuf,
    pub bytes: usize,
    pub viewport: Viewport,
    pub paper: PaperSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationResponse>,
    pub elapsed_ms: u64,
}

impl RenderOutput {
    pub fn from_document(doc: &PdfDocument) -> Self {
        Self {
            version: HTML2PDF_OUTPUT_VERSION.to_string(),
            source: SourceDescriptor {
                kind: doc.source_kind,
                value: doc.source.clone(),
            },
            output_path: doc.path.clone(),
            bytes: doc.bytes.len(),
            viewport: doc.viewport,
            paper: doc.paper,
            content_height: doc.content_height,
            navigation: doc.navigation.clone(),
            elapsed_ms: doc.elapsed.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOutput {
    pub version: String,
    /// File the values were read from; `None` for built-in defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    pub config: Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: ErrorPayload,
}
