use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use html2pdf_lib::{ErrorOutput, Html2PdfError, Html2PdfOutput, HTML2PDF_OUTPUT_VERSION};

use crate::cli::OutputFormat;

/// Write output in the requested format.
pub fn write_output(
    body: &Html2PdfOutput,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => write_json_output(body, output.as_deref())?,
        OutputFormat::Pretty => write_pretty_output(body, output.as_deref())?,
    };
    Ok(())
}

/// Render an error and return the fatal exit code.
pub fn render_error(err: Html2PdfError, format: OutputFormat, output: Option<PathBuf>) -> ExitCode {
    tracing::debug!("Render failed: {err:?}");
    let error_payload = err.to_payload();
    let payload = Html2PdfOutput::Error(ErrorOutput {
        version: HTML2PDF_OUTPUT_VERSION.to_string(),
        message: Some(error_payload.message.clone()),
        error: error_payload,
    });

    match format {
        OutputFormat::Json => {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            if let Some(path) = output {
                if let Err(write_err) = std::fs::write(&path, &content) {
                    eprintln!("Failed to write error output: {}", write_err);
                    println!("{content}");
                }
            } else {
                println!("{content}");
            }
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload, output.as_deref()) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    ExitCode::from(2)
}

fn write_json_output(
    body: &Html2PdfOutput,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string(body)?;
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

fn write_pretty_output(body: &Html2PdfOutput, output: Option<&Path>) -> io::Result<()> {
    let use_human = output.is_none() && std::io::stdout().is_terminal();

    if use_human {
        let content = format_pretty(body, true);
        println!("{content}");
        return Ok(());
    }

    // Files and pipes keep the JSON shape.
    let content =
        serde_json::to_string_pretty(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".to_string());
    if let Some(path) = output {
        std::fs::write(path, &content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &Html2PdfOutput, colorize: bool) -> String {
    let mut buf = String::new();
    match body {
        Html2PdfOutput::Render(out) => {
            let header = color("[PDF]", "32", colorize);
            writeln!(buf, "{} {}", header, out.output_path.display()).ok();
            writeln!(buf, "Source: {} ({:?})", out.source.value, out.source.kind).ok();
            writeln!(
                buf,
                "Viewport: {}x{} @{}x",
                out.viewport.width, out.viewport.height, out.viewport.device_scale_factor
            )
            .ok();
            writeln!(
                buf,
                "Paper: {:.2}in x {:.2}in",
                out.paper.width_in, out.paper.height_in
            )
            .ok();
            if let Some(height) = out.content_height {
                writeln!(buf, "Content height: {height}px").ok();
            }
            if let Some(nav) = &out.navigation {
                let code = if nav.ok() { "32" } else { "33" };
                let status = color(&nav.status.to_string(), code, colorize);
                writeln!(buf, "Response: {} {}", status, nav.status_text).ok();
            }
            writeln!(buf, "Size: {} bytes in {} ms", out.bytes, out.elapsed_ms).ok();
        }
        Html2PdfOutput::Config(out) => {
            let header = color("[CONFIG]", "36", colorize);
            let source = out
                .source
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in defaults".to_string());
            writeln!(buf, "{} {}", header, source).ok();
            match toml::to_string_pretty(&out.config) {
                Ok(text) => {
                    buf.push_str(&text);
                }
                Err(err) => {
                    writeln!(buf, "(could not render config: {err})").ok();
                }
            }
        }
        Html2PdfOutput::Error(out) => {
            let header = color("[ERROR]", "31", colorize);
            let message = out
                .message
                .as_deref()
                .unwrap_or_else(|| out.error.message.as_str());
            writeln!(buf, "{} {}", header, message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
        }
    }
    buf
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use html2pdf_lib::types::PaperSize;
    use html2pdf_lib::{
        Config, ConfigOutput, NavigationResponse, RenderOutput, SourceDescriptor, SourceKind,
        Viewport,
    };

    #[test]
    fn render_error_always_returns_fatal_exit_code() {
        let code = render_error(
            Html2PdfError::Config("boom".to_string()),
            OutputFormat::Json,
            None,
        );
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn render_error_writes_json_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        render_error(Html2PdfError::MissingSource, OutputFormat::Json, Some(path.clone()));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["mode"], "error");
        assert_eq!(json["error"]["category"], "input");
    }

    #[test]
    fn format_pretty_render_lists_paper_and_status() {
        let body = Html2PdfOutput::Render(RenderOutput {
            version: HTML2PDF_OUTPUT_VERSION.to_string(),
            source: SourceDescriptor {
                kind: SourceKind::Url,
                value: "https://example.com/".to_string(),
            },
            output_path: PathBuf::from("website.pdf"),
            bytes: 2048,
            viewport: Viewport::default(),
            paper: PaperSize {
                width_in: 13.333,
                height_in: 11.458,
            },
            content_height: Some(1000),
            navigation: Some(NavigationResponse {
                url: "https://example.com/".to_string(),
                status: 200,
                status_text: "OK".to_string(),
                mime_type: None,
            }),
            elapsed_ms: 812,
        });

        let pretty = format_pretty(&body, false);
        assert!(pretty.contains("[PDF] website.pdf"));
        assert!(pretty.contains("Viewport: 1280x720"));
        assert!(pretty.contains("Paper: 13.33in x 11.46in"));
        assert!(pretty.contains("Content height: 1000px"));
        assert!(pretty.contains("Response: 200 OK"));
        assert!(pretty.contains("2048 bytes in 812 ms"));
    }

    #[test]
    fn format_pretty_config_renders_toml() {
        let body = Html2PdfOutput::Config(ConfigOutput {
            version: HTML2PDF_OUTPUT_VERSION.to_string(),
            source: None,
            config: Config::default(),
        });
        let pretty = format_pretty(&body, false);
        assert!(pretty.starts_with("[CONFIG] built-in defaults"));
        assert!(pretty.contains("[page]"));
        assert!(pretty.contains("viewport-height = 720"));
    }

    #[test]
    fn format_pretty_error_includes_hint_and_color() {
        let err = Html2PdfError::MissingSource.to_payload();
        let body = Html2PdfOutput::Error(ErrorOutput {
            version: HTML2PDF_OUTPUT_VERSION.to_string(),
            message: Some(err.message.clone()),
            error: err,
        });
        let pretty = format_pretty(&body, true);
        assert!(pretty.contains("\x1b[31m[ERROR]\x1b[0m a Url or Html is required"));
        assert!(pretty.contains("Hint:"));
    }
}
