use std::path::PathBuf;
use std::process::ExitCode;

use html2pdf_lib::{ConfigOutput, Html2PdfError, Html2PdfOutput, HTML2PDF_OUTPUT_VERSION};

use crate::cli::OutputFormat;
use crate::formatting::{render_error, write_output};
use crate::settings::{config_source, format_effective_config, load_config};

/// Run the config command.
pub fn run_config(config_path: Option<PathBuf>, format: OutputFormat) -> ExitCode {
    let config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, None),
    };
    let source = config_source(config_path.as_deref());
    tracing::debug!("{}", format_effective_config(&config, source.as_deref()));

    let body = Html2PdfOutput::Config(ConfigOutput {
        version: HTML2PDF_OUTPUT_VERSION.to_string(),
        source,
        config,
    });
    if let Err(err) = write_output(&body, format, None) {
        return render_error(Html2PdfError::Config(err.to_string()), format, None);
    }
    ExitCode::SUCCESS
}
