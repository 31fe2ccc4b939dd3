use std::path::PathBuf;
use std::process::ExitCode;

use html2pdf_lib::browser::MOCK_BROWSER_ENV;
use html2pdf_lib::{
    BrowserLauncher, Html2PdfError, Html2PdfOutput, PdfRenderer, RecordingLauncher, RenderOutput,
};

use crate::cli::RenderArgs;
use crate::formatting::{render_error, write_output};
use crate::settings::{
    apply_cli_overrides, config_source, format_effective_config, load_config, params_from_args,
};

/// Run the render command.
pub async fn run_render(config_path: Option<PathBuf>, args: RenderArgs) -> ExitCode {
    let format = args.report;
    let report_file = args.report_file.clone();

    let mut config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, report_file),
    };
    apply_cli_overrides(&mut config, &args);
    tracing::debug!(
        "{}",
        format_effective_config(&config, config_source(config_path.as_deref()).as_deref())
    );

    let params = match params_from_args(&args) {
        Ok(params) => params,
        Err(err) => return render_error(err, format, report_file),
    };
    let launcher = match select_launcher() {
        Ok(launcher) => launcher,
        Err(err) => return render_error(err, format, report_file),
    };

    let renderer = PdfRenderer::new(launcher).with_config(config);
    let doc = match renderer.render(params).await {
        Ok(doc) => doc,
        Err(err) => return render_error(err, format, report_file),
    };

    let body = Html2PdfOutput::Render(RenderOutput::from_document(&doc));
    if let Err(err) = write_output(&body, format, report_file.clone()) {
        return render_error(Html2PdfError::Config(err.to_string()), format, report_file);
    }
    ExitCode::SUCCESS
}

/// Chromium unless the mock browser is requested through the environment.
fn select_launcher() -> Result<Box<dyn BrowserLauncher>, Html2PdfError> {
    if std::env::var_os(MOCK_BROWSER_ENV).is_some_and(|v| !v.is_empty()) {
        tracing::info!("{MOCK_BROWSER_ENV} is set; using the recording browser");
        return Ok(Box::new(RecordingLauncher::new()));
    }
    chromium_launcher()
}

#[cfg(feature = "chromium")]
fn chromium_launcher() -> Result<Box<dyn BrowserLauncher>, Html2PdfError> {
    Ok(Box::new(html2pdf_lib::ChromiumLauncher::new()))
}

#[cfg(not(feature = "chromium"))]
fn chromium_launcher() -> Result<Box<dyn BrowserLauncher>, Html2PdfError> {
    Err(Html2PdfError::browser(format!(
        "this build has no Chromium backend; rebuild with the `chromium` feature or set {MOCK_BROWSER_ENV}=1"
    )))
}
