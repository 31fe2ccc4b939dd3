use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use html2pdf_lib::types::{ContentOptions, HeadlessMode};
use html2pdf_lib::{
    Config, Html2PdfError, Html2PdfParams, LaunchOptions, NavigationOptions, PageFunction,
    PdfMargin, PdfOptions, ViewportOverrides,
};

use crate::cli::RenderArgs;

/// Load config from a TOML file, central config, or return defaults.
/// Priority: explicit path > ~/.config/html2pdf/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, Html2PdfError> {
    let cfg = Config::load(path).map_err(|e| {
        let loc = path
            .map(|p| p.display().to_string())
            .or_else(|| Config::central_config_path().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "defaults".to_string());
        Html2PdfError::Config(format!("Failed to read config {}: {}", loc, strip_prefix(&e)))
    })?;

    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), strip_prefix(&e)))
            .unwrap_or_else(|| format!("Invalid config: {}", strip_prefix(&e)));
        Html2PdfError::Config(prefix)
    })?;
    Ok(cfg)
}

fn strip_prefix(err: &Html2PdfError) -> String {
    match err {
        Html2PdfError::Config(msg) => msg.clone(),
        other => other.to_string(),
    }
}

/// File the effective config was read from, if any.
pub fn config_source(path: Option<&Path>) -> Option<std::path::PathBuf> {
    match path {
        Some(p) => Some(p.to_path_buf()),
        None => Config::central_config_path().filter(|p| p.is_file()),
    }
}

/// Fold flags that live in the config (timeouts) into it; CLI wins.
pub fn apply_cli_overrides(config: &mut Config, args: &RenderArgs) {
    if let Some(secs) = args.nav_timeout {
        config.timeouts.navigation = Duration::from_secs(secs);
    }
    if let Some(secs) = args.render_timeout {
        config.timeouts.render = Duration::from_secs(secs);
    }
}

/// Translate `render` flags into library parameters. Unset flags stay `None`
/// so the config values apply.
pub fn params_from_args(args: &RenderArgs) -> Result<Html2PdfParams, Html2PdfError> {
    let html = match &args.html_file {
        Some(path) => Some(read_input(path, "HTML file")?),
        None => args.html.clone(),
    };

    let function = match &args.script_file {
        Some(path) => Some(read_input(path, "script file")?),
        None => args.script.clone(),
    };
    if function.is_none() && !args.script_args.is_empty() {
        return Err(Html2PdfError::invalid_option(
            "--script-arg requires --script or --script-file",
        ));
    }
    let page_function = match function {
        Some(function) => {
            let mut page_function = PageFunction::new(function);
            for raw in &args.script_args {
                let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
                    Html2PdfError::invalid_option(format!("--script-arg '{raw}' is not JSON: {e}"))
                })?;
                page_function = page_function.with_arg(value);
            }
            Some(page_function)
        }
        None => None,
    };

    let headers = parse_headers(&args.headers)?;

    let viewport_options = ViewportOverrides {
        device_scale_factor: args.scale_factor,
        is_mobile: args.mobile.then_some(true),
        has_touch: args.touch.then_some(true),
        ..ViewportOverrides::default()
    };

    let launch_options = LaunchOptions {
        executable_path: args.chrome.clone(),
        args: (!args.browser_args.is_empty()).then(|| args.browser_args.clone()),
        headless: args.headful.then_some(HeadlessMode::Off),
        user_data_dir: args.user_data_dir.clone(),
        ..LaunchOptions::default()
    };

    let goto_options = NavigationOptions {
        referer: args.referer.clone(),
        referrer_policy: args.referrer_policy,
        ..NavigationOptions::default()
    };

    let display_header_footer = args.header_template.is_some() || args.footer_template.is_some();
    let pdf_options = PdfOptions {
        landscape: args.landscape.then_some(true),
        scale: args.scale,
        print_background: args.no_background.then_some(false),
        display_header_footer: display_header_footer.then_some(true),
        header_template: args.header_template.clone(),
        footer_template: args.footer_template.clone(),
        margin: args.margin.map(PdfMargin::uniform),
        page_ranges: args.page_ranges.clone(),
        prefer_css_page_size: args.prefer_css_page_size.then_some(true),
        ..PdfOptions::default()
    };

    Ok(Html2PdfParams {
        url: args.url.clone(),
        html,
        width: args.width,
        viewport_width: args.viewport.map(|v| v.width),
        viewport_height: args.viewport.map(|v| v.height),
        pdf_width: args.pdf_width,
        pdf_height: args.pdf_height,
        padding: args.padding,
        emulation_media_type: args.media,
        wait_until: args.wait_until.clone(),
        http_headers: (!headers.is_empty()).then_some(headers),
        page_function,
        file_name: args.output.clone(),
        launch_options: Some(launch_options),
        goto_options: Some(goto_options),
        html_content_options: Some(ContentOptions::default()),
        viewport_options: Some(viewport_options),
        pdf_options: Some(pdf_options),
        format: args.paper,
        on_page: None,
        on_navigation: None,
    })
}

fn read_input(path: &Path, what: &str) -> Result<String, Html2PdfError> {
    std::fs::read_to_string(path).map_err(|e| {
        Html2PdfError::invalid_option(format!("Failed to read {what} {}: {e}", path.display()))
    })
}

/// Parse repeated `Name: value` header flags.
pub fn parse_headers(raw: &[String]) -> Result<BTreeMap<String, String>, Html2PdfError> {
    let mut headers = BTreeMap::new();
    for entry in raw {
        let (name, value) = entry.split_once(':').ok_or_else(|| {
            Html2PdfError::invalid_option(format!("header '{entry}' must look like 'Name: value'"))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Html2PdfError::invalid_option(format!(
                "header '{entry}' has an empty name"
            )));
        }
        headers.insert(name.to_string(), value.trim().to_string());
    }
    Ok(headers)
}

/// Format effective config as a single-line string.
pub fn format_effective_config(config: &Config, config_source: Option<&Path>) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    let wait_until = config
        .page
        .wait_until
        .iter()
        .map(|w| w.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let pdf_width = config
        .pdf
        .width
        .map(|w| w.to_string())
        .unwrap_or_else(|| "page".to_string());
    let format = config
        .pdf
        .format
        .map(|f| f.as_str().to_string())
        .unwrap_or_else(|| "none".to_string());
    format!(
        "Effective config [{source}]: page={}x{}, media={}, wait-until={}, pdf: width={}, height={}, padding={}, format={}, background={}, file={}, browser: headless={:?}, args=[{}], timeouts: nav={}s, render={}s, request={}s",
        config.page.width,
        config.page.viewport_height,
        config.page.emulation_media,
        wait_until,
        pdf_width,
        String::from(config.pdf.height),
        config.pdf.padding,
        format,
        config.pdf.print_background,
        config.pdf.file_name.display(),
        config.browser.headless,
        config.browser.args.join(" "),
        config.timeouts.navigation.as_secs(),
        config.timeouts.render.as_secs(),
        config.timeouts.request.as_secs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use html2pdf_lib::PdfHeight;
    use std::io::Write;

    use crate::cli::{Cli, Commands};

    fn render_args(args: &[&str]) -> Box<RenderArgs> {
        let mut argv = vec!["html2pdf", "render"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Render(args) => args,
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn cli_timeouts_override_config() {
        let mut config = Config::default();
        apply_cli_overrides(&mut config, &render_args(&["--nav-timeout", "0", "--render-timeout", "9"]));
        assert_eq!(config.timeouts.navigation, Duration::ZERO);
        assert_eq!(config.timeouts.render, Duration::from_secs(9));

        let mut config = Config::default();
        apply_cli_overrides(&mut config, &render_args(&["--url", "example.com"]));
        assert_eq!(config.timeouts.navigation, Duration::from_secs(30));
    }

    #[test]
    fn unset_flags_leave_params_empty() {
        let params = params_from_args(&render_args(&["--url", "example.com"])).unwrap();
        assert_eq!(params.url.as_deref(), Some("example.com"));
        assert!(params.width.is_none());
        assert!(params.viewport_width.is_none());
        assert!(params.http_headers.is_none());
        assert!(params.page_function.is_none());
        let pdf = params.pdf_options.unwrap();
        assert!(pdf.print_background.is_none());
        assert!(pdf.landscape.is_none());
        let launch = params.launch_options.unwrap();
        assert!(launch.args.is_none());
        assert!(launch.headless.is_none());
    }

    #[test]
    fn flags_map_onto_params() {
        let params = params_from_args(&render_args(&[
            "--html",
            "<p>x</p>",
            "--viewport",
            "800x600",
            "--pdf-height",
            "bodyHeight",
            "--no-background",
            "--footer-template",
            "<span class='pageNumber'></span>",
            "--margin",
            "10mm",
            "--header",
            "Accept-Language: de",
            "--script",
            "(t) => { document.title = t }",
            "--script-arg",
            "\"Report\"",
            "--headful",
        ]))
        .unwrap();

        assert_eq!(params.viewport_width, Some(800));
        assert_eq!(params.viewport_height, Some(600));
        assert_eq!(params.pdf_height, Some(PdfHeight::BodyHeight));
        let pdf = params.pdf_options.unwrap();
        assert_eq!(pdf.print_background, Some(false));
        assert_eq!(pdf.display_header_footer, Some(true));
        assert!(pdf.margin.is_some());
        assert_eq!(
            params.http_headers.unwrap().get("Accept-Language").map(String::as_str),
            Some("de")
        );
        let function = params.page_function.unwrap();
        assert_eq!(function.args, vec![serde_json::json!("Report")]);
        assert_eq!(params.launch_options.unwrap().headless, Some(HeadlessMode::Off));
    }

    #[test]
    fn html_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<h1>From file</h1>").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let params = params_from_args(&render_args(&["--html-file", path.as_str()])).unwrap();
        assert_eq!(params.html.as_deref(), Some("<h1>From file</h1>"));
    }

    #[test]
    fn script_args_need_a_script() {
        let err = params_from_args(&render_args(&["--url", "example.com", "--script-arg", "1"]))
            .unwrap_err();
        assert!(matches!(err, Html2PdfError::InvalidOption(_)));
    }

    #[test]
    fn script_args_must_be_json() {
        let err = params_from_args(&render_args(&[
            "--url",
            "example.com",
            "--script",
            "(x) => x",
            "--script-arg",
            "not json",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("not JSON"));
    }

    #[test]
    fn parse_headers_splits_on_first_colon() {
        let headers = parse_headers(&["Referer: https://a.example/x".to_string()]).unwrap();
        assert_eq!(
            headers.get("Referer").map(String::as_str),
            Some("https://a.example/x")
        );
        assert!(parse_headers(&["no-colon".to_string()]).is_err());
        assert!(parse_headers(&[": value".to_string()]).is_err());
    }

    #[test]
    fn load_config_wraps_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[page\nwidth = ").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Configuration error: Failed to read config"));
        assert!(msg.contains("TOML parse error"));
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[page]\nwidth = 0\n").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Invalid config"));
    }

    #[test]
    fn format_effective_config_includes_key_fields() {
        let summary = format_effective_config(&Config::default(), Some(Path::new("h2p.toml")));
        assert!(summary.contains("page=1280x720"));
        assert!(summary.contains("media=screen"));
        assert!(summary.contains("wait-until=networkidle0"));
        assert!(summary.contains("height=bodyHeight"));
        assert!(summary.contains("padding=100"));
        assert!(summary.contains("file=website.pdf"));
        assert!(summary.contains("args=[--no-sandbox]"));
        assert!(summary.contains("nav=30s"));
        assert!(summary.contains("h2p.toml"));
    }
}
