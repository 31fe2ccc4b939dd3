use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use html2pdf_lib::browser::scripts::CONTENT_HEIGHT_SCRIPT;
use html2pdf_lib::browser::{DriverCall, FailAt, MOCK_PDF_BYTES};
use html2pdf_lib::types::{LaunchSettings, PdfOptions};
use html2pdf_lib::{
    BrowserLauncher, BrowserSession, Config, EmulationMedia, Html2PdfError, Html2PdfParams,
    PageFunction, PaperFormat, PdfHeight, PdfRenderer, RecordingLauncher, SourceKind, Viewport,
    WaitUntil,
};
use tempfile::TempDir;

fn kinds(calls: &[DriverCall]) -> Vec<&'static str> {
    calls
        .iter()
        .map(|call| match call {
            DriverCall::Launch(_) => "launch",
            DriverCall::NewPage => "new_page",
            DriverCall::SetViewport(_) => "set_viewport",
            DriverCall::SetExtraHttpHeaders(_) => "set_headers",
            DriverCall::Goto { .. } => "goto",
            DriverCall::SetContent { .. } => "set_content",
            DriverCall::EmulateMediaType(_) => "emulate_media",
            DriverCall::Evaluate(_) => "evaluate",
            DriverCall::Pdf(_) => "pdf",
            DriverCall::ClosePage => "close_page",
            DriverCall::CloseBrowser => "close_browser",
        })
        .collect()
}

fn output_in(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

fn renderer(launcher: &RecordingLauncher) -> PdfRenderer<RecordingLauncher> {
    PdfRenderer::new(launcher.clone())
}

#[tokio::test]
async fn url_render_follows_the_fixed_sequence() {
    let dir = TempDir::new().expect("tempdir");
    let out = output_in(&dir, "site.pdf");
    let launcher = RecordingLauncher::new();
    let params = Html2PdfParams {
        file_name: Some(out.clone()),
        http_headers: Some(BTreeMap::from([(
            "Authorization".to_string(),
            "Bearer t".to_string(),
        )])),
        ..Html2PdfParams::from_url("example.com")
    };

    let doc = renderer(&launcher).render(params).await.expect("render");

    let calls = launcher.calls();
    assert_eq!(
        kinds(&calls),
        vec![
            "launch",
            "new_page",
            "set_viewport",
            "set_headers",
            "goto",
            "emulate_media",
            "evaluate",
            "pdf",
            "close_page",
            "close_browser",
        ]
    );
    assert_eq!(calls[0], DriverCall::Launch(LaunchSettings::default()));
    assert_eq!(calls[2], DriverCall::SetViewport(Viewport::new(1280, 720)));
    match &calls[4] {
        DriverCall::Goto { url, settings } => {
            assert_eq!(url, "https://example.com/");
            assert_eq!(settings.load.wait_until, vec![WaitUntil::NetworkIdle0]);
        }
        other => panic!("expected goto, got {other:?}"),
    }
    assert_eq!(calls[5], DriverCall::EmulateMediaType(EmulationMedia::Screen));
    assert_eq!(calls[6], DriverCall::Evaluate(CONTENT_HEIGHT_SCRIPT.to_string()));

    assert_eq!(doc.source_kind, SourceKind::Url);
    assert_eq!(doc.content_height, Some(1000));
    assert_eq!(doc.navigation.as_ref().map(|n| n.status), Some(200));
    assert!((doc.paper.width_in - 1280.0 / 96.0).abs() < 1e-9);
    assert!((doc.paper.height_in - 1100.0 / 96.0).abs() < 1e-9);
    assert_eq!(doc.path, out);
    assert_eq!(std::fs::read(&out).expect("pdf written"), MOCK_PDF_BYTES);
}

#[tokio::test]
async fn html_render_loads_content_without_navigation() {
    let dir = TempDir::new().expect("tempdir");
    let launcher = RecordingLauncher::new().with_content_height(2400);
    let params = Html2PdfParams {
        file_name: Some(output_in(&dir, "inline.pdf")),
        ..Html2PdfParams::from_html("<h1>Hello</h1>")
    };

    let doc = renderer(&launcher).render(params).await.expect("render");

    let calls = launcher.calls();
    assert_eq!(
        kinds(&calls),
        vec![
            "launch",
            "new_page",
            "set_viewport",
            "set_content",
            "emulate_media",
            "evaluate",
            "pdf",
            "close_page",
            "close_browser",
        ]
    );
    assert!(matches!(&calls[3], DriverCall::SetContent { html, .. } if html == "<h1>Hello</h1>"));
    assert_eq!(doc.source_kind, SourceKind::Html);
    assert!(doc.navigation.is_none());
    assert!((doc.paper.height_in - 2500.0 / 96.0).abs() < 1e-9);
}

#[tokio::test]
async fn page_function_runs_after_measuring_height() {
    let dir = TempDir::new().expect("tempdir");
    let launcher = RecordingLauncher::new();
    let function = PageFunction::new("(title) => { document.title = title }").with_arg("Report");
    let params = Html2PdfParams {
        file_name: Some(output_in(&dir, "fn.pdf")),
        page_function: Some(function.clone()),
        ..Html2PdfParams::from_html("<p>x</p>")
    };

    renderer(&launcher).render(params).await.expect("render");

    let evaluated: Vec<String> = launcher
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            DriverCall::Evaluate(expr) => Some(expr),
            _ => None,
        })
        .collect();
    assert_eq!(
        evaluated,
        vec![CONTENT_HEIGHT_SCRIPT.to_string(), function.expression()]
    );
}

#[tokio::test]
async fn fixed_height_and_paper_format_skip_measurement() {
    let dir = TempDir::new().expect("tempdir");
    let launcher = RecordingLauncher::new();
    let params = Html2PdfParams {
        file_name: Some(output_in(&dir, "a4.pdf")),
        pdf_height: Some(PdfHeight::Pixels(1200)),
        format: Some(PaperFormat::A4),
        emulation_media_type: Some(EmulationMedia::Print),
        ..Html2PdfParams::from_html("<p>x</p>")
    };

    let doc = renderer(&launcher).render(params).await.expect("render");

    let calls = launcher.calls();
    assert!(!kinds(&calls).contains(&"evaluate"));
    assert!(calls.contains(&DriverCall::EmulateMediaType(EmulationMedia::Print)));
    assert_eq!(doc.content_height, None);
    assert_eq!(doc.paper.width_in, 8.27);
    assert_eq!(doc.paper.height_in, 11.7);
}

#[tokio::test]
async fn missing_navigation_response_fails_and_closes_browser() {
    let dir = TempDir::new().expect("tempdir");
    let out = output_in(&dir, "never.pdf");
    let launcher = RecordingLauncher::new().with_navigation_response(None);
    let params = Html2PdfParams {
        file_name: Some(out.clone()),
        ..Html2PdfParams::from_url("https://example.com")
    };

    let err = renderer(&launcher).render(params).await.unwrap_err();

    assert!(matches!(err, Html2PdfError::Navigation(_)));
    assert!(err.to_string().starts_with("Couldn't navigate to url"));
    let names = kinds(&launcher.calls());
    assert!(!names.contains(&"pdf"));
    assert_eq!(&names[names.len() - 2..], &["close_page", "close_browser"]);
    assert!(!out.exists());
}

#[tokio::test]
async fn script_failure_still_closes_browser() {
    let dir = TempDir::new().expect("tempdir");
    let launcher = RecordingLauncher::new().failing_at(FailAt::Evaluate);
    let params = Html2PdfParams {
        file_name: Some(output_in(&dir, "x.pdf")),
        page_function: Some(PageFunction::new("() => boom()")),
        ..Html2PdfParams::from_html("<p>x</p>")
    };

    let err = renderer(&launcher).render(params).await.unwrap_err();

    assert!(matches!(err, Html2PdfError::Script(_)));
    assert_eq!(kinds(&launcher.calls()).last(), Some(&"close_browser"));
}

#[tokio::test]
async fn launch_failure_surfaces_browser_error() {
    let launcher = RecordingLauncher::new().failing_at(FailAt::Launch);
    let err = renderer(&launcher)
        .render(Html2PdfParams::from_html("<p>x</p>"))
        .await
        .unwrap_err();

    assert!(matches!(err, Html2PdfError::Browser(_)));
    assert_eq!(kinds(&launcher.calls()), vec!["launch"]);
}

#[tokio::test]
async fn invalid_input_fails_before_launching() {
    let launcher = RecordingLauncher::new();

    let err = renderer(&launcher)
        .render(Html2PdfParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Html2PdfError::MissingSource));
    assert_eq!(err.to_string(), "a Url or Html is required");

    let params = Html2PdfParams {
        html: Some("<p>x</p>".to_string()),
        ..Html2PdfParams::from_url("example.com")
    };
    let err = renderer(&launcher).render(params).await.unwrap_err();
    assert!(matches!(err, Html2PdfError::ConflictingSources));

    let err = renderer(&launcher)
        .render(Html2PdfParams::from_url("ht!tp://nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, Html2PdfError::InvalidUrl { .. }));

    assert!(launcher.calls().is_empty());
}

#[tokio::test]
async fn hooks_see_the_response_and_the_page() {
    let dir = TempDir::new().expect("tempdir");
    let launcher = RecordingLauncher::new();
    let seen_status = Arc::new(Mutex::new(None));
    let seen = Arc::clone(&seen_status);

    let params = Html2PdfParams {
        file_name: Some(output_in(&dir, "hooks.pdf")),
        ..Html2PdfParams::from_url("example.com")
    }
    .with_navigation_hook(move |response, _page| {
        let seen = Arc::clone(&seen);
        let status = response.status;
        Box::pin(async move {
            *seen.lock().unwrap() = Some(status);
            Ok::<(), Html2PdfError>(())
        })
    })
    .with_page_hook(|page| {
        Box::pin(async move {
            page.evaluate("window.__hooked = true").await?;
            Ok::<(), Html2PdfError>(())
        })
    });

    renderer(&launcher).render(params).await.expect("render");

    assert_eq!(*seen_status.lock().unwrap(), Some(200));
    let names = kinds(&launcher.calls());
    let hook_eval = launcher
        .calls()
        .iter()
        .position(|c| *c == DriverCall::Evaluate("window.__hooked = true".to_string()))
        .expect("hook evaluated");
    let pdf = names.iter().position(|n| *n == "pdf").expect("pdf call");
    assert!(hook_eval < pdf);
}

#[tokio::test]
async fn hook_error_aborts_render() {
    let launcher = RecordingLauncher::new();
    let params = Html2PdfParams::from_html("<p>x</p>").with_page_hook(|_page| {
        Box::pin(async { Err::<(), Html2PdfError>(Html2PdfError::hook("refused")) })
    });

    let err = renderer(&launcher).render(params).await.unwrap_err();

    assert!(matches!(err, Html2PdfError::Hook(ref msg) if msg == "refused"));
    let names = kinds(&launcher.calls());
    assert!(!names.contains(&"pdf"));
    assert_eq!(names.last(), Some(&"close_browser"));
}

#[tokio::test]
async fn config_defaults_apply_when_params_are_unset() {
    let dir = TempDir::new().expect("tempdir");
    let launcher = RecordingLauncher::new();
    let mut config = Config::default();
    config.page.width = 900;
    config.page.viewport_height = 500;
    config.pdf.padding = 0;
    config.pdf.file_name = output_in(&dir, "from-config.pdf");

    let doc = PdfRenderer::new(launcher.clone())
        .with_config(config)
        .render(Html2PdfParams::from_html("<p>x</p>"))
        .await
        .expect("render");

    assert_eq!(doc.viewport, Viewport::new(900, 500));
    assert!((doc.paper.width_in - 900.0 / 96.0).abs() < 1e-9);
    assert!((doc.paper.height_in - 1000.0 / 96.0).abs() < 1e-9);
    assert!(Path::new(&doc.path).ends_with("from-config.pdf"));
    assert!(doc.path.exists());
}

#[tokio::test]
async fn pdf_options_path_creates_nested_directories() {
    let dir = TempDir::new().expect("tempdir");
    let nested = dir.path().join("reports/2026/q3.pdf");
    let launcher = RecordingLauncher::new().with_pdf_bytes(b"%PDF-1.4 custom".to_vec());
    let params = Html2PdfParams {
        file_name: Some(output_in(&dir, "ignored.pdf")),
        pdf_options: Some(PdfOptions {
            path: Some(nested.clone()),
            ..PdfOptions::default()
        }),
        ..Html2PdfParams::from_html("<p>x</p>")
    };

    let doc = renderer(&launcher).render(params).await.expect("render");

    assert_eq!(doc.path, nested);
    assert_eq!(std::fs::read(&nested).unwrap(), b"%PDF-1.4 custom");
    assert!(!output_in(&dir, "ignored.pdf").exists());
}

struct StallingLauncher;

impl BrowserLauncher for StallingLauncher {
    fn launch<'a>(
        &'a self,
        _settings: &'a LaunchSettings,
    ) -> BoxFuture<'a, html2pdf_lib::Result<Box<dyn BrowserSession>>> {
        futures::future::pending().boxed()
    }
}

#[tokio::test]
async fn render_timeout_bounds_the_whole_run() {
    let mut config = Config::default();
    config.timeouts.render = Duration::from_millis(50);

    let err = PdfRenderer::new(StallingLauncher)
        .with_config(config)
        .render(Html2PdfParams::from_html("<p>x</p>"))
        .await
        .unwrap_err();

    match err {
        Html2PdfError::Timeout { after, .. } => assert_eq!(after, Duration::from_millis(50)),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn render_timeout_still_closes_page_and_browser() {
    let dir = TempDir::new().expect("tempdir");
    let launcher = RecordingLauncher::new().stalling_at(FailAt::Evaluate);
    let mut config = Config::default();
    config.timeouts.render = Duration::from_millis(50);
    let params = Html2PdfParams {
        file_name: Some(output_in(&dir, "never.pdf")),
        page_function: Some(PageFunction::new("() => new Promise(() => {})")),
        ..Html2PdfParams::from_html("<p>x</p>")
    };

    let err = renderer(&launcher)
        .with_config(config)
        .render(params)
        .await
        .unwrap_err();

    assert!(matches!(err, Html2PdfError::Timeout { .. }), "got {err:?}");
    let names = kinds(&launcher.calls());
    assert!(!names.contains(&"pdf"));
    assert_eq!(names[names.len() - 2..], ["close_page", "close_browser"]);
    assert!(!output_in(&dir, "never.pdf").exists());
}

#[tokio::test]
async fn page_function_result_does_not_change_the_document() {
    let dir = TempDir::new().expect("tempdir");
    let launcher = RecordingLauncher::new()
        .with_script_result(serde_json::json!({ "rewritten": true }))
        .with_content_height(400);
    let params = Html2PdfParams {
        file_name: Some(output_in(&dir, "result.pdf")),
        page_function: Some(PageFunction::new("() => ({ rewritten: true })")),
        ..Html2PdfParams::from_html("<p>x</p>")
    };

    let doc = renderer(&launcher).render(params).await.expect("render");

    assert_eq!(doc.content_height, Some(400));
    assert_eq!(doc.bytes, MOCK_PDF_BYTES);
}
