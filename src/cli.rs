use clap::{Args, Parser, Subcommand, ValueEnum};
use html2pdf_lib::{
    EmulationMedia, Length, PaperFormat, PdfHeight, ReferrerPolicy, Viewport, WaitUntil,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "html2pdf")]
#[command(
    version,
    about = "Render a URL or an HTML string to PDF through a headless Chromium",
    long_about = "html2pdf\n\nCommands:\n- render: load a URL or HTML in headless Chromium and print it to PDF.\n- config: show the effective configuration (defaults merged with the config file).\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose (debug) logging on stderr")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) with defaults for page/pdf/browser/timeouts; CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a URL or HTML to a PDF file
    Render(Box<RenderArgs>),

    /// Print the effective configuration
    Config {
        #[arg(long, value_enum, default_value = "json", help = "Report format")]
        report: OutputFormat,
    },
}

#[derive(Args)]
pub struct RenderArgs {
    #[arg(long, help = "Page to render; bare hosts get https:// prepended")]
    pub url: Option<String>,

    #[arg(long, help = "Literal HTML markup to render", conflicts_with = "html_file")]
    pub html: Option<String>,

    #[arg(long, value_name = "PATH", help = "Read the HTML markup from a file")]
    pub html_file: Option<PathBuf>,

    #[arg(long, short, value_name = "PATH", help = "PDF output path [default: website.pdf]")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Page width in px; fallback for the viewport and PDF width")]
    pub width: Option<u32>,

    #[arg(long, help = "Viewport dimensions (WIDTHxHEIGHT)")]
    pub viewport: Option<Viewport>,

    #[arg(long, value_name = "FACTOR", help = "Device scale factor")]
    pub scale_factor: Option<f64>,

    #[arg(long, help = "Emulate a mobile device")]
    pub mobile: bool,

    #[arg(long, help = "Emulate touch support")]
    pub touch: bool,

    #[arg(long, value_name = "PX", help = "PDF width in px")]
    pub pdf_width: Option<u32>,

    #[arg(
        long,
        value_name = "PX|bodyHeight",
        help = "PDF height in px, or bodyHeight to fit the document [default: bodyHeight]"
    )]
    pub pdf_height: Option<PdfHeight>,

    #[arg(long, value_name = "PX", help = "Pixels added to a measured body height [default: 100]")]
    pub padding: Option<u32>,

    #[arg(long, help = "Paper format (letter, legal, tabloid, ledger, a0-a6); wins over width/height")]
    pub paper: Option<PaperFormat>,

    #[arg(long, help = "Print in landscape orientation")]
    pub landscape: bool,

    #[arg(long, help = "Print scale between 0.1 and 2")]
    pub scale: Option<f64>,

    #[arg(long, value_name = "LENGTH", help = "Uniform page margin (e.g. 10mm, 0.5in, 24px)")]
    pub margin: Option<Length>,

    #[arg(long, value_name = "RANGES", help = "Pages to print, e.g. 1-3,5")]
    pub page_ranges: Option<String>,

    #[arg(long, help = "Do not print background graphics")]
    pub no_background: bool,

    #[arg(long, value_name = "HTML", help = "Header template; enables header/footer")]
    pub header_template: Option<String>,

    #[arg(long, value_name = "HTML", help = "Footer template; enables header/footer")]
    pub footer_template: Option<String>,

    #[arg(long, help = "Prefer page size declared by CSS @page")]
    pub prefer_css_page_size: bool,

    #[arg(long, value_name = "MEDIA", help = "Emulated media type (screen, print) [default: screen]")]
    pub media: Option<EmulationMedia>,

    #[arg(
        long,
        value_delimiter = ',',
        value_name = "EVENTS",
        help = "Wait conditions (load,domcontentloaded,networkidle0,networkidle2) [default: networkidle0]"
    )]
    pub wait_until: Option<Vec<WaitUntil>>,

    #[arg(long = "header", value_name = "NAME: VALUE", help = "Extra HTTP header (repeatable)")]
    pub headers: Vec<String>,

    #[arg(long, help = "Referer header sent with the navigation")]
    pub referer: Option<String>,

    #[arg(long, value_name = "POLICY", help = "Referrer policy for the navigation")]
    pub referrer_policy: Option<ReferrerPolicy>,

    #[arg(
        long,
        value_name = "JS",
        help = "JavaScript function run in the page before printing, e.g. '(t) => document.title = t'",
        conflicts_with = "script_file"
    )]
    pub script: Option<String>,

    #[arg(long, value_name = "PATH", help = "Read the page function from a file")]
    pub script_file: Option<PathBuf>,

    #[arg(long = "script-arg", value_name = "JSON", help = "JSON argument for the page function (repeatable)")]
    pub script_args: Vec<String>,

    #[arg(long, value_name = "PATH", help = "Chrome/Chromium executable (else CHROME_BIN or autodetect)")]
    pub chrome: Option<PathBuf>,

    #[arg(
        long = "browser-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        help = "Browser command-line argument (repeatable; replaces the default --no-sandbox)"
    )]
    pub browser_args: Vec<String>,

    #[arg(long, help = "Run the browser with a visible window")]
    pub headful: bool,

    #[arg(long, value_name = "PATH", help = "Browser profile directory")]
    pub user_data_dir: Option<PathBuf>,

    #[arg(long, value_name = "SECS", help = "Navigation timeout in seconds; 0 disables [default: 30]")]
    pub nav_timeout: Option<u64>,

    #[arg(long, value_name = "SECS", help = "Whole render timeout in seconds; 0 disables [default: 120]")]
    pub render_timeout: Option<u64>,

    #[arg(long, value_enum, default_value = "json", help = "Report format")]
    pub report: OutputFormat,

    #[arg(long, value_name = "PATH", help = "Write the report to a file instead of stdout")]
    pub report_file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}
