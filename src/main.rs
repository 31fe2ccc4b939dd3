mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use cli::Commands;
use commands::{run_config, run_render};

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}

async fn run() -> ExitCode {
    let args = cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Render(render) => run_render(args.config, *render).await,
        Commands::Config { report } => run_config(args.config, report),
    }
}

/// Logs go to stderr so stdout stays reserved for the report. `RUST_LOG` wins
/// over `--verbose`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "html2pdf=debug,html2pdf_lib=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
