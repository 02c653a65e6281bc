//! # Journal CLI
//!
//! Renders a saved journal page to a PNG preview or a print PDF.

use clap::Parser;
use journal_cli::{open_studio, CliArgs, Command};
use journal_core::PageCommands;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing.
///
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,journal_core=debug,journal_renderer=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    tracing::info!(snapshot = %args.snapshot.display(), "Starting Journal CLI");

    match &args.command {
        Command::Preview { out, scale } => {
            let mut studio = open_studio(&args, std::path::Path::new("."))?;
            let png = studio.render_png(*scale)?;
            std::fs::write(out, &png)?;
            tracing::info!(out = %out.display(), bytes = png.len(), "preview written");
        }
        Command::Export { dir } => {
            let mut studio = open_studio(&args, dir)?;
            let receipt = studio.export()?;
            println!("{}", receipt.location);
        }
    }

    Ok(())
}
