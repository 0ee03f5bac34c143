//! subshape - per-subscriber traffic-control report.
//!
//! Shows, for every subscriber on a shaped link, the class and filter
//! identifiers derived from its address next to the rates and hit
//! counters the kernel is actually applying.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use subshape::config::Config;
use subshape::output::{OutputFormat, OutputOptions};

#[derive(Parser)]
#[command(name = "subshape", version, about = "Per-subscriber traffic-control report")]
struct Cli {
    /// Output JSON.
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long, global = true)]
    pretty: bool,

    /// Show the full classifier breakdown.
    #[arg(short = 'x', long, global = true)]
    extensive: bool,

    /// Shaper configuration file.
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report subscribers with their classes, rates and hits.
    #[command(visible_alias = "r")]
    Report(commands::report::ReportCmd),

    /// Show qdiscs on the shaping devices.
    #[command(visible_alias = "q")]
    Qdisc(commands::qdisc::QdiscCmd),

    /// Derive classifier IDs for sequential hosts of a network.
    #[command(visible_alias = "s")]
    Sample(commands::sample::SampleCmd),

    /// Derive classifier IDs for addresses.
    #[command(visible_alias = "d")]
    Derive(commands::derive::DeriveCmd),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let opts = OutputOptions {
        extensive: cli.extensive,
        pretty: cli.pretty,
    };

    let result = match cli.command {
        Command::Report(cmd) => match load_config(cli.config) {
            Ok(config) => cmd.run(config, format, &opts).await,
            Err(e) => Err(e),
        },
        Command::Qdisc(cmd) => match load_config(cli.config) {
            Ok(config) => cmd.run(config, format, &opts).await,
            Err(e) => Err(e),
        },
        Command::Sample(cmd) => cmd.run(format, &opts),
        Command::Derive(cmd) => cmd.run(format, &opts),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(&path)
            .map_err(|e| anyhow::anyhow!("cannot load config {}: {}", path.display(), e)),
        None => Ok(Config::default()),
    }
}
