use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod report;

use commands::{OutputFormat, RunArgs};

#[derive(Parser)]
#[command(
    name = "gridsim",
    about = "gridsim, a load-balancing and auto-scaling simulator",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch one batch of synthetic requests and report per-server metrics.
    Simulate {
        #[command(flatten)]
        run: RunArgs,
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Run one auto-scaling check after the batch.
        #[arg(long)]
        autoscale: bool,
    },
    /// Keep dispatching batches, streaming a JSON metrics snapshot per tick
    /// and auto-scaling after each one. Stops on Ctrl-C.
    Monitor {
        #[command(flatten)]
        run: RunArgs,
        /// Milliseconds between batches.
        #[arg(long, default_value = "1000")]
        interval_ms: u64,
        /// Stop after this many batches.
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Write a gridsim.toml scaffold.
    Init {
        #[arg(short, long, default_value = "gridsim.toml")]
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gridsim=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            run,
            format,
            autoscale,
        } => commands::simulate::simulate(&run, format, autoscale),
        Commands::Monitor {
            run,
            interval_ms,
            ticks,
        } => commands::monitor::monitor(&run, interval_ms, ticks).await,
        Commands::Init { path, force } => commands::init::init(&path, force),
    }
}
