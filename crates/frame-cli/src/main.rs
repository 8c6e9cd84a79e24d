//! Frame Inference CLI - drive the frame pipeline from still images
//!
//! Stands in for a real-time host: it feeds an image file through the same
//! execute cycle a video host would call once per frame.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::params::ParamsCommand;
use commands::run::RunCommand;

#[derive(Parser)]
#[command(
    name = "frame-infer",
    version,
    about = "Per-frame image-to-image neural inference",
    after_help = "EXAMPLES:\n  \
                  # Run a style-transfer model on one frame\n  \
                  frame-infer run --model models/udnie.onnx frame.png -o styled.png\n\n  \
                  # Repeat the execute cycle to measure steady-state latency\n  \
                  frame-infer run --model models/udnie.onnx --repeat 30 frame.png\n\n  \
                  # Show parameter declarations and write a default config\n  \
                  frame-infer params --write params.yaml"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run execute cycles on an image file
    Run(RunCommand),

    /// Show the operator descriptor and parameter declarations
    Params(ParamsCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match &cli.command {
        Commands::Params(_) => Level::WARN,
        Commands::Run(_) => {
            if cli.verbose {
                Level::DEBUG
            } else {
                Level::INFO
            }
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Run(cmd) => cmd.execute(),
        Commands::Params(cmd) => cmd.execute(),
    }
}
