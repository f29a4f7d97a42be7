//! ## dronewatch-cli
//! **Unified operational interface**
//! Runs the mock detection backend, the terminal dashboard (optionally fed
//! by the simulator) or submits a single manual detection.

use clap::Parser;

mod commands;
mod render;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run_command(cli).await
}
