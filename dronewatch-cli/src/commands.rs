use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use dronewatch_config::DronewatchConfig;
use dronewatch_engine::{
    run_dashboard, run_server, submit_detection, ManualEntry, OperatorCommand,
};
use dronewatch_telemetry::EventLogger;

use crate::render;

#[derive(Parser, Debug)]
#[command(version, about = "Drone detection dashboard and mock backend")]
pub struct Cli {
    /// Configuration file; defaults to config/dronewatch.yaml plus environment
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the mock detection backend
    Serve(ServeArgs),
    /// Follow detections and block alerts in the terminal. Reads operator
    /// commands from stdin: `add <mac> <rssi> <location>`, `clear`,
    /// `sim on|off`, `reload`
    Dashboard(DashboardArgs),
    /// Submit one detection to the backend
    Submit(SubmitArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<String>,
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug, Clone)]
pub struct DashboardArgs {
    /// Generate a random detection every simulation interval
    #[arg(long)]
    pub simulate: bool,
    /// Backend `host:port`
    #[arg(long)]
    pub api_url: Option<String>,
    /// Seed for a reproducible simulation feed
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    #[arg(long)]
    pub mac: String,
    /// Signal strength in dBm
    #[arg(long, allow_negative_numbers = true)]
    pub rssi: i32,
    #[arg(long)]
    pub location: String,
    #[arg(long)]
    pub api_url: Option<String>,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<DronewatchConfig> {
    match path {
        Some(path) => DronewatchConfig::load_from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => DronewatchConfig::load().context("loading configuration"),
    }
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_ref())?;
    EventLogger::init(&config.telemetry.log_level);

    match cli.command {
        Commands::Serve(args) => {
            if let Some(bind) = args.bind {
                config.server.bind = bind;
            }
            if let Some(port) = args.port {
                config.server.port = port;
            }
            info!(address = %config.server.listen_address(), "Starting mock backend");
            run_server(&config, shutdown_signal()).await?;
        }
        Commands::Dashboard(args) => {
            if let Some(api_url) = args.api_url {
                config.dashboard.api_url = api_url;
            }
            if args.seed.is_some() {
                config.simulation.seed = args.seed;
            }
            run_dashboard(
                &config,
                args.simulate,
                operator_commands(),
                shutdown_signal(),
                |snapshot| println!("{}", render::frame(snapshot)),
            )
            .await?;
        }
        Commands::Submit(args) => {
            if let Some(api_url) = args.api_url {
                config.dashboard.api_url = api_url;
            }
            let entry = ManualEntry::new(args.mac, args.rssi, args.location);
            let event = submit_detection(&config, entry).await?;
            println!("{}", render::detection_line(&event));
        }
    }
    Ok(())
}

/// Forwards operator lines from stdin. Lines that do not parse are reported
/// and skipped.
fn operator_commands() -> mpsc::Receiver<OperatorCommand> {
    let (commands, receiver) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match line.parse::<OperatorCommand>() {
                    Ok(command) => {
                        if commands.send(command).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => eprintln!("{}", e),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read operator input: {}", e);
                    break;
                }
            }
        }
    });
    receiver
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
