//! snoopmgr - DHCP Snooping Configuration Manager
//!
//! Entry point for the snoopmgr command.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use snoop_common::{FileInventory, FileLogSink, Inventory, LogSink, TracingLogSink};
use snoopmgr::{
    classify_all, parse_status, DryRunTransport, FleetOrchestrator, FleetSummary, SnoopConfig,
    DEFAULT_CONFIG_PATH,
};

/// DHCP snooping configuration manager
#[derive(Parser, Debug)]
#[command(name = "snoopmgr")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the batches planned for one captured status output
    Plan {
        /// File holding `show interface status` output
        #[arg(short = 's', long)]
        status: PathBuf,
    },
    /// Rehearse a fleet run against captured status outputs
    Run {
        /// Inventory file, one host per line
        #[arg(short = 'i', long)]
        inventory: PathBuf,

        /// Directory holding `<host>.txt` status captures
        #[arg(short = 'd', long)]
        capture_dir: PathBuf,
    },
}

/// Initializes tracing/logging subsystem
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn plan(config: &SnoopConfig, status: &Path) -> anyhow::Result<bool> {
    let raw = std::fs::read_to_string(status)
        .with_context(|| format!("failed to read {}", status.display()))?;
    let records = parse_status(&raw)?;
    let ports = classify_all(&config.classifier(), records);
    let batches = config.planner()?.plan(&ports);

    for port in &ports {
        println!("{:<16} {}", port.name(), port.role);
    }
    println!();
    for batch in &batches {
        println!("! {}", batch.scope());
        for command in batch.commands() {
            println!("{}", command);
        }
    }
    Ok(true)
}

async fn run(
    config: &SnoopConfig,
    inventory: &Path,
    capture_dir: &Path,
) -> anyhow::Result<bool> {
    let devices = FileInventory::new(inventory).devices()?;
    info!("Loaded {} devices from {}", devices.len(), inventory.display());

    let file_sink = match config.log.audit_file() {
        Some(path) => Some(Arc::new(
            FileLogSink::open(path)
                .await
                .with_context(|| format!("failed to open audit log {}", path.display()))?,
        )),
        None => None,
    };
    let sink: Arc<dyn LogSink> = match &file_sink {
        Some(file) => Arc::clone(file) as Arc<dyn LogSink>,
        None => Arc::new(TracingLogSink),
    };

    let transport = Arc::new(DryRunTransport::new(capture_dir));
    let orchestrator = FleetOrchestrator::from_config(config, transport, sink)?;
    let reports = orchestrator.run(devices).await;

    if let Some(file) = &file_sink {
        file.close().await;
    }

    for report in &reports {
        match &report.failure {
            Some(cause) => println!("{:<24} {:<8} {}", report.device, report.state, cause),
            None => println!(
                "{:<24} {:<8} trunk={} access={} ignored={} failed_batches={}",
                report.device,
                report.state,
                report.trunk_ports,
                report.access_ports,
                report.ignored_ports,
                report.failed_batches().count()
            ),
        }
    }

    let summary = FleetSummary::from_reports(&reports);
    info!("{}", summary);
    println!("{}", summary);
    Ok(summary.all_succeeded())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("--- Starting snoopmgr ---");

    let config = match SnoopConfig::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match &args.command {
        Command::Plan { status } => plan(&config, status),
        Command::Run {
            inventory,
            capture_dir,
        } => run(&config, inventory, capture_dir).await,
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
