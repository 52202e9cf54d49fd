use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ue_monitor::{FieldSet, Monitor, MonitorConfig, Overrides};

#[derive(Parser, Debug)]
#[command(name = "ue-monitor")]
#[command(about = "Monitor UE throughput and signal parameters via WebSocket")]
struct Args {
    /// UE ID to monitor
    #[arg(long)]
    ue_id: u32,

    /// WebSocket server URL (default: ws://127.0.0.1:9001/)
    #[arg(long)]
    ws_url: Option<String>,

    /// Which fields to collect and export
    #[arg(long, value_enum)]
    fields: Option<FieldSet>,

    /// Poll interval (e.g., "1s", "500ms")
    #[arg(long)]
    interval: Option<String>,

    /// Directory the CSV file is written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so the live view on stdout stays readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("ue_monitor={}", args.log_level))),
        )
        .with_writer(io::stderr)
        .init();

    let overrides = Overrides {
        ue_id: Some(args.ue_id),
        ws_url: args.ws_url,
        poll_interval: args.interval,
        fields: args.fields,
        output_dir: args.output_dir,
    };
    let config = MonitorConfig::load(args.config.as_deref(), &overrides)
        .context("Failed to load configuration")?;
    info!(?config, "Configuration loaded");

    let ue_id = config.ue_id;
    let monitor = Monitor::new(config);

    let stop = monitor.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nStopping monitoring...");
            stop.stop();
        }
    });

    println!("Starting UE[{}] monitoring...", ue_id);
    println!("Press Ctrl+C to stop");

    // Export failures are reported on the console by the exporter itself
    let outcome = monitor.run(&mut io::stdout()).await;
    if let Some(path) = outcome.saved_to {
        info!(path = %path.display(), "Monitoring finished");
    }
    Ok(())
}
