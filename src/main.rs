//! Contact Sensor Agent CLI
//!
//! Replays recorded avatar parameter updates and reports contact features.

use anyhow::Context;
use clap::{Parser, Subcommand};
use contact_sensor_agent::{
    activity::create_shared_log,
    config::{Config, OutputFormat},
    core::SnapshotBuilder,
    init_logging,
    replay::{InputSource, Replayer, UpdateReader},
    VERSION,
};
use crossbeam_channel::RecvTimeoutError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "contact-sensor")]
#[command(version = VERSION)]
#[command(about = "Length detection and contact features for avatar proximity sensors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a recorded session and print the final features
    Replay {
        /// JSON-lines file of channel updates (stdin if omitted or "-")
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Output format (text, json or jsonl); defaults to the configured format
        #[arg(long)]
        format: Option<String>,

        /// Write the snapshot to the configured export directory as well
        #[arg(long)]
        export: bool,
    },

    /// Process updates continuously, printing device status periodically
    Watch {
        /// JSON-lines file of channel updates (stdin if omitted or "-")
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Status interval in seconds; defaults to the configured interval
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Show configuration
    Config {
        /// Write the current configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load configuration, using defaults: {e}");
            Config::default()
        }
    };
    init_logging(&config.log_filter);

    match cli.command {
        Commands::Replay {
            input,
            format,
            export,
        } => cmd_replay(&config, input, format.as_deref(), export),
        Commands::Watch { input, interval } => cmd_watch(&config, input, interval),
        Commands::Config { init } => cmd_config(&config, init),
    }
}

fn cmd_replay(
    config: &Config,
    input: Option<PathBuf>,
    format: Option<&str>,
    export: bool,
) -> anyhow::Result<()> {
    let format = match format {
        Some(f) => f.parse::<OutputFormat>()?,
        None => config.output_format,
    };

    let log = create_shared_log();
    let reader = UpdateReader::spawn(InputSource::from_arg(input), config.channel_capacity)?;
    let mut replayer = Replayer::new(log.clone());

    replayer.run_to_end(reader.receiver());
    reader.join()?;

    let devices = replayer.devices();
    tracing::info!(devices = devices.len(), "Replay finished");

    let builder = SnapshotBuilder::new();
    let snapshot = builder.build(devices);

    if export {
        config.ensure_directories()?;
        let path = config
            .export_path
            .join(format!("snapshot_{}.json", snapshot.snapshot_id));
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&path, json)
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
        log.record_snapshot_exported();
        eprintln!("Exported snapshot to {}", path.display());
    }

    match format {
        OutputFormat::Text => {
            if devices.is_empty() {
                println!("No devices seen.");
            } else {
                println!("{}", devices.status());
            }
            println!();
            println!("Instance ID: {}", builder.instance_id());
            println!("{}", log.summary());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        OutputFormat::Jsonl => println!("{}", serde_json::to_string(&snapshot)?),
    }

    Ok(())
}

fn cmd_watch(config: &Config, input: Option<PathBuf>, interval: Option<u64>) -> anyhow::Result<()> {
    let interval = interval
        .map(Duration::from_secs)
        .unwrap_or(config.status_interval)
        .max(Duration::from_millis(100));

    println!("Contact Sensor Agent v{VERSION}");
    println!("Status every {}s. Press Ctrl+C to stop", interval.as_secs_f64());
    println!();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")?;

    let log = create_shared_log();
    let reader = UpdateReader::spawn(InputSource::from_arg(input), config.channel_capacity)?;
    let receiver = reader.receiver().clone();
    let mut replayer = Replayer::new(log.clone());
    let mut last_status = Instant::now();

    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                replayer.handle(event);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("Input closed");
                break;
            }
        }

        if last_status.elapsed() >= interval {
            print_status(&replayer);
            last_status = Instant::now();
        }
    }

    print_status(&replayer);
    println!();
    println!("{}", log.summary());

    // A reader blocked on stdin cannot be joined after Ctrl+C.
    if !running.load(Ordering::SeqCst) {
        return Ok(());
    }
    reader.join()?;
    Ok(())
}

fn print_status(replayer: &Replayer) {
    let devices = replayer.devices();
    if devices.is_empty() {
        println!("[{}] No devices seen yet", chrono::Local::now().format("%H:%M:%S"));
    } else {
        println!("[{}]", chrono::Local::now().format("%H:%M:%S"));
        println!("{}", devices.status());
    }
}

fn cmd_config(config: &Config, init: bool) -> anyhow::Result<()> {
    if init {
        config.save()?;
        println!("Wrote {}", Config::config_path().display());
        println!();
    }

    println!("Contact Sensor Agent Configuration");
    println!("==================================");
    println!();
    println!("Config file: {}", Config::config_path().display());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
