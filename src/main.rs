// src/main.rs
//! GPS Link - serial GPS acquisition daemon

use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use gps_link::{transport, GpsMonitor, Settings};

#[derive(Parser, Debug)]
#[command(name = "gps-link", version, about = "Serial GPS acquisition engine")]
struct Cli {
    /// Serial device path (overrides config file and environment)
    #[arg(short, long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    baudrate: Option<u32>,

    /// Read cycle interval in milliseconds
    #[arg(long)]
    update_interval_ms: Option<u64>,

    /// Deferred reconnect delay in milliseconds
    #[arg(long)]
    reconnect_interval_ms: Option<u64>,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Persist the effective settings to the config file
    #[arg(long)]
    save_settings: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list_ports {
        let ports = transport::list_serial_ports().context("failed to list serial ports")?;
        if ports.is_empty() {
            println!("No serial ports found.");
        } else {
            println!("Available serial ports:");
            for port in ports {
                println!("  {}", port);
            }
        }
        return Ok(());
    }

    // Config file, then environment, then flags.
    let mut settings = Settings::load().unwrap_or_default();
    settings.apply_env();
    if let Some(port) = cli.port {
        settings.port = port;
    }
    if let Some(baudrate) = cli.baudrate {
        settings.baudrate = baudrate;
    }
    if let Some(interval) = cli.update_interval_ms {
        settings.update_interval_ms = interval;
    }
    if let Some(interval) = cli.reconnect_interval_ms {
        settings.reconnect_interval_ms = interval;
    }
    if cli.save_settings {
        settings.save().context("failed to save settings")?;
    }

    println!(
        "Starting GPS link on {} at {} baud...",
        settings.port, settings.baudrate
    );

    let (monitor, mut status_rx) = GpsMonitor::new(&settings);
    monitor.connect();
    monitor.start_updates();

    tokio::spawn(async move {
        while let Some(event) = status_rx.recv().await {
            println!("[{:?}] {}", event.kind, event.detail);
        }
    });

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                if let Some(fix) = monitor.current_data() {
                    if fix.has_position() {
                        println!(
                            "{:.6}° {} {:.6}° {}  alt {:.1} m  sats {}  quality {}",
                            fix.latitude,
                            fix.lat_dir,
                            fix.longitude,
                            fix.lon_dir,
                            fix.height,
                            fix.num_sats,
                            fix.gps_quality.description()
                        );
                    }
                }
            }
        }
    }

    println!("Shutting down...");
    monitor.shutdown();
    Ok(())
}
