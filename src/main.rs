//! CLI Entry Point for stringlight
//!
//! Thin front end over the driver library. Every subcommand opens the
//! controller, runs one operation and exits.
//!
//! # Usage
//!
//! ```bash
//! stringlight on
//! stringlight color 255 80 0
//! stringlight mode fade
//! stringlight --port /dev/ttyACM0 status
//! stringlight ports
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use stringlight::config::{DriverConfig, DEFAULT_CONFIG_PATH};
use stringlight::discovery::{DirectoryScan, PortDiscovery};
use stringlight::protocol::Mode;
use stringlight::{logging, StringLight};
use tracing::info;

#[derive(Parser)]
#[command(name = "stringlight")]
#[command(about = "Control a StringLight LED strip over serial", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Serial port, overriding the configured path and discovery
    #[arg(long, global = true)]
    port: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Power the strip on
    On,
    /// Power the strip off
    Off,
    /// Set the colour
    Color {
        /// Red channel
        r: u8,
        /// Green channel
        g: u8,
        /// Blue channel
        b: u8,
    },
    /// Set the animation mode (solid, jump, fade, user)
    Mode {
        /// Mode name
        mode: Mode,
    },
    /// Set the animation speed (0-255)
    Speed {
        /// Raw speed value
        #[arg(allow_negative_numbers = true)]
        speed: i32,
    },
    /// Enable or disable async animation
    Async {
        /// New state
        state: Toggle,
    },
    /// Print the controller status as JSON
    Status,
    /// List candidate serial ports
    Ports,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = DriverConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(port) = cli.port {
        config.port.path = Some(port);
    }
    config.validate().context("Invalid configuration")?;
    logging::init(&config.logging).context("Failed to initialise logging")?;

    if let Commands::Ports = cli.command {
        let scan = DirectoryScan::from(&config.port.discovery);
        for port in scan.discover().context("Port discovery failed")? {
            println!("{port}");
        }
        return Ok(());
    }

    let mut light = StringLight::open(&config).context("Failed to open StringLight")?;
    info!(port = light.port_id(), "Connected");

    match cli.command {
        Commands::On => light.turn_on()?,
        Commands::Off => light.turn_off()?,
        Commands::Color { r, g, b } => light.set_color(r, g, b)?,
        Commands::Mode { mode } => light.set_mode(mode)?,
        Commands::Speed { speed } => light.set_speed(speed)?,
        Commands::Async { state } => light.set_async(matches!(state, Toggle::On))?,
        Commands::Status => {
            let status = light.get_status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Ports => {}
    }

    Ok(())
}
