//! padbridged - run the controller bridge as a standalone process.
//!
//! Reads the same environment variables as the in-process attach, lets
//! command-line flags override them, and runs until Ctrl-C.

#![deny(clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use padbridge::{Bridge, BridgeConfig, logging};
use padbridge_backend::Sdl2Backend;
use padbridge_devfilter::DeviceFilter;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "padbridged")]
#[command(about = "Bridge shared-memory gamepads to virtual joysticks")]
#[command(version)]
struct Args {
    /// Player slots to attach (clamped to 4)
    #[arg(short, long)]
    players: Option<usize>,

    /// Backing file of player 1; other players derive from it
    #[arg(short, long)]
    base: Option<PathBuf>,

    /// Joystick library name or path
    #[arg(long)]
    library: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    debug: bool,

    /// Do not install the input device filter
    #[arg(long)]
    no_filter: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn apply(&self, mut config: BridgeConfig) -> BridgeConfig {
        if let Some(players) = self.players {
            config.players = players.min(padbridge::MAX_PLAYERS);
        }
        if let Some(base) = &self.base {
            config.base_path.clone_from(base);
        }
        if let Some(library) = &self.library {
            config.backend_library.clone_from(library);
        }
        config.debug |= self.debug;
        config.shutdown_on_drop = true;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.apply(BridgeConfig::from_env());

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    logging::init(config.debug);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting padbridged");

    if args.no_filter {
        warn!("Input device filter disabled");
    } else {
        padbridge_devfilter::install(DeviceFilter::new())
            .context("failed to install the input device filter")?;
    }

    let backend = Sdl2Backend::load(&config.backend_library)
        .with_context(|| format!("failed to load {}", config.backend_library))?;
    let handle = Bridge::start(config, Arc::new(backend)).context("bridge failed to start")?;
    info!(attached = handle.attached_count(), "Running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutting down");

    tokio::task::spawn_blocking(move || handle.shutdown())
        .await
        .context("shutdown task failed")??;

    info!("padbridged stopped");
    Ok(())
}
