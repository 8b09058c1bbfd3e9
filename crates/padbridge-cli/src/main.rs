//! padctl - padbridge backing file tool
//!
//! Stands in for the emulation process: creates the per-player backing
//! files, writes gamepad input into them and reads back the rumble the
//! bridge writes.

#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use padbridge_shm::{DEFAULT_BASE_PATH, RumbleCommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::SendArgs;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "padctl")]
#[command(about = "Create, inspect and drive padbridge backing files")]
#[command(version)]
#[command(long_about = "
padctl acts as the producer side of the padbridge shared gamepad files.
Players are numbered from 1; player 1 uses the base path as-is and player n
appends n-1 to the file stem (gamepad.mem, gamepad1.mem, ...).

Use --json for machine-readable output.
")]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Backing file of player 1
    #[arg(long, global = true, env = "EVSHIM_SHM_PATH", default_value = DEFAULT_BASE_PATH)]
    base: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create backing files for players 1..=N
    Init {
        /// Number of players
        #[arg(short, long, default_value_t = 1)]
        players: usize,
    },

    /// Decode a player's record
    Show {
        /// Player number
        #[arg(short, long, default_value_t = 1)]
        player: usize,
    },

    /// Write input into a player's record
    Send {
        /// Player number
        #[arg(short, long, default_value_t = 1)]
        player: usize,

        #[command(flatten)]
        args: SendArgs,
    },

    /// Read a player's rumble fields, or write them with --low/--high
    Rumble {
        /// Player number
        #[arg(short, long, default_value_t = 1)]
        player: usize,

        /// Low-frequency motor intensity to write
        #[arg(long, requires = "high")]
        low: Option<u16>,

        /// High-frequency motor intensity to write
        #[arg(long, requires = "low")]
        high: Option<u16>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("padbridge_cli={log_level},padbridge_shm={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Init { players } => commands::init::execute(&cli.base, *players, cli.json),
        Commands::Show { player } => commands::show::execute(&cli.base, *player, cli.json),
        Commands::Send { player, args } => {
            commands::send::execute(&cli.base, *player, args, cli.json)
        }
        Commands::Rumble { player, low, high } => {
            let set = low.zip(*high).map(|(low, high)| RumbleCommand::new(low, high));
            commands::rumble::execute(&cli.base, *player, set, cli.json)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["padctl", "show"])?;
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        assert!(matches!(cli.command, Commands::Show { player: 1 }));
        Ok(())
    }

    #[test]
    fn parse_global_flags_after_subcommand() -> TestResult {
        let cli = Cli::try_parse_from(["padctl", "init", "--players", "3", "--json", "--base", "/tmp/p.mem"])?;
        assert!(cli.json);
        assert_eq!(cli.base, PathBuf::from("/tmp/p.mem"));
        assert!(matches!(cli.command, Commands::Init { players: 3 }));
        Ok(())
    }

    #[test]
    fn parse_send_assignments() -> TestResult {
        let cli = Cli::try_parse_from([
            "padctl", "send", "-p", "2", "--axis", "0=-5", "--axis", "4=32767", "--button", "1=1",
            "--hat", "8",
        ])?;
        let Commands::Send { player, args } = cli.command else {
            return Err("expected send".into());
        };
        assert_eq!(player, 2);
        assert_eq!(args.axes.len(), 2);
        assert_eq!(args.buttons.len(), 1);
        assert_eq!(args.hat, Some(8));
        Ok(())
    }

    #[test]
    fn parse_rumble_requires_both_motors() {
        assert!(Cli::try_parse_from(["padctl", "rumble", "--low", "5"]).is_err());
        assert!(Cli::try_parse_from(["padctl", "rumble", "--low", "5", "--high", "6"]).is_ok());
    }

    #[test]
    fn parse_bad_assignment_rejected() {
        assert!(Cli::try_parse_from(["padctl", "send", "--axis", "zero"]).is_err());
    }
}
