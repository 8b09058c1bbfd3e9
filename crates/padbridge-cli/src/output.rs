//! Output formatting for padctl

use std::path::{Path, PathBuf};

use anyhow::Error;
use colored::Colorize;
use padbridge_shm::{RumbleCommand, SharedRecord};
use serde::Serialize;
use serde_json::json;

const AXIS_NAMES: [&str; 6] = ["lx", "ly", "rx", "ry", "lt", "rt"];

/// Print any serializable value as pretty JSON.
pub fn print_json(value: &impl Serialize) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

pub fn print_created_human(files: &[PathBuf]) {
    println!("{}", "Backing files ready:".bold());
    for (player, path) in files.iter().enumerate() {
        println!(
            "  Player {} {}",
            player.saturating_add(1),
            path.display().to_string().dimmed()
        );
    }
}

pub fn print_record_human(player: usize, path: &Path, record: &SharedRecord) {
    println!(
        "{} {}",
        format!("Player {player}").bold(),
        path.display().to_string().dimmed()
    );

    let axes: Vec<String> = AXIS_NAMES
        .iter()
        .zip(record.state.axes)
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    println!("  Axes:    {}", axes.join(" "));

    let pressed: Vec<String> = record
        .state
        .buttons
        .iter()
        .enumerate()
        .filter(|(_, value)| **value != 0)
        .map(|(index, _)| index.to_string())
        .collect();
    if pressed.is_empty() {
        println!("  Buttons: {}", "none".dimmed());
    } else {
        println!("  Buttons: {}", pressed.join(",").green());
    }

    println!("  Hat:     {:#04x}", record.state.hat);
    print_rumble_line(record.rumble);
}

pub fn print_sent_human(player: usize, changed: usize) {
    if changed == 0 {
        println!("Player {player}: {}", "no change".yellow());
    } else {
        println!("Player {player}: {} field(s) {}", changed, "updated".green());
    }
}

pub fn print_rumble_human(player: usize, rumble: RumbleCommand) {
    println!("{}", format!("Player {player}").bold());
    print_rumble_line(rumble);
}

fn print_rumble_line(rumble: RumbleCommand) {
    let status = if rumble.is_stopped() {
        "stopped".dimmed()
    } else {
        "active".green()
    };
    println!(
        "  Rumble:  low={} high={} ({status})",
        rumble.low, rumble.high
    );
}
