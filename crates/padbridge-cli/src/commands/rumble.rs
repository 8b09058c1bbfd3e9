//! `padctl rumble`: read the rumble fields, or write them as the bridge would.

use std::path::Path;

use anyhow::Result;
use padbridge_shm::{RumbleCommand, SlotChannel};
use serde_json::json;

use crate::commands::player_path;
use crate::error::CliError;
use crate::output;

pub fn execute(
    base: &Path,
    player: usize,
    set: Option<RumbleCommand>,
    json: bool,
) -> Result<()> {
    let path = player_path(base, player)?;
    let channel = SlotChannel::open(&path).map_err(CliError::from)?;
    if let Some(command) = set {
        channel.write_rumble(command).map_err(CliError::from)?;
    }

    let rumble = channel
        .read_record()
        .map_err(CliError::from)?
        .ok_or_else(|| CliError::NoData(path.clone()))?
        .rumble;

    if json {
        output::print_json(&json!({
            "success": true,
            "player": player,
            "rumble": rumble,
        }))?;
    } else {
        output::print_rumble_human(player, rumble);
    }
    Ok(())
}
