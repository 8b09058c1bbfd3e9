//! `padctl show`: decode a player's record.

use std::path::Path;

use anyhow::Result;
use padbridge_shm::SlotChannel;
use serde_json::json;

use crate::commands::player_path;
use crate::error::CliError;
use crate::output;

pub fn execute(base: &Path, player: usize, json: bool) -> Result<()> {
    let path = player_path(base, player)?;
    let channel = SlotChannel::open(&path).map_err(CliError::from)?;
    let record = channel
        .read_record()
        .map_err(CliError::from)?
        .ok_or_else(|| CliError::NoData(path.clone()))?;

    if json {
        output::print_json(&json!({
            "success": true,
            "player": player,
            "path": path,
            "state": record.state,
            "rumble": record.rumble,
        }))?;
    } else {
        output::print_record_human(player, &path, &record);
    }
    Ok(())
}
