//! `padctl init`: create backing files the way the producer does.

use std::path::Path;

use anyhow::Result;
use padbridge_shm::ProducerChannel;
use serde_json::json;

use crate::commands::player_path;
use crate::output;

pub fn execute(base: &Path, players: usize, json: bool) -> Result<()> {
    // Validates the count before touching the filesystem.
    player_path(base, players)?;

    let mut created = Vec::with_capacity(players);
    for player in 1..=players {
        let channel = ProducerChannel::create(player_path(base, player)?)?;
        channel.flush()?;
        created.push(channel.path().to_path_buf());
    }

    if json {
        output::print_json(&json!({ "success": true, "files": created }))?;
    } else {
        output::print_created_human(&created);
    }
    Ok(())
}
