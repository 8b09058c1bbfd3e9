//! Command implementations for padctl

pub mod init;
pub mod rumble;
pub mod send;
pub mod show;

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Args;
use padbridge_shm::backing_file_path;

use crate::error::CliError;

/// Highest player number a bridge attaches.
pub const MAX_PLAYERS: usize = 4;

/// `INDEX=VALUE` argument, e.g. `--axis 0=-32768`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment<T> {
    pub index: usize,
    pub value: T,
}

/// Clap value parser for [`Assignment`].
pub fn parse_assignment<T>(arg: &str) -> Result<Assignment<T>, String>
where
    T: FromStr,
    T::Err: Display,
{
    let (index, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=VALUE, got '{arg}'"))?;
    let index = index
        .trim()
        .parse()
        .map_err(|e| format!("bad index '{index}': {e}"))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("bad value '{value}': {e}"))?;
    Ok(Assignment { index, value })
}

/// Input fields to change with `send`.
#[derive(Args, Debug, Clone, Default)]
pub struct SendArgs {
    /// Set an axis: INDEX=VALUE (0..6, -32768..=32767)
    #[arg(long = "axis", value_name = "INDEX=VALUE", value_parser = parse_assignment::<i16>)]
    pub axes: Vec<Assignment<i16>>,

    /// Set a button: INDEX=VALUE (0..15, 0 or 1)
    #[arg(long = "button", value_name = "INDEX=VALUE", value_parser = parse_assignment::<u8>)]
    pub buttons: Vec<Assignment<u8>>,

    /// Set the hat bitmask (1 up, 2 right, 4 down, 8 left)
    #[arg(long)]
    pub hat: Option<u8>,

    /// Start from a neutral state instead of the current one
    #[arg(long)]
    pub reset: bool,
}

/// Backing file of a 1-based player number.
pub fn player_path(base: &Path, player: usize) -> Result<PathBuf, CliError> {
    if player == 0 || player > MAX_PLAYERS {
        return Err(CliError::PlayerOutOfRange {
            player,
            max: MAX_PLAYERS,
        });
    }
    Ok(backing_file_path(base, player.saturating_sub(1)))
}
