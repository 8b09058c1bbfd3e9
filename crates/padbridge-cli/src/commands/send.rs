//! `padctl send`: write input into a player's record.

use std::path::Path;

use anyhow::Result;
use padbridge_shm::{AXIS_COUNT, BUTTON_COUNT, GamepadState, ProducerChannel};
use serde_json::json;
use tracing::debug;

use crate::commands::{SendArgs, player_path};
use crate::error::CliError;
use crate::output;

/// Apply `args` on top of `current`.
pub fn apply(current: GamepadState, args: &SendArgs) -> Result<GamepadState, CliError> {
    let mut state = if args.reset {
        GamepadState::default()
    } else {
        current
    };

    for axis in &args.axes {
        if axis.index >= AXIS_COUNT {
            return Err(CliError::InvalidInput(format!(
                "axis {} does not exist (0..{AXIS_COUNT})",
                axis.index
            )));
        }
        state = state.with_axis(axis.index, axis.value);
    }
    for button in &args.buttons {
        if button.index >= BUTTON_COUNT {
            return Err(CliError::InvalidInput(format!(
                "button {} does not exist (0..{BUTTON_COUNT})",
                button.index
            )));
        }
        state = state.with_button(button.index, button.value);
    }
    if let Some(hat) = args.hat {
        if hat > 0x0F {
            return Err(CliError::InvalidInput(format!(
                "hat mask {hat:#04x} has bits outside 0x0f"
            )));
        }
        state = state.with_hat(hat);
    }
    Ok(state)
}

pub fn execute(base: &Path, player: usize, args: &SendArgs, json: bool) -> Result<()> {
    let path = player_path(base, player)?;
    let mut channel = ProducerChannel::open(&path).map_err(CliError::from)?;
    let current = channel.read_record().map_err(CliError::from)?.state;

    let state = apply(current, args)?;
    let changes = state.diff(&current);
    channel.write_state(&state);
    channel.flush()?;
    debug!(player, changes = changes.len(), "Wrote state");

    if json {
        output::print_json(&json!({
            "success": true,
            "player": player,
            "changed": changes.len(),
            "state": state,
        }))?;
    } else {
        output::print_sent_human(player, changes.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Assignment;

    #[test]
    fn test_apply_keeps_untouched_fields() -> Result<(), CliError> {
        let current = GamepadState::default().with_button(2, 1);
        let args = SendArgs {
            axes: vec![Assignment {
                index: 0,
                value: 100,
            }],
            ..SendArgs::default()
        };
        let state = apply(current, &args)?;
        assert_eq!(state.axis(0), Some(100));
        assert_eq!(state.button(2), Some(1));
        Ok(())
    }

    #[test]
    fn test_apply_reset_starts_neutral() -> Result<(), CliError> {
        let current = GamepadState::default().with_button(2, 1);
        let args = SendArgs {
            reset: true,
            hat: Some(0x04),
            ..SendArgs::default()
        };
        let state = apply(current, &args)?;
        assert_eq!(state, GamepadState::default().with_hat(0x04));
        Ok(())
    }

    #[test]
    fn test_apply_rejects_unknown_fields() {
        let args = SendArgs {
            buttons: vec![Assignment {
                index: 15,
                value: 1,
            }],
            ..SendArgs::default()
        };
        assert!(matches!(
            apply(GamepadState::default(), &args),
            Err(CliError::InvalidInput(_))
        ));
    }
}
