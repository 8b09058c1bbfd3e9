//! Bridge configuration.
//!
//! Read once at process attach from the environment:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `EVSHIM_DEBUG` | first character `1`, `y` or `Y` enables debug logs | off |
//! | `EVSHIM_MAX_PLAYERS` | configured players, clamped to `0..=4` | 1 |
//! | `EVSHIM_SHM_PATH` | base backing file path | [`DEFAULT_BASE_PATH`] |
//! | `EVSHIM_SDL_LIBRARY` | backend library name or path | `libSDL2-2.0.so.0` |
//! | `EVSHIM_PUMP_WITHOUT_SLOTS` | run the event pump with no attached slot | on |

use std::path::{Path, PathBuf};
use std::time::Duration;

use padbridge_backend::DEFAULT_LIBRARY;
use padbridge_shm::{DEFAULT_BASE_PATH, backing_file_path};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};

/// Most players the bridge serves.
pub const MAX_PLAYERS: usize = 4;

/// Players configured when the environment says nothing.
pub const DEFAULT_PLAYERS: usize = 1;

/// Default delay between polls of one slot.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Default delay between event pumps.
pub const DEFAULT_PUMP_INTERVAL: Duration = Duration::from_millis(5);

/// Environment variable names.
pub mod env {
    /// Debug verbosity flag.
    pub const DEBUG: &str = "EVSHIM_DEBUG";
    /// Player count.
    pub const MAX_PLAYERS: &str = "EVSHIM_MAX_PLAYERS";
    /// Base backing file path.
    pub const SHM_PATH: &str = "EVSHIM_SHM_PATH";
    /// Backend library.
    pub const SDL_LIBRARY: &str = "EVSHIM_SDL_LIBRARY";
    /// Pump with zero attached slots.
    pub const PUMP_WITHOUT_SLOTS: &str = "EVSHIM_PUMP_WITHOUT_SLOTS";
}

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Debug-level logging for the bridge.
    pub debug: bool,
    /// Configured player slots.
    pub players: usize,
    /// Slot 0's backing file; other slots derive from it.
    pub base_path: PathBuf,
    /// Backend library name or path.
    pub backend_library: String,
    /// Delay between polls of one slot.
    pub poll_interval: Duration,
    /// Delay between event pumps.
    pub pump_interval: Duration,
    /// Start the event pump even if no slot attached.
    pub pump_without_slots: bool,
    /// Cancel and join workers when the handle is dropped instead of leaving
    /// them running.
    pub shutdown_on_drop: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            debug: false,
            players: DEFAULT_PLAYERS,
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            backend_library: DEFAULT_LIBRARY.to_owned(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            pump_interval: DEFAULT_PUMP_INTERVAL,
            pump_without_slots: true,
            shutdown_on_drop: false,
        }
    }
}

/// Whether a flag value enables the option: its first character is `1`, `y`
/// or `Y`.
#[must_use]
pub fn parse_flag(value: &str) -> bool {
    matches!(value.chars().next(), Some('1' | 'y' | 'Y'))
}

/// Parse a player count the way `atoi` would, then clamp to
/// `0..=MAX_PLAYERS`.
///
/// Leading whitespace and a sign are accepted; parsing stops at the first
/// non-digit. No digits, or a negative value, gives 0.
#[must_use]
pub fn parse_player_count(value: &str) -> usize {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if negative || digits.is_empty() {
        return 0;
    }
    digits
        .parse::<usize>()
        .unwrap_or(usize::MAX)
        .min(MAX_PLAYERS)
}

impl BridgeConfig {
    /// Read the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from a variable lookup, so the environment can be substituted in
    /// tests.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup(env::DEBUG) {
            config.debug = parse_flag(&value);
        }
        if let Some(value) = lookup(env::MAX_PLAYERS) {
            config.players = parse_player_count(&value);
            if config.players == 0 {
                warn!(value = %value, "Player count parsed as 0, no slots will be configured");
            }
        }
        if let Some(value) = lookup(env::SHM_PATH).filter(|v| !v.is_empty()) {
            config.base_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(env::SDL_LIBRARY).filter(|v| !v.is_empty()) {
            config.backend_library = value;
        }
        if let Some(value) = lookup(env::PUMP_WITHOUT_SLOTS) {
            config.pump_without_slots = parse_flag(&value);
        }
        config
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first invalid field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.players > MAX_PLAYERS {
            return Err(ConfigError::TooManyPlayers {
                requested: self.players,
                max: MAX_PLAYERS,
            });
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("poll_interval"));
        }
        if self.pump_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("pump_interval"));
        }
        if self.base_path.file_name().is_none() {
            return Err(ConfigError::InvalidBasePath(self.base_path.clone()));
        }
        if self.backend_library.is_empty() {
            return Err(ConfigError::EmptyLibrary);
        }
        Ok(())
    }

    /// Backing file path of slot `index`.
    #[must_use]
    pub fn slot_path(&self, index: usize) -> PathBuf {
        backing_file_path(&self.base_path, index)
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }
}

/// Builder for [`BridgeConfig`].
#[derive(Debug, Default)]
pub struct BridgeConfigBuilder {
    config: BridgeConfig,
}

impl BridgeConfigBuilder {
    /// Enable debug logging.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Set the player count.
    #[must_use]
    pub fn players(mut self, players: usize) -> Self {
        self.config.players = players;
        self
    }

    /// Set the base backing file path.
    #[must_use]
    pub fn base_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.base_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the backend library.
    #[must_use]
    pub fn backend_library(mut self, library: impl Into<String>) -> Self {
        self.config.backend_library = library.into();
        self
    }

    /// Set the poll interval.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the pump interval.
    #[must_use]
    pub fn pump_interval(mut self, interval: Duration) -> Self {
        self.config.pump_interval = interval;
        self
    }

    /// Run the pump even with no attached slot.
    #[must_use]
    pub fn pump_without_slots(mut self, enabled: bool) -> Self {
        self.config.pump_without_slots = enabled;
        self
    }

    /// Join workers when the handle is dropped.
    #[must_use]
    pub fn shutdown_on_drop(mut self, enabled: bool) -> Self {
        self.config.shutdown_on_drop = enabled;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> ConfigResult<BridgeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = BridgeConfig::from_lookup(|_| None);
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.players, 1);
        assert!(!config.debug);
        assert!(config.pump_without_slots);
    }

    #[test]
    fn test_debug_flag_first_character() {
        for (value, expected) in [
            ("1", true),
            ("yes", true),
            ("Y", true),
            ("0", false),
            ("true", false),
            ("", false),
        ] {
            let config = BridgeConfig::from_lookup(lookup(&[(env::DEBUG, value)]));
            assert_eq!(config.debug, expected, "EVSHIM_DEBUG={value:?}");
        }
    }

    #[test]
    fn test_player_count_is_clamped() {
        assert_eq!(parse_player_count("2"), 2);
        assert_eq!(parse_player_count("9"), MAX_PLAYERS);
        assert_eq!(parse_player_count("-3"), 0);
        assert_eq!(parse_player_count("abc"), 0);
        assert_eq!(parse_player_count(" 3players"), 3);
        assert_eq!(parse_player_count("99999999999999999999999"), MAX_PLAYERS);
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = BridgeConfig::from_lookup(lookup(&[
            (env::MAX_PLAYERS, "3"),
            (env::SHM_PATH, "/tmp/pads/gamepad.mem"),
            (env::SDL_LIBRARY, "libSDL2.so"),
            (env::PUMP_WITHOUT_SLOTS, "0"),
        ]));
        assert_eq!(config.players, 3);
        assert_eq!(config.slot_path(2), PathBuf::from("/tmp/pads/gamepad2.mem"));
        assert_eq!(config.backend_library, "libSDL2.so");
        assert!(!config.pump_without_slots);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert_eq!(
            BridgeConfig::builder().players(5).build(),
            Err(ConfigError::TooManyPlayers {
                requested: 5,
                max: MAX_PLAYERS
            })
        );
        assert_eq!(
            BridgeConfig::builder()
                .poll_interval(Duration::ZERO)
                .build(),
            Err(ConfigError::ZeroInterval("poll_interval"))
        );
        assert_eq!(
            BridgeConfig::builder().base_path("/").build(),
            Err(ConfigError::InvalidBasePath(PathBuf::from("/")))
        );
        assert_eq!(
            BridgeConfig::builder().backend_library("").build(),
            Err(ConfigError::EmptyLibrary)
        );
    }

    #[test]
    fn test_serde_fills_missing_fields() -> Result<(), serde_json::Error> {
        let config: BridgeConfig = serde_json::from_str(r#"{"players": 2}"#)?;
        assert_eq!(config.players, 2);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        Ok(())
    }
}
