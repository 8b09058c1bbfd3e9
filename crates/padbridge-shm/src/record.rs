//! Fixed-layout gamepad record shared with the producer.
//!
//! The codec works on byte slices with explicit little-endian conversions, so
//! the in-memory Rust layout never leaks into the file format.

use serde::{Deserialize, Serialize};

use crate::error::{ShmError, ShmResult};

/// Number of analog axes (two sticks and two triggers).
pub const AXIS_COUNT: usize = 6;
/// Number of digital buttons.
pub const BUTTON_COUNT: usize = 15;
/// Number of hats (d-pads).
pub const HAT_COUNT: usize = 1;

/// Byte offset of the first axis.
pub const AXES_OFFSET: usize = 0;
/// Byte offset of the first button.
pub const BUTTONS_OFFSET: usize = AXES_OFFSET + AXIS_COUNT * 2;
/// Byte offset of the hat value.
pub const HAT_OFFSET: usize = BUTTONS_OFFSET + BUTTON_COUNT;
/// Length of the producer-owned input portion.
pub const INPUT_LEN: usize = HAT_OFFSET + HAT_COUNT;
/// Byte offset of the padding between input and feedback.
pub const PADDING_OFFSET: usize = INPUT_LEN;
/// Padding length.
pub const PADDING_LEN: usize = 4;
/// Byte offset of the bridge-owned rumble fields.
pub const RUMBLE_OFFSET: usize = PADDING_OFFSET + PADDING_LEN;
/// Length of the rumble fields.
pub const RUMBLE_LEN: usize = 4;
/// Total record length.
pub const RECORD_LEN: usize = RUMBLE_OFFSET + RUMBLE_LEN;
/// Size the producer gives every backing file.
pub const BACKING_FILE_LEN: u64 = 64;

const _: () = assert!(RUMBLE_OFFSET == 32);
const _: () = assert!(RECORD_LEN == 36);
const _: () = assert!(RECORD_LEN as u64 <= BACKING_FILE_LEN);

/// SDL hat bit values, as written by the producer.
pub mod hat {
    /// No direction pressed.
    pub const CENTERED: u8 = 0x00;
    /// Up.
    pub const UP: u8 = 0x01;
    /// Right.
    pub const RIGHT: u8 = 0x02;
    /// Down.
    pub const DOWN: u8 = 0x04;
    /// Left.
    pub const LEFT: u8 = 0x08;
}

fn require(bytes: &[u8], needed: usize) -> ShmResult<()> {
    if bytes.len() < needed {
        return Err(ShmError::TooShort {
            needed,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Producer-owned input portion of a record.
///
/// This is the unit of change detection: the rumble fields are not part of
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GamepadState {
    /// `lx, ly, rx, ry, lt, rt`.
    pub axes: [i16; AXIS_COUNT],
    /// Button values (0/1, or an intensity).
    pub buttons: [u8; BUTTON_COUNT],
    /// Hat bitmask, see [`hat`].
    pub hat: u8,
}

/// One field that differs between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldChange {
    /// Axis `index` now reads `value`.
    Axis {
        /// Axis index (0-5).
        index: u8,
        /// New value.
        value: i16,
    },
    /// Button `index` now reads `value`.
    Button {
        /// Button index (0-14).
        index: u8,
        /// New value.
        value: u8,
    },
    /// Hat `index` now reads `value`.
    Hat {
        /// Hat index (always 0).
        index: u8,
        /// New value.
        value: u8,
    },
}

impl GamepadState {
    /// Decode the input portion from the start of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`ShmError::TooShort`] if fewer than [`INPUT_LEN`] bytes are given.
    pub fn decode(bytes: &[u8]) -> ShmResult<Self> {
        require(bytes, INPUT_LEN)?;
        let mut state = Self::default();

        let axes = bytes.get(AXES_OFFSET..BUTTONS_OFFSET).unwrap_or_default();
        for (slot, chunk) in state.axes.iter_mut().zip(axes.chunks_exact(2)) {
            if let [lo, hi] = chunk {
                *slot = i16::from_le_bytes([*lo, *hi]);
            }
        }

        let buttons = bytes.get(BUTTONS_OFFSET..HAT_OFFSET).unwrap_or_default();
        state.buttons.copy_from_slice(buttons);
        state.hat = bytes.get(HAT_OFFSET).copied().unwrap_or(hat::CENTERED);
        Ok(state)
    }

    /// Encode the input portion.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; INPUT_LEN] {
        let mut out = [0u8; INPUT_LEN];
        for (chunk, axis) in out
            .get_mut(AXES_OFFSET..BUTTONS_OFFSET)
            .unwrap_or_default()
            .chunks_exact_mut(2)
            .zip(self.axes)
        {
            chunk.copy_from_slice(&axis.to_le_bytes());
        }
        if let Some(buttons) = out.get_mut(BUTTONS_OFFSET..HAT_OFFSET) {
            buttons.copy_from_slice(&self.buttons);
        }
        if let Some(hat) = out.get_mut(HAT_OFFSET) {
            *hat = self.hat;
        }
        out
    }

    /// Axis value by index.
    #[must_use]
    pub fn axis(&self, index: usize) -> Option<i16> {
        self.axes.get(index).copied()
    }

    /// Button value by index.
    #[must_use]
    pub fn button(&self, index: usize) -> Option<u8> {
        self.buttons.get(index).copied()
    }

    /// Return a copy with axis `index` set. Out-of-range indices are ignored.
    #[must_use]
    pub fn with_axis(mut self, index: usize, value: i16) -> Self {
        if let Some(axis) = self.axes.get_mut(index) {
            *axis = value;
        }
        self
    }

    /// Return a copy with button `index` set. Out-of-range indices are ignored.
    #[must_use]
    pub fn with_button(mut self, index: usize, value: u8) -> Self {
        if let Some(button) = self.buttons.get_mut(index) {
            *button = value;
        }
        self
    }

    /// Return a copy with the hat set.
    #[must_use]
    pub fn with_hat(mut self, value: u8) -> Self {
        self.hat = value;
        self
    }

    /// Fields of `self` that differ from `previous`, axes first, then
    /// buttons, then the hat.
    ///
    /// Only the producer's input fields are compared. The padding bytes
    /// after the hat and the rumble fields are excluded on purpose, so a
    /// change there never publishes.
    #[must_use]
    pub fn diff(&self, previous: &Self) -> Vec<FieldChange> {
        if self == previous {
            return Vec::new();
        }

        let axes = (0u8..)
            .zip(self.axes.iter().zip(previous.axes.iter()))
            .filter(|(_, (now, before))| now != before)
            .map(|(index, (&value, _))| FieldChange::Axis { index, value });

        let buttons = (0u8..)
            .zip(self.buttons.iter().zip(previous.buttons.iter()))
            .filter(|(_, (now, before))| now != before)
            .map(|(index, (&value, _))| FieldChange::Button { index, value });

        let hat = (self.hat != previous.hat).then_some(FieldChange::Hat {
            index: 0,
            value: self.hat,
        });

        axes.chain(buttons).chain(hat).collect()
    }
}

/// Force-feedback command written by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RumbleCommand {
    /// Low-frequency (large motor) intensity.
    pub low: u16,
    /// High-frequency (small motor) intensity.
    pub high: u16,
}

impl RumbleCommand {
    /// Create a command.
    #[must_use]
    pub const fn new(low: u16, high: u16) -> Self {
        Self { low, high }
    }

    /// Both motors off.
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.low == 0 && self.high == 0
    }

    /// Encode as the four bytes stored at [`RUMBLE_OFFSET`].
    #[must_use]
    pub fn to_bytes(&self) -> [u8; RUMBLE_LEN] {
        let [l0, l1] = self.low.to_le_bytes();
        let [h0, h1] = self.high.to_le_bytes();
        [l0, l1, h0, h1]
    }

    /// Decode from the four bytes stored at [`RUMBLE_OFFSET`].
    ///
    /// # Errors
    ///
    /// Returns [`ShmError::TooShort`] if fewer than [`RUMBLE_LEN`] bytes are given.
    pub fn from_bytes(bytes: &[u8]) -> ShmResult<Self> {
        match bytes {
            [l0, l1, h0, h1, ..] => Ok(Self {
                low: u16::from_le_bytes([*l0, *l1]),
                high: u16::from_le_bytes([*h0, *h1]),
            }),
            _ => Err(ShmError::TooShort {
                needed: RUMBLE_LEN,
                actual: bytes.len(),
            }),
        }
    }
}

/// The full 36-byte record image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SharedRecord {
    /// Producer-owned input.
    pub state: GamepadState,
    /// Padding bytes, preserved as read.
    pub padding: [u8; PADDING_LEN],
    /// Bridge-owned feedback.
    pub rumble: RumbleCommand,
}

impl SharedRecord {
    /// Decode a record from the start of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`ShmError::TooShort`] if fewer than [`RECORD_LEN`] bytes are given.
    pub fn decode(bytes: &[u8]) -> ShmResult<Self> {
        require(bytes, RECORD_LEN)?;
        let state = GamepadState::decode(bytes)?;
        let mut padding = [0u8; PADDING_LEN];
        padding.copy_from_slice(bytes.get(PADDING_OFFSET..RUMBLE_OFFSET).unwrap_or_default());
        let rumble = RumbleCommand::from_bytes(bytes.get(RUMBLE_OFFSET..RECORD_LEN).unwrap_or_default())?;
        Ok(Self {
            state,
            padding,
            rumble,
        })
    }

    /// Encode the full record.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        if let Some(input) = out.get_mut(..INPUT_LEN) {
            input.copy_from_slice(&self.state.to_bytes());
        }
        if let Some(padding) = out.get_mut(PADDING_OFFSET..RUMBLE_OFFSET) {
            padding.copy_from_slice(&self.padding);
        }
        if let Some(rumble) = out.get_mut(RUMBLE_OFFSET..RECORD_LEN) {
            rumble.copy_from_slice(&self.rumble.to_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_offsets_match_producer_layout() {
        assert_eq!(BUTTONS_OFFSET, 12);
        assert_eq!(HAT_OFFSET, 27);
        assert_eq!(INPUT_LEN, 28);
        assert_eq!(RUMBLE_OFFSET, 32);
        assert_eq!(RECORD_LEN, 36);
    }

    #[test]
    fn test_decode_known_bytes() -> TestResult {
        let mut bytes = [0u8; RECORD_LEN];
        bytes[0..2].copy_from_slice(&(-32767i16).to_le_bytes());
        bytes[10..12].copy_from_slice(&32767i16.to_le_bytes());
        bytes[12] = 1;
        bytes[26] = 1;
        bytes[27] = hat::UP | hat::RIGHT;
        bytes[32..34].copy_from_slice(&0x1234u16.to_le_bytes());
        bytes[34..36].copy_from_slice(&0xFFFFu16.to_le_bytes());

        let record = SharedRecord::decode(&bytes)?;
        assert_eq!(record.state.axis(0), Some(-32767));
        assert_eq!(record.state.axis(5), Some(32767));
        assert_eq!(record.state.button(0), Some(1));
        assert_eq!(record.state.button(14), Some(1));
        assert_eq!(record.state.hat, 0x03);
        assert_eq!(record.rumble, RumbleCommand::new(0x1234, 0xFFFF));
        Ok(())
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let result = SharedRecord::decode(&[0u8; RECORD_LEN - 1]);
        assert!(matches!(result, Err(ShmError::TooShort { needed: 36, actual: 35 })));
    }

    #[test]
    fn test_rumble_bytes_are_little_endian() {
        let bytes = RumbleCommand::new(0x0102, 0x0304).to_bytes();
        assert_eq!(bytes, [0x02, 0x01, 0x04, 0x03]);
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let state = GamepadState::default().with_axis(2, 100).with_button(3, 1);
        assert!(state.diff(&state).is_empty());
    }

    #[test]
    fn test_diff_reports_only_changed_fields() {
        let before = GamepadState::default();
        let after = before.with_axis(1, -5).with_button(7, 1).with_hat(hat::LEFT);

        let changes = after.diff(&before);
        assert_eq!(
            changes,
            vec![
                FieldChange::Axis { index: 1, value: -5 },
                FieldChange::Button { index: 7, value: 1 },
                FieldChange::Hat {
                    index: 0,
                    value: hat::LEFT
                },
            ]
        );
    }

    #[test]
    fn test_diff_ignores_padding_and_rumble() -> TestResult {
        let mut before = [0u8; RECORD_LEN];
        before[12] = 1;
        let mut after = before;
        after[PADDING_OFFSET..RUMBLE_OFFSET].fill(0xAA);
        after[RUMBLE_OFFSET..RECORD_LEN].fill(0xFF);

        let before = SharedRecord::decode(&before)?;
        let after = SharedRecord::decode(&after)?;
        assert_ne!(before, after);
        assert!(after.state.diff(&before.state).is_empty());
        Ok(())
    }

    #[test]
    fn test_with_out_of_range_is_ignored() {
        let state = GamepadState::default().with_axis(6, 1).with_button(15, 1);
        assert_eq!(state, GamepadState::default());
    }
}
