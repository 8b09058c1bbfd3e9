//! Property-based tests for the shared record format.

use padbridge_shm::prelude::*;
use padbridge_shm::{INPUT_LEN, RECORD_LEN, RUMBLE_OFFSET};
use proptest::prelude::*;

fn state_strategy() -> impl Strategy<Value = GamepadState> {
    (
        prop::array::uniform6(any::<i16>()),
        prop::array::uniform15(any::<u8>()),
        any::<u8>(),
    )
        .prop_map(|(axes, buttons, hat)| GamepadState { axes, buttons, hat })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_record_bytes_decode_to_same_record(
        state in state_strategy(),
        padding in prop::array::uniform4(any::<u8>()),
        low in any::<u16>(),
        high in any::<u16>(),
    ) {
        let record = SharedRecord { state, padding, rumble: RumbleCommand::new(low, high) };
        let decoded = SharedRecord::decode(&record.to_bytes());
        prop_assert_eq!(decoded.ok(), Some(record));
    }

    #[test]
    fn prop_rumble_bytes_do_not_touch_input(
        state in state_strategy(),
        low in any::<u16>(),
        high in any::<u16>(),
    ) {
        let mut bytes = SharedRecord { state, ..SharedRecord::default() }.to_bytes();
        let rumble = RumbleCommand::new(low, high).to_bytes();
        for (dst, src) in bytes.iter_mut().skip(RUMBLE_OFFSET).zip(rumble) {
            *dst = src;
        }
        let expected = state.to_bytes();
        prop_assert_eq!(bytes.get(..INPUT_LEN), Some(&expected[..]));
        prop_assert_eq!(bytes.len(), RECORD_LEN);
    }

    #[test]
    fn prop_diff_against_self_is_empty(state in state_strategy()) {
        prop_assert!(state.diff(&state).is_empty());
    }

    #[test]
    fn prop_diff_applied_reproduces_state(
        now in state_strategy(),
        before in state_strategy(),
    ) {
        let mut rebuilt = before;
        for change in now.diff(&before) {
            rebuilt = match change {
                FieldChange::Axis { index, value } => rebuilt.with_axis(usize::from(index), value),
                FieldChange::Button { index, value } => rebuilt.with_button(usize::from(index), value),
                FieldChange::Hat { value, .. } => rebuilt.with_hat(value),
            };
        }
        prop_assert_eq!(rebuilt, now);
    }

    #[test]
    fn prop_single_axis_change_is_single_call(
        before in state_strategy(),
        index in 0usize..6,
        value in any::<i16>(),
    ) {
        prop_assume!(before.axis(index) != Some(value));
        let now = before.with_axis(index, value);
        prop_assert_eq!(now.diff(&before).len(), 1);
    }
}
