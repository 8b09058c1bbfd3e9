//! Attach sequence scenarios against the mock backend.

use std::sync::Arc;
use std::time::Duration;

use padbridge::prelude::*;
use padbridge_backend::mock::{BackendCall, MockBackend};
use padbridge_backend::{BackendError, DeviceIndex};
use padbridge_shm::{GamepadState, ProducerChannel};
use padbridge_test_helpers::prelude::*;

fn config_for(dir: &BackingDir, players: usize) -> Result<BridgeConfig, ConfigError> {
    BridgeConfig::builder()
        .base_path(dir.base_path())
        .players(players)
        .poll_interval(Duration::from_millis(1))
        .pump_interval(Duration::from_millis(1))
        .shutdown_on_drop(true)
        .build()
}

#[test]
fn test_two_players_two_devices() -> TestResult {
    let dir = BackingDir::new()?;
    let paths = dir.create_files((0..2).map(|i| padbridge_shm::backing_file_path(&dir.base_path(), i)))?;
    assert_eq!(paths.len(), 2);
    let mock = Arc::new(MockBackend::new());

    let handle = Bridge::start(config_for(&dir, 2)?, mock.clone())?;

    let names: Vec<_> = mock
        .attached_devices()
        .into_iter()
        .map(|(_, desc)| desc.name)
        .collect();
    assert_eq!(names, vec!["B (Player 1)", "B (Player 2)"]);
    assert_eq!(handle.attached_count(), 2);
    assert_eq!(handle.poller_count(), 2);
    assert!(handle.has_pump());
    assert_eq!(handle.worker_count(), 3);

    handle.shutdown()?;
    Ok(())
}

#[test]
fn test_missing_second_file_disables_only_that_slot() -> TestResult {
    let dir = BackingDir::new()?;
    dir.create_file(dir.base_path())?;
    let mock = Arc::new(MockBackend::new());

    let handle = Bridge::start(config_for(&dir, 2)?, mock.clone())?;

    assert_eq!(mock.attached_devices().len(), 1);
    assert_eq!(handle.poller_count(), 1);
    let second = must_some(handle.registry().get(1), "slot 1");
    assert!(matches!(second.status(), SlotStatus::Disabled { .. }));
    assert!(!second.is_writable());
    assert!(must_some(handle.registry().get(0), "slot 0").is_active());

    handle.shutdown()?;
    Ok(())
}

#[test]
fn test_attach_failure_disables_slot_and_closes_file() -> TestResult {
    let dir = BackingDir::new()?;
    dir.create_files((0..3).map(|i| padbridge_shm::backing_file_path(&dir.base_path(), i)))?;
    let mock = Arc::new(MockBackend::new().fail_attach_for_player(1));

    let handle = Bridge::start(config_for(&dir, 3)?, mock.clone())?;

    let names: Vec<_> = mock
        .attached_devices()
        .into_iter()
        .map(|(_, desc)| desc.name)
        .collect();
    assert_eq!(names, vec!["B (Player 1)", "A (Player 3)"]);
    let failed = must_some(handle.registry().get(1), "slot 1");
    assert!(!failed.is_writable());
    assert_eq!(failed.device(), None);
    assert_eq!(handle.poller_count(), 2);

    handle.shutdown()?;
    Ok(())
}

#[test]
fn test_init_failure_is_fatal() -> TestResult {
    let dir = BackingDir::new()?;
    dir.create_file(dir.base_path())?;
    let mock = Arc::new(MockBackend::new().fail_init("no video driver"));

    let result = Bridge::start(config_for(&dir, 1)?, mock.clone());

    assert!(matches!(
        result,
        Err(BridgeError::Backend(BackendError::Init(_)))
    ));
    assert!(mock.attached_devices().is_empty());
    assert_eq!(mock.pump_count(), 0);
    Ok(())
}

#[test]
fn test_no_slots_without_pump() -> TestResult {
    let dir = BackingDir::new()?;
    let config = BridgeConfig::builder()
        .base_path(dir.base_path())
        .players(0)
        .pump_without_slots(false)
        .shutdown_on_drop(true)
        .build()?;
    let mock = Arc::new(MockBackend::new());

    let handle = Bridge::start(config, mock.clone())?;

    assert_eq!(handle.worker_count(), 0);
    assert!(!handle.has_pump());
    assert_eq!(mock.calls(), vec![BackendCall::Init]);
    Ok(())
}

#[test]
fn test_no_slots_still_pumps_by_default() -> TestResult {
    let dir = BackingDir::new()?;
    let mock = Arc::new(MockBackend::new());

    let handle = Bridge::start(config_for(&dir, 2)?, mock.clone())?;

    assert_eq!(handle.attached_count(), 0);
    assert!(handle.has_pump());
    assert!(wait_until(Duration::from_secs(2), || mock.pump_count() > 0));
    handle.shutdown()?;
    Ok(())
}

#[test]
fn test_producer_change_published_within_interval() -> TestResult {
    let dir = BackingDir::new()?;
    let mut producer = ProducerChannel::create(dir.base_path())?;
    let mock = Arc::new(MockBackend::new());
    let handle = Bridge::start(config_for(&dir, 1)?, mock.clone())?;
    let device = DeviceIndex(0);

    producer.write_state(&GamepadState::default().with_axis(1, -32768).with_button(14, 1));

    let published = wait_until(Duration::from_secs(2), || {
        mock.publish_calls(device).len() >= 2
    });
    assert!(published);
    let calls = mock.publish_calls(device);
    assert!(calls.contains(&BackendCall::SetAxis {
        device,
        axis: 1,
        value: -32768
    }));
    assert!(calls.contains(&BackendCall::SetButton {
        device,
        button: 14,
        value: 1
    }));
    assert_eq!(calls.len(), 2);

    handle.shutdown()?;
    Ok(())
}

#[test]
fn test_shutdown_closes_every_slot() -> TestResult {
    let dir = BackingDir::new()?;
    dir.create_files((0..2).map(|i| padbridge_shm::backing_file_path(&dir.base_path(), i)))?;
    let mock = Arc::new(MockBackend::new());
    let handle = Bridge::start(config_for(&dir, 2)?, mock.clone())?;
    let registry = Arc::clone(handle.registry());

    handle.shutdown()?;

    assert!(registry.iter().all(|slot| !slot.is_writable()));
    assert!(mock.attached_devices().is_empty());
    Ok(())
}
