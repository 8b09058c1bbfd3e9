//! Capability surface tests through a shared `Arc<dyn JoystickBackend>`.

use std::sync::Arc;
use std::thread;

use padbridge_backend::mock::{BackendCall, MockBackend};
use padbridge_backend::prelude::*;
use padbridge_test_helpers::prelude::*;

#[test]
fn test_shared_backend_across_threads() -> TestResult {
    let mock = Arc::new(MockBackend::new());
    let backend: Arc<dyn JoystickBackend> = mock.clone();
    backend.init_joystick()?;

    let mut workers = Vec::new();
    for player in 0..2 {
        let backend = Arc::clone(&backend);
        workers.push(thread::spawn(move || -> BackendResult<DeviceIndex> {
            let desc = VirtualPadDesc::gamepad(VirtualPadDesc::player_name(player));
            let device = backend.attach_virtual(&desc, Box::new(|_, _| Ok(())))?;
            let joystick = backend.open_joystick(device)?;
            backend.set_button(joystick, 3, 1)?;
            Ok(device)
        }));
    }

    for worker in workers {
        let device = must(must(worker.join().map_err(|_| "worker panicked")));
        assert_eq!(
            mock.publish_calls(device),
            vec![BackendCall::SetButton {
                device,
                button: 3,
                value: 1
            }]
        );
    }
    assert_eq!(mock.attached_devices().len(), 2);
    Ok(())
}

#[test]
fn test_init_failure_is_fatal() {
    let backend = MockBackend::new().fail_init("no joystick subsystem");
    match backend.init_joystick() {
        Err(err) => assert!(err.is_fatal()),
        Ok(()) => panic!("init should fail"),
    }
}

#[test]
fn test_missing_library_reports_name() {
    let err = must_some(
        Sdl2Backend::load("/nonexistent/libSDL2-2.0.so.0").err(),
        "load should fail",
    );
    assert!(matches!(err, BackendError::LibraryLoad { .. }));
}

#[test]
fn test_version_after_init() -> TestResult {
    let backend = MockBackend::new();
    backend.init_joystick()?;
    assert_eq!(backend.version()?.major, 2);
    Ok(())
}
