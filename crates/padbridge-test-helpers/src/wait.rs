//! Bounded polling for conditions set by background threads.

use std::time::{Duration, Instant};

/// Poll `condition` every millisecond until it holds or `timeout` elapses.
///
/// Returns whether the condition held.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_condition() {
        assert!(wait_until(Duration::from_millis(10), || true));
    }

    #[test]
    fn test_timeout() {
        assert!(!wait_until(Duration::from_millis(5), || false));
    }
}
