//! Path-matching interception rules.

use std::ffi::OsString;
use std::fmt::Debug;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Prefix of the raw event device nodes.
pub const EVENT_NODE_PREFIX: &str = "/dev/input/event";

/// A stateless predicate over paths.
pub trait InterceptionRule: Debug + Send + Sync {
    /// Whether requests on `path` must be hidden.
    fn matches(&self, path: &Path) -> bool;
}

/// Matches paths whose bytes start with a fixed prefix.
///
/// This is a plain byte comparison, not a path-component one:
/// `/dev/input/event` matches `/dev/input/event0` and `/dev/input/event12`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRule {
    prefix: OsString,
}

impl PrefixRule {
    /// Match paths starting with `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<OsString>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Match the raw event device nodes.
    #[must_use]
    pub fn event_nodes() -> Self {
        Self::new(EVENT_NODE_PREFIX)
    }

    /// The prefix.
    #[must_use]
    pub fn prefix(&self) -> &Path {
        Path::new(&self.prefix)
    }
}

impl Default for PrefixRule {
    fn default() -> Self {
        Self::event_nodes()
    }
}

impl InterceptionRule for PrefixRule {
    fn matches(&self, path: &Path) -> bool {
        path.as_os_str()
            .as_bytes()
            .starts_with(self.prefix.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_nodes_match() {
        let rule = PrefixRule::event_nodes();
        assert!(rule.matches(Path::new("/dev/input/event0")));
        assert!(rule.matches(Path::new("/dev/input/event15")));
    }

    #[test]
    fn test_other_input_nodes_pass() {
        let rule = PrefixRule::event_nodes();
        assert!(!rule.matches(Path::new("/dev/input/js0")));
        assert!(!rule.matches(Path::new("/dev/input/mice")));
        assert!(!rule.matches(Path::new("/dev/input")));
        assert!(!rule.matches(Path::new("dev/input/event0")));
    }
}
