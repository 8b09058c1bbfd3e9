//! Error types for the backend capability layer.

use thiserror::Error;

/// Errors raised by a [`JoystickBackend`](crate::JoystickBackend).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend library could not be opened.
    #[error("Failed to load backend library '{library}': {reason}")]
    LibraryLoad {
        /// Library name or path.
        library: String,
        /// Loader error text.
        reason: String,
    },

    /// The entry point needed for this capability was not resolved.
    #[error("Backend entry point '{0}' is not available")]
    MissingEntryPoint(&'static str),

    /// Initialising the joystick subsystem failed.
    #[error("Joystick subsystem initialisation failed: {0}")]
    Init(String),

    /// Attaching a virtual device failed.
    #[error("Failed to attach virtual device '{name}': {reason}")]
    Attach {
        /// Device name.
        name: String,
        /// Backend error text.
        reason: String,
    },

    /// Detaching a virtual device failed.
    #[error("Failed to detach virtual device {device}: {reason}")]
    Detach {
        /// Device index.
        device: i32,
        /// Backend error text.
        reason: String,
    },

    /// Opening a joystick handle failed.
    #[error("Failed to open joystick {device}: {reason}")]
    Open {
        /// Device index.
        device: i32,
        /// Backend error text.
        reason: String,
    },

    /// Setting an axis, button or hat value failed.
    #[error("Failed to set {control} {index}: {reason}")]
    SetValue {
        /// `axis`, `button` or `hat`.
        control: &'static str,
        /// Control index.
        index: u8,
        /// Backend error text.
        reason: String,
    },

    /// A descriptor field could not be passed to the backend.
    #[error("Invalid virtual device descriptor: {0}")]
    InvalidDescriptor(String),
}

impl BackendError {
    /// Create an attach error.
    #[must_use]
    pub fn attach(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Attach {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a set-value error.
    #[must_use]
    pub fn set_value(control: &'static str, index: u8, reason: impl Into<String>) -> Self {
        Self::SetValue {
            control,
            index,
            reason: reason.into(),
        }
    }

    /// Whether the error means the whole backend is unusable.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::LibraryLoad { .. } | Self::Init(_))
    }
}

/// Result alias for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(BackendError::Init("no video".into()).is_fatal());
        assert!(
            BackendError::LibraryLoad {
                library: "libSDL2-2.0.so.0".into(),
                reason: "not found".into(),
            }
            .is_fatal()
        );
        assert!(!BackendError::MissingEntryPoint("SDL_PumpEvents").is_fatal());
        assert!(!BackendError::attach("B (Player 1)", "too many devices").is_fatal());
    }

    #[test]
    fn test_display_names_entry_point() {
        let err = BackendError::MissingEntryPoint("SDL_JoystickAttachVirtualEx");
        assert!(err.to_string().contains("SDL_JoystickAttachVirtualEx"));
    }

    #[test]
    fn test_set_value_display() {
        let err = BackendError::set_value("button", 14, "invalid joystick");
        assert_eq!(err.to_string(), "Failed to set button 14: invalid joystick");
    }
}
