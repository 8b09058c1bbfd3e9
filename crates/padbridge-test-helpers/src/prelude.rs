//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use padbridge_test_helpers::prelude::*;
//! ```

pub use crate::fixtures::{BackingDir, FIXTURE_FILE_LEN};
pub use crate::must::{must, must_some, must_with};
pub use crate::wait::wait_until;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
