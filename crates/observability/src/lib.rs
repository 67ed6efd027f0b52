//! Tracing/logging setup shared by the demo binary and the test suites.

/// Tracing configuration (filters, formatters).
pub mod tracing;

pub use self::tracing::init_for_tests;

/// Install the JSON subscriber for the process. Idempotent.
pub fn init() {
    self::tracing::init();
}
