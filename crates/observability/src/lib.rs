//! Process-wide logging setup shared by the binary and the tests.

/// Initialize JSON logging for the service process.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize human-readable logging captured by the test harness.
pub fn init_for_tests() {
    tracing::init_for_tests();
}

/// Subscriber construction (filters, formatting).
pub mod tracing;
