//! Utility functions for snap.

pub mod tracing;

pub use self::tracing::{init_subscriber, init_test_subscriber};
