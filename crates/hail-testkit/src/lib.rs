//! hail-testkit: test doubles and in-process peers for hail clients.
//!
//! Channel end-to-end tests live here (under `tests/`) rather than in
//! hail-core, to avoid circular dev-dependencies between hail-core and
//! hail-transport-mem.

#![deny(unsafe_code)]

mod mock;
mod peer;

pub use mock::*;
pub use peer::*;

/// Initialise tracing for tests. Idempotent; respects `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
