//! Test support: one tracing subscriber for the whole test binary.

use std::sync::Once;

use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

static TEST_SETUP: Once = Once::new();

/// Install the test subscriber once; `RUST_LOG` overrides the `debug` default.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridcheck=debug"));

        let layer = fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter);

        // another harness may already own the global dispatcher
        if tracing_subscriber::registry().with(layer).try_init().is_ok() {
            info!("test setup complete");
        }
    });
}
