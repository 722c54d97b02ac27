//! Logging initialization for the Vigil harness.
//!
//! Structured logging with consistent spans: the CLI initializes once at
//! startup, tests use the test-writer variant so output is captured per test.

use std::sync::Once;

use tracing::Span;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times; subsequent
/// calls are no-ops. Log levels are controlled via `RUST_LOG`.
pub fn init_logging() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .init();
    });
}

/// Initializes test logging (call once per test).
pub fn init_test_logging() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates a span covering one scenario run with standard fields.
#[must_use]
pub fn scenario_span(name: &str) -> Span {
    tracing::info_span!("scenario", name = name)
}
