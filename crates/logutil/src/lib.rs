//! Utilities for logging.

use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install a global subscriber suitable for tests.
///
/// Output goes through the test writer so it's only shown for failing tests.
/// `RUST_LOG` overrides the default `debug` level. Calling this more than once
/// is a no-op.
pub fn init_test() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::DEBUG.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_test_writer()
        .with_env_filter(env_filter)
        .with_file(true)
        .with_line_number(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
