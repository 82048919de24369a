//! Tracing subscriber initialisation.
//!
//! Log verbosity is controlled by the standard `RUST_LOG` environment variable and defaults to
//! `info`. For example, `RUST_LOG=hostelctl=debug,sqlx=warn` shows request-level detail from this
//! crate while keeping SQL statement logging quiet.

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize tracing with console output filtered by `RUST_LOG`.
///
/// Fails if a global subscriber has already been installed.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
