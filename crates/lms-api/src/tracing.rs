//! Log output setup.
//!
//! Development gets pretty, human-readable logs with source locations.
//! Production gets flattened JSON lines for log aggregation. `RUST_LOG`
//! overrides the default filter in both modes
//! (e.g. `RUST_LOG=debug,tower_http=trace`).

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Environment;

const DEVELOPMENT_FILTER: &str = "debug,tower_http=debug,sqlx=warn";
const PRODUCTION_FILTER: &str = "info,tower_http=info,sqlx=warn";

/// Install the global subscriber for `env`.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(env: Environment) -> anyhow::Result<()> {
    let filter = env_filter(env);

    if env.is_development() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .pretty()
                    .with_filter(filter),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .flatten_event(true)
                    .with_target(true)
                    .with_filter(filter),
            )
            .try_init()?;
    }

    tracing::info!(environment = ?env, "tracing initialized");
    Ok(())
}

fn env_filter(env: Environment) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if env.is_development() {
            DEVELOPMENT_FILTER
        } else {
            PRODUCTION_FILTER
        })
    })
}
