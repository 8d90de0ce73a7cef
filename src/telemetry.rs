use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging.
///
/// `RUST_LOG` wins over the configured level when it is set. The output is
/// JSON unless `log_format` is `pretty`.
pub fn init_telemetry(settings: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&settings.log_level))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if settings.log_format.eq_ignore_ascii_case("pretty") {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    };
    result.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::debug!(format = %settings.log_format, "StoryReel telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create the span that wraps one whole run
pub fn create_run_span(run_id: &str, source_dir: &str, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "storyreel_run",
        run.id = run_id,
        source.dir = source_dir,
        correlation.id = correlation_id,
    )
}

/// Shutdown telemetry gracefully
pub fn shutdown_telemetry() {
    // Nothing is buffered by the fmt layers.
    tracing::debug!("StoryReel telemetry shutdown complete");
}
