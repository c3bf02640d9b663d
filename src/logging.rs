use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::SimulationError;

/// Install the terminal logger. Level comes from `RUST_LOG`, default `info`.
pub fn init_logging() -> Result<(), SimulationError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| {
            SimulationError::LoggingError(format!("Failed to set up logging env filter: {e}"))
        })?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| SimulationError::LoggingError(format!("Failed to initialize logging: {e}")))
}
