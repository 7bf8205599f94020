use crate::conf::LogConfig;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the logging system with JSON formatting and environment-based
/// filtering.
///
/// - `RUST_LOG` wins over the configured default filter
/// - JSON output with flattened event fields for structured log shipping
/// - all output runs through the non-blocking worker, writing to a
///   daily-rolling file when `log.dir` is configured and stdout otherwise
pub fn init_logging(cfg: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.filter_or_default()));

    let (writer, guard) = match &cfg.dir {
        Some(dir) => tracing_appender::non_blocking(rolling::daily(dir, "meshgate.log")),
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    fmt()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .with_writer(writer)
        .init();

    // The worker thread stops flushing once its guard drops, and the
    // subscriber installed above lives for the whole process, so the guard
    // is leaked rather than threaded back to every caller.
    std::mem::forget(guard);
}
