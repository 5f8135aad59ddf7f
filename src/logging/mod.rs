//! slog-based application logger.
//!
//! Service-level events log through this; per-request logs come from the
//! tracing layers wired up in `main`.

use slog::{o, Drain, Logger};
use slog_async::Async;
use slog_term::{FullFormat, TermDecorator};

/// Knobs for the root logger.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    async_buffer_size: usize,
    use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            async_buffer_size: 1024,
            use_color: true,
        }
    }
}

/// Builds the root logger. Records drain through an async channel so slow
/// terminals never block request handling.
pub fn setup_logger(config: LoggerConfig) -> Logger {
    let decorator = if config.use_color {
        TermDecorator::new().force_color().build()
    } else {
        TermDecorator::new().build()
    };

    let format = FullFormat::new(decorator).build().fuse();
    let drain = Async::new(format)
        .chan_size(config.async_buffer_size)
        .build()
        .fuse();

    Logger::root(
        drain,
        o!(
            "service" => "supplierhub-api",
            "version" => env!("CARGO_PKG_VERSION")
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_is_usable_immediately() {
        let logger = setup_logger(LoggerConfig {
            async_buffer_size: 128,
            use_color: false,
        });

        slog::info!(logger, "logger smoke test"; "check" => true);

        let child = logger.new(o!("component" => "tests"));
        slog::debug!(child, "child logger inherits the drain");
    }
}
