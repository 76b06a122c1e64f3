use std::{io::IsTerminal, path::Path};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LogLevel;

fn default_directives(level: LogLevel) -> String {
    format!("warn,fsnative={level},flyingsocks_native={level}")
}

/// Install the global subscriber. `RUST_LOG` wins over `level`.
///
/// The returned guard flushes the log file when dropped and must be kept
/// alive until exit.
pub fn setup_logging(
    level: LogLevel,
    log_file: Option<&Path>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let default_log_level = default_directives(level);
    let filter = EnvFilter::try_from_default_env()
        .inspect(|f| {
            eprintln!("using env log level: {f}");
        })
        .inspect_err(|_| {
            if let Ok(log_level) = std::env::var("RUST_LOG") {
                eprintln!("Failed to parse log level from environment: {log_level}");
                eprintln!("Using default log level: {default_log_level}");
            }
        })
        .unwrap_or(EnvFilter::new(&default_log_level));

    let (file_layer, guard) = if let Some(log_file) = log_file {
        let writer = std::fs::File::options()
            .create(true)
            .append(true)
            .open(log_file)?;
        let (non_blocking, guard) =
            tracing_appender::non_blocking::NonBlockingBuilder::default()
                .buffered_lines_limit(16_000)
                .lossy(true)
                .thread_name("fsnative-logger-appender")
                .finish(writer);
        (
            Some(fmt::layer().with_ansi(false).with_writer(non_blocking)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal());

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(
            default_directives(LogLevel::Warning),
            "warn,fsnative=warn,flyingsocks_native=warn"
        );
        assert_eq!(
            default_directives(LogLevel::Silent),
            "warn,fsnative=off,flyingsocks_native=off"
        );
    }
}
