use crate::args::LogLevel;

/// Initialize the global subscriber, controlled by `--log-level` unless
/// `RUST_LOG` is set, in which case `RUST_LOG` wins.
pub fn init(level: LogLevel) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
