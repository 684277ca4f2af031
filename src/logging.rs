use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logging setup, resolved from the environment with sane defaults.
/// `RUST_LOG` overrides `level` when set.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_dir: "logs".to_string(),
            log_file: "lockbench.log".to_string(),
            use_json: false,
        }
    }
}

/// Install the global subscriber: rolling file layer plus ANSI stdout.
/// The returned guard must outlive the run or buffered lines are dropped.
pub fn init_logging(config: &LogConfig) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, &config.log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
        registry.with(file_layer).with(stdout_layer).init();
    }

    guard
}
