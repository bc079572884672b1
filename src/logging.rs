use log::{error, info, log_enabled, warn, Level};

/// Initializes the logger with the `env_logger` crate, using `default_level` when
/// `RUST_LOG` is unset. `RUST_LOG=npb_charger=debug` shows every frame sent and received.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger_with_level(default_level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .try_init();
}

/// Logs an error message.
pub fn log_error(message: &str) {
    if log_enabled!(Level::Error) {
        error!("{message}");
    }
}

/// Logs a warning message.
pub fn log_warn(message: &str) {
    if log_enabled!(Level::Warn) {
        warn!("{message}");
    }
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}
