//! Diagnostic logging.
//!
//! The terminal is owned by the UI, so logs go to a daily-rotated file under
//! the cache directory (`~/.cache/lotedit/logs/lotedit.log` on Linux).
//! `RUST_LOG` overrides the configured level, e.g.
//! `RUST_LOG=lotedit::editor=debug,lotedit::tracker=debug`.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::cache::CacheManager;

pub const LOG_FILE_PREFIX: &str = "lotedit.log";

/// Install the global subscriber. `default_level` applies when RUST_LOG is unset.
pub fn init(cache: &CacheManager, default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| eyre!("Invalid log filter '{}': {}", default_level, e))?;

    let logs_dir = cache.ensure_log_dir()?;
    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .map_err(|e| eyre!("Could not initialize logging: {}", e))
}
