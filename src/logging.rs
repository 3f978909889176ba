//! Logging initialisation: `tracing` is the sole facade. Two sinks run at
//! once, a rotating JSONL file under the platform log directory and a
//! compact layer on stderr, both gated by `RUST_LOG` (default `info`).

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static GUARD: OnceLock<LoggingGuard> = OnceLock::new();

/// Keeps the non-blocking file writer's background thread alive for the
/// process lifetime. Dropping it flushes any buffered lines.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

fn log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("mouse-hinter")
        .join("logs")
}

/// Builds the global subscriber on first call; later calls are no-ops.
pub fn init() {
    if GUARD.get().is_some() {
        return;
    }

    let dir = log_dir();
    if let Err(err) = fs::create_dir_all(&dir) {
        eprintln!("mouse-hinter: could not create log directory {}: {err}", dir.display());
    }

    let file_appender = tracing_appender::rolling::daily(&dir, "mouse-hinter.log");
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer().json().with_writer(non_blocking).with_ansi(false);
    let stderr_layer = fmt::layer().compact().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    let _ = GUARD.set(LoggingGuard { _file_guard: file_guard });
}
