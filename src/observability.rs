//! Logging and observability helpers.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::{Duration, SystemTime};

use chrono::Local;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;
use crate::engine::error::{EngineError, EngineResult};

const LOG_FILE_PREFIX: &str = "qore-structure.log";

/// Prepares `log_dir` and installs the JSON file subscriber and the panic hook
///
/// The subscriber and hook are installed once per process; later calls only
/// create the directory and apply retention. `RUST_LOG` wins over the
/// configured filter. Returns the log directory.
pub fn init_tracing(log_dir: &Path, config: &ObservabilityConfig) -> PathBuf {
    static INSTALL: Once = Once::new();

    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("Failed to create log directory {:?}: {}", log_dir, e);
    }

    let removed = match cleanup_old_logs(log_dir, config.retention_days) {
        Ok(removed) => removed,
        Err(e) => {
            eprintln!("Failed to clean up old logs: {}", e);
            0
        }
    };

    INSTALL.call_once(|| {
        let file_appender: RollingFileAppender =
            tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(file_appender)
            .json()
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_current_span(true)
            .with_span_list(true)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .try_init();

        install_panic_hook();
    });

    tracing::info!(
        removed_logs = removed,
        "Tracing initialized. Logs directory: {:?}",
        log_dir
    );
    log_dir.to_path_buf()
}

fn install_panic_hook() {
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let payload = panic_info.payload();
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            format!("PANIC: {}", s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("PANIC: {}", s)
        } else {
            "PANIC: unknown cause".to_string()
        };

        tracing::error!(target: "panic", location = %location, message = %msg, "Structure engine panicked");

        previous_hook(panic_info);
    }));
}

pub struct LogExport {
    pub filename: String,
    pub content: String,
}

/// Concatenates every log file in `log_dir`, oldest first
pub fn collect_logs(log_dir: &Path) -> EngineResult<LogExport> {
    let entries = fs::read_dir(log_dir).map_err(|e| {
        EngineError::internal(format!(
            "Failed to read log directory {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
        })
        .collect();

    if files.is_empty() {
        return Err(EngineError::internal("No log files found"));
    }

    files.sort_by_key(|path| path.file_name().map(|name| name.to_os_string()));

    let mut content = String::new();
    for path in files {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown");
        let data = fs::read_to_string(&path).map_err(|e| {
            EngineError::internal(format!(
                "Failed to read log file {}: {}",
                path.display(),
                e
            ))
        })?;

        if !content.is_empty() {
            content.push_str("\n\n");
        }
        content.push_str(&format!("===== {} =====\n", filename));
        content.push_str(&data);
    }

    let filename = format!(
        "qore-structure-logs-{}.log",
        Local::now().format("%Y%m%d-%H%M%S")
    );

    Ok(LogExport { filename, content })
}

/// Removes our log files older than `retention_days`; returns how many went
fn cleanup_old_logs(log_dir: &Path, retention_days: u64) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let retention = Duration::from_secs(retention_days.saturating_mul(24 * 60 * 60));
    let mut removed = 0;

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        let is_ours = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX));
        if !is_ours {
            continue;
        }

        let age = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if age.is_some_and(|age| age > retention) {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!("Failed to remove old log file {:?}: {}", path, e),
            }
        }
    }
    Ok(removed)
}
