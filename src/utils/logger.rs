use std::io;
use std::path::Path;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name used when the log file is requested as `auto`.
pub fn timestamped_log_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("{}.log", now.format("%Y-%m-%d-%H:%M:%S"))
}

fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("outage_scraper=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("outage_scraper=info"))
    }
}

/// Appender writing exactly to `path`, never rotated.
fn file_appender(path: &Path) -> io::Result<RollingFileAppender> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log file '{}' has no file name", path.display()),
        )
    })?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(directory)
        .map_err(io::Error::other)
}

/// Installs the global subscriber. With a log file, lines are written by a
/// background thread; the returned guard flushes it on drop and must live
/// as long as the process logs.
pub fn init_cli_logger(
    verbose: bool,
    log_file: Option<&Path>,
    json: bool,
) -> io::Result<Option<WorkerGuard>> {
    let (writer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = non_blocking(file_appender(path)?);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(io::stderr), None),
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(log_file.is_none())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let registry = tracing_subscriber::registry().with(default_filter(verbose));
    if json {
        registry.with(layer.json()).init();
    } else {
        registry.with(layer.compact()).init();
    }

    Ok(guard)
}
