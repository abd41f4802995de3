use planner_infrastructure::PlannerPaths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "planner.log";

/// Installs the global subscriber: stderr plus a daily file in the logs
/// directory. `RUST_LOG` wins over `default_level`.
///
/// The returned guard flushes the file writer on drop and must live until exit.
pub fn init(paths: &PlannerPaths, default_level: &str) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_appender = paths.logs_dir().ok().and_then(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .build(dir)
            .ok()
    });

    let (file_layer, guard) = match file_appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    if guard.is_none() {
        tracing::warn!("[Logging] Log directory unavailable; logging to stderr only");
    }

    guard
}
