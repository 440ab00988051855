use crate::persistence::files::logs_dir;
use anyhow::Result;
use std::path::Path;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// How many daily log files to keep around.
const MAX_LOG_FILES: usize = 7;

/// Install the global tracing subscriber.
///
/// Events always go to a daily-rolling file under `<data dir>/logs/`;
/// they are mirrored to stderr only when `verbose` is set. `RUST_LOG`
/// overrides the default `info` level.
pub fn init(data_dir: &Path, verbose: bool) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix("tempo")
        .build(logs_dir(data_dir))?;

    let stderr = std::io::stderr.with_filter(move |_| verbose);

    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!(
            "{}={level}",
            env!("CARGO_PKG_NAME")
        )))
        .with_writer(stderr.and(appender))
        .with_ansi(false)
        .init();
    Ok(())
}
