//! Terminal progress bars that share stderr with the logger.

use std::sync::LazyLock;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{LevelFilter, Log, Metadata, Record};

static PROGRESS: LazyLock<MultiProgress> = LazyLock::new(MultiProgress::new);

/// Wraps `env_logger` so records are written with any bars hidden, instead
/// of being drawn over.
struct BarAwareLogger(env_logger::Logger);

impl Log for BarAwareLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.0.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if self.0.matches(record) {
            PROGRESS.suspend(|| self.0.log(record));
        }
    }

    fn flush(&self) {
        PROGRESS.suspend(|| self.0.flush());
    }
}

/// Install the logger. `RUST_LOG` still overrides `level` per module.
pub(crate) fn init_logging(level: LevelFilter) -> Result<()> {
    let logger = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .build();
    let max_level = logger.filter();
    log::set_boxed_logger(Box::new(BarAwareLogger(logger)))?;
    log::set_max_level(max_level);
    Ok(())
}

/// A bar of `len` units, registered with the shared draw target.
pub(crate) fn new_progress_bar(len: u64, prefix: &'static str) -> Result<ProgressBar> {
    let style = ProgressStyle::default_bar()
        .template("{prefix:6} [{elapsed_precise}] {wide_bar} {pos:>8}/{len:8} {msg}")?;
    let bar = ProgressBar::new(len).with_style(style).with_prefix(prefix);
    Ok(PROGRESS.add(bar))
}
