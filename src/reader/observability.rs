use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{ReaderError, RowError};

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReaderSeverity {
    /// A row was rejected but captured (lenient mode or valid-only traversal).
    Warning,
    /// Reading stopped: strict validation failure or schema problem.
    Error,
    /// I/O failure underneath the tokenizer.
    Critical,
}

impl ReaderSeverity {
    pub(crate) fn for_error(e: &ReaderError) -> Self {
        match e {
            ReaderError::Io(_) => ReaderSeverity::Critical,
            ReaderError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => ReaderSeverity::Critical,
                _ => ReaderSeverity::Error,
            },
            ReaderError::Schema(_) | ReaderError::Validation(_) => ReaderSeverity::Error,
        }
    }
}

/// Whether failures are raised or captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    Strict,
    Lenient,
}

/// Context about a read.
#[derive(Debug, Clone)]
pub struct ReadContext {
    /// Input file, when the reader was opened from a path.
    pub path: Option<PathBuf>,
    pub mode: ReadMode,
}

impl ReadContext {
    fn source(&self) -> String {
        match &self.path {
            Some(p) => p.display().to_string(),
            None => "<stream>".to_string(),
        }
    }
}

/// Counters reported once the input is exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Data rows read (header and blank lines excluded).
    pub rows: usize,
    /// Rows with at least one failing field.
    pub rejected: usize,
    /// Line of the skipped header row, if any.
    pub header_skipped: Option<u64>,
    /// Last physical line the tokenizer reported.
    pub last_line: u64,
}

/// Observer interface for reader events.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait ReaderObserver: Send + Sync {
    /// Called when the first row matched the declared header and was skipped.
    fn on_header_skipped(&self, _ctx: &ReadContext, _line: u64) {}

    /// Called for every row that failed validation.
    fn on_row_rejected(&self, _ctx: &ReadContext, _severity: ReaderSeverity, _error: &RowError) {}

    /// Called when reading stops on an error.
    fn on_failure(&self, _ctx: &ReadContext, _severity: ReaderSeverity, _error: &ReaderError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &ReadContext, severity: ReaderSeverity, error: &ReaderError) {
        self.on_failure(ctx, severity, error)
    }

    /// Called once when the input is exhausted.
    fn on_finished(&self, _ctx: &ReadContext, _stats: ReadStats) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ReaderObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn ReaderObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ReaderObserver for CompositeObserver {
    fn on_header_skipped(&self, ctx: &ReadContext, line: u64) {
        for o in &self.observers {
            o.on_header_skipped(ctx, line);
        }
    }

    fn on_row_rejected(&self, ctx: &ReadContext, severity: ReaderSeverity, error: &RowError) {
        for o in &self.observers {
            o.on_row_rejected(ctx, severity, error);
        }
    }

    fn on_failure(&self, ctx: &ReadContext, severity: ReaderSeverity, error: &ReaderError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &ReadContext, severity: ReaderSeverity, error: &ReaderError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_finished(&self, ctx: &ReadContext, stats: ReadStats) {
        for o in &self.observers {
            o.on_finished(ctx, stats);
        }
    }
}

/// Logs reader events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl ReaderObserver for StdErrObserver {
    fn on_header_skipped(&self, ctx: &ReadContext, line: u64) {
        eprintln!("[read][header] source={} line={line}", ctx.source());
    }

    fn on_row_rejected(&self, ctx: &ReadContext, severity: ReaderSeverity, error: &RowError) {
        eprintln!(
            "[read][{:?}] mode={:?} source={} {}",
            severity,
            ctx.mode,
            ctx.source(),
            error
        );
    }

    fn on_failure(&self, ctx: &ReadContext, severity: ReaderSeverity, error: &ReaderError) {
        eprintln!(
            "[read][{:?}] mode={:?} source={} err={}",
            severity,
            ctx.mode,
            ctx.source(),
            error
        );
    }

    fn on_alert(&self, ctx: &ReadContext, severity: ReaderSeverity, error: &ReaderError) {
        eprintln!(
            "[ALERT][read][{:?}] mode={:?} source={} err={}",
            severity,
            ctx.mode,
            ctx.source(),
            error
        );
    }

    fn on_finished(&self, ctx: &ReadContext, stats: ReadStats) {
        eprintln!(
            "[read][ok] mode={:?} source={} rows={} rejected={} last_line={}",
            ctx.mode,
            ctx.source(),
            stats.rows,
            stats.rejected,
            stats.last_line
        );
    }
}

/// Appends reader events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl ReaderObserver for FileObserver {
    fn on_header_skipped(&self, ctx: &ReadContext, line: u64) {
        self.append_line(&format!(
            "{} header source={} line={line}",
            unix_ts(),
            ctx.source()
        ));
    }

    fn on_row_rejected(&self, ctx: &ReadContext, severity: ReaderSeverity, error: &RowError) {
        self.append_line(&format!(
            "{} reject severity={:?} source={} {}",
            unix_ts(),
            severity,
            ctx.source(),
            error
        ));
    }

    fn on_failure(&self, ctx: &ReadContext, severity: ReaderSeverity, error: &ReaderError) {
        self.append_line(&format!(
            "{} fail severity={:?} mode={:?} source={} err={}",
            unix_ts(),
            severity,
            ctx.mode,
            ctx.source(),
            error
        ));
    }

    fn on_alert(&self, ctx: &ReadContext, severity: ReaderSeverity, error: &ReaderError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} mode={:?} source={} err={}",
            unix_ts(),
            severity,
            ctx.mode,
            ctx.source(),
            error
        ));
    }

    fn on_finished(&self, ctx: &ReadContext, stats: ReadStats) {
        self.append_line(&format!(
            "{} ok mode={:?} source={} rows={} rejected={}",
            unix_ts(),
            ctx.mode,
            ctx.source(),
            stats.rows,
            stats.rejected
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
