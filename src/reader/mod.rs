//! Validating reader: pulls raw rows, converts every declared field, and raises or captures
//! validation failures.
//!
//! - [`ValidatingReader`] is an `Iterator<Item = ReaderResult<Record>>`.
//! - In strict mode (the default) the first row with a failing field is returned as
//!   [`ReaderError::Validation`] and iteration stops.
//! - In lenient mode (`capture_errors: true`) every row is yielded; failing fields are
//!   [`Value::Null`] and the failure is stored in
//!   [`ValidatingReader::errors`] under the row's logical number.
//! - [`ValidatingReader::valid_records`] yields only rows without failures, paired with their
//!   logical row number.
//!
//! ```rust
//! use validated_csv::reader::{ReaderOptions, ValidatingReader};
//! use validated_csv::schema::{FieldSpec, Schema};
//! use validated_csv::types::Value;
//!
//! # fn main() -> Result<(), validated_csv::ReaderError> {
//! let schema = Schema::builder()
//!     .field(FieldSpec::integer("foo").required())
//!     .field(FieldSpec::date("bar").required())
//!     .build()?;
//!
//! let input = "foo,bar\n1,02/01/2016\n,02/02/2016\n";
//! let opts = ReaderOptions {
//!     capture_errors: true,
//!     ..Default::default()
//! };
//! let mut reader = ValidatingReader::from_reader(input.as_bytes(), &schema, opts);
//! let records = reader.by_ref().collect::<Result<Vec<_>, _>>()?;
//!
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[0].get("foo"), Some(&Value::Int(1)));
//! assert_eq!(records[1].get("foo"), Some(&Value::Null));
//! assert_eq!(reader.errors().get(1).unwrap().errors.fields(), vec!["foo"]);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod observability;
pub mod rows;
pub mod source;

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::error::{FieldErrors, ReaderError, ReaderResult, RowError, SchemaError};
use crate::schema::{ColumnMap, Schema};
use crate::types::{Record, Value};

pub use errors::ErrorAggregator;
pub use observability::{
    CompositeObserver, FileObserver, ReadContext, ReadMode, ReadStats, ReaderObserver, ReaderSeverity,
    StdErrObserver,
};
pub use rows::{HeaderMode, RawRecord, RowIterator};
pub use source::{CsvSource, MemorySource, RowSource};

/// Default key for surplus cells.
pub const DEFAULT_REST_KEY: &str = "rest";

/// Options controlling reader behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ReaderOptions {
    /// Capture failures instead of raising them (lenient mode).
    pub capture_errors: bool,
    /// Raw value given to columns a short row does not reach. `None` converts like a blank cell.
    pub fill_value: Option<String>,
    /// Key under which surplus cells are reported. Must not be a declared field name.
    pub rest_key: String,
    /// How the first row is treated.
    pub header: HeaderMode,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn ReaderObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: ReaderSeverity,
}

impl ReaderOptions {
    pub fn mode(&self) -> ReadMode {
        if self.capture_errors {
            ReadMode::Lenient
        } else {
            ReadMode::Strict
        }
    }
}

impl fmt::Debug for ReaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderOptions")
            .field("capture_errors", &self.capture_errors)
            .field("fill_value", &self.fill_value)
            .field("rest_key", &self.rest_key)
            .field("header", &self.header)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            capture_errors: false,
            fill_value: None,
            rest_key: DEFAULT_REST_KEY.to_string(),
            header: HeaderMode::default(),
            observer: None,
            alert_at_or_above: ReaderSeverity::Critical,
        }
    }
}

/// Everything a drained reader produced.
#[derive(Debug, Clone)]
pub struct ReadReport {
    pub records: Vec<Record>,
    pub errors: ErrorAggregator,
    pub stats: ReadStats,
}

/// Schema-validating pull reader over a [`RowSource`].
pub struct ValidatingReader<'s, S> {
    schema: &'s Schema,
    rows: RowIterator<S>,
    errors: ErrorAggregator,
    options: ReaderOptions,
    ctx: ReadContext,
    rejected: usize,
    header_reported: bool,
    done: bool,
}

impl<'s, R: Read> ValidatingReader<'s, CsvSource<R>> {
    /// Read comma-separated data from any reader.
    pub fn from_reader(reader: R, schema: &'s Schema, options: ReaderOptions) -> Self {
        Self::new(CsvSource::from_reader(reader), schema, options)
    }
}

impl<'s> ValidatingReader<'s, CsvSource<File>> {
    /// Open a CSV file.
    pub fn from_path(
        path: impl AsRef<Path>,
        schema: &'s Schema,
        options: ReaderOptions,
    ) -> ReaderResult<Self> {
        let path = path.as_ref();
        let mut reader = Self::new(CsvSource::from_path(path)?, schema, options);
        reader.ctx.path = Some(path.to_path_buf());
        Ok(reader)
    }
}

impl<'s, S: RowSource> ValidatingReader<'s, S> {
    /// Create a reader. The column map is resolved lazily, on the first pull.
    pub fn new(source: S, schema: &'s Schema, options: ReaderOptions) -> Self {
        let rows = RowIterator::new(source, options.header, options.fill_value.clone());
        let ctx = ReadContext {
            path: None,
            mode: options.mode(),
        };
        Self {
            schema,
            rows,
            errors: ErrorAggregator::new(),
            options,
            ctx,
            rejected: 0,
            header_reported: false,
            done: false,
        }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Failures captured so far, keyed by logical row number.
    pub fn errors(&self) -> &ErrorAggregator {
        &self.errors
    }

    pub fn into_errors(self) -> ErrorAggregator {
        self.errors
    }

    /// Column map, once the first row has been read.
    pub fn column_map(&self) -> Option<&ColumnMap> {
        self.rows.column_map()
    }

    /// Physical line number of the last row read.
    pub fn line_number(&self) -> u64 {
        self.rows.line_number()
    }

    /// Data rows read so far.
    pub fn rows_read(&self) -> usize {
        self.rows.rows_read()
    }

    pub fn stats(&self) -> ReadStats {
        ReadStats {
            rows: self.rows.rows_read(),
            rejected: self.rejected,
            header_skipped: self.rows.header_skipped(),
            last_line: self.rows.line_number(),
        }
    }

    /// Iterate only rows that pass validation, as `(logical row, record)`; rejected rows go to
    /// [`Self::errors`] under the same numbering.
    pub fn valid_records(&mut self) -> ValidRecords<'_, 's, S> {
        ValidRecords { reader: self }
    }

    /// Drain the reader.
    ///
    /// In strict mode the first failing row is returned as the error.
    pub fn collect_report(mut self) -> ReaderResult<ReadReport> {
        let mut records = Vec::new();
        for record in &mut self {
            records.push(record?);
        }
        let stats = self.stats();
        Ok(ReadReport {
            records,
            errors: self.errors,
            stats,
        })
    }

    /// Start over on a new input. Header detection and column resolution run again; the
    /// previously captured errors are handed back.
    pub fn reset(&mut self, source: S) -> ErrorAggregator {
        self.rows.reset(source);
        self.rejected = 0;
        self.header_reported = false;
        self.done = false;
        std::mem::take(&mut self.errors)
    }

    fn pull(&mut self) -> ReaderResult<Option<(usize, Record, Option<RowError>)>> {
        if self.rows.column_map().is_none()
            && !self.rows.is_exhausted()
            && self.schema.field(&self.options.rest_key).is_some()
        {
            self.rows.finish();
            return Err(SchemaError::Configuration {
                message: format!(
                    "rest key '{}' collides with a declared field",
                    self.options.rest_key
                ),
            }
            .into());
        }

        let raw = self.rows.next_raw(self.schema)?;

        if !self.header_reported {
            if let Some(line) = self.rows.header_skipped() {
                self.header_reported = true;
                if let Some(obs) = self.options.observer.as_ref() {
                    obs.on_header_skipped(&self.ctx, line);
                }
            }
        }

        match raw {
            Some(raw) => Ok(Some(self.validate(raw))),
            None => {
                self.report_finished();
                Ok(None)
            }
        }
    }

    fn validate(&self, raw: RawRecord) -> (usize, Record, Option<RowError>) {
        let mut values = Vec::with_capacity(self.schema.fields().len());
        let mut errors = FieldErrors::new();

        for (i, field) in self.schema.fields().iter().enumerate() {
            let cell = self
                .rows
                .column_map()
                .and_then(|map| map.position_of(i))
                .and_then(|pos| raw.value(pos));
            match field.convert(cell) {
                Ok(value) => values.push((field.name().to_owned(), value)),
                Err(e) => {
                    values.push((field.name().to_owned(), Value::Null));
                    errors.push(field.name(), e);
                }
            }
        }

        let record = Record::new(values, &self.options.rest_key, raw.rest);
        let error = (!errors.is_empty()).then(|| RowError {
            row: raw.row,
            line: raw.line,
            raw: raw.raw,
            errors,
        });
        (raw.row, record, error)
    }

    fn capture(&mut self, error: RowError) {
        self.rejected += 1;
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_row_rejected(&self.ctx, ReaderSeverity::Warning, &error);
        }
        self.errors.record(error);
    }

    fn fail(&mut self, error: &ReaderError) {
        self.done = true;
        if let Some(obs) = self.options.observer.as_ref() {
            let sev = ReaderSeverity::for_error(error);
            obs.on_failure(&self.ctx, sev, error);
            if sev >= self.options.alert_at_or_above {
                obs.on_alert(&self.ctx, sev, error);
            }
        }
    }

    fn report_finished(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_finished(&self.ctx, self.stats());
        }
    }
}

impl<S: RowSource> Iterator for ValidatingReader<'_, S> {
    type Item = ReaderResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.pull() {
            Ok(Some((_, record, None))) => Some(Ok(record)),
            Ok(Some((_, record, Some(error)))) if self.options.capture_errors => {
                self.capture(error);
                Some(Ok(record))
            }
            Ok(Some((_, _, Some(error)))) => {
                self.rejected += 1;
                self.rows.finish();
                if let Some(obs) = self.options.observer.as_ref() {
                    obs.on_row_rejected(&self.ctx, ReaderSeverity::Error, &error);
                }
                let err = ReaderError::Validation(error);
                self.fail(&err);
                Some(Err(err))
            }
            Ok(None) => None,
            Err(e) => {
                self.fail(&e);
                Some(Err(e))
            }
        }
    }
}

impl<S> fmt::Debug for ValidatingReader<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatingReader")
            .field("schema_fields", &self.schema.fields().len())
            .field("options", &self.options)
            .field("errors", &self.errors.len())
            .field("rejected", &self.rejected)
            .finish()
    }
}

/// Iterator over rows without validation failures; see [`ValidatingReader::valid_records`].
pub struct ValidRecords<'r, 's, S> {
    reader: &'r mut ValidatingReader<'s, S>,
}

impl<S: RowSource> Iterator for ValidRecords<'_, '_, S> {
    type Item = ReaderResult<(usize, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.pull() {
                Ok(Some((row, record, None))) => return Some(Ok((row, record))),
                Ok(Some((_, _, Some(error)))) => self.reader.capture(error),
                Ok(None) => return None,
                Err(e) => {
                    self.reader.fail(&e);
                    return Some(Err(e));
                }
            }
        }
    }
}
