//! Raw row sources: the tokenizer side of the reader.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::error::ReaderResult;

/// A sequential supply of tokenized rows.
pub trait RowSource {
    /// Next physical row, or `None` at end of input. A blank line may be reported as an empty row.
    fn next_row(&mut self) -> ReaderResult<Option<Vec<String>>>;

    /// 1-based physical line number of the row last returned (0 before the first row).
    fn line_number(&self) -> u64;
}

/// Byte reader that remembers where every `'\n'` sits.
///
/// The tokenizer drops blank lines without counting them, so physical line numbers are derived
/// from byte offsets instead.
#[derive(Debug)]
struct LineTracker<R> {
    inner: R,
    offset: u64,
    newlines: Vec<u64>,
    /// Newlines already consumed and dropped from `newlines`.
    passed: u64,
}

impl<R> LineTracker<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            offset: 0,
            newlines: Vec::new(),
            passed: 0,
        }
    }

    /// 1-based line holding the byte at `byte`. Offsets before it are forgotten.
    fn line_at(&mut self, byte: u64) -> u64 {
        let before = self.newlines.partition_point(|&nl| nl < byte);
        self.newlines.drain(..before);
        self.passed += before as u64;
        self.passed + 1
    }
}

impl<R: Read> Read for LineTracker<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        let start = self.offset;
        self.newlines.extend(
            buf[..n]
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .map(|(i, _)| start + i as u64),
        );
        self.offset += n as u64;
        Ok(n)
    }
}

/// [`RowSource`] backed by the `csv` crate.
///
/// The tokenizer runs header-less and flexible: header handling and ragged rows are the
/// reader's job. Blank lines are dropped by the tokenizer but still counted in line numbers.
#[derive(Debug)]
pub struct CsvSource<R> {
    rdr: csv::Reader<LineTracker<R>>,
    record: csv::StringRecord,
    line: u64,
}

impl<R: Read> CsvSource<R> {
    /// Tokenize comma-separated data from any reader.
    pub fn from_reader(reader: R) -> Self {
        Self::from_builder(csv::ReaderBuilder::new(), reader)
    }

    /// Tokenize with caller-chosen settings (delimiter, quoting, ...).
    ///
    /// Headers and strict record widths are always switched off: header handling and ragged rows
    /// belong to the reader.
    pub fn from_builder(mut builder: csv::ReaderBuilder, reader: R) -> Self {
        builder.has_headers(false).flexible(true);
        Self {
            rdr: builder.from_reader(LineTracker::new(reader)),
            record: csv::StringRecord::new(),
            line: 0,
        }
    }
}

impl CsvSource<File> {
    /// Open a CSV file.
    pub fn from_path(path: impl AsRef<Path>) -> ReaderResult<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> RowSource for CsvSource<R> {
    fn next_row(&mut self) -> ReaderResult<Option<Vec<String>>> {
        if !self.rdr.read_record(&mut self.record)? {
            return Ok(None);
        }
        // The reader now sits just past the record's terminator (or at end of input), so the
        // last byte consumed belongs to the record's final line.
        let end = self.rdr.position().byte();
        self.line = self.rdr.get_mut().line_at(end.saturating_sub(1));
        Ok(Some(self.record.iter().map(str::to_owned).collect()))
    }

    fn line_number(&self) -> u64 {
        self.line
    }
}

/// In-memory [`RowSource`]; each entry is one physical line, an empty entry is a blank line.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: Vec<Vec<String>>,
    next: usize,
}

impl MemorySource {
    pub fn new<I, R, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
            next: 0,
        }
    }
}

impl RowSource for MemorySource {
    fn next_row(&mut self) -> ReaderResult<Option<Vec<String>>> {
        let row = self.rows.get(self.next).cloned();
        if row.is_some() {
            self.next += 1;
        }
        Ok(row)
    }

    fn line_number(&self) -> u64 {
        self.next as u64
    }
}

impl<T: RowSource + ?Sized> RowSource for Box<T> {
    fn next_row(&mut self) -> ReaderResult<Option<Vec<String>>> {
        (**self).next_row()
    }

    fn line_number(&self) -> u64 {
        (**self).line_number()
    }
}
