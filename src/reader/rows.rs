//! Row iterator: header detection, blank-row skipping and width reconciliation.

use crate::error::ReaderResult;
use crate::schema::{ColumnMap, Schema};

use super::source::RowSource;

/// How the first row of the input is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderMode {
    /// Skip the first physical row only if it equals the declared header exactly (never for
    /// index-keyed schemas, never after leading blank lines). Fields map positionally.
    #[default]
    Detect,
    /// The first row is a header. Name-keyed fields are resolved against it, so columns may be
    /// reordered or carry extra columns.
    Present,
    /// There is no header; every row is data.
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    Reading,
    Exhausted,
}

/// One data row after width reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based physical line number.
    pub line: u64,
    /// 0-based logical row number.
    pub row: usize,
    /// Cells exactly as tokenized.
    pub raw: Vec<String>,
    /// One value per column map position; short rows are padded with the fill value.
    pub values: Vec<Option<String>>,
    /// Cells beyond the column map width, in order.
    pub rest: Option<Vec<String>>,
}

impl RawRecord {
    /// Value at a physical position (after padding).
    pub fn value(&self, position: usize) -> Option<&str> {
        self.values.get(position).and_then(|v| v.as_deref())
    }

    /// Value of a column by its column map label (field name or `not_captured_<i>`).
    pub fn get<'a>(&'a self, map: &ColumnMap, label: &str) -> Option<&'a str> {
        self.value(map.position_of_label(label)?)
    }
}

/// Pull iterator over reconciled data rows.
#[derive(Debug)]
pub struct RowIterator<S> {
    source: S,
    state: State,
    map: Option<ColumnMap>,
    fill_value: Option<String>,
    header: HeaderMode,
    next_row: usize,
    header_skipped: Option<u64>,
}

impl<S: RowSource> RowIterator<S> {
    pub fn new(source: S, header: HeaderMode, fill_value: Option<String>) -> Self {
        Self {
            source,
            state: State::Init,
            map: None,
            fill_value,
            header,
            next_row: 0,
            header_skipped: None,
        }
    }

    /// Column map, available once the first row has been pulled.
    pub fn column_map(&self) -> Option<&ColumnMap> {
        self.map.as_ref()
    }

    /// Line number of the skipped header row, if one was skipped.
    pub fn header_skipped(&self) -> Option<u64> {
        self.header_skipped
    }

    /// Line number reported by the source for the last row it returned.
    pub fn line_number(&self) -> u64 {
        self.source.line_number()
    }

    /// Number of data rows produced so far.
    pub fn rows_read(&self) -> usize {
        self.next_row
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }

    /// Stop iterating; later pulls return `None`.
    pub fn finish(&mut self) {
        self.state = State::Exhausted;
    }

    /// Swap in a new source and forget everything learned from the old one.
    pub fn reset(&mut self, source: S) -> S {
        self.state = State::Init;
        self.map = None;
        self.next_row = 0;
        self.header_skipped = None;
        std::mem::replace(&mut self.source, source)
    }

    /// Pull the next data row.
    pub fn next_raw(&mut self, schema: &Schema) -> ReaderResult<Option<RawRecord>> {
        let result = self.advance(schema);
        if !matches!(result, Ok(Some(_))) {
            self.state = State::Exhausted;
        }
        result
    }

    fn advance(&mut self, schema: &Schema) -> ReaderResult<Option<RawRecord>> {
        let cells = match self.state {
            State::Exhausted => return Ok(None),
            State::Init => {
                let Some(first) = self.next_non_blank()? else {
                    return Ok(None);
                };
                self.state = State::Reading;
                match self.start(schema, first)? {
                    Some(cells) => cells,
                    None => match self.next_non_blank()? {
                        Some(cells) => cells,
                        None => return Ok(None),
                    },
                }
            }
            State::Reading => match self.next_non_blank()? {
                Some(cells) => cells,
                None => return Ok(None),
            },
        };

        let width = self.map.as_ref().map_or(0, ColumnMap::width);
        Ok(Some(self.reconcile(cells, width)))
    }

    /// Resolve the column map from the first row; returns the row back unless it was a header.
    fn start(&mut self, schema: &Schema, first: Vec<String>) -> ReaderResult<Option<Vec<String>>> {
        let is_header = match self.header {
            HeaderMode::Present => true,
            HeaderMode::Absent => false,
            HeaderMode::Detect => {
                self.source.line_number() == 1
                    && !schema.is_index_keyed()
                    && first.iter().map(String::as_str).eq(schema.header_names())
            }
        };

        let map = if self.header == HeaderMode::Present {
            schema.resolve(Some(&first))?
        } else {
            schema.layout().clone()
        };
        self.map = Some(map);

        if is_header {
            self.header_skipped = Some(self.source.line_number());
            Ok(None)
        } else {
            Ok(Some(first))
        }
    }

    fn next_non_blank(&mut self) -> ReaderResult<Option<Vec<String>>> {
        loop {
            match self.source.next_row()? {
                Some(cells) if cells.is_empty() => continue,
                other => return Ok(other),
            }
        }
    }

    fn reconcile(&mut self, raw: Vec<String>, width: usize) -> RawRecord {
        let mut values: Vec<Option<String>> = raw.iter().take(width).cloned().map(Some).collect();
        values.resize(width, self.fill_value.clone());
        let rest = (raw.len() > width).then(|| raw[width..].to_vec());

        let row = self.next_row;
        self.next_row += 1;
        RawRecord {
            line: self.source.line_number(),
            row,
            raw,
            values,
            rest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReaderError, SchemaError};
    use crate::reader::source::MemorySource;
    use crate::schema::FieldSpec;

    fn foo_bar() -> Schema {
        Schema::builder()
            .field(FieldSpec::integer("foo"))
            .field(FieldSpec::date("bar"))
            .build()
            .unwrap()
    }

    fn drain<S: RowSource>(it: &mut RowIterator<S>, schema: &Schema) -> Vec<RawRecord> {
        let mut out = Vec::new();
        while let Some(r) = it.next_raw(schema).unwrap() {
            out.push(r);
        }
        out
    }

    #[test]
    fn detects_and_skips_exact_header() {
        let schema = foo_bar();
        let src = MemorySource::new(vec![vec!["foo", "bar"], vec!["1", "02/01/2016"]]);
        let mut it = RowIterator::new(src, HeaderMode::Detect, None);
        let rows = drain(&mut it, &schema);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].row, 0);
        assert_eq!(it.header_skipped(), Some(1));
    }

    #[test]
    fn header_detection_only_checks_first_row() {
        let schema = foo_bar();
        let src = MemorySource::new(vec![vec!["1", "x"], vec!["foo", "bar"]]);
        let mut it = RowIterator::new(src, HeaderMode::Detect, None);
        assert_eq!(drain(&mut it, &schema).len(), 2);
        assert_eq!(it.header_skipped(), None);
    }

    #[test]
    fn header_after_leading_blank_line_is_data() {
        let schema = foo_bar();
        let src = MemorySource::new(vec![vec![], vec!["foo", "bar"], vec!["1", "a"]]);
        let mut it = RowIterator::new(src, HeaderMode::Detect, None);
        let rows = drain(&mut it, &schema);
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].row, rows[0].line), (0, 2));
        assert_eq!(rows[0].raw, vec!["foo", "bar"]);
        assert_eq!(it.header_skipped(), None);
    }

    #[test]
    fn present_header_may_follow_blank_lines() {
        let schema = foo_bar();
        let src = MemorySource::new(vec![vec![], vec!["bar", "foo"], vec!["d", "1"]]);
        let mut it = RowIterator::new(src, HeaderMode::Present, None);
        let rows = drain(&mut it, &schema);
        assert_eq!(rows.len(), 1);
        assert_eq!(it.header_skipped(), Some(2));
    }

    #[test]
    fn blank_rows_are_skipped_but_counted() {
        let schema = foo_bar();
        let src = MemorySource::new(vec![vec!["1", "a"], vec![], vec![], vec!["2", "b"]]);
        let mut it = RowIterator::new(src, HeaderMode::Detect, None);
        let rows = drain(&mut it, &schema);
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[1].row, rows[1].line), (1, 4));
    }

    #[test]
    fn long_rows_collect_rest_and_short_rows_are_filled() {
        let schema = foo_bar();
        let src = MemorySource::new(vec![vec!["1", "a", "x", "y"], vec!["2"]]);
        let mut it = RowIterator::new(src, HeaderMode::Absent, Some("-".into()));
        let rows = drain(&mut it, &schema);
        assert_eq!(rows[0].rest, Some(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(rows[0].values.len(), 2);
        assert_eq!(rows[1].values, vec![Some("2".to_string()), Some("-".to_string())]);
        assert_eq!(rows[1].rest, None);
    }

    #[test]
    fn present_header_resolves_by_name() {
        let schema = foo_bar();
        let src = MemorySource::new(vec![vec!["bar", "foo", "other"], vec!["d", "1", "z"]]);
        let mut it = RowIterator::new(src, HeaderMode::Present, None);
        let rows = drain(&mut it, &schema);
        let map = it.column_map().unwrap();
        assert_eq!(map.position_of(0), Some(1));
        assert_eq!(rows[0].get(map, "foo"), Some("1"));
        assert_eq!(rows[0].get(map, "not_captured_2"), Some("z"));
    }

    #[test]
    fn present_header_missing_field_fails_and_exhausts() {
        let schema = foo_bar();
        let src = MemorySource::new(vec![vec!["foo"], vec!["1"]]);
        let mut it = RowIterator::new(src, HeaderMode::Present, None);
        let err = it.next_raw(&schema).unwrap_err();
        assert!(matches!(
            err,
            ReaderError::Schema(SchemaError::Resolution { ref missing }) if missing == &["bar"]
        ));
        assert!(it.is_exhausted());
        assert!(it.next_raw(&schema).unwrap().is_none());
    }

    #[test]
    fn index_keyed_schema_never_detects_header() {
        let schema = Schema::builder()
            .field(FieldSpec::string("a").index(1))
            .build()
            .unwrap();
        // Labels for this schema are ["not_captured_0", "a"].
        let src = MemorySource::new(vec![vec!["not_captured_0", "a"]]);
        let mut it = RowIterator::new(src, HeaderMode::Detect, None);
        assert_eq!(drain(&mut it, &schema).len(), 1);
    }

    #[test]
    fn empty_input_is_exhausted_without_error() {
        let schema = foo_bar();
        let mut it = RowIterator::new(MemorySource::default(), HeaderMode::Detect, None);
        assert!(it.next_raw(&schema).unwrap().is_none());
        assert!(it.column_map().is_none());
    }

    #[test]
    fn reset_reruns_header_detection() {
        let schema = foo_bar();
        let mut it = RowIterator::new(
            MemorySource::new(vec![vec!["foo", "bar"], vec!["1", "a"]]),
            HeaderMode::Detect,
            None,
        );
        drain(&mut it, &schema);
        it.reset(MemorySource::new(vec![vec!["foo", "bar"], vec!["2", "b"], vec!["3", "c"]]));
        assert!(it.column_map().is_none());
        let rows = drain(&mut it, &schema);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 0);
    }
}
