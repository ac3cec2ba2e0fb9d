use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::error::RowError;

/// Validation failures captured while reading, keyed by 0-based logical row number.
///
/// Grows as rows are read and is never cleared by the reader itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorAggregator {
    rows: BTreeMap<usize, RowError>,
}

impl ErrorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, error: RowError) {
        self.rows.insert(error.row, error);
    }

    /// Error captured for logical row `row`, if it failed.
    pub fn get(&self, row: usize) -> Option<&RowError> {
        self.rows.get(&row)
    }

    /// Number of failing rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Failing rows in ascending row order.
    pub fn iter(&self) -> btree_map::Iter<'_, usize, RowError> {
        self.rows.iter()
    }

    /// Logical numbers of the failing rows.
    pub fn rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.keys().copied()
    }

    pub fn into_inner(self) -> BTreeMap<usize, RowError> {
        self.rows
    }
}

impl<'a> IntoIterator for &'a ErrorAggregator {
    type Item = (&'a usize, &'a RowError);
    type IntoIter = btree_map::Iter<'a, usize, RowError>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
