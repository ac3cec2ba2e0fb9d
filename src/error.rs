use std::fmt;

use thiserror::Error;

/// Convenience result type for reader operations.
pub type ReaderResult<T> = Result<T, ReaderError>;

/// Error type returned by the validating reader.
///
/// Tokenizer failures (`Io`, `Csv`) are passed through unchanged; schema problems and row
/// validation failures have their own structured variants.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV tokenizer error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The schema is invalid or does not fit the input's header.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A row failed validation (strict mode only).
    #[error("validation error: {0}")]
    Validation(#[from] RowError),
}

/// Errors raised while declaring a schema or resolving it against a header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The declaration itself is invalid (reserved index, conflicting keys, bad pattern, ...).
    #[error("invalid schema: {message}")]
    Configuration { message: String },

    /// One or more name-keyed fields are absent from the header row.
    #[error("Fields missing in header: {}", .missing.join(", "))]
    Resolution { missing: Vec<String> },
}

impl SchemaError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Why a single field rejected its raw value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// A required field was empty or missing.
    #[error("Field may not be blank")]
    Blank,

    /// The raw string did not match the field's pattern.
    #[error("Doesn't match \"{pattern}\"")]
    PatternMismatch { pattern: String },

    /// The raw string could not be converted to the field's kind.
    #[error("Must be {expected}")]
    TypeConversion { expected: &'static str },

    /// None of the configured date formats matched.
    #[error("Invalid date format")]
    DateFormat,
}

/// Failing fields of one row, in schema declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: Vec<(String, FieldError)>,
}

impl FieldErrors {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`.
    pub fn push(&mut self, field: impl Into<String>, error: FieldError) {
        self.entries.push((field.into(), error));
    }

    /// Returns the failure recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, e)| e)
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no field failed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(field, error)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.entries.iter().map(|(name, e)| (name.as_str(), e))
    }

    /// Names of the failing fields, in declaration order.
    pub fn fields(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Human-readable `(field, message)` pairs.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(name, e)| (name.clone(), e.to_string()))
            .collect()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, e)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{name}: {e}")?;
        }
        Ok(())
    }
}

/// Structured validation failure for one data row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {row} (line {line}): {errors}")]
pub struct RowError {
    /// 0-based logical row number (header and blank lines excluded).
    pub row: usize,
    /// 1-based physical line number reported by the tokenizer.
    pub line: u64,
    /// The row's cells exactly as tokenized.
    pub raw: Vec<String>,
    /// Every field that failed, with its reason.
    pub errors: FieldErrors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_error_lists_every_missing_field() {
        let err = SchemaError::Resolution {
            missing: vec!["foo".into(), "bar".into()],
        };
        assert_eq!(err.to_string(), "Fields missing in header: foo, bar");
    }

    #[test]
    fn field_error_messages() {
        assert_eq!(FieldError::Blank.to_string(), "Field may not be blank");
        assert_eq!(
            FieldError::PatternMismatch {
                pattern: "[A-Z0-9_]{3,9}".into()
            }
            .to_string(),
            "Doesn't match \"[A-Z0-9_]{3,9}\""
        );
        assert_eq!(
            FieldError::TypeConversion { expected: "an int" }.to_string(),
            "Must be an int"
        );
        assert_eq!(FieldError::DateFormat.to_string(), "Invalid date format");
    }

    #[test]
    fn row_error_display_includes_row_line_and_fields() {
        let mut errors = FieldErrors::new();
        errors.push("foo", FieldError::Blank);
        errors.push("bar", FieldError::DateFormat);
        let err = RowError {
            row: 3,
            line: 5,
            raw: vec![String::new(), "x".into()],
            errors,
        };
        assert_eq!(
            err.to_string(),
            "row 3 (line 5): foo: Field may not be blank; bar: Invalid date format"
        );

        let wrapped: ReaderError = err.into();
        assert!(wrapped.to_string().starts_with("validation error: row 3"));
    }
}
