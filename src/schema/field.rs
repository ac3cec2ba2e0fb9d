//! Field descriptors: one typed conversion/validation rule per declared field.
//!
//! Fields are declared with [`FieldSpec`] (a plain builder) and checked into an immutable
//! [`Field`] by [`FieldSpec::build`], usually via [`super::SchemaBuilder`].

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use regex::Regex;

use crate::error::{FieldError, SchemaError};
use crate::types::Value;

/// Date formats tried when a date field declares none.
pub const DEFAULT_DATE_FORMATS: [&str; 2] = ["%m/%d/%y", "%m/%d/%Y"];

/// Where a field reads its raw value from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    /// Column whose header cell equals this name.
    Name(String),
    /// Zero-based physical column position. `0` is reserved and rejected at build time.
    Index(usize),
}

impl ColumnKey {
    pub fn is_index(&self) -> bool {
        matches!(self, ColumnKey::Index(_))
    }
}

/// Target type of a field's conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Raw string, unchanged.
    String,
    /// Base-10 `i64`.
    Integer,
    /// `f64`.
    Float,
    /// `true/false`, `t/f`, `1/0`, `yes/no`, `y/n` (case-insensitive).
    Boolean,
    /// Calendar date, parsed with the field's date formats.
    Date,
}

/// Declaration of a field, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    column: Option<ColumnKey>,
    required: bool,
    pattern: Option<String>,
    date_formats: Vec<String>,
}

impl FieldSpec {
    /// Declare a field of the given kind. The column defaults to a header named like the field.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            column: None,
            required: false,
            pattern: None,
            date_formats: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    /// Read from the column whose header is `header` instead of the field name.
    pub fn column(mut self, header: impl Into<String>) -> Self {
        self.column = Some(ColumnKey::Name(header.into()));
        self
    }

    /// Read from a fixed zero-based column position.
    pub fn index(mut self, index: usize) -> Self {
        self.column = Some(ColumnKey::Index(index));
        self
    }

    /// Reject blank values.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Require non-blank raw values to match `pattern` in full.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Accepted date formats (chrono `strftime` syntax), tried in order.
    pub fn formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check the declaration and produce an immutable [`Field`].
    pub fn build(self) -> Result<Field, SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::configuration("field name may not be empty"));
        }

        let column = match self.column {
            Some(ColumnKey::Index(0)) => {
                return Err(SchemaError::configuration(format!(
                    "field '{}': column index 0 is reserved",
                    self.name
                )));
            }
            Some(ColumnKey::Name(ref n)) if n.is_empty() => {
                return Err(SchemaError::configuration(format!(
                    "field '{}': column name may not be empty",
                    self.name
                )));
            }
            Some(key) => key,
            None => ColumnKey::Name(self.name.clone()),
        };

        let pattern = match self.pattern {
            Some(source) => {
                let regex = Regex::new(&format!(r"\A(?:{source})\z")).map_err(|e| {
                    SchemaError::configuration(format!(
                        "field '{}': invalid pattern \"{source}\": {e}",
                        self.name
                    ))
                })?;
                Some((source, regex))
            }
            None => None,
        };

        let date_formats = match self.kind {
            FieldKind::Date if self.date_formats.is_empty() => {
                DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect()
            }
            FieldKind::Date => {
                if let Some(bad) = self.date_formats.iter().find(|f| !is_valid_date_format(f)) {
                    return Err(SchemaError::configuration(format!(
                        "field '{}': invalid date format \"{bad}\"",
                        self.name
                    )));
                }
                self.date_formats
            }
            _ if !self.date_formats.is_empty() => {
                return Err(SchemaError::configuration(format!(
                    "field '{}': date formats are only allowed on date fields",
                    self.name
                )));
            }
            _ => Vec::new(),
        };

        Ok(Field {
            name: self.name,
            kind: self.kind,
            column,
            required: self.required,
            pattern,
            date_formats,
        })
    }
}

fn is_valid_date_format(fmt: &str) -> bool {
    !fmt.is_empty() && StrftimeItems::new(fmt).all(|item| !matches!(item, Item::Error))
}

/// A validated field descriptor.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    column: ColumnKey,
    required: bool,
    pattern: Option<(String, Regex)>,
    date_formats: Vec<String>,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn column(&self) -> &ColumnKey {
        &self.column
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The pattern as declared (without the full-match anchors).
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(|(source, _)| source.as_str())
    }

    pub fn date_formats(&self) -> &[String] {
        &self.date_formats
    }

    /// Convert one raw cell.
    ///
    /// `None` and `""` are blank and fail required fields. Otherwise `None` is [`Value::Null`];
    /// an empty cell still has to match the pattern, if one is set, before it becomes `Null`.
    pub fn convert(&self, raw: Option<&str>) -> Result<Value, FieldError> {
        let raw = match raw {
            Some("") | None if self.required => return Err(FieldError::Blank),
            None => return Ok(Value::Null),
            Some(s) => s,
        };

        if let Some((source, regex)) = &self.pattern {
            if !regex.is_match(raw) {
                return Err(FieldError::PatternMismatch {
                    pattern: source.clone(),
                });
            }
        }

        if raw.is_empty() {
            return Ok(Value::Null);
        }

        match self.kind {
            FieldKind::String => Ok(Value::Str(raw.to_owned())),
            FieldKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| FieldError::TypeConversion { expected: "an int" }),
            FieldKind::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| FieldError::TypeConversion { expected: "a float" }),
            FieldKind::Boolean => parse_bool(raw.trim())
                .map(Value::Bool)
                .ok_or(FieldError::TypeConversion { expected: "a bool" }),
            FieldKind::Date => self
                .date_formats
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .map(Value::Date)
                .ok_or(FieldError::DateFormat),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}
