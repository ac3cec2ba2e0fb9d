//! Schema registry: the ordered set of declared fields and its resolution to physical columns.
//!
//! A schema is built explicitly, one field at a time, in output order:
//!
//! ```rust
//! use validated_csv::schema::{FieldSpec, Schema};
//!
//! let schema = Schema::builder()
//!     .field(FieldSpec::integer("foo").required())
//!     .field(FieldSpec::date("bar").formats(["%m/%d/%Y"]))
//!     .field(FieldSpec::string("baz").pattern("[A-Z0-9_]{3,9}"))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.header_names(), vec!["foo", "bar", "baz"]);
//! ```
//!
//! Fields are either all name-keyed (the default, optionally renamed with
//! [`FieldSpec::column`]) or all index-keyed ([`FieldSpec::index`]).

pub mod field;

use std::collections::HashSet;

use crate::error::SchemaError;

pub use field::{ColumnKey, DEFAULT_DATE_FORMATS, Field, FieldKind, FieldSpec};

/// Prefix of the placeholder label given to physical columns no field reads.
pub const NOT_CAPTURED_PREFIX: &str = "not_captured_";

/// Registers fields in declaration order; see [`Schema::builder`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    specs: Vec<FieldSpec>,
}

impl SchemaBuilder {
    /// Append a field. Output records keep this order.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Append several fields in order.
    pub fn fields(mut self, specs: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.specs.extend(specs);
        self
    }

    /// Validate every declaration and freeze the schema.
    pub fn build(self) -> Result<Schema, SchemaError> {
        if self.specs.is_empty() {
            return Err(SchemaError::configuration("schema declares no fields"));
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.specs.len());
        for spec in self.specs {
            if !seen.insert(spec.name().to_owned()) {
                return Err(SchemaError::configuration(format!(
                    "field '{}' is declared more than once",
                    spec.name()
                )));
            }
            fields.push(spec.build()?);
        }

        let indexed = fields.iter().filter(|f| f.column().is_index()).count();
        if indexed != 0 && indexed != fields.len() {
            return Err(SchemaError::configuration(
                "conflicting column keys: fields must be all name-keyed or all index-keyed",
            ));
        }

        let layout = positional_layout(&fields);
        Ok(Schema { fields, layout })
    }
}

/// An ordered, validated set of fields.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
    layout: ColumnMap,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name())
    }

    /// True when every field reads a fixed column position.
    pub fn is_index_keyed(&self) -> bool {
        self.fields.iter().all(|f| f.column().is_index())
    }

    /// The header row this schema expects, in declaration order.
    ///
    /// For index-keyed schemas this is the labels of [`Self::layout`].
    pub fn header_names(&self) -> Vec<&str> {
        if self.is_index_keyed() {
            return self.layout.labels();
        }
        self.fields
            .iter()
            .map(|f| match f.column() {
                ColumnKey::Name(n) => n.as_str(),
                ColumnKey::Index(_) => f.name(),
            })
            .collect()
    }

    /// Column map used when no header is resolved: fields by index, or in declaration order.
    pub fn layout(&self) -> &ColumnMap {
        &self.layout
    }

    /// Resolve the schema against an observed header row.
    ///
    /// Index-keyed schemas ignore `header`. Name-keyed schemas need one, and every declared
    /// column name must be present in it.
    pub fn resolve(&self, header: Option<&[String]>) -> Result<ColumnMap, SchemaError> {
        if self.is_index_keyed() {
            return Ok(self.layout.clone());
        }
        let header = header.ok_or_else(|| {
            SchemaError::configuration("name-keyed fields need a header row to resolve against")
        })?;

        let mut missing = Vec::new();
        let mut positions = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let ColumnKey::Name(name) = field.column() else {
                continue;
            };
            match header.iter().position(|h| h == name) {
                Some(idx) => positions.push(idx),
                None => missing.push(field.name().to_owned()),
            }
        }
        if !missing.is_empty() {
            return Err(SchemaError::Resolution { missing });
        }

        Ok(ColumnMap::new(&self.fields, positions, header.len()))
    }
}

/// Positional map built at schema construction time.
fn positional_layout(fields: &[Field]) -> ColumnMap {
    let positions: Vec<usize> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| match f.column() {
            ColumnKey::Index(idx) => *idx,
            ColumnKey::Name(_) => i,
        })
        .collect();
    let width = positions.iter().max().map_or(0, |m| m + 1);
    ColumnMap::new(fields, positions, width)
}

/// Resolved mapping between physical column positions and declared fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    labels: Vec<String>,
    positions: Vec<usize>,
}

impl ColumnMap {
    fn new(fields: &[Field], positions: Vec<usize>, width: usize) -> Self {
        let mut labels: Vec<Option<String>> = vec![None; width];
        for (field, &pos) in fields.iter().zip(&positions) {
            if labels[pos].is_none() {
                labels[pos] = Some(field.name().to_owned());
            }
        }
        let labels = labels
            .into_iter()
            .enumerate()
            .map(|(i, l)| l.unwrap_or_else(|| format!("{NOT_CAPTURED_PREFIX}{i}")))
            .collect();
        Self { labels, positions }
    }

    /// Number of physical columns the map understands; cells beyond it are surplus.
    pub fn width(&self) -> usize {
        self.labels.len()
    }

    /// Label of every physical column: the field it feeds or `not_captured_<i>`.
    pub fn labels(&self) -> Vec<&str> {
        self.labels.iter().map(String::as_str).collect()
    }

    /// Physical position carrying `label`.
    pub fn position_of_label(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn label(&self, position: usize) -> Option<&str> {
        self.labels.get(position).map(String::as_str)
    }

    /// Physical position read by the field at `field_idx` (declaration order).
    pub fn position_of(&self, field_idx: usize) -> Option<usize> {
        self.positions.get(field_idx).copied()
    }
}
