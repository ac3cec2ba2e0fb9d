//! `validated-csv` reads CSV rows through a declared [`schema::Schema`], converting each cell into
//! a typed [`types::Value`] and reporting validation failures per row.
//!
//! The primary entrypoint is [`reader::ValidatingReader`], a pull iterator over
//! [`types::Record`]s.
//!
//! ## Declaring a schema
//!
//! Fields are registered explicitly, in output order. Each field reads one physical column,
//! either by header name (the default: the field's own name, or [`schema::FieldSpec::column`])
//! or by zero-based position ([`schema::FieldSpec::index`]).
//!
//! Supported kinds:
//!
//! - [`schema::FieldKind::String`]
//! - [`schema::FieldKind::Integer`]
//! - [`schema::FieldKind::Float`]
//! - [`schema::FieldKind::Boolean`]
//! - [`schema::FieldKind::Date`] (chrono `strftime` formats, tried in order)
//!
//! Blank cells map to [`types::Value::Null`] unless the field is `required`.
//!
//! ## Quick example: strict reading
//!
//! ```rust
//! use validated_csv::reader::{ReaderOptions, ValidatingReader};
//! use validated_csv::schema::{FieldSpec, Schema};
//! use validated_csv::types::Value;
//! use validated_csv::ReaderError;
//!
//! # fn main() -> Result<(), ReaderError> {
//! let schema = Schema::builder()
//!     .field(FieldSpec::integer("foo").required())
//!     .field(FieldSpec::date("bar").required().formats(["%m/%d/%Y"]))
//!     .field(FieldSpec::string("baz").required().pattern("[A-Z0-9_]{3,9}"))
//!     .build()?;
//!
//! let mut reader = ValidatingReader::from_reader(
//!     "1,02/01/2016,FOO\n,02/01/2016,FOO\n".as_bytes(),
//!     &schema,
//!     ReaderOptions::default(),
//! );
//!
//! let first = reader.next().unwrap()?;
//! assert_eq!(first.get("foo"), Some(&Value::Int(1)));
//! assert_eq!(first.get("baz"), Some(&Value::Str("FOO".into())));
//!
//! // Strict mode: the failing row ends iteration with a structured error.
//! match reader.next() {
//!     Some(Err(ReaderError::Validation(row))) => {
//!         assert_eq!(row.errors.get("foo").unwrap().to_string(), "Field may not be blank");
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! assert!(reader.next().is_none());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`schema`]: field descriptors, schema builder and column resolution
//! - [`reader`]: row sources, row iterator, validating reader, error aggregation, observers
//! - [`types`]: typed values and records
//! - [`error`]: error types

pub mod error;
pub mod reader;
pub mod schema;
pub mod types;

pub use error::{FieldError, FieldErrors, ReaderError, ReaderResult, RowError, SchemaError};
