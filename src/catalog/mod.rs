//! Catalog rows and data-type canonicalization.

mod dialect;
mod rows;
mod types;

pub use dialect::Dialect;
pub use rows::{CatalogRows, ColumnDescriptor, ConstraintDescriptor, ConstraintKind};
pub use types::{canonicalize, SqlType, UnsupportedType, VARCHAR_CAPACITY};
