//! Error types shared by the canonicalizer, normalizer and mutator.

use thiserror::Error;

use crate::catalog::UnsupportedType;

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Machine-readable discriminant of a [`SchemaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedType,
    DuplicateColumn,
    UnknownColumn,
    DanglingReference,
    DuplicateConstraintName,
    DuplicateReference,
    UnknownConstraint,
    InvalidReferenceTarget,
    IncompleteConstraint,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedType => "UnsupportedTypeError",
            Self::DuplicateColumn => "DuplicateColumnError",
            Self::UnknownColumn => "UnknownColumnError",
            Self::DanglingReference => "DanglingReferenceError",
            Self::DuplicateConstraintName => "DuplicateConstraintNameError",
            Self::DuplicateReference => "DuplicateReferenceError",
            Self::UnknownConstraint => "UnknownConstraintError",
            Self::InvalidReferenceTarget => "InvalidReferenceTargetError",
            Self::IncompleteConstraint => "IncompleteConstraintError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failure the core can report.
///
/// Normalization errors abort the whole batch. Mutation errors leave the
/// graph exactly as it was before the call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("column {table}.{column}: {source}")]
    UnsupportedType {
        table: String,
        column: String,
        #[source]
        source: UnsupportedType,
    },

    #[error("column {table}.{column} appears more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("unknown column {table}.{column}")]
    UnknownColumn { table: String, column: String },

    #[error(
        "constraint {constraint} on {table}.{column} references {target_table}.{target_column}, which is not a primary key"
    )]
    DanglingReference {
        constraint: String,
        table: String,
        column: String,
        target_table: String,
        target_column: String,
    },

    #[error("constraint name {constraint} is already used in table {table}")]
    DuplicateConstraintName { table: String, constraint: String },

    #[error(
        "{table}.{column} already references {target_table}.{target_column} via {existing}"
    )]
    DuplicateReference {
        table: String,
        column: String,
        target_table: String,
        target_column: String,
        existing: String,
    },

    #[error("no constraint {constraint} on {table}.{column}")]
    UnknownConstraint {
        table: String,
        column: String,
        constraint: String,
    },

    #[error("{table}.{column} is not a primary key and cannot be referenced")]
    InvalidReferenceTarget { table: String, column: String },

    #[error("foreign key {constraint} on {table}.{column} has no target column")]
    IncompleteConstraint {
        constraint: String,
        table: String,
        column: String,
    },
}

impl SchemaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Self::DuplicateColumn { .. } => ErrorKind::DuplicateColumn,
            Self::UnknownColumn { .. } => ErrorKind::UnknownColumn,
            Self::DanglingReference { .. } => ErrorKind::DanglingReference,
            Self::DuplicateConstraintName { .. } => ErrorKind::DuplicateConstraintName,
            Self::DuplicateReference { .. } => ErrorKind::DuplicateReference,
            Self::UnknownConstraint { .. } => ErrorKind::UnknownConstraint,
            Self::InvalidReferenceTarget { .. } => ErrorKind::InvalidReferenceTarget,
            Self::IncompleteConstraint { .. } => ErrorKind::IncompleteConstraint,
        }
    }

    pub(crate) fn unknown_column(table: &str, column: &str) -> Self {
        Self::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let err = SchemaError::unknown_column("public.orders", "cust_id");
        assert_eq!(err.kind(), ErrorKind::UnknownColumn);
        assert_eq!(err.kind().as_str(), "UnknownColumnError");
        assert_eq!(err.to_string(), "unknown column public.orders.cust_id");
    }

    #[test]
    fn test_unsupported_type_message() {
        let err = SchemaError::UnsupportedType {
            table: "t".into(),
            column: "c".into(),
            source: UnsupportedType("tsvector".into()),
        };
        assert_eq!(err.kind().to_string(), "UnsupportedTypeError");
        assert_eq!(err.to_string(), "column t.c: unsupported data type `tsvector`");
    }
}
