//! Flat column and constraint rows handed over by a catalog adapter.

use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SchemaError;

/// One row of column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    /// The catalog reports `YES` / `NO`; booleans are accepted too.
    #[serde(deserialize_with = "nullable_flag")]
    pub is_nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        data_type: impl Into<String>,
        is_nullable: bool,
    ) -> Self {
        Self {
            table_name: table.into(),
            column_name: column.into(),
            data_type: data_type.into(),
            is_nullable,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NullableFlag {
    Bool(bool),
    Text(String),
}

fn nullable_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match NullableFlag::deserialize(deserializer)? {
        NullableFlag::Bool(b) => Ok(b),
        NullableFlag::Text(s) => match s.to_uppercase().as_str() {
            "YES" => Ok(true),
            "NO" => Ok(false),
            _ => Err(de::Error::invalid_value(Unexpected::Str(&s), &"YES or NO")),
        },
    }
}

/// What a constraint row declares about its column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    /// The owning column references `table.column`.
    ForeignKey { table: String, column: String },
}

/// One row of key metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConstraintRow", into = "ConstraintRow")]
pub struct ConstraintDescriptor {
    pub constraint_name: String,
    pub table_name: String,
    pub column_name: String,
    pub kind: ConstraintKind,
}

impl ConstraintDescriptor {
    pub fn primary_key(
        name: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            constraint_name: name.into(),
            table_name: table.into(),
            column_name: column.into(),
            kind: ConstraintKind::PrimaryKey,
        }
    }

    pub fn foreign_key(
        name: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
        foreign_table: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        Self {
            constraint_name: name.into(),
            table_name: table.into(),
            column_name: column.into(),
            kind: ConstraintKind::ForeignKey {
                table: foreign_table.into(),
                column: foreign_column.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum ConstraintType {
    #[serde(rename = "PRIMARY KEY", alias = "PRIMARY_KEY")]
    PrimaryKey,
    #[serde(rename = "FOREIGN KEY", alias = "FOREIGN_KEY")]
    ForeignKey,
}

/// Wire shape of a key row: the join of the constraint, key-usage and
/// referential-constraint catalogs.
#[derive(Serialize, Deserialize)]
struct ConstraintRow {
    constraint_name: String,
    table_name: String,
    column_name: String,
    constraint_type: ConstraintType,
    #[serde(default)]
    foreign_table_name: Option<String>,
    #[serde(default)]
    foreign_column_name: Option<String>,
}

impl TryFrom<ConstraintRow> for ConstraintDescriptor {
    type Error = SchemaError;

    fn try_from(row: ConstraintRow) -> Result<Self, Self::Error> {
        let kind = match row.constraint_type {
            ConstraintType::PrimaryKey => ConstraintKind::PrimaryKey,
            ConstraintType::ForeignKey => match (row.foreign_table_name, row.foreign_column_name) {
                (Some(table), Some(column)) => ConstraintKind::ForeignKey { table, column },
                _ => {
                    return Err(SchemaError::IncompleteConstraint {
                        constraint: row.constraint_name,
                        table: row.table_name,
                        column: row.column_name,
                    });
                }
            },
        };
        Ok(Self {
            constraint_name: row.constraint_name,
            table_name: row.table_name,
            column_name: row.column_name,
            kind,
        })
    }
}

impl From<ConstraintDescriptor> for ConstraintRow {
    fn from(desc: ConstraintDescriptor) -> Self {
        let (constraint_type, foreign_table_name, foreign_column_name) = match desc.kind {
            ConstraintKind::PrimaryKey => (ConstraintType::PrimaryKey, None, None),
            ConstraintKind::ForeignKey { table, column } => {
                (ConstraintType::ForeignKey, Some(table), Some(column))
            }
        };
        Self {
            constraint_name: desc.constraint_name,
            table_name: desc.table_name,
            column_name: desc.column_name,
            constraint_type,
            foreign_table_name,
            foreign_column_name,
        }
    }
}

/// Both row sequences of one catalog fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRows {
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub constraints: Vec<ConstraintDescriptor>,
}

impl CatalogRows {
    pub fn new(columns: Vec<ColumnDescriptor>, constraints: Vec<ConstraintDescriptor>) -> Self {
        Self {
            columns,
            constraints,
        }
    }

    /// Prefix every table name, including foreign-key targets, with
    /// `schema.`. Identity matching is exact, so both sequences must agree.
    pub fn qualify(&mut self, schema: &str) {
        let prefix = format!("{schema}.");
        let qualify = |name: &mut String| {
            if !name.starts_with(&prefix) {
                name.insert_str(0, &prefix);
            }
        };

        for col in &mut self.columns {
            qualify(&mut col.table_name);
        }
        for con in &mut self.constraints {
            qualify(&mut con.table_name);
            if let ConstraintKind::ForeignKey { table, .. } = &mut con.kind {
                qualify(table);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_information_schema_rows() {
        let json = r#"{
            "columns": [
                {"table_name": "orders", "column_name": "id", "data_type": "integer", "is_nullable": "NO"},
                {"table_name": "orders", "column_name": "note", "data_type": "text", "is_nullable": "YES"},
                {"table_name": "orders", "column_name": "paid", "data_type": "boolean", "is_nullable": false}
            ],
            "constraints": [
                {"constraint_name": "orders_pkey", "table_name": "orders", "column_name": "id",
                 "constraint_type": "PRIMARY KEY", "foreign_table_name": null, "foreign_column_name": null},
                {"constraint_name": "fk1", "table_name": "orders", "column_name": "cust_id",
                 "constraint_type": "FOREIGN_KEY", "foreign_table_name": "customers", "foreign_column_name": "id"}
            ]
        }"#;
        let rows: CatalogRows = serde_json::from_str(json).unwrap();

        assert_eq!(rows.columns.len(), 3);
        assert!(!rows.columns[0].is_nullable);
        assert!(rows.columns[1].is_nullable);
        assert!(!rows.columns[2].is_nullable);
        assert_eq!(rows.constraints[0].kind, ConstraintKind::PrimaryKey);
        assert_eq!(
            rows.constraints[1],
            ConstraintDescriptor::foreign_key("fk1", "orders", "cust_id", "customers", "id")
        );
    }

    #[test]
    fn test_foreign_key_without_target_is_rejected() {
        let json = r#"{"constraint_name": "fk1", "table_name": "orders", "column_name": "cust_id",
                       "constraint_type": "FOREIGN KEY", "foreign_table_name": "customers"}"#;
        let err = serde_json::from_str::<ConstraintDescriptor>(json).unwrap_err();
        assert!(err.to_string().contains("has no target column"));
    }

    #[test]
    fn test_bad_nullable_flag() {
        let json = r#"{"table_name": "t", "column_name": "c", "data_type": "text", "is_nullable": "maybe"}"#;
        assert!(serde_json::from_str::<ColumnDescriptor>(json).is_err());
    }

    #[test]
    fn test_unknown_constraint_type() {
        let json = r#"{"constraint_name": "u1", "table_name": "t", "column_name": "c",
                       "constraint_type": "UNIQUE"}"#;
        assert!(serde_json::from_str::<ConstraintDescriptor>(json).is_err());
    }

    #[test]
    fn test_qualify_applies_to_both_sequences() {
        let mut rows = CatalogRows::new(
            vec![
                ColumnDescriptor::new("orders", "cust_id", "integer", true),
                ColumnDescriptor::new("public.customers", "id", "integer", false),
            ],
            vec![ConstraintDescriptor::foreign_key("fk1", "orders", "cust_id", "customers", "id")],
        );
        rows.qualify("public");

        assert_eq!(rows.columns[0].table_name, "public.orders");
        assert_eq!(rows.columns[1].table_name, "public.customers");
        assert_eq!(rows.constraints[0].table_name, "public.orders");
        assert_eq!(
            rows.constraints[0].kind,
            ConstraintKind::ForeignKey {
                table: "public.customers".into(),
                column: "id".into()
            }
        );
    }

    #[test]
    fn test_round_trip_through_wire_row() {
        let desc = ConstraintDescriptor::primary_key("pk", "t", "id");
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["constraint_type"], "PRIMARY KEY");
        assert!(json["foreign_table_name"].is_null());
    }
}
