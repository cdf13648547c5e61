//! Engine type string to canonical type tag.

use std::fmt;

use thiserror::Error;

use super::Dialect;

/// Bound given to every variable-length character column, whatever the
/// catalog reports.
pub const VARCHAR_CAPACITY: u32 = 255;

/// Canonical, engine-independent column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Varchar(u32),
    Char,
    Text,
    SmallInt,
    Integer,
    BigInt,
    Numeric,
    Real,
    DoublePrecision,
    Boolean,
    Date,
    Time,
    TimeTz,
    Timestamp,
    TimestampTz,
    Interval,
    Uuid,
    Json,
    Jsonb,
    Bytea,
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Varchar(n) => return write!(f, "VARCHAR({n})"),
            Self::Char => "CHAR",
            Self::Text => "TEXT",
            Self::SmallInt => "SMALLINT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Numeric => "NUMERIC",
            Self::Real => "REAL",
            Self::DoublePrecision => "DOUBLE PRECISION",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::TimeTz => "TIME WITH TIME ZONE",
            Self::Timestamp => "TIMESTAMP",
            Self::TimestampTz => "TIMESTAMP WITH TIME ZONE",
            Self::Interval => "INTERVAL",
            Self::Uuid => "UUID",
            Self::Json => "JSON",
            Self::Jsonb => "JSONB",
            Self::Bytea => "BYTEA",
        };
        f.write_str(tag)
    }
}

impl serde::Serialize for SqlType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Raw type string outside the canonicalization vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported data type `{0}`")]
pub struct UnsupportedType(pub String);

/// Map an engine type string to its canonical tag.
pub fn canonicalize(raw: &str, dialect: Dialect) -> Result<SqlType, UnsupportedType> {
    let lower = raw.trim().to_lowercase();
    let mapped = strip_modifiers(&lower).and_then(|base| match dialect {
        Dialect::PostgreSQL => map_postgres_type(&base),
        Dialect::MySQL => map_mysql_type(&base, &lower),
        Dialect::Generic => map_generic_type(&base),
    });

    mapped.ok_or_else(|| UnsupportedType(raw.to_string()))
}

/// Drop every parenthesised length/precision group, keeping the words
/// around it: `timestamp(3) with time zone` => `timestamp with time zone`.
/// Array brackets are kept so they never match a scalar tag. `None` on
/// unbalanced parentheses.
fn strip_modifiers(lower: &str) -> Option<String> {
    let mut base = String::with_capacity(lower.len());
    let mut depth = 0usize;
    for ch in lower.chars() {
        match ch {
            '(' => {
                depth += 1;
                base.push(' ');
            }
            ')' => depth = depth.checked_sub(1)?,
            _ if depth == 0 => base.push(ch),
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    Some(base.split_whitespace().collect::<Vec<_>>().join(" ").replace(" [", "["))
}

fn map_postgres_type(base: &str) -> Option<SqlType> {
    let typ = match base {
        "character varying" | "varchar" => SqlType::Varchar(VARCHAR_CAPACITY),
        "character" | "char" | "bpchar" => SqlType::Char,
        "text" => SqlType::Text,

        "smallint" | "int2" => SqlType::SmallInt,
        "integer" | "int" | "int4" => SqlType::Integer,
        "bigint" | "int8" => SqlType::BigInt,

        "numeric" | "decimal" => SqlType::Numeric,
        "real" | "float4" => SqlType::Real,
        "double precision" | "float8" => SqlType::DoublePrecision,

        "boolean" | "bool" => SqlType::Boolean,

        "date" => SqlType::Date,
        "time without time zone" | "time" => SqlType::Time,
        "time with time zone" | "timetz" => SqlType::TimeTz,
        "timestamp without time zone" | "timestamp" => SqlType::Timestamp,
        "timestamp with time zone" | "timestamptz" => SqlType::TimestampTz,
        "interval" => SqlType::Interval,

        "uuid" => SqlType::Uuid,
        "json" => SqlType::Json,
        "jsonb" => SqlType::Jsonb,
        "bytea" => SqlType::Bytea,

        _ => return None,
    };
    Some(typ)
}

fn map_mysql_type(base: &str, full: &str) -> Option<SqlType> {
    let typ = match base {
        "varchar" | "nvarchar" => SqlType::Varchar(VARCHAR_CAPACITY),
        "char" | "nchar" => SqlType::Char,
        "text" | "longtext" | "mediumtext" | "tinytext" => SqlType::Text,

        // TINYINT(1) is how MySQL spells boolean
        "tinyint" if full.starts_with("tinyint(1)") => SqlType::Boolean,
        "tinyint" | "smallint" => SqlType::SmallInt,
        "mediumint" | "int" | "integer" => SqlType::Integer,
        "bigint" => SqlType::BigInt,

        "decimal" | "numeric" => SqlType::Numeric,
        "float" => SqlType::Real,
        "double" => SqlType::DoublePrecision,

        "bool" | "boolean" => SqlType::Boolean,

        "date" => SqlType::Date,
        "time" => SqlType::Time,
        "datetime" | "timestamp" => SqlType::Timestamp,

        "json" => SqlType::Json,
        "blob" | "longblob" | "mediumblob" | "tinyblob" | "binary" | "varbinary" => {
            SqlType::Bytea
        }

        _ => return None,
    };
    Some(typ)
}

fn map_generic_type(base: &str) -> Option<SqlType> {
    let typ = match base {
        "character varying" | "varchar" => SqlType::Varchar(VARCHAR_CAPACITY),
        "character" | "char" => SqlType::Char,
        "text" => SqlType::Text,
        "smallint" => SqlType::SmallInt,
        "int" | "integer" => SqlType::Integer,
        "bigint" => SqlType::BigInt,
        "decimal" | "numeric" => SqlType::Numeric,
        "real" | "float" => SqlType::Real,
        "double" | "double precision" => SqlType::DoublePrecision,
        "boolean" | "bool" => SqlType::Boolean,
        "date" => SqlType::Date,
        "time" => SqlType::Time,
        "timestamp" | "datetime" => SqlType::Timestamp,
        _ => return None,
    };
    Some(typ)
}
