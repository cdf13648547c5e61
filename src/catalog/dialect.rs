//! Database engine whose type vocabulary the catalog rows use.

/// SQL dialect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Standard SQL spellings only
    Generic,
    /// PostgreSQL `information_schema.columns.data_type`
    #[default]
    PostgreSQL,
    /// MySQL `information_schema.COLUMNS.DATA_TYPE`
    MySQL,
}

impl Dialect {
    /// Parse dialect from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "generic" => Some(Self::Generic),
            "postgres" | "postgresql" | "pg" => Some(Self::PostgreSQL),
            "mysql" => Some(Self::MySQL),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::PostgreSQL => "postgresql",
            Self::MySQL => "mysql",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(Dialect::from_str("Postgres"), Some(Dialect::PostgreSQL));
        assert_eq!(Dialect::from_str("MYSQL"), Some(Dialect::MySQL));
        assert_eq!(Dialect::from_str("generic"), Some(Dialect::Generic));
        assert_eq!(Dialect::from_str("oracle"), None);
    }

    #[test]
    fn test_default_is_postgres() {
        assert_eq!(Dialect::default(), Dialect::PostgreSQL);
        assert_eq!(Dialect::default().name(), "postgresql");
    }
}
