//! Placeholder and identifier-quoting rules per SQL backend.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{SqlTagError, SqlTagResult};

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    #[serde(alias = "mariadb")]
    MySql,
    Sqlite,
}

impl Dialect {
    /// Generate the parameter placeholder for a zero-based parameter index.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index + 1),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    /// Quote an identifier (table or column name).
    pub fn quote_identifier(&self, name: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", name.replace('`', "``")),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Pick the dialect from a connection URL scheme.
    ///
    /// - `postgres://` / `postgresql://`
    /// - `mysql://` / `mariadb://`
    /// - `sqlite:` (including `sqlite::memory:`)
    pub fn from_url(url: &str) -> SqlTagResult<Self> {
        let scheme = url.split(':').next().unwrap_or_default();
        scheme.parse().map_err(|_| {
            SqlTagError::config(format!("unsupported database URL scheme: '{}'", scheme))
        })
    }
}

impl FromStr for Dialect {
    type Err = SqlTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            other => Err(SqlTagError::config(format!("unknown dialect: '{}'", other))),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}
