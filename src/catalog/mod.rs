//! Catalog adapters: per-backend introspection behind one interface.
//!
//! Each backend reads its own metadata sources (information_schema and pg_catalog
//! for PostgreSQL, information_schema for MySQL, PRAGMA functions for SQLite)
//! and produces [`Table`](crate::schema::Table) values in the unified model.
//! Adapters never talk to a driver directly; they issue queries through a
//! [`MetadataSource`], which returns plain rows.

mod mysql;
mod postgres;
mod source;
mod sqlite;
pub mod types;
mod url;

pub use mysql::MySqlCatalog;
pub use postgres::PostgresCatalog;
pub use source::{MySqlSource, PgSource, SqliteSource};
pub use sqlite::SqliteCatalog;
pub use url::{database_name_from_url, parse_database_url, redact_url};

use crate::error::{BoxError, Error, Result, RowError};
use crate::schema::Table;
use std::fmt;
use std::str::FromStr;

/// Default PostgreSQL namespace when none is given
pub const DEFAULT_POSTGRES_SCHEMA: &str = "public";

/// Supported database backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Postgres,
    MySql,
    Sqlite,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Backend::Postgres),
            "mysql" | "mariadb" => Ok(Backend::MySql),
            "sqlite" | "sqlite3" => Ok(Backend::Sqlite),
            _ => Err(format!(
                "Unknown backend: {}. Valid options: postgres, mysql, sqlite",
                s
            )),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Postgres => write!(f, "postgres"),
            Backend::MySql => write!(f, "mysql"),
            Backend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// A single value returned by a metadata query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    TextList(Vec<String>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Text(_) => "text",
            Value::TextList(_) => "text list",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::TextList(items.into_iter().map(String::from).collect())
    }
}

/// One result row, addressed by column position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> std::result::Result<&Value, RowError> {
        self.0.get(index).ok_or(RowError::OutOfRange {
            index,
            len: self.0.len(),
        })
    }

    pub fn text(&self, index: usize) -> std::result::Result<String, RowError> {
        match self.get(index)? {
            Value::Text(s) => Ok(s.clone()),
            other => Err(mismatch(index, "text", other)),
        }
    }

    pub fn opt_text(&self, index: usize) -> std::result::Result<Option<String>, RowError> {
        match self.get(index)? {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s.clone())),
            Value::Int(n) => Ok(Some(n.to_string())),
            other => Err(mismatch(index, "text", other)),
        }
    }

    pub fn int(&self, index: usize) -> std::result::Result<i64, RowError> {
        match self.get(index)? {
            Value::Int(n) => Ok(*n),
            Value::Bool(b) => Ok(i64::from(*b)),
            other => Err(mismatch(index, "int", other)),
        }
    }

    pub fn opt_int(&self, index: usize) -> std::result::Result<Option<i64>, RowError> {
        match self.get(index)? {
            Value::Null => Ok(None),
            _ => self.int(index).map(Some),
        }
    }

    /// Boolean from a native bool, a 0/1 integer or a YES/NO string
    pub fn flag(&self, index: usize) -> std::result::Result<bool, RowError> {
        match self.get(index)? {
            Value::Bool(b) => Ok(*b),
            Value::Int(n) => Ok(*n != 0),
            Value::Text(s) => Ok(matches!(
                s.to_ascii_uppercase().as_str(),
                "YES" | "TRUE" | "T" | "1"
            )),
            other => Err(mismatch(index, "bool", other)),
        }
    }

    /// List of strings from a native array or a comma-joined string
    pub fn text_list(&self, index: usize) -> std::result::Result<Vec<String>, RowError> {
        match self.get(index)? {
            Value::TextList(items) => Ok(items.clone()),
            Value::Text(s) => Ok(s.split(',').map(str::to_string).collect()),
            Value::Null => Ok(Vec::new()),
            other => Err(mismatch(index, "text list", other)),
        }
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row(values)
    }
}

fn mismatch(index: usize, expected: &'static str, found: &Value) -> RowError {
    RowError::Mismatch {
        index,
        expected,
        found: found.kind(),
    }
}

/// Bound query parameter
#[derive(Debug, Clone, Copy)]
pub enum Param<'a> {
    Text(&'a str),
    TextList(&'a [String]),
}

/// The "run a metadata query, return rows" capability of a connection
pub trait MetadataSource {
    fn query(&mut self, sql: &str, params: &[Param<'_>]) -> std::result::Result<Vec<Row>, BoxError>;
}

impl<S: MetadataSource + ?Sized> MetadataSource for Box<S> {
    fn query(&mut self, sql: &str, params: &[Param<'_>]) -> std::result::Result<Vec<Row>, BoxError> {
        (**self).query(sql, params)
    }
}

impl<S: MetadataSource + ?Sized> MetadataSource for &mut S {
    fn query(&mut self, sql: &str, params: &[Param<'_>]) -> std::result::Result<Vec<Row>, BoxError> {
        (**self).query(sql, params)
    }
}

/// Backend-specific introspection
pub trait CatalogAdapter {
    fn backend(&self) -> Backend;

    /// Tables to extract. An explicit list is returned verbatim, without an
    /// existence check; otherwise the catalog's tables in alphabetical order.
    fn list_tables(&mut self, explicit: Option<&[String]>) -> Result<Vec<String>>;

    /// Columns, primary key, outgoing foreign keys and secondary indexes of one table
    fn describe_table(&mut self, name: &str) -> Result<Table>;
}

impl<A: CatalogAdapter + ?Sized> CatalogAdapter for Box<A> {
    fn backend(&self) -> Backend {
        (**self).backend()
    }

    fn list_tables(&mut self, explicit: Option<&[String]>) -> Result<Vec<String>> {
        (**self).list_tables(explicit)
    }

    fn describe_table(&mut self, name: &str) -> Result<Table> {
        (**self).describe_table(name)
    }
}

/// Explicit, non-empty table list, if the caller gave one
pub(crate) fn explicit_tables(explicit: Option<&[String]>) -> Option<Vec<String>> {
    explicit.filter(|names| !names.is_empty()).map(<[String]>::to_vec)
}

/// Wrap a per-table failure with the table name
pub(crate) fn table_error(table: &str) -> impl FnOnce(BoxError) -> Error + '_ {
    move |source| Error::MetadataQuery {
        table: table.to_string(),
        source,
    }
}

/// Decode every row with `f`, tagging a malformed row with the table name
pub(crate) fn decode_rows<T>(
    table: &str,
    rows: &[Row],
    f: impl FnMut(&Row) -> std::result::Result<T, RowError>,
) -> Result<Vec<T>> {
    rows.iter()
        .map(f)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| table_error(table)(e.into()))
}

/// Open a verified connection for `url` and wrap it in the matching adapter.
///
/// `schema` overrides the namespace: PostgreSQL defaults to `public`, MySQL to
/// the database named in the URL, SQLite ignores it.
pub fn connect(url: &str, schema: Option<&str>) -> Result<Box<dyn CatalogAdapter>> {
    let (backend, target) = parse_database_url(url)?;
    let schema = schema.filter(|s| !s.is_empty());

    let adapter: Box<dyn CatalogAdapter> = match backend {
        Backend::Postgres => {
            let namespace = schema.unwrap_or(DEFAULT_POSTGRES_SCHEMA).to_string();
            let source = PgSource::connect(&target)?;
            Box::new(PostgresCatalog::new(source, namespace))
        }
        Backend::MySql => {
            let namespace = match schema {
                Some(s) => s.to_string(),
                None => database_name_from_url(&target).ok_or_else(|| {
                    Error::config(
                        "no database name in MySQL URL (pass --schema to choose one)",
                    )
                })?,
            };
            let source = MySqlSource::connect(&target)?;
            Box::new(MySqlCatalog::new(source, namespace))
        }
        Backend::Sqlite => {
            let source = SqliteSource::open(&target)?;
            Box::new(SqliteCatalog::new(source))
        }
    };

    Ok(adapter)
}
