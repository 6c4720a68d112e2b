//! `sqlx`-backed metadata sources.
//!
//! Each source owns one connection and a current-thread tokio runtime that
//! drives it, so the rest of the crate stays synchronous. The connection is
//! closed when the source is dropped.

use super::{Backend, MetadataSource, Param, Row, Value};
use crate::error::{BoxError, Error, Result};
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column as _, ConnectOptions, Connection, Row as _, TypeInfo as _};
use std::path::Path;
use tokio::runtime::{Builder, Runtime};

fn runtime(backend: Backend) -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Connection {
            backend,
            source: e.into(),
        })
}

fn connection_error(backend: Backend) -> impl FnOnce(sqlx::Error) -> Error {
    move |e| Error::Connection {
        backend,
        source: e.into(),
    }
}

fn unsupported_list(backend: Backend) -> BoxError {
    format!("{} does not support list parameters", backend).into()
}

/// PostgreSQL connection
pub struct PgSource {
    conn: Option<PgConnection>,
    rt: Runtime,
}

impl PgSource {
    /// Connect and verify the connection with a ping
    pub fn connect(url: &str) -> Result<Self> {
        let rt = runtime(Backend::Postgres)?;
        let conn = rt
            .block_on(async {
                let mut conn = PgConnection::connect(url).await?;
                conn.ping().await?;
                Ok::<_, sqlx::Error>(conn)
            })
            .map_err(connection_error(Backend::Postgres))?;
        Ok(Self {
            conn: Some(conn),
            rt,
        })
    }
}

impl MetadataSource for PgSource {
    fn query(&mut self, sql: &str, params: &[Param<'_>]) -> std::result::Result<Vec<Row>, BoxError> {
        let conn = self.conn.as_mut().ok_or("connection closed")?;
        let mut query = sqlx::query(sql);
        for param in params {
            query = match *param {
                Param::Text(s) => query.bind(s),
                Param::TextList(items) => query.bind(items),
            };
        }
        let rows = self.rt.block_on(query.fetch_all(conn))?;
        rows.iter().map(pg_row).collect()
    }
}

impl Drop for PgSource {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let _ = self.rt.block_on(conn.close());
        }
    }
}

fn pg_row(row: &PgRow) -> std::result::Result<Row, BoxError> {
    (0..row.len())
        .map(|i| pg_value(row, i))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(Row::new)
}

fn pg_value(row: &PgRow, i: usize) -> std::result::Result<Value, BoxError> {
    if let Ok(v) = row.try_get::<Option<String>, _>(i) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(i) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(i) {
        return Ok(v.map(i64::from).into());
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(i) {
        return Ok(v.map(i64::from).into());
    }
    if let Ok(v) = row.try_get::<Option<Vec<String>>, _>(i) {
        return Ok(v.map(Value::TextList).unwrap_or(Value::Null));
    }
    Err(unsupported_column(row.columns()[i].type_info().name(), i))
}

/// MySQL connection
pub struct MySqlSource {
    conn: Option<MySqlConnection>,
    rt: Runtime,
}

impl MySqlSource {
    /// Connect and verify the connection with a ping
    pub fn connect(url: &str) -> Result<Self> {
        let rt = runtime(Backend::MySql)?;
        let conn = rt
            .block_on(async {
                let mut conn = MySqlConnection::connect(url).await?;
                conn.ping().await?;
                Ok::<_, sqlx::Error>(conn)
            })
            .map_err(connection_error(Backend::MySql))?;
        Ok(Self {
            conn: Some(conn),
            rt,
        })
    }
}

impl MetadataSource for MySqlSource {
    fn query(&mut self, sql: &str, params: &[Param<'_>]) -> std::result::Result<Vec<Row>, BoxError> {
        let conn = self.conn.as_mut().ok_or("connection closed")?;
        let mut query = sqlx::query(sql);
        for param in params {
            query = match *param {
                Param::Text(s) => query.bind(s),
                Param::TextList(_) => return Err(unsupported_list(Backend::MySql)),
            };
        }
        let rows = self.rt.block_on(query.fetch_all(conn))?;
        rows.iter().map(mysql_row).collect()
    }
}

impl Drop for MySqlSource {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let _ = self.rt.block_on(conn.close());
        }
    }
}

fn mysql_row(row: &MySqlRow) -> std::result::Result<Row, BoxError> {
    (0..row.len())
        .map(|i| mysql_value(row, i))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(Row::new)
}

fn mysql_value(row: &MySqlRow, i: usize) -> std::result::Result<Value, BoxError> {
    if let Ok(v) = row.try_get::<Option<String>, _>(i) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(i) {
        return Ok(v.map(|n| i64::try_from(n).unwrap_or(i64::MAX)).into());
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(i) {
        return Ok(v.map(i64::from).into());
    }
    if let Ok(v) = row.try_get::<Option<u32>, _>(i) {
        return Ok(v.map(i64::from).into());
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(i) {
        return Ok(v.into());
    }
    // information_schema exposes some text columns with a binary collation
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(i) {
        return Ok(v
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .into());
    }
    Err(unsupported_column(row.columns()[i].type_info().name(), i))
}

/// SQLite database file, opened read-only
pub struct SqliteSource {
    conn: Option<SqliteConnection>,
    rt: Runtime,
}

impl SqliteSource {
    /// Open an existing database file. Missing files are a connection failure.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let rt = runtime(Backend::Sqlite)?;
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .read_only(true)
            .create_if_missing(false);
        let conn = rt
            .block_on(async {
                let mut conn = options.connect().await?;
                conn.ping().await?;
                Ok::<_, sqlx::Error>(conn)
            })
            .map_err(connection_error(Backend::Sqlite))?;
        Ok(Self {
            conn: Some(conn),
            rt,
        })
    }
}

impl MetadataSource for SqliteSource {
    fn query(&mut self, sql: &str, params: &[Param<'_>]) -> std::result::Result<Vec<Row>, BoxError> {
        let conn = self.conn.as_mut().ok_or("connection closed")?;
        let mut query = sqlx::query(sql);
        for param in params {
            query = match *param {
                Param::Text(s) => query.bind(s),
                Param::TextList(_) => return Err(unsupported_list(Backend::Sqlite)),
            };
        }
        let rows = self.rt.block_on(query.fetch_all(conn))?;
        rows.iter().map(sqlite_row).collect()
    }
}

impl Drop for SqliteSource {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let _ = self.rt.block_on(conn.close());
        }
    }
}

fn sqlite_row(row: &SqliteRow) -> std::result::Result<Row, BoxError> {
    (0..row.len())
        .map(|i| sqlite_value(row, i))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(Row::new)
}

fn sqlite_value(row: &SqliteRow, i: usize) -> std::result::Result<Value, BoxError> {
    if let Ok(v) = row.try_get::<Option<String>, _>(i) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(i) {
        return Ok(v
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .into());
    }
    Err(unsupported_column(row.columns()[i].type_info().name(), i))
}

fn unsupported_column(type_name: &str, index: usize) -> BoxError {
    format!("unsupported column type {} at position {}", type_name, index).into()
}
