//! MySQL catalog adapter, reading `information_schema` of one database.

use super::types::parse_mysql_enum;
use super::{
    decode_rows, explicit_tables, table_error, Backend, CatalogAdapter, MetadataSource, Param, Row,
};
use crate::error::{Error, Result};
use crate::schema::{Column, Index, Relation, Table};

// information_schema columns are cast to CHAR so they decode as text
// regardless of the server's collation for the dictionary tables.

const LIST_TABLES: &str = r#"
SELECT CAST(table_name AS CHAR)
FROM information_schema.tables
WHERE table_schema = ? AND table_type = 'BASE TABLE'
ORDER BY table_name
"#;

const COLUMNS: &str = r#"
SELECT
    CAST(c.column_name AS CHAR),
    CAST(c.column_type AS CHAR),
    CAST(c.is_nullable AS CHAR),
    CAST(c.column_default AS CHAR),
    CASE WHEN EXISTS (
        SELECT 1
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON kcu.constraint_schema = tc.constraint_schema
           AND kcu.constraint_name = tc.constraint_name
           AND kcu.table_name = tc.table_name
        WHERE tc.table_schema = c.table_schema
          AND tc.table_name = c.table_name
          AND tc.constraint_type = 'UNIQUE'
          AND kcu.column_name = c.column_name
          AND (
              SELECT COUNT(*)
              FROM information_schema.key_column_usage k2
              WHERE k2.constraint_schema = tc.constraint_schema
                AND k2.constraint_name = tc.constraint_name
                AND k2.table_name = tc.table_name
          ) = 1
    ) THEN 1 ELSE 0 END AS is_unique,
    CAST(c.data_type AS CHAR)
FROM information_schema.columns c
WHERE c.table_schema = ? AND c.table_name = ?
ORDER BY c.ordinal_position
"#;

const PRIMARY_KEY: &str = r#"
SELECT CAST(column_name AS CHAR)
FROM information_schema.key_column_usage
WHERE table_schema = ? AND table_name = ? AND constraint_name = 'PRIMARY'
ORDER BY ordinal_position
"#;

const FOREIGN_KEYS: &str = r#"
SELECT
    CAST(column_name AS CHAR),
    CAST(referenced_table_name AS CHAR),
    CAST(referenced_column_name AS CHAR)
FROM information_schema.key_column_usage
WHERE table_schema = ? AND table_name = ? AND referenced_table_name IS NOT NULL
ORDER BY constraint_name, ordinal_position
"#;

// One row per key part; rows are grouped by index name on our side so column
// names never pass through a joined string
const INDEXES: &str = r#"
SELECT
    CAST(index_name AS CHAR),
    CASE WHEN non_unique = 0 THEN 1 ELSE 0 END AS is_unique,
    CAST(column_name AS CHAR)
FROM information_schema.statistics
WHERE table_schema = ? AND table_name = ? AND index_name <> 'PRIMARY'
ORDER BY index_name, seq_in_index
"#;

/// Introspects one MySQL database
pub struct MySqlCatalog<S> {
    source: S,
    database: String,
}

impl<S: MetadataSource> MySqlCatalog<S> {
    pub fn new(source: S, database: impl Into<String>) -> Self {
        Self {
            source,
            database: database.into(),
        }
    }

    /// Run a per-table query bound to (database, table)
    fn query(&mut self, table: &str, sql: &str) -> Result<Vec<Row>> {
        self.source
            .query(sql, &[Param::Text(&self.database), Param::Text(table)])
            .map_err(table_error(table))
    }

    fn columns(&mut self, table: &str) -> Result<Vec<Column>> {
        let rows = self.query(table, COLUMNS)?;
        decode_rows(table, &rows, |row| {
            let column_type = row.text(1)?;
            let data_type = row.opt_text(5)?.unwrap_or_default();

            let mut col = Column::new(row.text(0)?, column_type.as_str());
            if matches!(data_type.as_str(), "enum" | "set") {
                if let Some((kind, values)) = parse_mysql_enum(&column_type) {
                    col.data_type = kind.to_string();
                    col.enum_values = values;
                }
            }
            col.nullable = row.flag(2)?;
            col.default = row.opt_text(3)?;
            col.is_unique = row.flag(4)?;
            Ok(col)
        })
    }

    fn primary_key(&mut self, table: &str) -> Result<Vec<String>> {
        let rows = self.query(table, PRIMARY_KEY)?;
        decode_rows(table, &rows, |row| row.text(0))
    }

    fn relations(&mut self, table: &str) -> Result<Vec<Relation>> {
        let rows = self.query(table, FOREIGN_KEYS)?;
        decode_rows(table, &rows, |row| {
            Ok(Relation::many_to_one(row.text(0)?, row.text(1)?, row.text(2)?))
        })
    }

    fn indexes(&mut self, table: &str) -> Result<Vec<Index>> {
        let rows = self.query(table, INDEXES)?;
        let parts = decode_rows(table, &rows, |row| {
            Ok((row.text(0)?, row.flag(1)?, row.opt_text(2)?))
        })?;

        let mut indexes: Vec<Index> = Vec::new();
        for (name, is_unique, column) in parts {
            if indexes.last().map_or(true, |last| last.name != name) {
                indexes.push(Index {
                    name,
                    columns: Vec::new(),
                    is_unique,
                });
            }
            // Functional key parts have no column name
            if let (Some(column), Some(index)) = (column, indexes.last_mut()) {
                index.columns.push(column);
            }
        }

        indexes.retain(|idx| !idx.columns.is_empty());
        Ok(indexes)
    }
}

impl<S: MetadataSource> CatalogAdapter for MySqlCatalog<S> {
    fn backend(&self) -> Backend {
        Backend::MySql
    }

    fn list_tables(&mut self, explicit: Option<&[String]>) -> Result<Vec<String>> {
        if let Some(names) = explicit_tables(explicit) {
            return Ok(names);
        }

        let rows = self
            .source
            .query(LIST_TABLES, &[Param::Text(&self.database)])
            .map_err(|source| Error::TableListing { source })?;
        rows.iter()
            .map(|row| row.text(0))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::TableListing { source: e.into() })
    }

    fn describe_table(&mut self, name: &str) -> Result<Table> {
        let mut table = Table::new(name);
        table.columns = self.columns(name)?;
        table.primary_key = self.primary_key(name)?;
        table.relations = self.relations(name)?;
        table.indexes = self.indexes(name)?;
        Ok(table)
    }
}
