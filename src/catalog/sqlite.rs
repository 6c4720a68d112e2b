//! SQLite catalog adapter.
//!
//! Uses the table-valued PRAGMA functions so table names are bound as
//! parameters rather than spliced into the statement. CHECK constraints are
//! recovered from the stored `CREATE TABLE` text.

use super::types::{check_constraints, check_subject, normalize_sqlite_type};
use super::{
    decode_rows, explicit_tables, table_error, Backend, CatalogAdapter, MetadataSource, Param, Row,
};
use crate::error::{Error, Result};
use crate::schema::{Column, Index, Relation, Table};

const LIST_TABLES: &str = r#"
SELECT name
FROM sqlite_master
WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
ORDER BY name
"#;

const TABLE_INFO: &str = r#"
SELECT name, type, "notnull", dflt_value, pk
FROM pragma_table_info(?1)
ORDER BY cid
"#;

const PRIMARY_KEY: &str = r#"
SELECT name
FROM pragma_table_info(?1)
WHERE pk > 0
ORDER BY pk
"#;

const CREATE_SQL: &str = r#"
SELECT sql
FROM sqlite_master
WHERE type = 'table' AND name = ?1
"#;

const INDEX_LIST: &str = r#"
SELECT name, "unique", origin
FROM pragma_index_list(?1)
ORDER BY name
"#;

const INDEX_INFO: &str = r#"
SELECT name
FROM pragma_index_info(?1)
ORDER BY seqno
"#;

// Foreign keys are numbered from the last declared one
const FOREIGN_KEYS: &str = r#"
SELECT id, seq, "table", "from", "to"
FROM pragma_foreign_key_list(?1)
ORDER BY id DESC, seq
"#;

/// Raw `pragma_table_info` row
struct ColumnInfo {
    column: Column,
    pk: i64,
}

/// Raw `pragma_index_list` row
struct IndexEntry {
    name: String,
    is_unique: bool,
    origin: String,
}

/// Introspects one SQLite database file
pub struct SqliteCatalog<S> {
    source: S,
}

impl<S: MetadataSource> SqliteCatalog<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Run a query bound to a single name, failures tagged with `table`
    fn query(&mut self, table: &str, sql: &str, name: &str) -> Result<Vec<Row>> {
        self.source
            .query(sql, &[Param::Text(name)])
            .map_err(table_error(table))
    }

    fn table_info(&mut self, table: &str) -> Result<Vec<ColumnInfo>> {
        let rows = self.query(table, TABLE_INFO, table)?;
        decode_rows(table, &rows, |row| {
            let declared = row.opt_text(1)?.unwrap_or_default();
            let mut column = Column::new(row.text(0)?, normalize_sqlite_type(&declared));
            column.nullable = !row.flag(2)?;
            column.default = row.opt_text(3)?;
            Ok(ColumnInfo {
                column,
                pk: row.int(4)?,
            })
        })
    }

    fn primary_key_of(&mut self, table: &str, target: &str) -> Result<Vec<String>> {
        let rows = self.query(table, PRIMARY_KEY, target)?;
        decode_rows(table, &rows, |row| row.text(0))
    }

    fn index_list(&mut self, table: &str) -> Result<Vec<IndexEntry>> {
        let rows = self.query(table, INDEX_LIST, table)?;
        decode_rows(table, &rows, |row| {
            Ok(IndexEntry {
                name: row.text(0)?,
                is_unique: row.flag(1)?,
                origin: row.opt_text(2)?.unwrap_or_default(),
            })
        })
    }

    fn index_columns(&mut self, table: &str, index: &str) -> Result<Vec<String>> {
        let rows = self.query(table, INDEX_INFO, index)?;
        let names = decode_rows(table, &rows, |row| row.opt_text(0))?;
        // Expression key parts have no name
        Ok(names.into_iter().flatten().collect())
    }

    fn relations(&mut self, table: &str) -> Result<Vec<Relation>> {
        let rows = self.query(table, FOREIGN_KEYS, table)?;
        let keys = decode_rows(table, &rows, |row| {
            Ok((
                row.int(1)?,
                row.text(2)?,
                row.text(3)?,
                row.opt_text(4)?,
            ))
        })?;

        let mut relations = Vec::with_capacity(keys.len());
        for (seq, target_table, source_column, target_column) in keys {
            let target_column = match target_column {
                Some(col) if !col.is_empty() => col,
                // REFERENCES without a column list targets the primary key
                _ => self
                    .primary_key_of(table, &target_table)?
                    .into_iter()
                    .nth(usize::try_from(seq).unwrap_or(0))
                    .unwrap_or_else(|| "rowid".to_string()),
            };
            relations.push(Relation::many_to_one(
                source_column,
                target_table,
                target_column,
            ));
        }
        Ok(relations)
    }

    fn create_sql(&mut self, table: &str) -> Result<Option<String>> {
        let rows = self.query(table, CREATE_SQL, table)?;
        let sql = decode_rows(table, &rows, |row| row.opt_text(0))?;
        Ok(sql.into_iter().flatten().next())
    }
}

impl<S: MetadataSource> CatalogAdapter for SqliteCatalog<S> {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn list_tables(&mut self, explicit: Option<&[String]>) -> Result<Vec<String>> {
        if let Some(names) = explicit_tables(explicit) {
            return Ok(names);
        }

        let rows = self
            .source
            .query(LIST_TABLES, &[])
            .map_err(|source| Error::TableListing { source })?;
        rows.iter()
            .map(|row| row.text(0))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::TableListing { source: e.into() })
    }

    fn describe_table(&mut self, name: &str) -> Result<Table> {
        let mut table = Table::new(name);

        let infos = self.table_info(name)?;
        let mut keyed: Vec<&ColumnInfo> = infos.iter().filter(|info| info.pk > 0).collect();
        keyed.sort_by_key(|info| info.pk);
        table.primary_key = keyed.iter().map(|info| info.column.name.clone()).collect();

        let mut indexes = Vec::new();
        let mut unique_columns = Vec::new();
        for entry in self.index_list(name)? {
            let columns = self.index_columns(name, &entry.name)?;
            if columns.is_empty() {
                continue;
            }
            if entry.is_unique && columns.len() == 1 && !table.is_primary_key(&columns[0]) {
                unique_columns.push(columns[0].clone());
            }
            if entry.origin != "pk" {
                indexes.push(Index {
                    name: entry.name,
                    columns,
                    is_unique: entry.is_unique,
                });
            }
        }

        table.columns = infos
            .into_iter()
            .map(|info| {
                let mut column = info.column;
                column.is_unique = unique_columns.contains(&column.name);
                column
            })
            .collect();

        if let Some(sql) = self.create_sql(name)? {
            let names: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();
            for expr in check_constraints(&sql) {
                let Some(subject) = check_subject(&expr, &names) else {
                    continue;
                };
                if let Some(column) = table.columns.iter_mut().find(|c| c.name == subject) {
                    column.check = Some(match column.check.take() {
                        Some(existing) => format!("{} AND {}", existing, expr),
                        None => expr,
                    });
                }
            }
        }

        table.relations = self.relations(name)?;
        table.indexes = indexes;
        Ok(table)
    }
}
