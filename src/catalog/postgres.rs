//! PostgreSQL catalog adapter.
//!
//! Columns and the primary key come from `information_schema`; uniqueness,
//! foreign keys, indexes and enum labels from `pg_catalog`, which keeps
//! constraint column order intact for composite keys.

use super::types::normalize_postgres_type;
use super::{
    decode_rows, explicit_tables, table_error, Backend, CatalogAdapter, MetadataSource, Param, Row,
};
use crate::error::{Error, Result};
use crate::schema::{Column, Index, Relation, Table};
use ahash::AHashMap;

const LIST_TABLES: &str = r#"
SELECT table_name::text
FROM information_schema.tables
WHERE table_schema = $1 AND table_type = 'BASE TABLE'
ORDER BY table_name
"#;

const COLUMNS: &str = r#"
SELECT
    c.column_name::text,
    c.data_type::text,
    c.is_nullable::text,
    c.column_default::text,
    EXISTS (
        SELECT 1
        FROM pg_constraint con
        JOIN pg_class rel ON rel.oid = con.conrelid
        JOIN pg_namespace nsp ON nsp.oid = rel.relnamespace
        JOIN pg_attribute att ON att.attrelid = rel.oid AND att.attnum = con.conkey[1]
        WHERE con.contype = 'u'
          AND array_length(con.conkey, 1) = 1
          AND nsp.nspname = c.table_schema
          AND rel.relname = c.table_name
          AND att.attname = c.column_name
    ) AS is_unique,
    c.udt_schema::text,
    c.udt_name::text,
    c.character_maximum_length::int8
FROM information_schema.columns c
WHERE c.table_schema = $1 AND c.table_name = $2
ORDER BY c.ordinal_position
"#;

/// Labels of every requested enum type, keyed by `schema.type`
const ENUM_LABELS: &str = r#"
SELECT (n.nspname || '.' || t.typname)::text AS qualified, e.enumlabel::text
FROM pg_type t
JOIN pg_enum e ON e.enumtypid = t.oid
JOIN pg_namespace n ON n.oid = t.typnamespace
WHERE (n.nspname || '.' || t.typname)::text = ANY($1)
ORDER BY qualified, e.enumsortorder
"#;

const PRIMARY_KEY: &str = r#"
SELECT kcu.column_name::text
FROM information_schema.table_constraints tc
JOIN information_schema.key_column_usage kcu
    ON kcu.constraint_name = tc.constraint_name
   AND kcu.constraint_schema = tc.constraint_schema
   AND kcu.table_name = tc.table_name
WHERE tc.table_schema = $1
  AND tc.table_name = $2
  AND tc.constraint_type = 'PRIMARY KEY'
ORDER BY kcu.ordinal_position
"#;

const FOREIGN_KEYS: &str = r#"
SELECT src.attname::text, tgt_rel.relname::text, tgt.attname::text
FROM pg_constraint con
JOIN pg_class rel ON rel.oid = con.conrelid
JOIN pg_namespace nsp ON nsp.oid = rel.relnamespace
JOIN pg_class tgt_rel ON tgt_rel.oid = con.confrelid
CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(src_attnum, tgt_attnum, ord)
JOIN pg_attribute src ON src.attrelid = con.conrelid AND src.attnum = k.src_attnum
JOIN pg_attribute tgt ON tgt.attrelid = con.confrelid AND tgt.attnum = k.tgt_attnum
WHERE con.contype = 'f' AND nsp.nspname = $1 AND rel.relname = $2
ORDER BY con.conname, k.ord
"#;

const INDEXES: &str = r#"
SELECT
    i.relname::text,
    ix.indisunique,
    array_agg(a.attname::text ORDER BY array_position(ix.indkey::int2[], a.attnum))
FROM pg_index ix
JOIN pg_class t ON t.oid = ix.indrelid
JOIN pg_class i ON i.oid = ix.indexrelid
JOIN pg_namespace n ON n.oid = t.relnamespace
JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
WHERE n.nspname = $1 AND t.relname = $2 AND NOT ix.indisprimary
GROUP BY i.relname, ix.indisunique
ORDER BY i.relname
"#;

/// Introspects one PostgreSQL namespace
pub struct PostgresCatalog<S> {
    source: S,
    schema: String,
}

impl<S: MetadataSource> PostgresCatalog<S> {
    pub fn new(source: S, schema: impl Into<String>) -> Self {
        Self {
            source,
            schema: schema.into(),
        }
    }

    fn query(&mut self, table: &str, sql: &str, params: &[Param<'_>]) -> Result<Vec<Row>> {
        self.source.query(sql, params).map_err(table_error(table))
    }

    fn columns(&mut self, table: &str) -> Result<Vec<Column>> {
        let schema = self.schema.clone();
        let rows = self.query(table, COLUMNS, &[Param::Text(&schema), Param::Text(table)])?;

        // (column, qualified enum type) pairs; the type is only set for USER-DEFINED
        let described = decode_rows(table, &rows, |row| {
            let data_type = row.text(1)?;
            let udt_schema = row.opt_text(5)?.unwrap_or_default();
            let udt_name = row.text(6)?;

            let mut col = Column::new(
                row.text(0)?,
                normalize_postgres_type(&data_type, &udt_name, row.opt_int(7)?),
            );
            col.nullable = row.flag(2)?;
            col.default = row.opt_text(3)?;
            col.is_unique = row.flag(4)?;

            let user_type =
                (data_type == "USER-DEFINED").then(|| format!("{}.{}", udt_schema, udt_name));
            Ok((col, user_type))
        })?;

        let mut user_types: Vec<String> = Vec::new();
        for qualified in described.iter().filter_map(|(_, t)| t.as_ref()) {
            if !user_types.contains(qualified) {
                user_types.push(qualified.clone());
            }
        }

        let labels = if user_types.is_empty() {
            AHashMap::new()
        } else {
            self.enum_labels(table, &user_types)?
        };

        Ok(described
            .into_iter()
            .map(|(mut col, user_type)| {
                if let Some(values) = user_type.and_then(|t| labels.get(&t)) {
                    col.enum_values = values.clone();
                }
                col
            })
            .collect())
    }

    /// One batched lookup for every enum type used by the table
    fn enum_labels(
        &mut self,
        table: &str,
        user_types: &[String],
    ) -> Result<AHashMap<String, Vec<String>>> {
        let rows = self.query(table, ENUM_LABELS, &[Param::TextList(user_types)])?;
        let pairs = decode_rows(table, &rows, |row| Ok((row.text(0)?, row.text(1)?)))?;

        let mut labels: AHashMap<String, Vec<String>> = AHashMap::new();
        for (qualified, label) in pairs {
            labels.entry(qualified).or_default().push(label);
        }
        Ok(labels)
    }

    fn primary_key(&mut self, table: &str) -> Result<Vec<String>> {
        let schema = self.schema.clone();
        let rows = self.query(table, PRIMARY_KEY, &[Param::Text(&schema), Param::Text(table)])?;
        decode_rows(table, &rows, |row| row.text(0))
    }

    fn relations(&mut self, table: &str) -> Result<Vec<Relation>> {
        let schema = self.schema.clone();
        let rows = self.query(table, FOREIGN_KEYS, &[Param::Text(&schema), Param::Text(table)])?;
        decode_rows(table, &rows, |row| {
            Ok(Relation::many_to_one(row.text(0)?, row.text(1)?, row.text(2)?))
        })
    }

    fn indexes(&mut self, table: &str) -> Result<Vec<Index>> {
        let schema = self.schema.clone();
        let rows = self.query(table, INDEXES, &[Param::Text(&schema), Param::Text(table)])?;
        decode_rows(table, &rows, |row| {
            Ok(Index {
                name: row.text(0)?,
                is_unique: row.flag(1)?,
                columns: row.text_list(2)?,
            })
        })
    }
}

impl<S: MetadataSource> CatalogAdapter for PostgresCatalog<S> {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    fn list_tables(&mut self, explicit: Option<&[String]>) -> Result<Vec<String>> {
        if let Some(names) = explicit_tables(explicit) {
            return Ok(names);
        }

        let rows = self
            .source
            .query(LIST_TABLES, &[Param::Text(&self.schema)])
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
