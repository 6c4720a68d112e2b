//! Structured markdown rendering.
//!
//! Columns become a table row each, with type, key markers, nullability and
//! default folded into one cell and CHECK text in its own cell. Foreign keys
//! are phrased as cardinality sentences.

use super::Format;
use crate::schema::{Column, IncomingRelation, Index, Schema, Table};

/// Render one table section
pub fn structured_table(table: &Table, incoming: Option<&[IncomingRelation]>) -> String {
    let mut output = format!("## {}\n\n", table.name);

    output.push_str("### Columns\n\n");
    output.push_str("| Column | Definition | Check |\n");
    output.push_str("|--------|------------|-------|\n");
    for col in &table.columns {
        output.push_str(&format!(
            "| {} | {} | {} |\n",
            escape_cell(&col.name),
            escape_cell(&definition(col, table.is_primary_key(&col.name))),
            col.check.as_deref().map(escape_cell).unwrap_or_default()
        ));
    }
    output.push('\n');

    let indexes: Vec<&Index> = table
        .indexes
        .iter()
        .filter(|idx| !restates_column_uniqueness(table, idx))
        .collect();
    if !indexes.is_empty() {
        output.push_str("### Indexes\n\n");
        for idx in indexes {
            let unique = if idx.is_unique { ", unique" } else { "" };
            output.push_str(&format!(
                "- {} on ({}){}\n",
                idx.name,
                idx.columns.join(", "),
                unique
            ));
        }
        output.push('\n');
    }

    if !table.relations.is_empty() {
        output.push_str("### References\n\n");
        for rel in &table.relations {
            output.push_str(&format!(
                "- {} → {}.{} ({})\n",
                rel.source_column,
                rel.target_table,
                rel.target_column,
                rel.cardinality.describe(&table.name, &rel.target_table)
            ));
        }
        output.push('\n');
    }

    if let Some(incoming) = incoming.filter(|rels| !rels.is_empty()) {
        output.push_str("### Referenced by\n\n");
        for rel in incoming {
            output.push_str(&format!(
                "- {}.{} → {} ({})\n",
                rel.source_table,
                rel.source_column,
                rel.target_column,
                rel.describe()
            ));
        }
        output.push('\n');
    }

    output
}

/// Composite cell: type, PK, UNIQUE, NOT NULL, DEFAULT
fn definition(col: &Column, is_pk: bool) -> String {
    let mut parts = vec![col.display_type()];
    if is_pk {
        parts.push("PK".to_string());
    }
    if col.is_unique {
        parts.push("UNIQUE".to_string());
    }
    if !col.nullable {
        parts.push("NOT NULL".to_string());
    }
    if let Some(default) = &col.default {
        parts.push(format!("DEFAULT {}", default));
    }
    parts.join(", ")
}

/// A single-column unique index adds nothing when the column is already marked UNIQUE
fn restates_column_uniqueness(table: &Table, idx: &Index) -> bool {
    match idx.columns.as_slice() {
        [only] if idx.is_unique => table.column(only).is_some_and(|c| c.is_unique),
        _ => false,
    }
}

fn escape_cell(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

/// Title plus every table in schema order
pub fn structured_document(schema: &Schema) -> String {
    let mut output = String::from("# Database Schema\n\n");
    for table in schema.iter() {
        output.push_str(&structured_table(table, None));
    }
    output
}

/// Overview listing every table alphabetically with the tables it references
pub fn structured_overview(schema: &Schema) -> String {
    let mut output = String::from("# Schema Overview\n\n");
    output.push_str(&format!(
        "Each table has a corresponding file: `<table_name>.{}`\n\n",
        Format::Markdown.extension()
    ));
    output.push_str("## Tables\n\n");

    for table in schema.sorted_tables() {
        let referenced = table.referenced_tables();
        if referenced.is_empty() {
            output.push_str(&format!("- **{}**\n", table.name));
        } else {
            output.push_str(&format!(
                "- **{}** (references: {})\n",
                table.name,
                referenced.join(", ")
            ));
        }
    }

    output
}
