//! Compact plain-text rendering, tuned for token efficiency.

use super::Format;
use crate::schema::{Column, IncomingRelation, Schema, Table};

/// Render one table block
pub fn compact_table(table: &Table, incoming: Option<&[IncomingRelation]>) -> String {
    let mut output = String::new();

    if table.primary_key.is_empty() {
        output.push_str(&format!("TABLE {}\n", table.name));
    } else {
        output.push_str(&format!(
            "TABLE {} (PK: {})\n",
            table.name,
            table.primary_key.join(", ")
        ));
    }

    for col in &table.columns {
        output.push_str(&format!("  {}\n", column_line(col)));
    }

    if !table.relations.is_empty() {
        output.push_str("\n  RELATIONS:\n");
        for rel in &table.relations {
            output.push_str(&format!(
                "    {} → {}.{} ({})\n",
                rel.source_column, rel.target_table, rel.target_column, rel.cardinality
            ));
        }
    }

    if !table.indexes.is_empty() {
        output.push_str("\n  INDEXES:\n");
        for idx in &table.indexes {
            let unique = if idx.is_unique { " UNIQUE" } else { "" };
            output.push_str(&format!(
                "    {} ({}){}\n",
                idx.name,
                idx.columns.join(", "),
                unique
            ));
        }
    }

    if let Some(incoming) = incoming.filter(|rels| !rels.is_empty()) {
        output.push_str("\n  REFERENCED BY:\n");
        for rel in incoming {
            output.push_str(&format!(
                "    {}.{} → {} ({})\n",
                rel.source_table,
                rel.source_column,
                rel.target_column,
                rel.describe()
            ));
        }
    }

    output
}

fn column_line(col: &Column) -> String {
    let mut parts = vec![format!("{}:", col.name), col.display_type()];

    if col.is_unique {
        parts.push("UNIQUE".to_string());
    }
    if !col.nullable {
        parts.push("NOT NULL".to_string());
    }
    if let Some(default) = &col.default {
        parts.push(format!("DEFAULT {}", default));
    }
    if let Some(check) = &col.check {
        parts.push(format!("CHECK ({})", single_line(check)));
    }

    parts.join(" ")
}

fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title plus every table, separated by blank lines
pub fn compact_document(schema: &Schema) -> String {
    let mut output = String::from("DATABASE SCHEMA\n");
    for table in schema.iter() {
        output.push('\n');
        output.push_str(&compact_table(table, None));
    }
    output
}

/// Overview listing every table alphabetically with the tables it references
pub fn compact_overview(schema: &Schema) -> String {
    let mut output = String::from("SCHEMA OVERVIEW\n");
    output.push_str(&format!(
        "Each table has a file: <table_name>.{}\n\n",
        Format::Text.extension()
    ));

    for table in schema.sorted_tables() {
        let referenced = table.referenced_tables();
        if referenced.is_empty() {
            output.push_str(&format!("{}\n", table.name));
        } else {
            output.push_str(&format!(
                "{} (references: {})\n",
                table.name,
                referenced.join(", ")
            ));
        }
    }

    output
}
