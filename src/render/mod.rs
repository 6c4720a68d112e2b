//! Document renderings of the schema model.
//!
//! Two independent renderings exist: a compact plain-text form and a
//! structured markdown form. Both are pure functions from a table (plus an
//! optional list of incoming relations) to text; neither performs I/O.

mod compact;
mod structured;

pub use compact::{compact_document, compact_overview, compact_table};
pub use structured::{structured_document, structured_overview, structured_table};

use crate::schema::{IncomingRelation, Schema, Table};
use std::fmt;
use std::str::FromStr;

/// Document rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Compact, token-efficient plain text
    #[default]
    Text,
    /// Structured markdown with column tables and cross-references
    Markdown,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "compact" => Ok(Format::Text),
            "markdown" | "md" | "structured" => Ok(Format::Markdown),
            _ => Err(format!(
                "Unknown format: {}. Valid options: text, markdown",
                s
            )),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Text => write!(f, "text"),
            Format::Markdown => write!(f, "markdown"),
        }
    }
}

impl Format {
    /// File extension for documents in this format
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Text => "txt",
            Format::Markdown => "md",
        }
    }

    /// Render one table. `incoming` is only given in multi-document output.
    pub fn render_table(&self, table: &Table, incoming: Option<&[IncomingRelation]>) -> String {
        match self {
            Format::Text => compact_table(table, incoming),
            Format::Markdown => structured_table(table, incoming),
        }
    }

    /// Title plus every table in schema order
    pub fn render_document(&self, schema: &Schema) -> String {
        match self {
            Format::Text => compact_document(schema),
            Format::Markdown => structured_document(schema),
        }
    }

    /// Alphabetical table listing with outgoing-reference annotations
    pub fn render_overview(&self, schema: &Schema) -> String {
        match self {
            Format::Text => compact_overview(schema),
            Format::Markdown => structured_overview(schema),
        }
    }
}
