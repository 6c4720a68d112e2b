// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

//! Extract relational database schemas into compact documentation.
//!
//! The pipeline is: connect a [`CatalogAdapter`](catalog::CatalogAdapter) for
//! the URL's backend, assemble a [`Schema`] table by table, drop excluded
//! tables, then render the result through the output organizer.

pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod progress;
pub mod render;
pub mod schema;

pub use catalog::Backend;
pub use error::{Error, Result};
pub use extract::{Extraction, SchemaExtractor, Stats};
pub use output::{OutputConfig, OutputMode, Written};
pub use render::Format;
pub use schema::{Column, IncomingRelation, Index, Relation, Schema, Table};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// What to extract from a database
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Namespace qualifier (PostgreSQL schema or MySQL database)
    pub schema: Option<String>,
    /// Tables to extract, in output order. Empty means every table.
    pub tables: Vec<String>,
    /// Tables removed from the result after extraction
    pub exclude: Vec<String>,
    /// Checked between tables; raising it aborts with [`Error::Cancelled`]
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Connect to `url`, assemble the schema and release the connection.
///
/// Exclusions in `options` are not applied here; see [`extract_and_format`].
pub fn extract_schema(url: &str, options: &ExtractOptions) -> Result<Extraction> {
    let adapter = catalog::connect(url, options.schema.as_deref())?;
    let mut extractor = SchemaExtractor::new(adapter).with_tables(options.tables.clone());
    if let Some(flag) = &options.cancel {
        extractor = extractor.with_cancel(Arc::clone(flag));
    }
    extractor.extract()
}

/// Remove the named tables. Names that are not present are ignored.
pub fn apply_exclusions(schema: &mut Schema, exclude: &[String]) {
    schema.exclude(exclude);
}

/// Render `schema` to the destination described by `config`
pub fn format_schema(schema: &Schema, config: &OutputConfig) -> Result<Written> {
    output::emit(schema, config)
}

/// Extract, apply exclusions, then render
pub fn extract_and_format(
    url: &str,
    options: &ExtractOptions,
    config: &OutputConfig,
) -> Result<(Extraction, Written)> {
    let mut extraction = extract_schema(url, options)?;
    apply_exclusions(&mut extraction.schema, &options.exclude);
    let written = format_schema(&extraction.schema, config)?;
    Ok((extraction, written))
}
