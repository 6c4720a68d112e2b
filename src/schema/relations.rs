//! Reverse relationship resolution.
//!
//! Backends only report foreign keys from the referencing side. The
//! "referenced by" view of a table is recomputed from the whole schema each
//! time it is needed and never stored on the model.

use super::{Cardinality, Schema};

/// A foreign key seen from the referenced table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRelation {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    pub cardinality: Cardinality,
}

impl IncomingRelation {
    /// Readable cardinality, phrased from the referencing table
    pub fn describe(&self) -> String {
        self.cardinality
            .describe(&self.source_table, &self.target_table)
    }
}

/// Collect every relation in `schema` whose target is `table`.
///
/// Order follows the schema's table order, then each table's relation order.
/// Self-references are included.
pub fn incoming_relations(schema: &Schema, table: &str) -> Vec<IncomingRelation> {
    schema
        .iter()
        .flat_map(|source| {
            source
                .relations
                .iter()
                .filter(|rel| rel.target_table == table)
                .map(move |rel| IncomingRelation {
                    source_table: source.name.clone(),
                    source_column: rel.source_column.clone(),
                    target_table: rel.target_table.clone(),
                    target_column: rel.target_column.clone(),
                    cardinality: rel.cardinality.clone(),
                })
        })
        .collect()
}
