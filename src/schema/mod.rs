//! Unified schema model shared by every backend.
//!
//! This module provides:
//! - Data models for tables, columns, foreign keys and indexes
//! - Post-extraction filtering (exclude lists)
//! - Reverse ("referenced by") relationship resolution

mod relations;

pub use relations::*;

use ahash::AHashSet;
use std::fmt;

/// Direction-aware cardinality of a foreign key, recorded from the owning table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    /// Every extracted foreign key is recorded as many-to-one
    #[default]
    ManyToOne,
    /// A tag we do not recognise, kept verbatim
    Other(String),
}

impl Cardinality {
    /// Parse a cardinality tag such as `N:1`
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "1:1" => Cardinality::OneToOne,
            "1:N" => Cardinality::OneToMany,
            "N:1" => Cardinality::ManyToOne,
            other => Cardinality::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Cardinality::OneToOne => "1:1",
            Cardinality::OneToMany => "1:N",
            Cardinality::ManyToOne => "N:1",
            Cardinality::Other(tag) => tag,
        }
    }

    /// Readable sentence form, e.g. "many orders to one users"
    pub fn describe(&self, source: &str, target: &str) -> String {
        match self {
            Cardinality::ManyToOne => format!("many {} to one {}", source, target),
            Cardinality::OneToMany => format!("one {} to many {}", source, target),
            Cardinality::OneToOne => format!("one {} to one {}", source, target),
            Cardinality::Other(tag) => tag.clone(),
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Column definition within a table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Canonical (normalized) type spelling
    pub data_type: String,
    /// Whether this column allows NULL values
    pub nullable: bool,
    /// Default expression as reported by the catalog
    pub default: Option<String>,
    /// Covered by a single-column UNIQUE constraint (never set for the primary key)
    pub is_unique: bool,
    /// Permitted literals of an enumerated type, in declared order (empty otherwise)
    pub enum_values: Vec<String>,
    /// Raw CHECK expression for backends without native enums
    pub check: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            ..Default::default()
        }
    }

    /// Type with the enumeration list inlined, e.g. `status (active|inactive)`
    pub fn display_type(&self) -> String {
        if self.enum_values.is_empty() {
            self.data_type.clone()
        } else {
            format!("{} ({})", self.data_type, self.enum_values.join("|"))
        }
    }
}

/// Outgoing foreign key edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Column in the owning table
    pub source_column: String,
    /// Referenced table
    pub target_table: String,
    /// Referenced column
    pub target_column: String,
    pub cardinality: Cardinality,
}

impl Relation {
    /// Foreign key edge with the default many-to-one cardinality
    pub fn many_to_one(
        source_column: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            source_column: source_column.into(),
            target_table: target_table.into(),
            target_column: target_column.into(),
            cardinality: Cardinality::ManyToOne,
        }
    }
}

/// Index definition (the primary key's backing index is never included)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Index name
    pub name: String,
    /// Columns in key order
    pub columns: Vec<String>,
    /// Whether this is a unique index
    pub is_unique: bool,
}

/// Complete table definition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Column definitions in catalog order
    pub columns: Vec<Column>,
    /// Outgoing foreign keys in extraction order
    pub relations: Vec<Relation>,
    /// Secondary indexes
    pub indexes: Vec<Index>,
    /// Primary key column names (ordered for composite keys)
    pub primary_key: Vec<String>,
}

impl Table {
    /// Create a new empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Get a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check if a column is part of the primary key
    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key.iter().any(|pk| pk == column)
    }

    /// Distinct referenced table names, in first-seen order
    pub fn referenced_tables(&self) -> Vec<&str> {
        let mut seen = AHashSet::new();
        self.relations
            .iter()
            .map(|r| r.target_table.as_str())
            .filter(|t| seen.insert(*t))
            .collect()
    }
}

/// Read-only snapshot of the extracted tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Tables in extraction order
    pub tables: Vec<Table>,
}

impl Schema {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    /// Get a table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Drop every table named in `names`. Unknown names are ignored.
    pub fn exclude(&mut self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        let excluded: AHashSet<&str> = names.iter().map(String::as_str).collect();
        self.tables.retain(|t| !excluded.contains(t.name.as_str()));
    }

    /// Tables sorted by name, for overview listings
    pub fn sorted_tables(&self) -> Vec<&Table> {
        let mut tables: Vec<&Table> = self.tables.iter().collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        tables
    }

    /// Get the number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if schema is empty
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Iterate over all tables
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }
}
