//! Schema assembly: drive a catalog adapter across every requested table.
//!
//! Extraction is all-or-nothing. The first failing table aborts the run with
//! that table's error, and a raised cancellation flag aborts it between
//! tables; no partial schema is ever returned.

use crate::catalog::{Backend, CatalogAdapter};
use crate::error::{Error, Result};
use crate::progress::{ProgressFn, TableProgress};
use crate::schema::Schema;
use ahash::AHashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Counters and non-fatal findings from one extraction run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub backend: Backend,
    pub tables_listed: usize,
    pub tables_extracted: usize,
    pub columns: usize,
    pub relations: usize,
    pub indexes: usize,
    pub warnings: Vec<String>,
}

impl Stats {
    fn new(backend: Backend) -> Self {
        Self {
            backend,
            tables_listed: 0,
            tables_extracted: 0,
            columns: 0,
            relations: 0,
            indexes: 0,
            warnings: Vec::new(),
        }
    }
}

/// Result of a successful extraction
#[derive(Debug)]
pub struct Extraction {
    pub schema: Schema,
    pub stats: Stats,
}

#[derive(Default)]
pub struct ExtractorConfig {
    pub tables: Option<Vec<String>>,
    pub progress_fn: Option<ProgressFn>,
    pub cancel: Option<Arc<AtomicBool>>,
}

pub struct SchemaExtractor<A> {
    adapter: A,
    config: ExtractorConfig,
}

impl<A: CatalogAdapter> SchemaExtractor<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            config: ExtractorConfig::default(),
        }
    }

    /// Restrict extraction to these tables, in this order
    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        if !tables.is_empty() {
            self.config.tables = Some(tables);
        }
        self
    }

    pub fn with_progress<F: Fn(usize, usize, &str) + 'static>(mut self, f: F) -> Self {
        self.config.progress_fn = Some(Box::new(f));
        self
    }

    /// Abort between tables once `flag` is set
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.config.cancel = Some(flag);
        self
    }

    /// Describe every table. The adapter, and with it the connection, is
    /// released when this returns.
    pub fn extract(mut self) -> Result<Extraction> {
        let mut stats = Stats::new(self.adapter.backend());
        let explicit = self.config.tables.take();

        let mut names = self.adapter.list_tables(explicit.as_deref())?;
        if explicit.is_some() {
            let mut seen = AHashSet::new();
            names.retain(|name| {
                let first = seen.insert(name.clone());
                if !first {
                    stats
                        .warnings
                        .push(format!("table '{}' requested more than once", name));
                }
                first
            });

            // Existence comes from the catalog listing, so a table without
            // columns is still extracted
            let known: AHashSet<String> = self.adapter.list_tables(None)?.into_iter().collect();
            names.retain(|name| {
                let found = known.contains(name);
                if !found {
                    stats
                        .warnings
                        .push(format!("table '{}' not found, skipping", name));
                }
                found
            });
        }
        stats.tables_listed = names.len();

        let mut progress = self
            .config
            .progress_fn
            .take()
            .map(|f| TableProgress::new(names.len(), f));

        let mut tables = Vec::with_capacity(names.len());
        for name in &names {
            if self.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let table = self.adapter.describe_table(name)?;
            if let Some(p) = progress.as_mut() {
                p.advance(name);
            }

            stats.columns += table.columns.len();
            stats.relations += table.relations.len();
            stats.indexes += table.indexes.len();
            tables.push(table);
        }

        stats.tables_extracted = tables.len();
        Ok(Extraction {
            schema: Schema::new(tables),
            stats,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.config
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
