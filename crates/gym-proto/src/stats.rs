//! Statistics file messages.
//!
//! The statistics file holds one [`Table`] per predicate with the row count
//! and the number of distinct subjects of its vertical-partitioning table.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

use crate::plan::TableStats;

/// Statistics of one predicate table.
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct Table {
    /// Predicate name as it appears in queries.
    pub name: String,
    /// Number of rows.
    pub size: i64,
    /// Number of distinct subjects.
    pub distinct_subjects: i64,
}

impl Table {
    /// Create a table entry.
    pub fn new(name: impl Into<String>, size: i64, distinct_subjects: i64) -> Self {
        Self {
            name: name.into(),
            size,
            distinct_subjects,
        }
    }

    /// The cardinality snapshot attached to triples using this predicate.
    pub fn stats(&self) -> TableStats {
        TableStats::new(self.size, self.distinct_subjects)
    }
}

/// Whole-graph statistics: the content of a statistics file.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Archive,
    Serialize,
    Deserialize,
    SerdeSerialize,
    SerdeDeserialize,
)]
pub struct Graph {
    pub tables: Vec<Table>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table entry.
    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Total number of triples across all tables.
    pub fn total_triples(&self) -> i64 {
        self.tables.iter().map(|t| t.size.max(0)).sum()
    }
}
