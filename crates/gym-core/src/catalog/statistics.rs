//! Per-predicate cardinality facts loaded from a statistics file.
//!
//! The catalog is read-only once built, so it can be shared freely between
//! planners running on different threads.

use std::collections::HashMap;
use std::path::Path;

use gym_proto::{codec, Graph, TableStats};

use crate::error::Error;

/// Read-only mapping from predicate name to table statistics.
#[derive(Debug, Clone, Default)]
pub struct StatisticsCatalog {
    tables: HashMap<String, TableStats>,
    /// Table names in file order.
    names: Vec<String>,
}

impl StatisticsCatalog {
    /// Create an empty catalog. Every lookup answers [`TableStats::UNKNOWN`].
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from decoded statistics.
    ///
    /// A predicate listed twice keeps its last entry.
    pub fn from_graph(graph: &Graph) -> Self {
        let mut catalog = Self::empty();
        for table in &graph.tables {
            if catalog
                .tables
                .insert(table.name.clone(), table.stats())
                .is_none()
            {
                catalog.names.push(table.name.clone());
            }
        }
        catalog
    }

    /// Load a statistics file.
    ///
    /// Missing or corrupt input is reported as [`Error::StatsUnavailable`];
    /// callers are expected to continue with [`StatisticsCatalog::empty`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let unavailable = |reason: String| Error::StatsUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = std::fs::read(path).map_err(|e| unavailable(e.to_string()))?;
        let graph = codec::decode_stats(&bytes).map_err(|e| unavailable(e.to_string()))?;
        let catalog = Self::from_graph(&graph);

        tracing::info!(
            path = %path.display(),
            tables = catalog.len(),
            "statistics loaded"
        );
        Ok(catalog)
    }

    /// Load a statistics file, falling back to an empty catalog.
    ///
    /// The failure is logged; planning then uses structural scoring only.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(error = %e, "continuing without statistics");
                Self::empty()
            }
        }
    }

    /// Statistics for a predicate, or [`TableStats::UNKNOWN`].
    pub fn lookup(&self, predicate: &str) -> TableStats {
        self.tables
            .get(predicate)
            .copied()
            .unwrap_or(TableStats::UNKNOWN)
    }

    /// Statistics for a predicate if the catalog has them.
    pub fn get(&self, predicate: &str) -> Option<TableStats> {
        self.tables.get(predicate).copied()
    }

    /// Table names in the order they were loaded.
    pub fn table_names(&self) -> &[String] {
        &self.names
    }

    /// Number of known predicates.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the catalog knows no predicate.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gym_proto::Table;

    fn sample_graph() -> Graph {
        Graph::new()
            .with_table(Table::new(":p1", 100, 10))
            .with_table(Table::new(":p2", 8, 8))
    }

    #[test]
    fn test_lookup_known_and_unknown() {
        let catalog = StatisticsCatalog::from_graph(&sample_graph());
        assert_eq!(catalog.lookup(":p1"), TableStats::new(100, 10));
        assert_eq!(catalog.lookup(":missing"), TableStats::UNKNOWN);
        assert_eq!(catalog.get(":missing"), None);
        assert_eq!(catalog.table_names(), &[":p1".to_string(), ":p2".to_string()]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.stats");
        std::fs::write(&path, codec::encode_stats(&sample_graph()).unwrap()).unwrap();

        let catalog = StatisticsCatalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup(":p2"), TableStats::new(8, 8));
    }

    #[test]
    fn test_missing_file_is_stats_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = StatisticsCatalog::load(dir.path().join("nope.stats"));
        assert!(matches!(result, Err(Error::StatsUnavailable { .. })));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.stats");
        std::fs::write(&path, b"not statistics").unwrap();

        assert!(matches!(
            StatisticsCatalog::load(&path),
            Err(Error::StatsUnavailable { .. })
        ));
        assert!(StatisticsCatalog::load_or_empty(&path).is_empty());
    }

    #[test]
    fn test_concurrent_lookups() {
        use std::sync::Arc;
        use std::thread;

        let catalog = Arc::new(StatisticsCatalog::from_graph(&sample_graph()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                thread::spawn(move || catalog.lookup(":p1"))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), TableStats::new(100, 10));
        }
    }
}
