//! Vertical-partitioning triple store on sled.

use std::collections::HashSet;

use gym_proto::{Graph, Table};
use rkyv::{Archive, Deserialize, Serialize};
use sled::{Db, Tree};

use super::StorageConfig;
use crate::error::Error;
use crate::query::{table_name, ProviderError, TableSource};

/// Tree mapping physical table names to their predicate.
const META_TREE: &str = "meta:tables";

/// One row of a predicate table.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct VpRow {
    pub subject: String,
    pub object: String,
}

impl VpRow {
    pub fn new(subject: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
        }
    }

    /// Serialize the row to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| gym_proto::Error::Serialization(e.to_string()).into())
    }

    /// Deserialize a row from bytes using rkyv.
    ///
    /// sled does not guarantee alignment, so the bytes are copied first.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, gym_proto::Error> {
        let mut aligned: rkyv::util::AlignedVec<16> = rkyv::util::AlignedVec::new();
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| gym_proto::Error::Deserialization(e.to_string()))
    }
}

/// Triple store with one sled tree per predicate.
///
/// Rows are tree keys with empty values, so a repeated triple is stored once.
pub struct VpStore {
    db: Db,
    meta_tree: Tree,
    table_prefix: String,
}

impl VpStore {
    /// Open or create a store with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        let meta_tree = db.open_tree(META_TREE)?;

        tracing::debug!(
            path = %config.path.display(),
            temporary = config.temporary,
            tables = meta_tree.len(),
            "vp store opened"
        );

        Ok(Self {
            db,
            meta_tree,
            table_prefix: config.table_prefix,
        })
    }

    /// Prefix of physical table names.
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    /// Insert a triple. Returns `false` if it was already stored.
    ///
    /// A table holds the rows of exactly one predicate. A predicate whose
    /// physical name is already taken by another predicate is rejected with
    /// [`Error::TableCollision`] and nothing is stored.
    pub fn insert(&self, subject: &str, predicate: &str, object: &str) -> Result<bool, Error> {
        let table = table_name(&self.table_prefix, predicate);
        match self.meta_tree.get(table.as_bytes())? {
            Some(existing) if existing.as_ref() != predicate.as_bytes() => {
                return Err(Error::TableCollision {
                    table,
                    predicate: predicate.to_string(),
                    existing: String::from_utf8_lossy(&existing).into_owned(),
                });
            }
            Some(_) => {}
            None => {
                self.meta_tree.insert(table.as_bytes(), predicate.as_bytes())?;
            }
        }

        let tree = self.db.open_tree(table.as_bytes())?;
        let key = VpRow::new(subject, object).to_bytes()?;
        Ok(tree.insert(key, Vec::<u8>::new())?.is_none())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    /// Physical table names, in key order.
    pub fn table_names(&self) -> Result<Vec<String>, Error> {
        self.meta_tree
            .iter()
            .keys()
            .map(|key| -> Result<String, Error> {
                Ok(String::from_utf8_lossy(&key?).into_owned())
            })
            .collect()
    }

    /// Number of rows in a table, or zero if it does not exist.
    pub fn table_len(&self, table: &str) -> Result<usize, Error> {
        if !self.meta_tree.contains_key(table.as_bytes())? {
            return Ok(0);
        }
        Ok(self.db.open_tree(table.as_bytes())?.len())
    }

    /// Compute per-predicate statistics over the stored tables.
    pub fn statistics(&self) -> Result<Graph, Error> {
        let mut graph = Graph::new();
        for entry in self.meta_tree.iter() {
            let (table, predicate) = entry?;
            let tree = self.db.open_tree(&table)?;

            let mut subjects = HashSet::new();
            let mut size: i64 = 0;
            for key in tree.iter().keys() {
                let row = VpRow::from_bytes(&key?)?;
                subjects.insert(row.subject);
                size += 1;
            }

            graph.tables.push(Table::new(
                String::from_utf8_lossy(&predicate).into_owned(),
                size,
                subjects.len() as i64,
            ));
        }
        Ok(graph)
    }
}

impl TableSource for VpStore {
    fn scan(&self, table: &str) -> Result<Vec<(String, String)>, ProviderError> {
        let storage = |e: sled::Error| ProviderError::Storage(e.to_string());

        if !self.meta_tree.contains_key(table.as_bytes()).map_err(storage)? {
            return Err(ProviderError::MissingTable(table.to_string()));
        }
        let tree = self.db.open_tree(table.as_bytes()).map_err(storage)?;

        tree.iter()
            .keys()
            .map(|key| -> Result<(String, String), ProviderError> {
                let row = VpRow::from_bytes(&key.map_err(storage)?)
                    .map_err(|e| ProviderError::Storage(e.to_string()))?;
                Ok((row.subject, row.object))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> VpStore {
        VpStore::open(StorageConfig::temporary()).unwrap()
    }

    #[test]
    fn test_row_roundtrip() {
        let row = VpRow::new("<http://ex.org/a>", "\"literal with spaces\"");
        let bytes = row.to_bytes().unwrap();
        assert_eq!(VpRow::from_bytes(&bytes).unwrap(), row);
        assert!(VpRow::from_bytes(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_insert_and_scan() {
        let store = temp_store();
        assert!(store.insert(":a", ":knows", ":b").unwrap());
        assert!(store.insert(":b", ":knows", ":c").unwrap());
        assert!(!store.insert(":a", ":knows", ":b").unwrap());
        store.insert(":a", ":age", "\"30\"").unwrap();

        assert_eq!(store.table_names().unwrap(), vec!["vp__age", "vp__knows"]);
        assert_eq!(store.table_len("vp__knows").unwrap(), 2);

        let mut rows = store.scan("vp__knows").unwrap();
        rows.sort();
        assert_eq!(
            rows,
            vec![
                (":a".to_string(), ":b".to_string()),
                (":b".to_string(), ":c".to_string()),
            ]
        );
    }

    #[test]
    fn test_scan_missing_table() {
        let store = temp_store();
        assert!(matches!(
            store.scan("vp__nothing"),
            Err(ProviderError::MissingTable(_))
        ));
        assert_eq!(store.table_len("vp__nothing").unwrap(), 0);
    }

    #[test]
    fn test_statistics() {
        let store = temp_store();
        store.insert(":a", ":knows", ":b").unwrap();
        store.insert(":a", ":knows", ":c").unwrap();
        store.insert(":b", ":knows", ":c").unwrap();
        store.insert(":a", ":age", "\"30\"").unwrap();

        let graph = store.statistics().unwrap();
        let knows = graph.tables.iter().find(|t| t.name == ":knows").unwrap();
        assert_eq!((knows.size, knows.distinct_subjects), (3, 2));
        let age = graph.tables.iter().find(|t| t.name == ":age").unwrap();
        assert_eq!((age.size, age.distinct_subjects), (1, 1));
    }

    #[test]
    fn test_colliding_predicate_rejected() {
        let store = temp_store();
        store.insert(":a", "ex:a-b", ":b").unwrap();

        let result = store.insert(":c", "ex:a_b", ":d");
        match result {
            Err(Error::TableCollision {
                table,
                predicate,
                existing,
            }) => {
                assert_eq!(table, "vp_ex_a_b");
                assert_eq!(predicate, "ex:a_b");
                assert_eq!(existing, "ex:a-b");
            }
            other => panic!("expected a table collision, got {:?}", other),
        }

        assert_eq!(store.table_len("vp_ex_a_b").unwrap(), 1);
        let graph = store.statistics().unwrap();
        assert_eq!(graph.tables.len(), 1);
        assert_eq!(graph.tables[0].name, "ex:a-b");
        assert_eq!(graph.tables[0].size, 1);
    }

    #[test]
    fn test_custom_prefix() {
        let store = VpStore::open(StorageConfig::temporary().with_table_prefix("t_")).unwrap();
        store.insert(":a", ":p", ":b").unwrap();
        assert_eq!(store.table_names().unwrap(), vec!["t__p"]);
    }

    #[test]
    fn test_reopen_persists() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = VpStore::open(StorageConfig::new(dir.path())).unwrap();
            store.insert(":a", ":p", ":b").unwrap();
            store.flush().unwrap();
        }
        let store = VpStore::open(StorageConfig::new(dir.path())).unwrap();
        assert_eq!(store.scan("vp__p").unwrap().len(), 1);
    }
}
