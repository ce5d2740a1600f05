//! Relation provider boundary and a local reference implementation.
//!
//! The engine only talks to a [`RelationProvider`]. [`LocalProvider`]
//! implements every operator in memory on top of any [`TableSource`] that
//! can scan the `(subject, object)` rows of a vertical-partitioning table.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::pattern::{strip_sigil, table_name, TriplePattern, DEFAULT_TABLE_PREFIX};
use super::relation::Relation;

/// Errors raised by a relation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The physical table of a predicate does not exist.
    #[error("table not found: {0}")]
    MissingTable(String),

    /// An operator referenced a column the relation does not have.
    #[error("column '{column}' not found among {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// The underlying storage failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Relational operators executed by the substrate.
pub trait RelationProvider {
    /// Base relation of a triple pattern, with constant slots applied as
    /// filters and variable slots as columns.
    fn fetch_base(&self, pattern: &TriplePattern) -> Result<Relation, ProviderError>;

    /// Wide relation of a subject group, one row per value combination.
    fn fetch_group(&self, group: &[TriplePattern]) -> Result<Relation, ProviderError>;

    /// Rows of `left` whose `key` value also occurs in `right`.
    fn semi_join(
        &self,
        left: Relation,
        right: &Relation,
        key: &str,
    ) -> Result<Relation, ProviderError>;

    /// Equi-join of `left` and `right` on `key`.
    fn join(&self, left: Relation, right: &Relation, key: &str) -> Result<Relation, ProviderError>;

    /// Restrict to the given columns, in that order.
    fn project(&self, relation: Relation, columns: &[String]) -> Result<Relation, ProviderError>;

    /// Remove duplicate rows, keeping first occurrences.
    fn distinct(&self, relation: Relation) -> Result<Relation, ProviderError>;
}

/// Storage that can scan a physical table.
pub trait TableSource {
    /// All `(subject, object)` rows of a table.
    fn scan(&self, table: &str) -> Result<Vec<(String, String)>, ProviderError>;
}

impl<T: TableSource + ?Sized> TableSource for &T {
    fn scan(&self, table: &str) -> Result<Vec<(String, String)>, ProviderError> {
        (**self).scan(table)
    }
}

/// In-memory tables, keyed by physical table name.
#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    tables: HashMap<String, Vec<(String, String)>>,
}

impl MemoryTables {
    /// Create an empty set of tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triple to the table of its predicate.
    pub fn add_triple(
        &mut self,
        subject: impl Into<String>,
        predicate: &str,
        object: impl Into<String>,
    ) {
        self.tables
            .entry(table_name(DEFAULT_TABLE_PREFIX, predicate))
            .or_default()
            .push((subject.into(), object.into()));
    }

    /// Builder form of [`MemoryTables::add_triple`].
    pub fn with_triple(
        mut self,
        subject: impl Into<String>,
        predicate: &str,
        object: impl Into<String>,
    ) -> Self {
        self.add_triple(subject, predicate, object);
        self
    }

    /// Number of rows in a table, or zero if it does not exist.
    pub fn table_len(&self, table: &str) -> usize {
        self.tables.get(table).map(Vec::len).unwrap_or(0)
    }
}

impl TableSource for MemoryTables {
    fn scan(&self, table: &str) -> Result<Vec<(String, String)>, ProviderError> {
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| ProviderError::MissingTable(table.to_string()))
    }
}

/// Provider evaluating every operator locally over a [`TableSource`].
pub struct LocalProvider<T> {
    source: T,
    table_prefix: String,
}

impl<T: TableSource> LocalProvider<T> {
    /// Create a provider using the default table prefix.
    pub fn new(source: T) -> Self {
        Self {
            source,
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
        }
    }

    /// Use a different physical table prefix.
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// The underlying table source.
    pub fn source(&self) -> &T {
        &self.source
    }
}

fn column_index(relation: &Relation, column: &str) -> Result<usize, ProviderError> {
    relation
        .column_index(column)
        .ok_or_else(|| ProviderError::MissingColumn {
            column: column.to_string(),
            available: relation.columns().to_vec(),
        })
}

/// Hash join on every column the two relations have in common.
///
/// With no common column this degenerates to a cross product.
fn natural_join(left: Relation, right: &Relation) -> Relation {
    let common: Vec<(usize, usize)> = left
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(li, name)| right.column_index(name).map(|ri| (li, ri)))
        .collect();
    let right_extra: Vec<usize> = (0..right.columns().len())
        .filter(|ri| !common.iter().any(|&(_, c)| c == *ri))
        .collect();

    let mut columns = left.columns().to_vec();
    columns.extend(right_extra.iter().map(|&ri| right.columns()[ri].clone()));

    // Build on the right side, probe with the left.
    let mut build: HashMap<Vec<&str>, Vec<usize>> = HashMap::new();
    for (index, row) in right.rows().iter().enumerate() {
        let key = common.iter().map(|&(_, ri)| row[ri].as_str()).collect();
        build.entry(key).or_default().push(index);
    }

    let mut out = Relation::new(columns);
    for row in left.rows() {
        let key: Vec<&str> = common.iter().map(|&(li, _)| row[li].as_str()).collect();
        if let Some(matches) = build.get(&key) {
            for &index in matches {
                let mut joined = row.clone();
                joined.extend(right_extra.iter().map(|&ri| right.rows()[index][ri].clone()));
                out.push_row(joined);
            }
        }
    }
    out
}

impl<T: TableSource> RelationProvider for LocalProvider<T> {
    fn fetch_base(&self, pattern: &TriplePattern) -> Result<Relation, ProviderError> {
        let rows = self
            .source
            .scan(&table_name(&self.table_prefix, &pattern.predicate.name))?;

        let subject = &pattern.subject;
        let object = &pattern.object;
        let subject_name = strip_sigil(&subject.name);
        let object_name = strip_sigil(&object.name);
        let same_variable =
            subject.is_variable() && object.is_variable() && subject_name == object_name;

        let mut columns = Vec::new();
        if subject.is_variable() {
            columns.push(subject_name.to_string());
        }
        if object.is_variable() && !same_variable {
            columns.push(object_name.to_string());
        }

        let mut relation = Relation::new(columns);
        for (s, o) in rows {
            if !subject.is_variable() && s != subject.name {
                continue;
            }
            if !object.is_variable() && o != object.name {
                continue;
            }
            if same_variable && s != o {
                continue;
            }
            let mut row = Vec::with_capacity(2);
            if subject.is_variable() {
                row.push(s);
            }
            if object.is_variable() && !same_variable {
                row.push(o);
            }
            relation.push_row(row);
        }
        Ok(relation)
    }

    fn fetch_group(&self, group: &[TriplePattern]) -> Result<Relation, ProviderError> {
        let mut members = group.iter();
        let first = match members.next() {
            Some(first) => self.fetch_base(first)?,
            None => return Ok(Relation::default()),
        };
        members.try_fold(first, |wide, member| {
            Ok(natural_join(wide, &self.fetch_base(member)?))
        })
    }

    fn semi_join(
        &self,
        left: Relation,
        right: &Relation,
        key: &str,
    ) -> Result<Relation, ProviderError> {
        let li = column_index(&left, key)?;
        let ri = column_index(right, key)?;
        let keys: HashSet<&str> = right.rows().iter().map(|row| row[ri].as_str()).collect();

        let rows = left
            .rows()
            .iter()
            .filter(|row| keys.contains(row[li].as_str()))
            .cloned()
            .collect();
        Ok(Relation::with_rows(left.columns().to_vec(), rows))
    }

    fn join(&self, left: Relation, right: &Relation, key: &str) -> Result<Relation, ProviderError> {
        column_index(&left, key)?;
        column_index(right, key)?;
        Ok(natural_join(left, right))
    }

    fn project(&self, relation: Relation, columns: &[String]) -> Result<Relation, ProviderError> {
        let indices = columns
            .iter()
            .map(|c| column_index(&relation, strip_sigil(c)))
            .collect::<Result<Vec<_>, _>>()?;

        let rows = relation
            .rows()
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Relation::with_rows(
            columns.iter().map(|c| strip_sigil(c).to_string()).collect(),
            rows,
        ))
    }

    fn distinct(&self, relation: Relation) -> Result<Relation, ProviderError> {
        let mut seen = HashSet::new();
        let rows = relation
            .rows()
            .iter()
            .filter(|row| seen.insert(row.as_slice()))
            .cloned()
            .collect();
        Ok(Relation::with_rows(relation.columns().to_vec(), rows))
    }
}
