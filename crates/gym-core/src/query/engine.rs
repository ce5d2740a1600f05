//! Generalized Yannakakis execution over a join tree.
//!
//! Execution runs four strictly ordered phases over the arena:
//!
//! 1. materialize every node's base relation (pre-order)
//! 2. upward semi-join reduction of reducible nodes (post-order)
//! 3. downward semi-join reduction below reducible nodes (pre-order)
//! 4. final join, projection and deduplication at the root (post-order)
//!
//! Phases 2 and 3 only shrink intermediate relations and never change the
//! final answer, so they can be skipped through [`ExecutorConfig`].

use std::time::{Duration, Instant};

use gym_proto::NodePayload;
use serde::Serialize;

use crate::error::Error;

use super::provider::{ProviderError, RelationProvider};
use super::relation::Relation;
use super::tree::{JoinTree, NodeId};

/// Executor configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutorConfig {
    /// Bypass the upward and downward reduction phases.
    pub skip_semi_joins: bool,
}

impl ExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_semi_joins(mut self, skip: bool) -> Self {
        self.skip_semi_joins = skip;
        self
    }
}

/// Wall-clock time spent in each phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PhaseTimings {
    pub materialize: Duration,
    pub upward: Duration,
    pub downward: Duration,
    pub join: Duration,
    pub total: Duration,
}

/// A named, projected and deduplicated result.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub name: String,
    pub relation: Relation,
    pub timings: PhaseTimings,
}

/// Engine evaluating join trees against a relation provider.
pub struct JoinExecutionEngine<'a, P: RelationProvider + ?Sized> {
    provider: &'a P,
    config: ExecutorConfig,
}

impl<'a, P: RelationProvider + ?Sized> JoinExecutionEngine<'a, P> {
    /// Create an engine over a provider.
    pub fn new(provider: &'a P, config: ExecutorConfig) -> Self {
        Self { provider, config }
    }

    /// Run all phases and return the result under `name`.
    ///
    /// The tree's relation slots are cleared afterwards, whether or not
    /// execution succeeded.
    pub fn execute(&self, tree: &mut JoinTree, name: &str) -> Result<ExecutionResult, Error> {
        let outcome = self.run(tree, name);
        tree.clear_relations();
        outcome
    }

    fn run(&self, tree: &mut JoinTree, name: &str) -> Result<ExecutionResult, Error> {
        let started = Instant::now();
        let mut timings = PhaseTimings::default();

        let phase = Instant::now();
        self.materialize(tree)?;
        timings.materialize = phase.elapsed();
        tracing::debug!(
            rows = tree.materialized_rows(),
            elapsed = ?timings.materialize,
            "materialized base relations"
        );

        if !self.config.skip_semi_joins {
            let phase = Instant::now();
            self.reduce_upward(tree)?;
            timings.upward = phase.elapsed();
            tracing::debug!(
                rows = tree.materialized_rows(),
                elapsed = ?timings.upward,
                "upward reduction done"
            );

            let phase = Instant::now();
            self.reduce_downward(tree)?;
            timings.downward = phase.elapsed();
            tracing::debug!(
                rows = tree.materialized_rows(),
                elapsed = ?timings.downward,
                "downward reduction done"
            );
        }

        let phase = Instant::now();
        let relation = self.join(tree)?;
        timings.join = phase.elapsed();
        timings.total = started.elapsed();

        tracing::info!(
            plan = name,
            nodes = tree.len(),
            rows = relation.len(),
            skip_semi_joins = self.config.skip_semi_joins,
            total = ?timings.total,
            "plan executed"
        );

        Ok(ExecutionResult {
            name: name.to_string(),
            relation,
            timings,
        })
    }

    /// Phase 1: fetch the base relation of every node.
    pub fn materialize(&self, tree: &mut JoinTree) -> Result<(), Error> {
        for id in tree.pre_order() {
            let fetched = match tree.node(id).payload() {
                NodePayload::Triple(triple) => self.provider.fetch_base(triple),
                NodePayload::TripleGroup(group) => self.provider.fetch_group(group),
            };
            let relation = fetched.map_err(|e| execution_error(tree, id, e))?;
            tree.set_relation(id, relation);
        }
        Ok(())
    }

    /// Phase 2: semi-join every reducible node against each of its children.
    pub fn reduce_upward(&self, tree: &mut JoinTree) -> Result<(), Error> {
        for id in tree.post_order() {
            if !tree.node(id).is_reducible() {
                continue;
            }
            for child in tree.node(id).children().to_vec() {
                let key = edge_key(tree, child)?;
                let relation = tree.take_relation(id)?;
                let reduced = self
                    .provider
                    .semi_join(relation, tree.relation(child)?, &key)
                    .map_err(|e| execution_error(tree, id, e))?;
                tree.set_relation(id, reduced);
            }
        }
        Ok(())
    }

    /// Phase 3: semi-join the children of every reducible node against it.
    pub fn reduce_downward(&self, tree: &mut JoinTree) -> Result<(), Error> {
        for id in tree.pre_order() {
            if !tree.node(id).is_reducible() {
                continue;
            }
            for child in tree.node(id).children().to_vec() {
                let key = edge_key(tree, child)?;
                let relation = tree.take_relation(child)?;
                let reduced = self
                    .provider
                    .semi_join(relation, tree.relation(id)?, &key)
                    .map_err(|e| execution_error(tree, child, e))?;
                tree.set_relation(child, reduced);
            }
        }
        Ok(())
    }

    /// Phase 4: join bottom-up, then project and deduplicate at the root.
    ///
    /// Consumes the relations of every node; the joined result is returned.
    pub fn join(&self, tree: &mut JoinTree) -> Result<Relation, Error> {
        for id in tree.post_order() {
            let mut relation = tree.take_relation(id)?;
            for child in tree.node(id).children().to_vec() {
                let key = edge_key(tree, child)?;
                let joined = tree.take_relation(child)?;
                relation = self
                    .provider
                    .join(relation, &joined, &key)
                    .map_err(|e| execution_error(tree, child, e))?;
            }
            tree.set_relation(id, relation);
        }

        let root = tree.root();
        let projection = tree.node(root).projection().to_vec();
        let joined = tree.take_relation(root)?;

        let projected = if projection.is_empty() {
            joined
        } else {
            self.provider
                .project(joined, &projection)
                .map_err(|e| execution_error(tree, root, e))?
        };
        self.provider
            .distinct(projected)
            .map_err(|e| execution_error(tree, root, e))
    }
}

/// Shared variable of the edge from `child` to its parent.
fn edge_key(tree: &JoinTree, child: NodeId) -> Result<String, Error> {
    tree.node(child)
        .parent_key()
        .map(str::to_string)
        .ok_or_else(|| Error::Input(format!("edge to node {} has no shared variable", child)))
}

fn execution_error(tree: &JoinTree, id: NodeId, source: ProviderError) -> Error {
    tracing::warn!(node = %id, error = %source, "relation operation failed");
    Error::Execution {
        node: format!("{} {}", id, tree.node(id).label()),
        source,
    }
}
