//! Core error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::query::ProviderError;

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The query or plan given as input is unreadable or malformed.
    #[error("invalid input: {0}")]
    Input(String),

    /// The statistics file is missing or corrupt.
    #[error("statistics unavailable at {path}: {reason}")]
    StatsUnavailable { path: PathBuf, reason: String },

    /// No join tree covers the triples, even with unbounded width.
    #[error("no join tree covers the pattern: {remaining} triple node(s) share no variable with the tree")]
    PlannerInfeasible { remaining: usize },

    /// A relation operation failed while executing a plan.
    #[error("execution failed at node {node}: {source}")]
    Execution {
        node: String,
        #[source]
        source: ProviderError,
    },

    /// A phase ran before the relation of a node was fetched.
    #[error("node {node} has no materialized relation")]
    NotMaterialized { node: String },

    /// Two predicates map to the same physical table name.
    #[error("predicate {predicate} maps to table {table}, already used by {existing}")]
    TableCollision {
        table: String,
        predicate: String,
        existing: String,
    },

    /// Reading or writing a plan, statistics or result file failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] std::io::Error),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] gym_proto::Error),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
}
