//! Query engine for GYM.
//!
//! This module turns a basic graph pattern into a join tree and executes the
//! tree with the generalized Yannakakis algorithm.

mod bgp;
mod engine;
mod pattern;
mod planner;
mod priority;
mod provider;
mod relation;
mod tree;

pub use bgp::BgpQuery;
pub use engine::{ExecutionResult, ExecutorConfig, JoinExecutionEngine, PhaseTimings};
pub use pattern::{
    physical_name, shared_variable, shared_variable_between, strip_sigil, table_name,
    TriplePattern, DEFAULT_TABLE_PREFIX,
};
pub use planner::{HypergraphPlanner, PlannerConfig, WidthBound};
pub use priority::{rounded_difference, NodePriority};
pub use provider::{LocalProvider, MemoryTables, ProviderError, RelationProvider, TableSource};
pub use relation::Relation;
pub use tree::{JoinTree, NodeId, TreeNode};
