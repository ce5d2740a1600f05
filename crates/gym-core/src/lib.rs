//! GYM Core - join-tree planning and generalized Yannakakis execution.
//!
//! The pipeline is: [`catalog::StatisticsCatalog`] feeds the
//! [`query::HypergraphPlanner`], which turns a basic graph pattern into a
//! join tree; the [`query::JoinExecutionEngine`] runs that tree against a
//! [`query::RelationProvider`] with upward and downward semi-join reduction
//! before the final join.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod catalog;
pub mod error;
pub mod query;
pub mod storage;

pub use catalog::StatisticsCatalog;
pub use error::Error;
pub use query::{
    BgpQuery, ExecutionResult, ExecutorConfig, HypergraphPlanner, JoinExecutionEngine, JoinTree,
    LocalProvider, MemoryTables, NodeId, NodePriority, PhaseTimings, PlannerConfig, Relation,
    RelationProvider, TableSource, TriplePattern, WidthBound,
};
pub use storage::{LoadReport, Loader, StorageConfig, VpStore};

/// Re-export format types.
pub use gym_proto as proto;
