//! Statistics catalog for cost-aware planning.

mod statistics;

pub use statistics::StatisticsCatalog;
