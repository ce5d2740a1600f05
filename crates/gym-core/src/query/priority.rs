//! Heuristic ordering of plan candidates.
//!
//! Lower scores are scheduled first. Groups score `1 / members`, patterns
//! with a bound endpoint score zero, and variable-to-variable patterns score
//! `size * log_1.2(distinct_subjects)` of their predicate table.
//!
//! The formula is applied to the unknown sentinel `(-1, -1)` as well. Its
//! score is NaN, which ties with every other candidate under
//! [`rounded_difference`], so unknown patterns keep their insertion order.

use std::cmp::Ordering;

use gym_proto::{NodePayload, TableStats};

use crate::catalog::StatisticsCatalog;

/// Base of the logarithm applied to the distinct-subject count.
const LOG_BASE: f64 = 1.2;

/// Rounded score difference used to compare two candidates.
///
/// `ceil(a - b)` collapses differences in `(-1, 0]` to a tie, so candidates
/// with close scores keep their insertion order. NaN differences are ties.
pub fn rounded_difference(a: f32, b: f32) -> i32 {
    (a - b).ceil() as i32
}

/// Candidate comparator backed by the statistics catalog.
#[derive(Debug, Clone, Copy)]
pub struct NodePriority<'a> {
    catalog: &'a StatisticsCatalog,
}

impl<'a> NodePriority<'a> {
    /// Create a comparator.
    pub fn new(catalog: &'a StatisticsCatalog) -> Self {
        Self { catalog }
    }

    /// Score a candidate payload.
    pub fn score(&self, payload: &NodePayload) -> f32 {
        match payload {
            NodePayload::TripleGroup(group) => 1.0 / group.len().max(1) as f32,
            NodePayload::Triple(triple) => {
                if !triple.subject.is_variable() || !triple.object.is_variable() {
                    return 0.0;
                }
                let stats = triple
                    .stats
                    .unwrap_or_else(|| self.catalog.lookup(&triple.predicate.name));
                table_score(stats)
            }
        }
    }

    /// Compare two candidates; `Less` schedules `a` before `b`.
    pub fn compare(&self, a: &NodePayload, b: &NodePayload) -> Ordering {
        rounded_difference(self.score(a), self.score(b)).cmp(&0)
    }

    /// Order candidates by priority, keeping insertion order among ties.
    ///
    /// Each candidate is inserted before the first queued candidate it
    /// strictly precedes. The rounded comparison is not a total order, so a
    /// library sort cannot be used here.
    pub fn order(&self, candidates: Vec<NodePayload>) -> Vec<NodePayload> {
        let mut queue: Vec<NodePayload> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let position = queue
                .iter()
                .position(|queued| self.compare(&candidate, queued) == Ordering::Less)
                .unwrap_or(queue.len());
            queue.insert(position, candidate);
        }
        queue
    }
}

fn table_score(stats: TableStats) -> f32 {
    let size = stats.size as f64;
    let distinct = stats.distinct_subjects as f64;
    (size * (distinct.ln() / LOG_BASE.ln())) as f32
}
