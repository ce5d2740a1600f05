//! Hypergraph-to-tree decomposition of a basic graph pattern.
//!
//! The planner orders the triple patterns by [`NodePriority`], takes the
//! first one as root and grows the tree from a frontier node: every remaining
//! candidate sharing a variable with the frontier is attached as a child, up
//! to the width bound. Attached children go on a LIFO pending list that
//! supplies the next frontier.
//!
//! Construction happens in two steps. The adjacency between candidates is
//! computed once up front, the layout (parent to children indices) is grown
//! over that fixed graph, and only then are the plan nodes materialized
//! bottom-up. If the width bound leaves candidates unreachable, construction
//! restarts with unbounded width; only a pattern that is disconnected even
//! then is reported as [`Error::PlannerInfeasible`].

use gym_proto::{Node, NodePayload, TableStats};

use crate::catalog::StatisticsCatalog;
use crate::error::Error;

use super::bgp::BgpQuery;
use super::pattern::{same_term, shared_variable_between, strip_sigil, TriplePattern};
use super::priority::NodePriority;

/// Heuristic width of a subject group node.
const GROUP_WIDTH: usize = 5;

/// Heuristic width of a node whose table has several rows per subject.
const FANOUT_WIDTH: usize = 3;

/// Heuristic width of any other node.
const DEFAULT_WIDTH: usize = 2;

/// Maximum number of children attached to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidthBound {
    /// Decide per node from its payload and statistics.
    #[default]
    Heuristic,
    /// At most this many children per node.
    Fixed(usize),
    /// No limit.
    Unbounded,
}

impl WidthBound {
    /// Interpret a raw width as given on the command line.
    ///
    /// Zero or negative means heuristic, `i32::MAX` and above means
    /// unbounded.
    pub fn from_raw(raw: i64) -> Self {
        if raw <= 0 {
            WidthBound::Heuristic
        } else if raw >= i64::from(i32::MAX) {
            WidthBound::Unbounded
        } else {
            WidthBound::Fixed(raw as usize)
        }
    }
}

/// Planner configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlannerConfig {
    /// Width bound applied while growing the tree.
    pub width: WidthBound,
    /// Collapse triples sharing a subject into property-table groups.
    pub use_property_table: bool,
}

impl PlannerConfig {
    /// Create the default configuration (heuristic width, no groups).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the width bound.
    pub fn with_width(mut self, width: WidthBound) -> Self {
        self.width = width;
        self
    }

    /// Enable or disable property-table groups.
    pub fn with_property_table(mut self, enabled: bool) -> Self {
        self.use_property_table = enabled;
        self
    }
}

/// Parent to children indices over the ordered candidate list; index 0 is
/// the root.
type Layout = Vec<Vec<usize>>;

/// Planner producing join trees from basic graph patterns.
pub struct HypergraphPlanner<'a> {
    catalog: &'a StatisticsCatalog,
    config: PlannerConfig,
}

impl<'a> HypergraphPlanner<'a> {
    /// Create a planner over a statistics catalog.
    ///
    /// Pass [`StatisticsCatalog::empty`] to plan from structure alone.
    pub fn new(catalog: &'a StatisticsCatalog, config: PlannerConfig) -> Self {
        Self { catalog, config }
    }

    /// Plan a parsed query document.
    pub fn plan_query(&self, query: &BgpQuery) -> Result<Node, Error> {
        self.plan(&query.patterns()?, &query.projected_variables())
    }

    /// Build a join tree covering every pattern exactly once.
    ///
    /// The projection is attached to the root only.
    pub fn plan(&self, patterns: &[TriplePattern], projection: &[String]) -> Result<Node, Error> {
        if patterns.is_empty() {
            return Err(Error::Input("cannot plan an empty pattern".to_string()));
        }

        if let Some(missing) = projection.iter().find(|variable| !binds(patterns, variable)) {
            return Err(Error::Input(format!(
                "projected variable '{}' appears in no triple pattern",
                missing
            )));
        }

        let candidates = NodePriority::new(self.catalog).order(self.candidates(patterns));
        let adjacency = adjacency(&candidates);

        let layout = match self.grow(&candidates, &adjacency, self.config.width) {
            Ok(layout) => layout,
            Err(remaining) if self.config.width != WidthBound::Unbounded => {
                tracing::info!(
                    width = ?self.config.width,
                    remaining,
                    "width bound leaves nodes unreachable, retrying unbounded"
                );
                self.grow(&candidates, &adjacency, WidthBound::Unbounded)
                    .map_err(|remaining| Error::PlannerInfeasible { remaining })?
            }
            Err(remaining) => return Err(Error::PlannerInfeasible { remaining }),
        };

        let projection = projection
            .iter()
            .map(|v| strip_sigil(v).to_string())
            .collect();
        let tree = materialize(candidates, &layout).with_projection(projection);

        tracing::debug!(
            triples = patterns.len(),
            nodes = tree.len(),
            "join tree built"
        );
        Ok(tree)
    }

    /// Turn patterns into node payloads, attaching known statistics.
    fn candidates(&self, patterns: &[TriplePattern]) -> Vec<NodePayload> {
        let patterns: Vec<TriplePattern> = patterns
            .iter()
            .map(|pattern| {
                let mut pattern = pattern.clone();
                if pattern.stats.is_none() {
                    pattern.stats = self.catalog.get(&pattern.predicate.name);
                }
                pattern
            })
            .collect();

        if !self.config.use_property_table {
            return patterns.into_iter().map(NodePayload::Triple).collect();
        }

        // Group by subject, keeping first-appearance order.
        let mut groups: Vec<Vec<TriplePattern>> = Vec::new();
        for pattern in patterns {
            match groups
                .iter_mut()
                .find(|group| same_term(&group[0].subject, &pattern.subject))
            {
                Some(group) => group.push(pattern),
                None => groups.push(vec![pattern]),
            }
        }

        groups
            .into_iter()
            .map(|mut group| {
                if group.len() > 1 {
                    NodePayload::TripleGroup(group)
                } else {
                    NodePayload::Triple(group.remove(0))
                }
            })
            .collect()
    }

    /// Width used for a frontier node when no explicit bound is set.
    ///
    /// The rows-per-subject proportion uses integer division.
    pub fn heuristic_width(&self, payload: &NodePayload) -> usize {
        match payload {
            NodePayload::TripleGroup(_) => GROUP_WIDTH,
            NodePayload::Triple(triple) => {
                let stats = triple
                    .stats
                    .unwrap_or_else(|| self.catalog.lookup(&triple.predicate.name));
                if rows_per_subject(stats) > 1 {
                    FANOUT_WIDTH
                } else {
                    DEFAULT_WIDTH
                }
            }
        }
    }

    /// Grow a layout under a width bound.
    ///
    /// Returns the number of candidates left unplaced when the bound makes
    /// them unreachable.
    fn grow(
        &self,
        candidates: &[NodePayload],
        adjacency: &[Vec<bool>],
        width: WidthBound,
    ) -> Result<Layout, usize> {
        let mut layout: Layout = vec![Vec::new(); candidates.len()];
        let mut pool: Vec<usize> = (1..candidates.len()).collect();
        let mut pending: Vec<usize> = Vec::new();
        let mut current = 0;

        let related = |current: usize, pool: &[usize]| {
            pool.iter().position(|&candidate| adjacency[current][candidate])
        };

        while !pool.is_empty() {
            let limit = match width {
                WidthBound::Heuristic => Some(self.heuristic_width(&candidates[current])),
                WidthBound::Fixed(n) => Some(n.max(1)),
                WidthBound::Unbounded => None,
            };

            let mut next = related(current, &pool);
            if next.is_none() && pending.is_empty() {
                return Err(pool.len());
            }

            let mut attached = 0;
            while let Some(position) = next {
                if limit.is_some_and(|limit| attached == limit) {
                    break;
                }
                let child = pool.remove(position);
                layout[current].push(child);
                pending.push(child);
                attached += 1;
                next = related(current, &pool);
            }

            if !pool.is_empty() {
                if let Some(frontier) = pending.pop() {
                    current = frontier;
                }
            }
        }

        Ok(layout)
    }
}

/// Check if some pattern binds the variable in its subject or object slot.
fn binds(patterns: &[TriplePattern], variable: &str) -> bool {
    let name = strip_sigil(variable);
    patterns.iter().any(|pattern| {
        [&pattern.subject, &pattern.object]
            .into_iter()
            .any(|slot| slot.is_variable() && strip_sigil(&slot.name) == name)
    })
}

fn rows_per_subject(stats: TableStats) -> i64 {
    if stats.distinct_subjects <= 0 {
        return if stats.is_known() { 0 } else { 1 };
    }
    stats.size / stats.distinct_subjects
}

/// Symmetric candidate adjacency: an edge wherever two payloads share a
/// variable.
fn adjacency(candidates: &[NodePayload]) -> Vec<Vec<bool>> {
    let n = candidates.len();
    let mut matrix = vec![vec![false; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let connected =
                shared_variable_between(candidates[i].triples(), candidates[j].triples()).is_some();
            matrix[i][j] = connected;
            matrix[j][i] = connected;
        }
    }
    matrix
}

/// Build plan nodes bottom-up from a finished layout.
fn materialize(candidates: Vec<NodePayload>, layout: &Layout) -> Node {
    // Pre-order over the layout; reversed, every child precedes its parent.
    let mut order = Vec::with_capacity(layout.len());
    let mut stack = vec![0usize];
    while let Some(index) = stack.pop() {
        order.push(index);
        stack.extend(layout[index].iter().rev());
    }

    let mut built: Vec<Option<Node>> = candidates
        .into_iter()
        .map(|payload| {
            Some(Node {
                payload,
                children: Vec::new(),
                projection: Vec::new(),
            })
        })
        .collect();

    for &index in order.iter().rev() {
        let children: Vec<Node> = layout[index]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        if let Some(node) = built[index].as_mut() {
            node.children = children;
        }
    }

    built[0].take().unwrap_or_else(|| unreachable!("root is never a child"))
}
