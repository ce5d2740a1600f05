//! Join-tree plan messages.
//!
//! A plan is a tree of [`Node`]s. Every node carries exactly one payload,
//! either a single triple pattern or a non-empty group of triple patterns
//! sharing a subject, plus its children. The projection list is only
//! meaningful on the root.

use std::fmt;

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

use crate::error::Error;

/// Whether a triple slot is bound to a variable or a constant term.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Archive,
    Serialize,
    Deserialize,
    SerdeSerialize,
    SerdeDeserialize,
)]
pub enum ElementType {
    /// A query variable such as `?s`.
    Variable,
    /// A bound term (IRI, prefixed name or literal).
    Constant,
}

/// One slot of a triple pattern.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct Element {
    /// Term text as rendered by the query front-end.
    pub name: String,
    /// Variable or constant.
    pub element_type: ElementType,
}

impl Element {
    /// Create a variable slot.
    pub fn variable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element_type: ElementType::Variable,
        }
    }

    /// Create a constant slot.
    pub fn constant(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element_type: ElementType::Constant,
        }
    }

    /// Check if this slot holds a variable.
    pub fn is_variable(&self) -> bool {
        self.element_type == ElementType::Variable
    }
}

/// Cardinality snapshot of a predicate table attached to a triple.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Archive,
    Serialize,
    Deserialize,
    SerdeSerialize,
    SerdeDeserialize,
)]
pub struct TableStats {
    /// Number of rows in the predicate table.
    pub size: i64,
    /// Number of distinct subjects in the predicate table.
    pub distinct_subjects: i64,
}

impl TableStats {
    /// Sentinel returned for predicates the catalog does not know.
    pub const UNKNOWN: TableStats = TableStats {
        size: -1,
        distinct_subjects: -1,
    };

    /// Create a statistics snapshot.
    pub fn new(size: i64, distinct_subjects: i64) -> Self {
        Self {
            size,
            distinct_subjects,
        }
    }

    /// Check if these are real statistics rather than the unknown sentinel.
    pub fn is_known(&self) -> bool {
        self.size >= 0 && self.distinct_subjects >= 0
    }

    /// A table is worth reducing when it holds more rows than subjects.
    pub fn is_reducible(&self) -> bool {
        self.is_known() && self.size > self.distinct_subjects
    }
}

/// A triple pattern with optional statistics for its predicate.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct Triple {
    pub subject: Element,
    pub predicate: Element,
    pub object: Element,
    /// Statistics of the predicate table, when the planner had them.
    pub stats: Option<TableStats>,
}

impl Triple {
    /// Create a triple pattern without statistics.
    pub fn new(subject: Element, predicate: Element, object: Element) -> Self {
        Self {
            subject,
            predicate,
            object,
            stats: None,
        }
    }

    /// Attach a statistics snapshot.
    pub fn with_stats(mut self, stats: TableStats) -> Self {
        self.stats = Some(stats);
        self
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) ({}) ({})",
            self.subject.name, self.predicate.name, self.object.name
        )
    }
}

/// The payload of a plan node: one triple or one subject group.
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub enum NodePayload {
    /// A single triple pattern, answered from its predicate table.
    Triple(Triple),
    /// Triples sharing one subject, answered from the property table.
    TripleGroup(Vec<Triple>),
}

impl NodePayload {
    /// All triples carried by this payload, in order.
    pub fn triples(&self) -> &[Triple] {
        match self {
            NodePayload::Triple(triple) => std::slice::from_ref(triple),
            NodePayload::TripleGroup(group) => group,
        }
    }

    /// Check if this payload is a subject group.
    pub fn is_group(&self) -> bool {
        matches!(self, NodePayload::TripleGroup(_))
    }
}

/// A node of the persisted join tree.
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
#[rkyv(serialize_bounds(
    __S: rkyv::ser::Writer + rkyv::ser::Allocator,
    __S::Error: rkyv::rancor::Source,
))]
#[rkyv(deserialize_bounds(__D::Error: rkyv::rancor::Source))]
#[rkyv(bytecheck(bounds(
    __C: rkyv::validation::ArchiveContext,
    __C::Error: rkyv::rancor::Source,
)))]
pub struct Node {
    pub payload: NodePayload,
    #[rkyv(omit_bounds)]
    pub children: Vec<Node>,
    /// Projected variable names; only set on the root.
    pub projection: Vec<String>,
}

impl Node {
    /// Create a leaf node for a single triple.
    pub fn triple(triple: Triple) -> Self {
        Self {
            payload: NodePayload::Triple(triple),
            children: vec![],
            projection: vec![],
        }
    }

    /// Create a leaf node for a subject group.
    ///
    /// Fails if the group is empty.
    pub fn group(triples: Vec<Triple>) -> Result<Self, Error> {
        if triples.is_empty() {
            return Err(Error::InvalidMessage(
                "triple group must not be empty".to_string(),
            ));
        }
        Ok(Self {
            payload: NodePayload::TripleGroup(triples),
            children: vec![],
            projection: vec![],
        })
    }

    /// Append a child node.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Set the projection list.
    pub fn with_projection(mut self, projection: Vec<String>) -> Self {
        self.projection = projection;
        self
    }

    /// Number of nodes in this subtree.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Node::len).sum::<usize>()
    }

    /// A node is never empty; provided for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All triples in this subtree, in pre-order.
    pub fn triples(&self) -> Vec<&Triple> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.extend(node.payload.triples());
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Check structural rules that the type system cannot express.
    pub fn validate(&self) -> Result<(), Error> {
        let mut stack = vec![(self, true)];
        while let Some((node, is_root)) = stack.pop() {
            if let NodePayload::TripleGroup(group) = &node.payload {
                if group.is_empty() {
                    return Err(Error::InvalidMessage(
                        "triple group must not be empty".to_string(),
                    ));
                }
            }
            if !is_root && !node.projection.is_empty() {
                return Err(Error::InvalidMessage(
                    "projection is only allowed on the root node".to_string(),
                ));
            }
            stack.extend(node.children.iter().map(|c| (c, false)));
        }
        Ok(())
    }

    /// Render the tree as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_triple(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(Element::variable(s), Element::constant(p), Element::variable(o))
    }

    #[test]
    fn test_empty_group_rejected() {
        assert!(Node::group(vec![]).is_err());
    }

    #[test]
    fn test_len_and_triples() {
        let tree = Node::triple(chain_triple("?a", ":p1", "?b"))
            .with_child(Node::triple(chain_triple("?b", ":p2", "?c")))
            .with_child(
                Node::group(vec![
                    chain_triple("?a", ":p3", "?d"),
                    chain_triple("?a", ":p4", "?e"),
                ])
                .unwrap(),
            );

        assert_eq!(tree.len(), 3);
        let predicates: Vec<&str> = tree
            .triples()
            .iter()
            .map(|t| t.predicate.name.as_str())
            .collect();
        assert_eq!(predicates, vec![":p1", ":p2", ":p3", ":p4"]);
    }

    #[test]
    fn test_validate_projection_only_on_root() {
        let bad = Node::triple(chain_triple("?a", ":p1", "?b")).with_child(
            Node::triple(chain_triple("?b", ":p2", "?c")).with_projection(vec!["c".into()]),
        );
        assert!(matches!(bad.validate(), Err(Error::InvalidMessage(_))));

        let good = Node::triple(chain_triple("?a", ":p1", "?b"))
            .with_projection(vec!["a".into()])
            .with_child(Node::triple(chain_triple("?b", ":p2", "?c")));
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_reducible_stats() {
        assert!(TableStats::new(100, 10).is_reducible());
        assert!(!TableStats::new(10, 10).is_reducible());
        assert!(!TableStats::UNKNOWN.is_reducible());
    }

    #[test]
    fn test_triple_display() {
        let triple = chain_triple("?s", "<http://ex.org/knows>", "?o");
        assert_eq!(triple.to_string(), "(?s) (<http://ex.org/knows>) (?o)");
    }
}
