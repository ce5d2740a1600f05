//! Arena representation of a join tree.
//!
//! The wire [`Node`] is a recursive value. The engine needs to replace the
//! relation of one node while reading the relation of its parent or child,
//! so the tree is flattened into an arena addressed by [`NodeId`] and every
//! phase is a mutable pass over it.

use std::fmt;

use gym_proto::{Node, NodePayload};

use crate::error::Error;

use super::pattern::{shared_variable_between, strip_sigil};
use super::relation::Relation;

/// Index of a node in a [`JoinTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in pre-order.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One node of the arena.
#[derive(Debug, Clone)]
pub struct TreeNode {
    payload: NodePayload,
    children: Vec<NodeId>,
    parent_key: Option<String>,
    reducible: bool,
    relation: Option<Relation>,
    projection: Vec<String>,
}

impl TreeNode {
    pub fn payload(&self) -> &NodePayload {
        &self.payload
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Variable joining this node to its parent; `None` on the root.
    pub fn parent_key(&self) -> Option<&str> {
        self.parent_key.as_deref()
    }

    /// Whether semi-join reduction applies to this node.
    pub fn is_reducible(&self) -> bool {
        self.reducible
    }

    /// Relation currently held by the node, if materialized.
    pub fn relation(&self) -> Option<&Relation> {
        self.relation.as_ref()
    }

    /// Projection columns without sigil; empty below the root.
    pub fn projection(&self) -> &[String] {
        &self.projection
    }

    /// Short human-readable description of the payload.
    pub fn label(&self) -> String {
        match &self.payload {
            NodePayload::Triple(triple) => triple.to_string(),
            NodePayload::TripleGroup(group) => {
                let members: Vec<String> = group.iter().map(ToString::to_string).collect();
                format!("{{{}}}", members.join(", "))
            }
        }
    }
}

/// A join tree flattened into an arena. Node ids follow pre-order, so the
/// root is always `#0`.
#[derive(Debug, Clone)]
pub struct JoinTree {
    nodes: Vec<TreeNode>,
}

impl JoinTree {
    /// Flatten a plan, checking that every edge has a shared variable.
    pub fn from_plan(plan: &Node) -> Result<Self, Error> {
        plan.validate()
            .map_err(|e| Error::Input(format!("invalid plan: {}", e)))?;

        let mut nodes: Vec<TreeNode> = Vec::with_capacity(plan.len());
        let mut stack: Vec<(&Node, Option<NodeId>)> = vec![(plan, None)];

        while let Some((node, parent)) = stack.pop() {
            let id = NodeId(nodes.len());

            let parent_key = match parent {
                Some(parent) => {
                    let parent_node = &nodes[parent.0];
                    let key = shared_variable_between(
                        parent_node.payload.triples(),
                        node.payload.triples(),
                    )
                    .ok_or_else(|| {
                        Error::Input(format!(
                            "edge {} -> {} has no shared variable",
                            parent_node.label(),
                            id
                        ))
                    })?;
                    Some(key)
                }
                None => None,
            };

            let reducible = match &node.payload {
                NodePayload::Triple(triple) => triple.stats.is_some_and(|s| s.is_reducible()),
                NodePayload::TripleGroup(_) => false,
            };

            nodes.push(TreeNode {
                payload: node.payload.clone(),
                children: Vec::with_capacity(node.children.len()),
                parent_key,
                reducible,
                relation: None,
                projection: node
                    .projection
                    .iter()
                    .map(|v| strip_sigil(v).to_string())
                    .collect(),
            });
            if let Some(parent) = parent {
                nodes[parent.0].children.push(id);
            }

            stack.extend(node.children.iter().rev().map(|child| (child, Some(id))));
        }

        Ok(Self { nodes })
    }

    /// Rebuild the wire representation.
    pub fn to_plan(&self) -> Node {
        let mut built: Vec<Option<Node>> = vec![None; self.nodes.len()];
        for id in self.post_order() {
            let node = &self.nodes[id.0];
            let children = node
                .children
                .iter()
                .filter_map(|child| built[child.0].take())
                .collect();
            built[id.0] = Some(Node {
                payload: node.payload.clone(),
                children,
                projection: node.projection.clone(),
            });
        }
        built[0]
            .take()
            .unwrap_or_else(|| unreachable!("a join tree always has a root"))
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Node by id.
    ///
    /// Ids are only handed out by this tree, so lookups cannot miss.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always has a root; provided for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of parent/child edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.children.len()).sum()
    }

    /// Ids in pre-order (parents before children).
    pub fn pre_order(&self) -> Vec<NodeId> {
        (0..self.nodes.len()).map(NodeId).collect()
    }

    /// Ids in post-order (children before parents, left to right).
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().copied());
        }
        out.reverse();
        out
    }

    /// Relation of a node, failing if it was never fetched.
    pub fn relation(&self, id: NodeId) -> Result<&Relation, Error> {
        self.nodes[id.0]
            .relation
            .as_ref()
            .ok_or_else(|| self.not_materialized(id))
    }

    /// Replace the relation of a node.
    pub fn set_relation(&mut self, id: NodeId, relation: Relation) {
        self.nodes[id.0].relation = Some(relation);
    }

    /// Move the relation out of a node.
    pub fn take_relation(&mut self, id: NodeId) -> Result<Relation, Error> {
        match self.nodes[id.0].relation.take() {
            Some(relation) => Ok(relation),
            None => Err(self.not_materialized(id)),
        }
    }

    /// Drop every materialized relation.
    pub fn clear_relations(&mut self) {
        for node in &mut self.nodes {
            node.relation = None;
        }
    }

    /// Total rows over all materialized relations.
    pub fn materialized_rows(&self) -> usize {
        self.nodes
            .iter()
            .filter_map(|n| n.relation.as_ref())
            .map(Relation::len)
            .sum()
    }

    fn not_materialized(&self, id: NodeId) -> Error {
        Error::NotMaterialized {
            node: format!("{} {}", id, self.nodes[id.0].label()),
        }
    }
}

impl fmt::Display for JoinTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id.0];
            write!(f, "{:indent$}{} {}", "", id, node.label(), indent = depth * 2)?;
            if let Some(key) = &node.parent_key {
                write!(f, " on {}", key)?;
            }
            if node.reducible {
                write!(f, " [reducible]")?;
            }
            if !node.projection.is_empty() {
                write!(f, " -> {}", node.projection.join(", "))?;
            }
            writeln!(f)?;
            stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gym_proto::{Element, TableStats, Triple};

    fn t(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(Element::variable(s), Element::constant(p), Element::variable(o))
    }

    fn sample() -> Node {
        Node::triple(t("?a", ":p1", "?b").with_stats(TableStats::new(100, 10)))
            .with_projection(vec!["?a".into(), "c".into()])
            .with_child(
                Node::triple(t("?b", ":p2", "?c"))
                    .with_child(Node::triple(t("?c", ":p3", "?d"))),
            )
            .with_child(Node::group(vec![t("?a", ":p4", "?e"), t("?a", ":p5", "?f")]).unwrap())
    }

    #[test]
    fn test_from_plan_layout() {
        let tree = JoinTree::from_plan(&sample()).unwrap();

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.edge_count(), 3);

        let root = tree.node(tree.root());
        assert!(root.is_reducible());
        assert_eq!(root.projection(), &["a", "c"]);
        assert_eq!(root.parent_key(), None);
        assert_eq!(root.children(), &[NodeId(1), NodeId(3)]);

        assert_eq!(tree.node(NodeId(1)).parent_key(), Some("b"));
        assert_eq!(tree.node(NodeId(2)).parent_key(), Some("c"));
        assert_eq!(tree.node(NodeId(3)).parent_key(), Some("a"));
        assert!(!tree.node(NodeId(3)).is_reducible());
    }

    #[test]
    fn test_traversal_orders() {
        let tree = JoinTree::from_plan(&sample()).unwrap();
        let ids = |order: Vec<NodeId>| order.into_iter().map(NodeId::index).collect::<Vec<_>>();

        assert_eq!(ids(tree.pre_order()), vec![0, 1, 2, 3]);
        assert_eq!(ids(tree.post_order()), vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_round_trip_plan() {
        let plan = sample();
        let tree = JoinTree::from_plan(&plan).unwrap();
        let rebuilt = tree.to_plan();
        assert_eq!(rebuilt.payload, plan.payload);
        assert_eq!(rebuilt.children, plan.children);
        assert_eq!(rebuilt.projection, vec!["a", "c"]);
    }

    #[test]
    fn test_edge_without_shared_variable() {
        let plan = Node::triple(t("?a", ":p1", "?b")).with_child(Node::triple(t("?x", ":p2", "?y")));
        assert!(matches!(JoinTree::from_plan(&plan), Err(Error::Input(_))));
    }

    #[test]
    fn test_relation_slots() {
        let mut tree = JoinTree::from_plan(&sample()).unwrap();
        let root = tree.root();

        assert!(matches!(
            tree.relation(root),
            Err(Error::NotMaterialized { .. })
        ));

        tree.set_relation(root, Relation::new(vec!["a".into()]));
        assert!(tree.relation(root).is_ok());
        assert!(tree.take_relation(root).is_ok());
        assert!(tree.take_relation(root).is_err());

        tree.set_relation(root, Relation::new(vec!["a".into()]));
        tree.clear_relations();
        assert_eq!(tree.materialized_rows(), 0);
        assert!(tree.node(root).relation().is_none());
    }

    #[test]
    fn test_display_dump() {
        let tree = JoinTree::from_plan(&sample()).unwrap();
        let dump = tree.to_string();
        let lines: Vec<&str> = dump.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("#0 (?a) (:p1) (?b) [reducible]"));
        assert!(lines[1].starts_with("  #1 (?b) (:p2) (?c) on b"));
        assert!(lines[2].starts_with("    #2"));
        assert!(lines[3].starts_with("  #3 {"));
    }
}
