//! Arena-allocated search tree with edge-resident statistics.
//!
//! Nodes live in a contiguous vector and reference each other by index,
//! which sidesteps ownership cycles and makes clearing between searches
//! trivial. Statistics accumulate on edges: each edge carries the prior,
//! visit count, and value sum for one legal move, and owns its child
//! node index once the child has been created. A fresh node is always
//! allocated when an edge is first descended, so no node is ever shared
//! between sibling branches.

use alphazero_chess::ChessMove;

/// Index into the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// One legal move out of a node.
#[derive(Clone, Debug)]
pub struct Edge {
    /// The move this edge represents.
    pub mv: ChessMove,

    /// Prior probability from the evaluator, set at parent expansion
    /// (and perturbed by root noise when configured).
    pub prior: f32,

    /// Times this edge was traversed during search.
    pub visits: u32,

    /// Accumulated backed-up value, from the parent mover's perspective.
    pub value_sum: f32,

    /// Child node, created lazily on first descent.
    pub child: Option<NodeId>,
}

impl Edge {
    pub fn new(mv: ChessMove, prior: f32) -> Self {
        Self {
            mv,
            prior,
            visits: 0,
            value_sum: 0.0,
            child: None,
        }
    }

    /// Mean backed-up value; 0.0 while unvisited.
    pub fn mean_value(&self) -> f32 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / self.visits as f32
        }
    }
}

/// One board state reached during search.
#[derive(Clone, Debug, Default)]
pub struct Node {
    /// Times this node was visited, its own first (expansion) visit
    /// included.
    pub visits: u32,

    /// Accumulated value from this node's mover's perspective.
    pub value_sum: f32,

    /// Outgoing edges, sorted by policy index. Empty until expansion.
    pub edges: Vec<Edge>,

    /// Whether edges have been generated for this node.
    pub expanded: bool,

    /// Game outcome for the side to move, cached once this node is
    /// discovered to be terminal.
    pub terminal_value: Option<f32>,
}

impl Node {
    /// Mean backed-up value; 0.0 while unvisited.
    pub fn mean_value(&self) -> f32 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / self.visits as f32
        }
    }
}

/// Arena of search nodes.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Create a tree holding only a fresh root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// # Panics
    /// Panics if the NodeId is stale (from a cleared tree).
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Add a node, returning its id.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Reset to a fresh root for the next search episode.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::default());
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &Node {
        self.get(NodeId::ROOT)
    }

    /// Iterate all nodes; used by invariant checks.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphazero_chess::codec;

    fn any_move() -> ChessMove {
        codec::from_uci("e2e4").unwrap()
    }

    #[test]
    fn test_tree_starts_with_root() {
        let tree = Tree::new();
        assert_eq!(tree.len(), 1);
        assert!(!tree.root().expanded);
        assert_eq!(tree.root().visits, 0);
    }

    #[test]
    fn test_add_and_link_child() {
        let mut tree = Tree::new();
        tree.get_mut(NodeId::ROOT).edges.push(Edge::new(any_move(), 1.0));

        let child = tree.add(Node::default());
        tree.get_mut(NodeId::ROOT).edges[0].child = Some(child);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.root().edges[0].child, Some(child));
    }

    #[test]
    fn test_clear_resets_to_fresh_root() {
        let mut tree = Tree::new();
        tree.add(Node::default());
        tree.add(Node::default());
        tree.get_mut(NodeId::ROOT).visits = 5;
        assert_eq!(tree.len(), 3);

        tree.clear();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root().visits, 0);
    }

    #[test]
    fn test_edge_mean_value() {
        let mut edge = Edge::new(any_move(), 0.5);
        assert_eq!(edge.mean_value(), 0.0);

        edge.visits = 4;
        edge.value_sum = 3.0;
        assert!((edge.mean_value() - 0.75).abs() < 1e-6);
    }
}
