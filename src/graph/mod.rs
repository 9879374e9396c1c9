//! Graph abstractions shared by the CFG views and the dominance analysis.
//!
//! The traits here decouple the dominator computation from any concrete graph
//! representation: a forward CFG, its edge-reversed dual, and the augmented
//! view with a virtual exit all implement the same small trait surface.
//!
//! - [`GraphBase`] - Node count and iteration
//! - [`Successors`] - Forward edge traversal
//! - [`Predecessors`] - Backward edge traversal
//! - [`RootedGraph`] - A distinguished entry node

use std::fmt;

pub mod algorithms;
pub mod dominators;

/// Identifier for a node in an abstract graph.
///
/// Nodes are plain indices; graph views define what an index means (for CFG
/// views it is the block index, possibly extended by a virtual node).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a new node identifier.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the underlying index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Base trait for graphs: node count and node iteration.
pub trait GraphBase {
    /// Returns the number of nodes in the graph.
    fn node_count(&self) -> usize;

    /// Returns an iterator over all node identifiers.
    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.node_count()).map(NodeId::new)
    }
}

/// Graphs with forward edge traversal.
pub trait Successors: GraphBase {
    /// Returns the successors of `node`.
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Graphs with backward edge traversal.
pub trait Predecessors: GraphBase {
    /// Returns the predecessors of `node`.
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Graphs with a distinguished entry node.
pub trait RootedGraph: Successors {
    /// Returns the entry node.
    fn entry(&self) -> NodeId;
}
