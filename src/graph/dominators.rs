//! Dominator tree computation using the Lengauer-Tarjan algorithm.
//!
//! A node `d` **dominates** a node `n` if every path from the entry node to `n`
//! must pass through `d`. The **immediate dominator** of `n` is the unique node
//! that strictly dominates `n` but no other strict dominator of `n`.
//!
//! Post-dominance (the relation the linearization pipeline actually consumes)
//! is dominance on the edge-reversed graph rooted at the exit; see
//! [`crate::analysis::PostDominatorTree`] for that view. This module is
//! direction-agnostic: it computes dominators for whatever [`Successors`]
//! implementation it is handed.
//!
//! # Algorithm
//!
//! Lengauer-Tarjan with path compression, O(V α(V)) for all practical inputs:
//!
//! 1. DFS numbering from the entry
//! 2. Semidominators in reverse DFS order
//! 3. Implicit immediate dominators via bucket processing
//! 4. Final explicit immediate dominators
//!
//! Nodes unreachable from the entry get no dominator; queries involving them
//! answer `false` rather than walking a parent chain that does not exist.

use crate::graph::{NodeId, RootedGraph, Successors};

/// Result of dominator tree computation.
///
/// Each reachable node except the entry has exactly one immediate dominator.
#[derive(Debug, Clone)]
pub struct DominatorTree {
    /// The entry (root) node of the dominator tree.
    entry: NodeId,
    /// Immediate dominator for each node; `None` for the entry and for nodes
    /// unreachable from it.
    idom: Vec<Option<NodeId>>,
}

impl DominatorTree {
    /// Returns the entry (root) node of the dominator tree.
    #[inline]
    #[must_use]
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// Returns the immediate dominator of a node.
    ///
    /// `None` for the entry node, for nodes unreachable from the entry, and
    /// for node indices outside the graph.
    #[inline]
    #[must_use]
    pub fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        self.idom.get(node.index()).copied().flatten()
    }

    /// Returns `true` if `node` is reachable from the entry.
    #[must_use]
    pub fn is_reachable(&self, node: NodeId) -> bool {
        node == self.entry || self.immediate_dominator(node).is_some()
    }

    /// Checks if node `a` dominates node `b`.
    ///
    /// A node dominates itself. The entry dominates every reachable node.
    /// Any query involving an unreachable node (other than `a == b`) is `false`.
    ///
    /// # Complexity
    ///
    /// O(depth) where depth is the depth of `b` in the dominator tree.
    #[must_use]
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return true;
        }

        let mut current = b;
        while let Some(idom) = self.immediate_dominator(current) {
            if idom == a {
                return true;
            }
            current = idom;
        }

        false
    }

    /// Checks if node `a` strictly dominates node `b` (dominates and `a ≠ b`).
    #[inline]
    #[must_use]
    pub fn strictly_dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Returns the number of nodes covered by this tree.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.idom.len()
    }
}

/// Computes the dominator tree of `graph` rooted at `entry`.
#[must_use]
pub fn compute_dominators<G: Successors>(graph: &G, entry: NodeId) -> DominatorTree {
    let node_count = graph.node_count();

    if node_count == 0 {
        return DominatorTree {
            entry,
            idom: Vec::new(),
        };
    }

    let mut lt = LengauerTarjan::new(node_count, entry);
    lt.compute(graph);
    lt.into_tree()
}

/// Convenience function to compute dominators for a [`RootedGraph`].
#[must_use]
pub fn compute_dominators_rooted<G: RootedGraph>(graph: &G) -> DominatorTree {
    compute_dominators(graph, graph.entry())
}

const UNDEFINED: usize = usize::MAX;

/// Internal state for the Lengauer-Tarjan algorithm.
///
/// Indices are raw `usize` node indices; `UNDEFINED` is the sentinel for
/// "no node".
struct LengauerTarjan {
    entry: usize,
    /// DFS number for each node (0 = not visited, numbers start at 1).
    dfnum: Vec<usize>,
    /// Node with each DFS number (inverse of dfnum, offset by one).
    vertex: Vec<usize>,
    /// Parent in the DFS tree.
    parent: Vec<usize>,
    /// Semidominator candidate for each node.
    semi: Vec<usize>,
    /// Immediate dominator (intermediate, then final).
    idom: Vec<usize>,
    /// Ancestor in the link-eval forest.
    ancestor: Vec<usize>,
    /// Best node on the path to the forest root (path compression).
    best: Vec<usize>,
    /// Nodes whose semidominator is this node.
    bucket: Vec<Vec<usize>>,
    /// Predecessor lists, gathered during the DFS numbering pass.
    preds: Vec<Vec<usize>>,
    dfs_counter: usize,
}

impl LengauerTarjan {
    fn new(n: usize, entry: NodeId) -> Self {
        Self {
            entry: entry.index(),
            dfnum: vec![0; n],
            vertex: vec![UNDEFINED; n],
            parent: vec![UNDEFINED; n],
            semi: (0..n).collect(),
            idom: vec![UNDEFINED; n],
            ancestor: vec![UNDEFINED; n],
            best: (0..n).collect(),
            bucket: vec![Vec::new(); n],
            preds: vec![Vec::new(); n],
            dfs_counter: 0,
        }
    }

    fn compute<G: Successors>(&mut self, graph: &G) {
        self.dfs(graph);

        // Process nodes in reverse DFS order, excluding the entry.
        for i in (1..self.dfs_counter).rev() {
            let w = self.vertex[i];
            let parent_w = self.parent[w];

            // Phase 2: semidominators.
            let preds = std::mem::take(&mut self.preds[w]);
            for &v in &preds {
                if self.dfnum[v] == 0 {
                    // unreachable from the entry
                    continue;
                }
                let u = self.eval(v);
                if self.dfnum[self.semi[u]] < self.dfnum[self.semi[w]] {
                    self.semi[w] = self.semi[u];
                }
            }
            self.preds[w] = preds;

            let semi_w = self.semi[w];
            self.bucket[semi_w].push(w);
            self.link(parent_w, w);

            // Phase 3: implicit immediate dominators.
            let bucket = std::mem::take(&mut self.bucket[parent_w]);
            for v in bucket {
                let u = self.eval(v);
                self.idom[v] = if self.semi[u] == self.semi[v] {
                    parent_w
                } else {
                    u
                };
            }
        }

        // Phase 4: explicit immediate dominators.
        for i in 1..self.dfs_counter {
            let w = self.vertex[i];
            if self.idom[w] != self.semi[w] {
                self.idom[w] = self.idom[self.idom[w]];
            }
        }
    }

    fn into_tree(self) -> DominatorTree {
        let entry = self.entry;
        let idom = self
            .idom
            .iter()
            .enumerate()
            .map(|(node, &idom)| {
                if node == entry || idom == UNDEFINED || self.dfnum[node] == 0 {
                    None
                } else {
                    Some(NodeId::new(idom))
                }
            })
            .collect();

        DominatorTree {
            entry: NodeId::new(entry),
            idom,
        }
    }

    /// DFS numbering; also gathers predecessor lists for phase 2.
    fn dfs<G: Successors>(&mut self, graph: &G) {
        if self.entry >= self.dfnum.len() {
            return;
        }

        let mut stack = vec![self.entry];
        while let Some(node) = stack.pop() {
            if self.dfnum[node] != 0 {
                continue;
            }

            self.dfs_counter += 1;
            self.dfnum[node] = self.dfs_counter;
            self.vertex[self.dfs_counter - 1] = node;

            for succ in graph.successors(NodeId::new(node)) {
                let s = succ.index();
                self.preds[s].push(node);
                if self.dfnum[s] == 0 {
                    self.parent[s] = node;
                    stack.push(s);
                }
            }
        }
    }

    /// Links `v` as a child of `w` in the spanning forest.
    fn link(&mut self, w: usize, v: usize) {
        self.ancestor[v] = w;
    }

    /// Finds the node with the minimum semidominator on the path to the
    /// forest root.
    fn eval(&mut self, v: usize) -> usize {
        if self.ancestor[v] == UNDEFINED {
            return v;
        }
        self.compress(v);
        self.best[v]
    }

    /// Path compression; iterative to keep stack depth bounded.
    fn compress(&mut self, v: usize) {
        // Collect the ancestor chain whose links still need compressing.
        let mut chain = Vec::new();
        let mut node = v;
        while self.ancestor[self.ancestor[node]] != UNDEFINED {
            chain.push(node);
            node = self.ancestor[node];
        }

        // Fold from the top of the chain down.
        for &n in chain.iter().rev() {
            let anc = self.ancestor[n];
            let best_anc = self.best[anc];
            if self.dfnum[self.semi[best_anc]] < self.dfnum[self.semi[self.best[n]]] {
                self.best[n] = best_anc;
            }
            self.ancestor[n] = self.ancestor[anc];
        }
    }
}
