//! Iterative graph traversals.
//!
//! Both traversals use an explicit stack rather than recursion, so traversal
//! depth is bounded by heap memory instead of the call stack; large functions
//! produce deep CFGs.

use crate::graph::{NodeId, Successors};

/// Returns the nodes reachable from `start` in depth-first post-order.
///
/// A node appears after all of its successors that were first reached
/// through it. Unreachable nodes do not appear.
#[must_use]
pub fn postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut visited = vec![false; graph.node_count()];
    // (node, child index into its successor list)
    let mut stack: Vec<(NodeId, usize)> = Vec::new();

    if start.index() >= graph.node_count() {
        return order;
    }

    visited[start.index()] = true;
    stack.push((start, 0));

    while let Some(top) = stack.last_mut() {
        let node = top.0;
        let next = top.1;
        top.1 += 1;
        match graph.successors(node).nth(next) {
            Some(s) => {
                if !visited[s.index()] {
                    visited[s.index()] = true;
                    stack.push((s, 0));
                }
            }
            None => {
                order.push(node);
                stack.pop();
            }
        }
    }

    order
}

/// Returns the nodes reachable from `start` in reverse post-order.
///
/// Reverse post-order is a topological order on acyclic graphs and the
/// canonical iteration order for forward data flow.
#[must_use]
pub fn reverse_postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let mut order = postorder(graph, start);
    order.reverse();
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::testgraph::AdjGraph;

    #[test]
    fn test_postorder_linear() {
        // 0 -> 1 -> 2
        let g = AdjGraph::new(vec![vec![1], vec![2], vec![]]);
        let order = postorder(&g, NodeId::new(0));
        assert_eq!(order, vec![NodeId::new(2), NodeId::new(1), NodeId::new(0)]);
    }

    #[test]
    fn test_postorder_diamond() {
        // 0 -> {1, 2} -> 3
        let g = AdjGraph::new(vec![vec![1, 2], vec![3], vec![3], vec![]]);
        let order = postorder(&g, NodeId::new(0));

        assert_eq!(order.len(), 4);
        // entry is last, the join precedes both arms
        assert_eq!(order[3], NodeId::new(0));
        assert_eq!(order[0], NodeId::new(3));
    }

    #[test]
    fn test_postorder_handles_cycles() {
        // 0 -> 1 -> 0 (back edge), 1 -> 2
        let g = AdjGraph::new(vec![vec![1], vec![0, 2], vec![]]);
        let order = postorder(&g, NodeId::new(0));
        assert_eq!(order, vec![NodeId::new(2), NodeId::new(1), NodeId::new(0)]);
    }

    #[test]
    fn test_postorder_skips_unreachable() {
        // 0 -> 1, node 2 disconnected
        let g = AdjGraph::new(vec![vec![1], vec![], vec![0]]);
        let order = postorder(&g, NodeId::new(0));
        assert_eq!(order.len(), 2);
        assert!(!order.contains(&NodeId::new(2)));
    }

    #[test]
    fn test_reverse_postorder_is_topological() {
        // 0 -> {1, 2}, 1 -> 3, 2 -> 3
        let g = AdjGraph::new(vec![vec![1, 2], vec![3], vec![3], vec![]]);
        let order = reverse_postorder(&g, NodeId::new(0));

        let pos = |n: usize| order.iter().position(|x| x.index() == n).unwrap();
        assert!(pos(0) < pos(1));
        assert!(pos(0) < pos(2));
        assert!(pos(1) < pos(3));
        assert!(pos(2) < pos(3));
    }
}
