//! Post-dominance analysis.
//!
//! A block `p` **post-dominates** a block `b` if every path from `b` to the
//! function's exit must pass through `p`. The linearization pipeline consumes
//! exactly one query from this analysis: `dominates(candidate, node)`, which
//! answers whether `candidate` post-dominates `node`. The stop rule of the
//! region walk and of mask synthesis is built on it.
//!
//! # Construction
//!
//! Post-dominance is dominance on the edge-reversed CFG. Functions can have
//! several exit blocks, so the reversed graph is rooted at a *virtual exit*
//! node with an edge to every real exit; the Lengauer-Tarjan machinery then
//! runs unchanged over that view.
//!
//! Blocks that cannot reach any exit (infinite loops) are unreachable in the
//! reversed graph: they post-dominate nothing and are post-dominated by
//! nothing, and queries involving them answer `false`.

use crate::analysis::FuncCfg;
use crate::graph::{
    dominators::{compute_dominators, DominatorTree},
    GraphBase, NodeId, Successors,
};
use crate::ir::BlockId;

/// The post-dominator tree of a function.
///
/// Owns its data; the [`FuncCfg`] used to build it can be dropped (and the
/// function mutated) afterwards.
#[derive(Debug, Clone)]
pub struct PostDominatorTree {
    tree: DominatorTree,
    /// Index of the virtual exit node in the reversed view.
    virtual_exit: usize,
}

impl PostDominatorTree {
    /// Computes the post-dominator tree for `cfg`.
    #[must_use]
    pub fn compute(cfg: &FuncCfg<'_>) -> Self {
        let view = ReversedCfg {
            cfg,
            exits: cfg.exits(),
        };
        let virtual_exit = cfg.block_count();
        let tree = compute_dominators(&view, NodeId::new(virtual_exit));

        Self { tree, virtual_exit }
    }

    /// Returns `true` if `candidate` post-dominates `node`.
    ///
    /// Every block post-dominates itself.
    #[must_use]
    pub fn dominates(&self, candidate: BlockId, node: BlockId) -> bool {
        self.tree.dominates(
            NodeId::new(candidate.index()),
            NodeId::new(node.index()),
        )
    }

    /// Returns `true` if `candidate` strictly post-dominates `node`.
    #[must_use]
    pub fn strictly_dominates(&self, candidate: BlockId, node: BlockId) -> bool {
        candidate != node && self.dominates(candidate, node)
    }

    /// Returns the immediate post-dominator of `node`, if it has one.
    #[must_use]
    pub fn immediate_post_dominator(&self, node: BlockId) -> Option<BlockId> {
        let idom = self.tree.immediate_dominator(NodeId::new(node.index()))?;
        if idom.index() == self.virtual_exit {
            None
        } else {
            Some(BlockId::new(idom.index()))
        }
    }

    /// Returns `true` if `node` can reach an exit.
    #[must_use]
    pub fn reaches_exit(&self, node: BlockId) -> bool {
        self.tree.is_reachable(NodeId::new(node.index()))
    }
}

/// The edge-reversed CFG, augmented with a virtual exit node.
///
/// Node `block_count` is the virtual exit; its successors (in the reversed
/// direction) are the function's real exit blocks. Every other node's
/// successors are its predecessors in the forward CFG.
struct ReversedCfg<'a, 'f> {
    cfg: &'a FuncCfg<'f>,
    exits: Vec<BlockId>,
}

impl GraphBase for ReversedCfg<'_, '_> {
    fn node_count(&self) -> usize {
        self.cfg.block_count() + 1
    }
}

impl Successors for ReversedCfg<'_, '_> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        let blocks: Vec<NodeId> = if node.index() == self.cfg.block_count() {
            self.exits
                .iter()
                .map(|b| NodeId::new(b.index()))
                .collect()
        } else {
            self.cfg
                .block_predecessors(BlockId::new(node.index()))
                .iter()
                .map(|b| NodeId::new(b.index()))
                .collect()
        };
        blocks.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, FunctionBuilder};

    fn b(i: usize) -> BlockId {
        BlockId::new(i)
    }

    fn diamond() -> Function {
        let mut fb = FunctionBuilder::new("diamond");
        let entry = fb.block();
        let then_b = fb.block();
        let else_b = fb.block();
        let join = fb.block();

        fb.switch_to(entry);
        let c = fb.const_bool(true);
        fb.branch(c, then_b, else_b);

        fb.switch_to(then_b);
        fb.jump(join);

        fb.switch_to(else_b);
        fb.jump(join);

        fb.switch_to(join);
        fb.ret(None);

        fb.finish()
    }

    #[test]
    fn test_postdom_diamond() {
        let func = diamond();
        let cfg = FuncCfg::from_function(&func);
        let pdt = PostDominatorTree::compute(&cfg);

        // the join post-dominates everything
        assert!(pdt.dominates(b(3), b(0)));
        assert!(pdt.dominates(b(3), b(1)));
        assert!(pdt.dominates(b(3), b(2)));
        assert!(pdt.strictly_dominates(b(3), b(0)));

        // the arms post-dominate nothing but themselves
        assert!(!pdt.strictly_dominates(b(1), b(0)));
        assert!(!pdt.strictly_dominates(b(2), b(0)));
        assert!(pdt.dominates(b(1), b(1)));

        assert_eq!(pdt.immediate_post_dominator(b(1)), Some(b(3)));
        assert_eq!(pdt.immediate_post_dominator(b(0)), Some(b(3)));
        assert_eq!(pdt.immediate_post_dominator(b(3)), None);
    }

    #[test]
    fn test_postdom_linear_chain() {
        let mut fb = FunctionBuilder::new("chain");
        let b0 = fb.block();
        let b1 = fb.block();
        let b2 = fb.block();

        fb.switch_to(b0);
        fb.jump(b1);
        fb.switch_to(b1);
        fb.jump(b2);
        fb.switch_to(b2);
        fb.ret(None);

        let func = fb.finish();
        let cfg = FuncCfg::from_function(&func);
        let pdt = PostDominatorTree::compute(&cfg);

        assert!(pdt.dominates(b1, b0));
        assert!(pdt.dominates(b2, b0));
        assert!(pdt.dominates(b2, b1));
        assert!(!pdt.dominates(b0, b1));
    }

    #[test]
    fn test_postdom_multiple_exits() {
        // entry branches to two returns; neither return post-dominates entry
        let mut fb = FunctionBuilder::new("twoexit");
        let entry = fb.block();
        let left = fb.block();
        let right = fb.block();

        fb.switch_to(entry);
        let c = fb.const_bool(true);
        fb.branch(c, left, right);

        fb.switch_to(left);
        fb.ret(None);
        fb.switch_to(right);
        fb.ret(None);

        let func = fb.finish();
        let cfg = FuncCfg::from_function(&func);
        let pdt = PostDominatorTree::compute(&cfg);

        assert!(!pdt.strictly_dominates(left, entry));
        assert!(!pdt.strictly_dominates(right, entry));
        assert!(pdt.reaches_exit(entry));
    }

    #[test]
    fn test_postdom_nested_convergence() {
        // entry -> {a, b}; a -> {c, d}; b -> {c, d}; all converge at join
        let mut fb = FunctionBuilder::new("nested");
        let entry = fb.block();
        let a = fb.block();
        let bb = fb.block();
        let c = fb.block();
        let d = fb.block();
        let join = fb.block();

        fb.switch_to(entry);
        let c1 = fb.const_bool(true);
        fb.branch(c1, a, bb);

        fb.switch_to(a);
        let c2 = fb.const_bool(false);
        fb.branch(c2, c, d);

        fb.switch_to(bb);
        let c3 = fb.const_bool(false);
        fb.branch(c3, c, d);

        fb.switch_to(c);
        fb.jump(join);
        fb.switch_to(d);
        fb.jump(join);
        fb.switch_to(join);
        fb.ret(None);

        let func = fb.finish();
        let cfg = FuncCfg::from_function(&func);
        let pdt = PostDominatorTree::compute(&cfg);

        assert!(pdt.strictly_dominates(join, entry));
        assert!(pdt.strictly_dominates(join, a));
        assert!(pdt.strictly_dominates(join, c));
        assert!(!pdt.strictly_dominates(c, entry));
        assert!(!pdt.strictly_dominates(d, a));
    }
}
