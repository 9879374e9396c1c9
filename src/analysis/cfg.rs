//! Control flow graph view of a function.
//!
//! [`FuncCfg`] is a lightweight CFG derived from block terminators. It does
//! not duplicate the function body; it holds a reference plus precomputed
//! predecessor lists, and implements the graph traits so the dominance
//! machinery can run over it (and over its reversed dual).
//!
//! # Lifetime
//!
//! The CFG holds a reference to the function it was created from and must be
//! dropped before the function is mutated; analyses that outlive mutation
//! ([`PostDominatorTree`](crate::analysis::PostDominatorTree)) copy what they
//! need out of the view.

use crate::graph::{
    algorithms::{postorder, reverse_postorder},
    GraphBase, NodeId, Predecessors, RootedGraph, Successors,
};
use crate::ir::{BlockId, Function};

/// A control flow graph view over a [`Function`].
///
/// Successors come from block terminators; predecessors are computed once at
/// construction, an O(E) pass.
#[derive(Debug)]
pub struct FuncCfg<'a> {
    /// The function this view reads.
    func: &'a Function,
    /// Precomputed predecessor lists, indexed by block.
    predecessors: Vec<Vec<BlockId>>,
}

impl<'a> FuncCfg<'a> {
    /// Creates a CFG view of `func`.
    #[must_use]
    pub fn from_function(func: &'a Function) -> Self {
        let mut predecessors = vec![Vec::new(); func.block_count()];

        for block in func.blocks() {
            if let Some(term) = block.terminator() {
                for succ in term.successors() {
                    if succ.index() < func.block_count() {
                        predecessors[succ.index()].push(block.id());
                    }
                }
            }
        }

        Self { func, predecessors }
    }

    /// Returns the underlying function.
    #[must_use]
    pub const fn function(&self) -> &'a Function {
        self.func
    }

    /// Returns the number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.func.block_count()
    }

    /// Returns the successors of `block`, from its terminator.
    #[must_use]
    pub fn block_successors(&self, block: BlockId) -> Vec<BlockId> {
        self.func
            .get_block(block)
            .and_then(|b| b.terminator())
            .map(|t| t.successors())
            .unwrap_or_default()
    }

    /// Returns the predecessors of `block`.
    #[must_use]
    pub fn block_predecessors(&self, block: BlockId) -> &[BlockId] {
        self.predecessors
            .get(block.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Returns the exit blocks: blocks with no successors.
    #[must_use]
    pub fn exits(&self) -> Vec<BlockId> {
        self.func
            .blocks()
            .iter()
            .filter(|b| b.terminator().map_or(true, |t| t.successors().is_empty()))
            .map(|b| b.id())
            .collect()
    }

    /// Returns blocks in depth-first post-order from the entry.
    #[must_use]
    pub fn postorder(&self) -> Vec<BlockId> {
        postorder(self, self.entry())
            .into_iter()
            .map(|n| BlockId::new(n.index()))
            .collect()
    }

    /// Returns blocks in reverse post-order from the entry.
    #[must_use]
    pub fn reverse_postorder(&self) -> Vec<BlockId> {
        reverse_postorder(self, self.entry())
            .into_iter()
            .map(|n| BlockId::new(n.index()))
            .collect()
    }
}

impl GraphBase for FuncCfg<'_> {
    fn node_count(&self) -> usize {
        self.func.block_count()
    }
}

impl Successors for FuncCfg<'_> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.block_successors(BlockId::new(node.index()))
            .into_iter()
            .map(|b| NodeId::new(b.index()))
    }
}

impl Predecessors for FuncCfg<'_> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.block_predecessors(BlockId::new(node.index()))
            .iter()
            .map(|b| NodeId::new(b.index()))
    }
}

impl RootedGraph for FuncCfg<'_> {
    fn entry(&self) -> NodeId {
        NodeId::new(self.func.entry().index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FunctionBuilder;

    fn diamond() -> Function {
        let mut b = FunctionBuilder::new("diamond");
        let entry = b.block();
        let then_b = b.block();
        let else_b = b.block();
        let join = b.block();

        b.switch_to(entry);
        let c = b.const_bool(true);
        b.branch(c, then_b, else_b);

        b.switch_to(then_b);
        b.jump(join);

        b.switch_to(else_b);
        b.jump(join);

        b.switch_to(join);
        b.ret(None);

        b.finish()
    }

    #[test]
    fn test_cfg_successors_and_predecessors() {
        let func = diamond();
        let cfg = FuncCfg::from_function(&func);

        assert_eq!(cfg.block_count(), 4);
        assert_eq!(
            cfg.block_successors(BlockId::new(0)),
            vec![BlockId::new(1), BlockId::new(2)]
        );
        assert!(cfg.block_successors(BlockId::new(3)).is_empty());

        let preds = cfg.block_predecessors(BlockId::new(3));
        assert_eq!(preds.len(), 2);
        assert!(preds.contains(&BlockId::new(1)));
        assert!(preds.contains(&BlockId::new(2)));
    }

    #[test]
    fn test_cfg_exits() {
        let func = diamond();
        let cfg = FuncCfg::from_function(&func);
        assert_eq!(cfg.exits(), vec![BlockId::new(3)]);
    }

    #[test]
    fn test_cfg_orders() {
        let func = diamond();
        let cfg = FuncCfg::from_function(&func);

        let rpo = cfg.reverse_postorder();
        assert_eq!(rpo.len(), 4);
        assert_eq!(rpo[0], BlockId::new(0));
        assert_eq!(rpo[3], BlockId::new(3));

        let po = cfg.postorder();
        assert_eq!(po[0], BlockId::new(3));
        assert_eq!(po[3], BlockId::new(0));
    }
}
