//! Linear ordering of the branch region.
//!
//! Given the blocks that branch on tainted data (the start blocks) and the
//! post-dominance oracle, computes a linear order over every block reachable
//! between the start blocks and their common convergence point. The order is
//! what the branch rewrite threads the region onto: each block ends up jumping
//! unconditionally to the next one in the order.
//!
//! # Algorithm
//!
//! Depth-first traversal of successors from each unvisited start block, with
//! one stop rule: a block that strictly post-dominates the reference start
//! block (and is not itself a start block) terminates the walk down that
//! path and is emitted first, closest to convergence. Start blocks are
//! exempt so degenerate single-branch regions keep being explored rather than
//! cut off at their own branch.
//!
//! Blocks are emitted in DFS post-order (a block only after all of its
//! successors), and the accumulated list is reversed at the end, yielding a
//! topological order with the convergence block last. A global visited set
//! spans all start blocks so a block reachable from two of them appears
//! exactly once.
//!
//! The traversal is iterative with an explicit frame stack; region depth is
//! bounded by heap, not the call stack.
//!
//! # Limitations
//!
//! The order is only guaranteed topological for reducible regions. Branches
//! compiled from structured source (`if`/`else`) always produce those;
//! irreducible flow yields a best-effort order.

use std::collections::HashSet;

use crate::analysis::{FuncCfg, PostDominatorTree};
use crate::ir::BlockId;

/// One in-flight DFS visit.
struct Frame {
    block: BlockId,
    successors: Vec<BlockId>,
    next: usize,
}

/// Computes the linear block order for the region spanned by `start_blocks`.
///
/// The first start block is the reference for the post-dominance stop rule.
/// Returns the region's blocks, predecessors before successors, convergence
/// block last.
#[must_use]
pub(crate) fn linear_order(
    cfg: &FuncCfg<'_>,
    postdom: &PostDominatorTree,
    start_blocks: &[BlockId],
) -> Vec<BlockId> {
    let Some(&reference) = start_blocks.first() else {
        return Vec::new();
    };
    let start_set: HashSet<BlockId> = start_blocks.iter().copied().collect();

    let mut visited: HashSet<BlockId> = HashSet::new();
    let mut order: Vec<BlockId> = Vec::new();

    for &start in start_blocks {
        if visited.contains(&start) {
            continue;
        }
        visit_from(
            cfg,
            postdom,
            reference,
            &start_set,
            start,
            &mut visited,
            &mut order,
        );
    }

    order.reverse();
    order
}

/// Emits `block` immediately when the stop rule applies, otherwise pushes a
/// DFS frame for it. Returns `true` when a frame was pushed.
fn enter(
    cfg: &FuncCfg<'_>,
    postdom: &PostDominatorTree,
    reference: BlockId,
    start_set: &HashSet<BlockId>,
    block: BlockId,
    visited: &mut HashSet<BlockId>,
    order: &mut Vec<BlockId>,
    stack: &mut Vec<Frame>,
) -> bool {
    visited.insert(block);

    let converged = block != reference
        && postdom.dominates(block, reference)
        && !start_set.contains(&block);
    if converged {
        order.push(block);
        return false;
    }

    stack.push(Frame {
        block,
        successors: cfg.block_successors(block),
        next: 0,
    });
    true
}

fn visit_from(
    cfg: &FuncCfg<'_>,
    postdom: &PostDominatorTree,
    reference: BlockId,
    start_set: &HashSet<BlockId>,
    start: BlockId,
    visited: &mut HashSet<BlockId>,
    order: &mut Vec<BlockId>,
) {
    let mut stack: Vec<Frame> = Vec::new();
    enter(
        cfg, postdom, reference, start_set, start, visited, order, &mut stack,
    );

    while let Some(frame) = stack.last_mut() {
        if frame.next < frame.successors.len() {
            let succ = frame.successors[frame.next];
            frame.next += 1;
            if !visited.contains(&succ) {
                enter(
                    cfg, postdom, reference, start_set, succ, visited, order, &mut stack,
                );
            }
        } else {
            order.push(frame.block);
            stack.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, FunctionBuilder};

    fn position(order: &[BlockId], block: BlockId) -> usize {
        order
            .iter()
            .position(|b| *b == block)
            .unwrap_or_else(|| panic!("{block} missing from order"))
    }

    /// entry branches to then/else, both jump to join, join returns.
    fn diamond() -> (Function, [BlockId; 4]) {
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

        (fb.finish(), [entry, then_b, else_b, join])
    }

    #[test]
    fn test_linear_order_diamond() {
        let (func, [entry, then_b, else_b, join]) = diamond();
        let cfg = FuncCfg::from_function(&func);
        let postdom = PostDominatorTree::compute(&cfg);

        let order = linear_order(&cfg, &postdom, &[entry]);

        assert_eq!(order.len(), 4);
        assert_eq!(order[0], entry);
        assert_eq!(order[3], join);
        // both arms are strictly between the branch and the convergence
        assert!(position(&order, then_b) > 0 && position(&order, then_b) < 3);
        assert!(position(&order, else_b) > 0 && position(&order, else_b) < 3);
    }

    #[test]
    fn test_linear_order_respects_edges() {
        // entry -> {a, b}; a -> {c, d}; b, c, d -> join
        let mut fb = FunctionBuilder::new("nested");
        let entry = fb.block();
        let a = fb.block();
        let b = fb.block();
        let c = fb.block();
        let d = fb.block();
        let join = fb.block();

        fb.switch_to(entry);
        let c1 = fb.const_bool(true);
        fb.branch(c1, a, b);
        fb.switch_to(a);
        let c2 = fb.const_bool(false);
        fb.branch(c2, c, d);
        fb.switch_to(b);
        fb.jump(join);
        fb.switch_to(c);
        fb.jump(join);
        fb.switch_to(d);
        fb.jump(join);
        fb.switch_to(join);
        fb.ret(None);

        let func = fb.finish();
        let cfg = FuncCfg::from_function(&func);
        let postdom = PostDominatorTree::compute(&cfg);

        let order = linear_order(&cfg, &postdom, &[entry, a]);

        assert_eq!(order.len(), 6);
        assert_eq!(order[0], entry);
        assert_eq!(order[5], join);
        // every region edge goes forward in the order
        for (from, to) in [(entry, a), (entry, b), (a, c), (a, d)] {
            assert!(
                position(&order, from) < position(&order, to),
                "{from} must precede {to}"
            );
        }
    }

    #[test]
    fn test_linear_order_visits_shared_blocks_once() {
        // two start blocks reaching the same convergence
        let (func, [entry, then_b, else_b, join]) = diamond();
        let cfg = FuncCfg::from_function(&func);
        let postdom = PostDominatorTree::compute(&cfg);

        // then_b is (artificially) also a start block
        let order = linear_order(&cfg, &postdom, &[entry, then_b]);

        assert_eq!(order.len(), 4);
        let mut sorted: Vec<_> = order.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 4, "no block may appear twice");
        assert!(order.contains(&else_b));
        assert!(order.contains(&join));
        assert_eq!(order[0], entry);
    }

    #[test]
    fn test_linear_order_empty_starts() {
        let (func, _) = diamond();
        let cfg = FuncCfg::from_function(&func);
        let postdom = PostDominatorTree::compute(&cfg);
        assert!(linear_order(&cfg, &postdom, &[]).is_empty());
    }

    #[test]
    fn test_linear_order_stops_at_convergence() {
        // join has a successor beyond the region; it must not be pulled in
        let mut fb = FunctionBuilder::new("tail");
        let entry = fb.block();
        let then_b = fb.block();
        let else_b = fb.block();
        let join = fb.block();
        let tail = fb.block();

        fb.switch_to(entry);
        let c = fb.const_bool(true);
        fb.branch(c, then_b, else_b);
        fb.switch_to(then_b);
        fb.jump(join);
        fb.switch_to(else_b);
        fb.jump(join);
        fb.switch_to(join);
        fb.jump(tail);
        fb.switch_to(tail);
        fb.ret(None);

        let func = fb.finish();
        let cfg = FuncCfg::from_function(&func);
        let postdom = PostDominatorTree::compute(&cfg);

        let order = linear_order(&cfg, &postdom, &[entry]);

        assert_eq!(order.len(), 4);
        assert!(!order.contains(&tail));
        assert_eq!(order[3], join);
    }
}
