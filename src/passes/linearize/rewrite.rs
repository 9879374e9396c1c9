//! The region rewrite: branch flattening and merge-to-select folding.
//!
//! Two independent consumers of the linear order and the mask table:
//!
//! - **Branch flattening** walks adjacent pairs of the linear order and
//!   replaces each block's terminator with an unconditional branch to the
//!   next block in the order. The original condition's control effect is
//!   discarded entirely; its data effect survives through the masks consumed
//!   by the select chains below, which run in the same pass.
//! - **Merge folding** rewrites each merge node in the region into a
//!   right-associated chain of selects keyed by the incoming-edge masks. A
//!   merge with an incoming edge that carries no mask (the path never
//!   crossed a secret-dependent branch) is left untouched: the selects
//!   inserted for it so far are unwound in reverse order and the pass moves
//!   on to the next merge; no other merge is affected.

use crate::ir::{BlockId, Function, Op, PhiOperand, ValueId};
use crate::passes::linearize::masks::MaskTable;
use crate::passes::{EventKind, PassContext};
use crate::{Error, Result};

/// Replaces terminators along the linear order with unconditional branches.
///
/// A terminator that already is an unconditional branch to exactly the next
/// block is left alone. The final block of the order keeps its terminator:
/// from the convergence point on, control flow is uniform regardless of the
/// secret.
///
/// Returns the number of terminators rewritten.
pub(crate) fn flatten_branches(
    func: &mut Function,
    order: &[BlockId],
    ctx: &mut PassContext,
) -> usize {
    let mut rewritten = 0;

    for pair in order.windows(2) {
        let (block, next) = (pair[0], pair[1]);
        if matches!(func.terminator(block), Some(Op::Jump { target }) if *target == next) {
            continue;
        }
        func.set_terminator(block, Op::Jump { target: next });
        ctx.events
            .record_with(EventKind::BranchFlattened, format!("{block} -> {next}"));
        rewritten += 1;
    }

    rewritten
}

/// Folds the merge nodes of every region block into select chains.
///
/// For a merge `phi((v0, p0), (v1, p1), ..., (vn, pn))` the chain starts at
/// `v0` and extends once per remaining operand: `select(mask(p_i, block),
/// v_i, previous)`. On success every use of the merge result is redirected to
/// the final select and the merge node is erased.
///
/// Returns the number of merges folded.
///
/// # Errors
///
/// Only with `strict` set: a merge whose incoming edge has no mask becomes
/// [`Error::MergeMaskMissing`] instead of a recorded skip.
pub(crate) fn fold_merges(
    func: &mut Function,
    order: &[BlockId],
    masks: &MaskTable,
    strict: bool,
    ctx: &mut PassContext,
) -> Result<usize> {
    let mut folded = 0;

    for &block in order {
        let results: Vec<ValueId> = func
            .block(block)
            .phis()
            .iter()
            .map(|phi| phi.result())
            .collect();

        for result in results {
            match fold_one(func, block, result, masks) {
                FoldOutcome::Folded => {
                    ctx.events
                        .record_with(EventKind::MergeFolded, format!("{} in {block}", func.describe(result)));
                    folded += 1;
                }
                FoldOutcome::NoMask(pred) => {
                    if strict {
                        return Err(Error::MergeMaskMissing {
                            block: block.to_string(),
                            message: format!(
                                "incoming edge {pred} -> {block} never crossed a critical branch"
                            ),
                        });
                    }
                    ctx.events.record_with(
                        EventKind::MergeSkipped,
                        format!(
                            "{} in {block}: no mask for edge {pred} -> {block}",
                            func.describe(result)
                        ),
                    );
                }
            }
        }
    }

    Ok(folded)
}

enum FoldOutcome {
    Folded,
    /// The predecessor whose edge carried no mask.
    NoMask(BlockId),
}

fn fold_one(
    func: &mut Function,
    block: BlockId,
    result: ValueId,
    masks: &MaskTable,
) -> FoldOutcome {
    let operands: Vec<PhiOperand> = func
        .block(block)
        .find_phi(result)
        .map(|phi| phi.operands().to_vec())
        .unwrap_or_default();

    let Some(first) = operands.first() else {
        return FoldOutcome::Folded;
    };

    let mut chain = first.value();
    let mut inserted: Vec<ValueId> = Vec::new();
    let mut position = 0;

    for operand in &operands[1..] {
        let Some(mask) = masks.edge_mask(operand.predecessor(), block) else {
            // Unwind everything this merge added, most recent first.
            for select in inserted.iter().rev() {
                func.erase_def(block, *select);
            }
            return FoldOutcome::NoMask(operand.predecessor());
        };

        let dest = func.alloc_value();
        let op = Op::Select {
            dest,
            condition: mask,
            if_true: operand.value(),
            if_false: chain,
        };
        // Chain order: each select right after the one before it, at the top
        // of the block where the merge result used to become available.
        if inserted.is_empty() {
            func.insert_at_top(block, op);
        } else {
            func.insert_after(block, position, op);
            position += 1;
        }
        inserted.push(dest);
        chain = dest;
    }

    func.replace_all_uses(result, chain);
    func.remove_phi(block, result);
    FoldOutcome::Folded
}
