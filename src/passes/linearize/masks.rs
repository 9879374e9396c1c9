//! Boolean path-mask synthesis.
//!
//! For every CFG edge inside the branch region, and for the entry of every
//! block in it, this stage builds a boolean value that is true iff control
//! reaches that edge or block under the original semantics. The merge rewrite
//! then keys its select chains off the edge masks; the original branch
//! conditions survive as data after their control effect is discarded.
//!
//! # Mask algebra
//!
//! Masks are boolean values combined only with AND/OR/NOT:
//!
//! - the entry mask of the first-visited start block is the *always-reached*
//!   placeholder (no instruction at all);
//! - a conditional branch with condition `P` out of a block with entry mask
//!   `E` gives its true edge `E AND P` and its false edge `E AND NOT P`
//!   (just `P` / `NOT P` when `E` is the placeholder);
//! - an unconditional branch propagates the entry mask unchanged to its
//!   successor edge;
//! - a block entered through several region edges gets the OR of their edge
//!   masks as its entry mask, accumulated edge by edge.
//!
//! All synthesized instructions are pure, so placement only has to respect
//! operand availability: NOT and AND go immediately before the branch they
//! derive from; an entry OR goes right after the mask it extends when that
//! mask lives in the same block, and at the very top of the block (after the
//! merge nodes) otherwise.
//!
//! When a block is re-entered through a new edge after its outgoing edge
//! masks were already built, those masks are stale: they bind the old entry
//! mask. Each is rebuilt from the updated entry mask, every use of the stale
//! instruction is redirected to the fresh one, and the dead remains are
//! erased, before the walk descends through that edge again.
//!
//! The walk mirrors the region traversal (same stop rule: stop at a block
//! that strictly post-dominates the reference start block and is not itself a
//! start block), but it stops *after* accumulating the convergence block's
//! entry mask. The entry of the convergence point is the OR over every path
//! into it, which is the last fact the region has to offer. No masks are
//! built beyond it: from there on, control flow no longer depends on the
//! secret.
//!
//! Switch and indirect branches are not decomposed into per-case masks; their
//! edges stay maskless and any merge fed through them is later skipped by the
//! merge rewrite.
//!
//! All walk state lives in a [`MaskBuilder`] threaded through the traversal;
//! there is no pass-owned mutable table.

use std::collections::{HashMap, HashSet};

use crate::analysis::PostDominatorTree;
use crate::ir::{BlockId, Function, Op, ValueId};

/// A directed region edge: `(fromBlock, toBlock)`, or `(None, toBlock)` for
/// the entry of `toBlock`.
pub(crate) type MaskEdge = (Option<BlockId>, BlockId);

/// A mask value: `None` is the always-reached placeholder.
pub(crate) type Mask = Option<ValueId>;

/// The edge → mask table produced by synthesis.
#[derive(Debug, Default)]
pub(crate) struct MaskTable {
    map: HashMap<MaskEdge, Mask>,
}

impl MaskTable {
    /// Returns the mask for an edge, if the edge was walked.
    pub(crate) fn get(&self, edge: MaskEdge) -> Option<Mask> {
        self.map.get(&edge).copied()
    }

    fn set(&mut self, edge: MaskEdge, mask: Mask) {
        self.map.insert(edge, mask);
    }

    fn contains(&self, edge: MaskEdge) -> bool {
        self.map.contains_key(&edge)
    }

    /// Returns the mask value for the edge `from → to`.
    ///
    /// `None` both when the edge was never walked and when its mask is the
    /// always-reached placeholder: a merge rewrite keyed on "which path ran"
    /// can use neither.
    pub(crate) fn edge_mask(&self, from: BlockId, to: BlockId) -> Option<ValueId> {
        self.get((Some(from), to)).flatten()
    }

    /// Returns the entry mask of `block`, if the block was walked.
    pub(crate) fn entry_mask(&self, block: BlockId) -> Option<Mask> {
        self.get((None, block))
    }

    /// Returns the number of table entries.
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    /// Iterates over all `(edge, mask)` entries in unspecified order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (MaskEdge, Mask)> + '_ {
        self.map.iter().map(|(e, m)| (*e, *m))
    }
}

/// One pending visit: entering `block` through the edge `from → block`
/// carrying that edge's mask.
struct WalkItem {
    from: Option<BlockId>,
    block: BlockId,
    carried: Mask,
}

/// Mask synthesis state, threaded through the region walk.
pub(crate) struct MaskBuilder<'a> {
    postdom: &'a PostDominatorTree,
    reference: BlockId,
    start_set: HashSet<BlockId>,
    table: MaskTable,
    /// Region edges already folded into their target's entry mask, with the
    /// mask value that was folded in. A later visit carrying a different
    /// value means the edge's mask was rebuilt upstream and the target's
    /// entry must swap the stale contribution for the fresh one.
    merged: HashMap<(BlockId, BlockId), Mask>,
    /// Values created by this builder (raw branch conditions reused as edge
    /// masks are not ours to erase).
    synthesized: HashSet<ValueId>,
    /// Number of instructions inserted.
    inserted: usize,
}

impl<'a> MaskBuilder<'a> {
    /// Runs mask synthesis for the region spanned by `start_blocks`.
    ///
    /// Returns the mask table and the number of instructions inserted into
    /// the function.
    pub(crate) fn build(
        func: &mut Function,
        postdom: &'a PostDominatorTree,
        start_blocks: &[BlockId],
    ) -> (MaskTable, usize) {
        let Some(&reference) = start_blocks.first() else {
            return (MaskTable::default(), 0);
        };

        let mut builder = MaskBuilder {
            postdom,
            reference,
            start_set: start_blocks.iter().copied().collect(),
            table: MaskTable::default(),
            merged: HashMap::new(),
            synthesized: HashSet::new(),
            inserted: 0,
        };

        for &start in start_blocks {
            if !builder.table.contains((None, start)) {
                builder.walk(
                    func,
                    WalkItem {
                        from: None,
                        block: start,
                        carried: None,
                    },
                );
            }
        }

        (builder.table, builder.inserted)
    }

    /// Pre-order walk from one start block, explicit stack.
    fn walk(&mut self, func: &mut Function, root: WalkItem) {
        let mut stack = vec![root];

        while let Some(item) = stack.pop() {
            let entry_changed = self.merge_entry(func, &item);
            if item.from.is_some() && !entry_changed {
                // Either this edge was folded in before, or it added nothing
                // new; every downstream mask is already up to date.
                continue;
            }

            let block = item.block;
            let converged = block != self.reference
                && self.postdom.dominates(block, self.reference)
                && !self.start_set.contains(&block);
            if converged {
                continue;
            }

            let entry = self.table.get((None, block)).flatten();
            let Some(term) = func.block(block).terminator().cloned() else {
                continue;
            };

            match term {
                Op::Branch {
                    condition,
                    true_target,
                    false_target,
                } => {
                    // False item first so the true subtree is walked first.
                    let mut pending = Vec::with_capacity(2);
                    for (succ, positive) in [(true_target, true), (false_target, false)] {
                        if let Some(carried) =
                            self.branch_edge(func, block, succ, condition, positive, entry, entry_changed)
                        {
                            pending.push(WalkItem {
                                from: Some(block),
                                block: succ,
                                carried,
                            });
                        }
                    }
                    stack.extend(pending.into_iter().rev());
                }
                Op::Jump { target } => {
                    let edge = (Some(block), target);
                    if !self.table.contains(edge) || entry_changed {
                        self.table.set(edge, entry);
                        stack.push(WalkItem {
                            from: Some(block),
                            block: target,
                            carried: entry,
                        });
                    }
                }
                // Switch and indirect-branch edges get no masks; returns end
                // the path.
                _ => {}
            }
        }
    }

    /// Folds the incoming edge of `item` into its block's entry mask.
    ///
    /// Returns `true` when the entry mask changed.
    fn merge_entry(&mut self, func: &mut Function, item: &WalkItem) -> bool {
        let entry_key = (None, item.block);

        let Some(from) = item.from else {
            // Directly entered start block: always reached.
            self.table.set(entry_key, None);
            return true;
        };

        let edge_key = (from, item.block);
        let Some(prev) = self.merged.get(&edge_key).copied() else {
            // First time this edge is folded in.
            self.merged.insert(edge_key, item.carried);
            return match self.table.get(entry_key) {
                None => {
                    self.table.set(entry_key, item.carried);
                    true
                }
                Some(None) => false,
                Some(Some(existing)) => match item.carried {
                    None => {
                        self.table.set(entry_key, None);
                        true
                    }
                    Some(edge_mask) => {
                        let or = self.insert_or(func, item.block, existing, edge_mask);
                        self.table.set(entry_key, Some(or));
                        true
                    }
                },
            };
        };

        if prev == item.carried {
            return false;
        }

        // The edge's mask was rebuilt upstream; swap the stale contribution.
        self.merged.insert(edge_key, item.carried);
        match (self.table.get(entry_key), prev, item.carried) {
            (Some(Some(entry_mask)), Some(stale), Some(_)) if entry_mask == stale => {
                // The entry aliased the old edge mask outright.
                self.table.set(entry_key, item.carried);
                true
            }
            (Some(Some(_)), Some(stale), Some(fresh)) => {
                // The entry is an OR chain; rewrite the stale operand where it
                // still appears (a use-redirect upstream may have fixed it
                // already, in which case this is a no-op).
                self.fix_or_operand(func, item.block, stale, fresh);
                false
            }
            _ => false,
        }
    }

    /// Rewrites `old` to `new` inside the entry-mask OR chain of `block`.
    fn fix_or_operand(&self, func: &mut Function, block: BlockId, old: ValueId, new: ValueId) {
        for op in func.block_mut(block).instructions_mut() {
            let is_entry_or = matches!(op, Op::Or { dest, .. } if self.synthesized.contains(dest));
            if is_entry_or {
                op.replace_uses(old, new);
            }
        }
    }

    /// Ensures the edge `block → succ` of a conditional branch has an
    /// up-to-date mask. Returns the mask to carry into `succ`, or `None`
    /// when the edge needs no (re)visit.
    #[allow(clippy::too_many_arguments)]
    fn branch_edge(
        &mut self,
        func: &mut Function,
        block: BlockId,
        succ: BlockId,
        condition: ValueId,
        positive: bool,
        entry: Option<ValueId>,
        entry_changed: bool,
    ) -> Option<Mask> {
        let edge = (Some(block), succ);
        let existing = self.table.get(edge);

        if existing.is_some() && !entry_changed {
            return None;
        }

        let term = if positive {
            condition
        } else {
            self.insert_not(func, block, condition)
        };
        let fresh = match entry {
            Some(entry_mask) => self.insert_and(func, block, succ, entry_mask, term),
            None => term,
        };

        if let Some(Some(old)) = existing {
            if old == fresh {
                return None;
            }
            self.replace_stale(func, old, fresh);
        }

        self.table.set(edge, Some(fresh));
        Some(Some(fresh))
    }

    /// Redirects every use of a stale mask to its rebuilt form and erases the
    /// dead remains.
    fn replace_stale(&mut self, func: &mut Function, old: ValueId, fresh: ValueId) {
        if !self.synthesized.contains(&old) {
            return;
        }
        func.replace_all_uses(old, fresh);

        let operands = func
            .find_def(old)
            .map(|(b, i)| func.block(b).instructions()[i].uses())
            .unwrap_or_default();
        if func.erase_if_dead(old) {
            self.synthesized.remove(&old);
            for operand in operands {
                if self.synthesized.contains(&operand) && func.erase_if_dead(operand) {
                    self.synthesized.remove(&operand);
                }
            }
        }
    }

    fn insert_not(&mut self, func: &mut Function, block: BlockId, condition: ValueId) -> ValueId {
        let name = format!("mask_not_{}", func.describe(condition));
        let dest = func.alloc_named_value(name);
        func.insert_before_terminator(
            block,
            Op::Not {
                dest,
                operand: condition,
            },
        );
        self.synthesized.insert(dest);
        self.inserted += 1;
        dest
    }

    fn insert_and(
        &mut self,
        func: &mut Function,
        block: BlockId,
        succ: BlockId,
        left: ValueId,
        right: ValueId,
    ) -> ValueId {
        let dest = func.alloc_named_value(format!("mask_{block}_{succ}"));
        func.insert_before_terminator(block, Op::And { dest, left, right });
        self.synthesized.insert(dest);
        self.inserted += 1;
        dest
    }

    /// Extends `block`'s entry mask with a new edge mask.
    ///
    /// The OR goes right after the existing mask's defining instruction when
    /// that instruction lives in `block`, and at the very top of the block
    /// (after the merge nodes) otherwise.
    fn insert_or(
        &mut self,
        func: &mut Function,
        block: BlockId,
        existing: ValueId,
        edge_mask: ValueId,
    ) -> ValueId {
        let dest = func.alloc_named_value(format!("mask_{block}"));
        let op = Op::Or {
            dest,
            left: existing,
            right: edge_mask,
        };
        match func.find_def(existing) {
            Some((def_block, idx)) if def_block == block => func.insert_after(block, idx, op),
            _ => func.insert_at_top(block, op),
        }
        self.synthesized.insert(dest);
        self.inserted += 1;
        dest
    }
}
