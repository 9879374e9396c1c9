//! Use index for value lookup.
//!
//! [`UseIndex`] answers "where is this value read?" for a whole function in
//! O(1) per query after a single O(N) build pass. The taint propagation walks
//! it forward: from a value to its users, from each user to the value that
//! user defines, and so on.
//!
//! The index is a read-only snapshot; rebuild it after mutating the function.

use std::collections::HashMap;

use crate::ir::{Function, ValueId};

/// Where a value is read: a block plus a position within it.
///
/// For instruction sites `index` is the instruction's position in the block's
/// instruction list; for merge-operand sites it is the merge node's position
/// in the block's phi list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseSite {
    /// The block containing the use.
    pub block: crate::ir::BlockId,
    /// Position within the block (instruction or phi index).
    pub index: usize,
    /// Whether this use is a merge-node operand.
    pub is_phi_operand: bool,
}

impl UseSite {
    /// Creates a use site for a regular instruction.
    #[must_use]
    pub const fn instruction(block: crate::ir::BlockId, index: usize) -> Self {
        Self {
            block,
            index,
            is_phi_operand: false,
        }
    }

    /// Creates a use site for a merge-node operand.
    #[must_use]
    pub const fn phi_operand(block: crate::ir::BlockId, index: usize) -> Self {
        Self {
            block,
            index,
            is_phi_operand: true,
        }
    }
}

/// Value → use-site index over a whole function.
#[derive(Debug, Default)]
pub struct UseIndex {
    uses: HashMap<ValueId, Vec<UseSite>>,
}

impl UseIndex {
    /// Builds the index for `func`.
    #[must_use]
    pub fn build(func: &Function) -> Self {
        let mut uses: HashMap<ValueId, Vec<UseSite>> = HashMap::new();

        for block in func.blocks() {
            for (p, phi) in block.phis().iter().enumerate() {
                for value in phi.used_values() {
                    uses.entry(value)
                        .or_default()
                        .push(UseSite::phi_operand(block.id(), p));
                }
            }
            for (i, op) in block.instructions().iter().enumerate() {
                for value in op.uses() {
                    uses.entry(value)
                        .or_default()
                        .push(UseSite::instruction(block.id(), i));
                }
            }
        }

        Self { uses }
    }

    /// Returns the use sites of `value`.
    #[must_use]
    pub fn uses_of(&self, value: ValueId) -> &[UseSite] {
        self.uses.get(&value).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if `value` has no uses.
    #[must_use]
    pub fn is_unused(&self, value: ValueId) -> bool {
        self.uses_of(value).is_empty()
    }

    /// Returns the value defined by the user at `site`, if that user defines one.
    ///
    /// A merge-operand site yields the merge node's result; an instruction
    /// site yields the instruction's destination.
    #[must_use]
    pub fn defined_at(&self, func: &Function, site: UseSite) -> Option<ValueId> {
        let block = func.get_block(site.block)?;
        if site.is_phi_operand {
            block.phis().get(site.index).map(|phi| phi.result())
        } else {
            block.instructions().get(site.index).and_then(|op| op.dest())
        }
    }
}
