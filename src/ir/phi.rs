//! Merge (phi) nodes.
//!
//! A merge node selects a value depending on which predecessor block control
//! arrived from. Merge nodes live at block entry, before any real instruction,
//! and are the one construct the linearization pipeline must eliminate: once a
//! region executes as a single straight line, "which predecessor ran" is no
//! longer encoded in control flow and has to be reconstructed from the
//! synthesized path masks instead.
//!
//! # Semantics
//!
//! A merge node `v3 = phi(v1 from b1, v2 from b2)` means:
//! - If control came from block b1, use value v1
//! - If control came from block b2, use value v2
//!
//! All merge nodes of a block are evaluated "simultaneously" at block entry,
//! before any real instructions execute.

use std::fmt;

use crate::ir::{BlockId, ValueId};

/// An operand of a merge node - a value coming from a specific predecessor block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhiOperand {
    /// The value selected when control arrives from `predecessor`.
    value: ValueId,
    /// The predecessor block from which this value comes.
    predecessor: BlockId,
}

impl PhiOperand {
    /// Creates a new merge-node operand.
    ///
    /// # Arguments
    ///
    /// * `value` - The value providing the result
    /// * `predecessor` - The block from which this value comes
    #[must_use]
    pub const fn new(value: ValueId, predecessor: BlockId) -> Self {
        Self { value, predecessor }
    }

    /// Returns the value providing the result.
    #[must_use]
    pub const fn value(&self) -> ValueId {
        self.value
    }

    /// Returns the predecessor block.
    #[must_use]
    pub const fn predecessor(&self) -> BlockId {
        self.predecessor
    }
}

impl fmt::Display for PhiOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {}", self.value, self.predecessor)
    }
}

/// A merge node at a control flow join point.
///
/// # Invariants
///
/// - Each merge node has one operand per predecessor of its block
/// - The result value is defined by this node
#[derive(Debug, Clone, PartialEq)]
pub struct PhiNode {
    /// The value defined by this merge node.
    result: ValueId,
    /// Operands from each predecessor block.
    operands: Vec<PhiOperand>,
}

impl PhiNode {
    /// Creates a new merge node with no operands.
    ///
    /// Operands are added as predecessor blocks are wired up.
    #[must_use]
    pub const fn new(result: ValueId) -> Self {
        Self {
            result,
            operands: Vec::new(),
        }
    }

    /// Creates a merge node with the given operands.
    #[must_use]
    pub fn with_operands(result: ValueId, operands: Vec<PhiOperand>) -> Self {
        Self { result, operands }
    }

    /// Returns the value defined by this merge node.
    #[must_use]
    pub const fn result(&self) -> ValueId {
        self.result
    }

    /// Returns the operands of this merge node.
    #[must_use]
    pub fn operands(&self) -> &[PhiOperand] {
        &self.operands
    }

    /// Adds an operand.
    pub fn add_operand(&mut self, operand: PhiOperand) {
        self.operands.push(operand);
    }

    /// Returns the number of operands.
    #[must_use]
    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }

    /// Returns `true` if this merge node has no operands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }

    /// Finds the operand coming from the specified predecessor block.
    #[must_use]
    pub fn operand_from(&self, predecessor: BlockId) -> Option<&PhiOperand> {
        self.operands
            .iter()
            .find(|op| op.predecessor == predecessor)
    }

    /// Returns all the values used by this merge node.
    pub fn used_values(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.operands.iter().map(|op| op.value)
    }

    /// Replaces every operand use of `old` with `new`.
    ///
    /// The result value is never rewritten.
    pub fn replace_uses(&mut self, old: ValueId, new: ValueId) {
        for op in &mut self.operands {
            if op.value == old {
                op.value = new;
            }
        }
    }
}

impl fmt::Display for PhiNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = phi(", self.result)?;
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{operand}")?;
        }
        write!(f, ")")
    }
}
