//! The instruction set.
//!
//! This module defines [`Op`], the tagged-variant instruction representation in
//! `result = op(operands)` form. The variant set is deliberately small and closed:
//! the linearization pipeline matches on it exhaustively instead of downcasting
//! through an open instruction hierarchy.
//!
//! # Operation Categories
//!
//! - **Constants**: Load constant values
//! - **Arithmetic/logical**: Binary and unary operations over integers and booleans
//! - **Comparison**: Equality and relational comparisons
//! - **Memory**: Address-of-local, load, store
//! - **Annotation**: The secret-source marker attached to a variable's address
//! - **Selection**: Branchless select between two values
//! - **Calls**: Opaque calls into other functions
//! - **Terminators**: Jump, conditional branch, switch, indirect branch, return
//!
//! # Field Documentation
//!
//! The struct fields in this module follow a consistent naming convention:
//! - `dest`: The destination value for the operation result
//! - `left`, `right`: Binary operands (left and right hand side)
//! - `operand`: Unary operand
//! - `value`: A value being stored or scrutinized
//! - `addr`: Address for memory operations
//! - `target`, `true_target`, `false_target`: Branch targets (blocks)

use std::fmt;

use crate::ir::{BlockId, ConstValue, ValueId};

/// A single operation.
///
/// Each variant represents one operation with explicit inputs and outputs.
/// Operands are values; control-flow targets are blocks.
///
/// # Conventions
///
/// - Operations that produce a result carry a `dest` value
/// - Terminators appear only as the last instruction of a block
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Load a constant value: `dest = const value`
    Const {
        /// Result value.
        dest: ValueId,
        /// The constant.
        value: ConstValue,
    },

    /// Addition: `dest = left + right`
    Add {
        /// Result value.
        dest: ValueId,
        /// Left operand.
        left: ValueId,
        /// Right operand.
        right: ValueId,
    },

    /// Subtraction: `dest = left - right`
    Sub {
        /// Result value.
        dest: ValueId,
        /// Left operand.
        left: ValueId,
        /// Right operand.
        right: ValueId,
    },

    /// Multiplication: `dest = left * right`
    Mul {
        /// Result value.
        dest: ValueId,
        /// Left operand.
        left: ValueId,
        /// Right operand.
        right: ValueId,
    },

    /// Bitwise/logical AND: `dest = left & right`
    And {
        /// Result value.
        dest: ValueId,
        /// Left operand.
        left: ValueId,
        /// Right operand.
        right: ValueId,
    },

    /// Bitwise/logical OR: `dest = left | right`
    Or {
        /// Result value.
        dest: ValueId,
        /// Left operand.
        left: ValueId,
        /// Right operand.
        right: ValueId,
    },

    /// Bitwise XOR: `dest = left ^ right`
    Xor {
        /// Result value.
        dest: ValueId,
        /// Left operand.
        left: ValueId,
        /// Right operand.
        right: ValueId,
    },

    /// Bitwise/logical NOT: `dest = !operand`
    Not {
        /// Result value.
        dest: ValueId,
        /// Operand.
        operand: ValueId,
    },

    /// Shift left: `dest = value << amount`
    Shl {
        /// Result value.
        dest: ValueId,
        /// Value being shifted.
        value: ValueId,
        /// Shift amount.
        amount: ValueId,
    },

    /// Shift right: `dest = value >> amount`
    Shr {
        /// Result value.
        dest: ValueId,
        /// Value being shifted.
        value: ValueId,
        /// Shift amount.
        amount: ValueId,
    },

    /// Compare equal: `dest = (left == right)`
    Ceq {
        /// Result value (boolean).
        dest: ValueId,
        /// Left operand.
        left: ValueId,
        /// Right operand.
        right: ValueId,
    },

    /// Compare less than: `dest = (left < right)`
    Clt {
        /// Result value (boolean).
        dest: ValueId,
        /// Left operand.
        left: ValueId,
        /// Right operand.
        right: ValueId,
    },

    /// Compare greater than: `dest = (left > right)`
    Cgt {
        /// Result value (boolean).
        dest: ValueId,
        /// Left operand.
        left: ValueId,
        /// Right operand.
        right: ValueId,
    },

    /// Copy value: `dest = src`
    Copy {
        /// Result value.
        dest: ValueId,
        /// Source value.
        src: ValueId,
    },

    /// Load the address of a local slot: `dest = &localN`
    LocalAddr {
        /// Result value (the address).
        dest: ValueId,
        /// Local slot index.
        local: u16,
    },

    /// Load through an address: `dest = *addr`
    Load {
        /// Result value.
        dest: ValueId,
        /// Address to read.
        addr: ValueId,
    },

    /// Store through an address: `*addr = value`
    Store {
        /// Address to write.
        addr: ValueId,
        /// Value being stored.
        value: ValueId,
    },

    /// Marks the variable behind `ptr` as a secret input.
    ///
    /// `ptr` must be the result of an instruction whose operand names the
    /// annotated variable's address; taint analysis recovers the variable by
    /// looking through that one level of indirection.
    Annotate {
        /// Pointer to the annotated variable.
        ptr: ValueId,
    },

    /// Branchless select: `dest = condition ? if_true : if_false`
    Select {
        /// Result value.
        dest: ValueId,
        /// Boolean selector.
        condition: ValueId,
        /// Value produced when the condition holds.
        if_true: ValueId,
        /// Value produced otherwise.
        if_false: ValueId,
    },

    /// Opaque call: `dest = callee(args...)`
    Call {
        /// Result value, if the callee returns one.
        dest: Option<ValueId>,
        /// Callee name.
        callee: String,
        /// Argument values.
        args: Vec<ValueId>,
    },

    /// Unconditional jump to a block.
    Jump {
        /// Target block.
        target: BlockId,
    },

    /// Conditional branch: if condition is true, go to `true_target`, else `false_target`.
    Branch {
        /// Boolean condition.
        condition: ValueId,
        /// Block taken when the condition holds.
        true_target: BlockId,
        /// Block taken otherwise.
        false_target: BlockId,
    },

    /// Switch: jump to `targets[value]`, or `default` if out of range.
    Switch {
        /// Scrutinized value.
        value: ValueId,
        /// Case targets.
        targets: Vec<BlockId>,
        /// Default target.
        default: BlockId,
    },

    /// Indirect branch through a computed address, restricted to the listed targets.
    IndirectBr {
        /// Computed target address.
        address: ValueId,
        /// Possible target blocks.
        targets: Vec<BlockId>,
    },

    /// Return from the function with an optional value.
    Return {
        /// Returned value, if any.
        value: Option<ValueId>,
    },
}

impl Op {
    /// Returns the destination value if this operation produces one.
    #[must_use]
    pub fn dest(&self) -> Option<ValueId> {
        match self {
            Self::Const { dest, .. }
            | Self::Add { dest, .. }
            | Self::Sub { dest, .. }
            | Self::Mul { dest, .. }
            | Self::And { dest, .. }
            | Self::Or { dest, .. }
            | Self::Xor { dest, .. }
            | Self::Not { dest, .. }
            | Self::Shl { dest, .. }
            | Self::Shr { dest, .. }
            | Self::Ceq { dest, .. }
            | Self::Clt { dest, .. }
            | Self::Cgt { dest, .. }
            | Self::Copy { dest, .. }
            | Self::LocalAddr { dest, .. }
            | Self::Load { dest, .. }
            | Self::Select { dest, .. } => Some(*dest),

            Self::Call { dest, .. } => *dest,

            Self::Store { .. }
            | Self::Annotate { .. }
            | Self::Jump { .. }
            | Self::Branch { .. }
            | Self::Switch { .. }
            | Self::IndirectBr { .. }
            | Self::Return { .. } => None,
        }
    }

    /// Returns all values used by this operation.
    #[must_use]
    pub fn uses(&self) -> Vec<ValueId> {
        match self {
            Self::Const { .. } | Self::LocalAddr { .. } | Self::Jump { .. } => vec![],

            Self::Add { left, right, .. }
            | Self::Sub { left, right, .. }
            | Self::Mul { left, right, .. }
            | Self::And { left, right, .. }
            | Self::Or { left, right, .. }
            | Self::Xor { left, right, .. }
            | Self::Ceq { left, right, .. }
            | Self::Clt { left, right, .. }
            | Self::Cgt { left, right, .. } => vec![*left, *right],

            Self::Shl { value, amount, .. } | Self::Shr { value, amount, .. } => {
                vec![*value, *amount]
            }

            Self::Not { operand, .. } => vec![*operand],
            Self::Copy { src, .. } => vec![*src],

            Self::Load { addr, .. } => vec![*addr],
            Self::Store { addr, value } => vec![*addr, *value],
            Self::Annotate { ptr } => vec![*ptr],

            Self::Select {
                condition,
                if_true,
                if_false,
                ..
            } => vec![*condition, *if_true, *if_false],

            Self::Call { args, .. } => args.clone(),

            Self::Branch { condition, .. } => vec![*condition],
            Self::Switch { value, .. } => vec![*value],
            Self::IndirectBr { address, .. } => vec![*address],
            Self::Return { value } => value.iter().copied().collect(),
        }
    }

    /// Replaces every use of `old` with `new` in this operation's operands.
    ///
    /// The destination is never rewritten.
    pub fn replace_uses(&mut self, old: ValueId, new: ValueId) {
        let swap = |v: &mut ValueId| {
            if *v == old {
                *v = new;
            }
        };

        match self {
            Self::Const { .. } | Self::LocalAddr { .. } | Self::Jump { .. } => {}

            Self::Add { left, right, .. }
            | Self::Sub { left, right, .. }
            | Self::Mul { left, right, .. }
            | Self::And { left, right, .. }
            | Self::Or { left, right, .. }
            | Self::Xor { left, right, .. }
            | Self::Ceq { left, right, .. }
            | Self::Clt { left, right, .. }
            | Self::Cgt { left, right, .. } => {
                swap(left);
                swap(right);
            }

            Self::Shl { value, amount, .. } | Self::Shr { value, amount, .. } => {
                swap(value);
                swap(amount);
            }

            Self::Not { operand, .. } => swap(operand),
            Self::Copy { src, .. } => swap(src),

            Self::Load { addr, .. } => swap(addr),
            Self::Store { addr, value } => {
                swap(addr);
                swap(value);
            }
            Self::Annotate { ptr } => swap(ptr),

            Self::Select {
                condition,
                if_true,
                if_false,
                ..
            } => {
                swap(condition);
                swap(if_true);
                swap(if_false);
            }

            Self::Call { args, .. } => args.iter_mut().for_each(swap),

            Self::Branch { condition, .. } => swap(condition),
            Self::Switch { value, .. } => swap(value),
            Self::IndirectBr { address, .. } => swap(address),
            Self::Return { value } => {
                if let Some(v) = value {
                    swap(v);
                }
            }
        }
    }

    /// Returns `true` if this operation is a terminator (ends a basic block).
    #[must_use]
    pub const fn is_terminator(&self) -> bool {
        matches!(
            self,
            Self::Jump { .. }
                | Self::Branch { .. }
                | Self::Switch { .. }
                | Self::IndirectBr { .. }
                | Self::Return { .. }
        )
    }

    /// Returns `true` if this is a branch-family terminator whose outcome
    /// depends on a value: a conditional branch, a switch, or an indirect branch.
    ///
    /// Unconditional jumps and returns are not in this family.
    #[must_use]
    pub const fn is_branch(&self) -> bool {
        matches!(
            self,
            Self::Branch { .. } | Self::Switch { .. } | Self::IndirectBr { .. }
        )
    }

    /// Returns the value that decides a branch-family terminator's outcome:
    /// the branch condition, the switch scrutinee, or the indirect-branch address.
    #[must_use]
    pub const fn branch_operand(&self) -> Option<ValueId> {
        match self {
            Self::Branch { condition, .. } => Some(*condition),
            Self::Switch { value, .. } => Some(*value),
            Self::IndirectBr { address, .. } => Some(*address),
            _ => None,
        }
    }

    /// Returns the successor blocks of a terminator; empty for non-terminators
    /// and returns.
    #[must_use]
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Self::Jump { target } => vec![*target],
            Self::Branch {
                true_target,
                false_target,
                ..
            } => vec![*true_target, *false_target],
            Self::Switch {
                targets, default, ..
            } => {
                let mut succs = targets.clone();
                succs.push(*default);
                succs
            }
            Self::IndirectBr { targets, .. } => targets.clone(),
            _ => vec![],
        }
    }

    /// Returns `true` if this operation is pure (has no side effects).
    ///
    /// Pure operations can be erased when their result is unused. All of the
    /// boolean mask instructions the transformation synthesizes are pure.
    #[must_use]
    pub const fn is_pure(&self) -> bool {
        matches!(
            self,
            Self::Const { .. }
                | Self::Add { .. }
                | Self::Sub { .. }
                | Self::Mul { .. }
                | Self::And { .. }
                | Self::Or { .. }
                | Self::Xor { .. }
                | Self::Not { .. }
                | Self::Shl { .. }
                | Self::Shr { .. }
                | Self::Ceq { .. }
                | Self::Clt { .. }
                | Self::Cgt { .. }
                | Self::Copy { .. }
                | Self::LocalAddr { .. }
                | Self::Select { .. }
        )
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const { dest, value } => write!(f, "{dest} = {value}"),
            Self::Add { dest, left, right } => write!(f, "{dest} = add {left}, {right}"),
            Self::Sub { dest, left, right } => write!(f, "{dest} = sub {left}, {right}"),
            Self::Mul { dest, left, right } => write!(f, "{dest} = mul {left}, {right}"),
            Self::And { dest, left, right } => write!(f, "{dest} = and {left}, {right}"),
            Self::Or { dest, left, right } => write!(f, "{dest} = or {left}, {right}"),
            Self::Xor { dest, left, right } => write!(f, "{dest} = xor {left}, {right}"),
            Self::Not { dest, operand } => write!(f, "{dest} = not {operand}"),
            Self::Shl {
                dest,
                value,
                amount,
            } => write!(f, "{dest} = shl {value}, {amount}"),
            Self::Shr {
                dest,
                value,
                amount,
            } => write!(f, "{dest} = shr {value}, {amount}"),
            Self::Ceq { dest, left, right } => write!(f, "{dest} = ceq {left}, {right}"),
            Self::Clt { dest, left, right } => write!(f, "{dest} = clt {left}, {right}"),
            Self::Cgt { dest, left, right } => write!(f, "{dest} = cgt {left}, {right}"),
            Self::Copy { dest, src } => write!(f, "{dest} = {src}"),
            Self::LocalAddr { dest, local } => write!(f, "{dest} = &loc{local}"),
            Self::Load { dest, addr } => write!(f, "{dest} = load {addr}"),
            Self::Store { addr, value } => write!(f, "store {addr}, {value}"),
            Self::Annotate { ptr } => write!(f, "annotate {ptr}"),
            Self::Select {
                dest,
                condition,
                if_true,
                if_false,
            } => write!(f, "{dest} = select {condition}, {if_true}, {if_false}"),
            Self::Call { dest, callee, args } => {
                if let Some(d) = dest {
                    write!(f, "{d} = ")?;
                }
                write!(f, "call {callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Self::Jump { target } => write!(f, "jump {target}"),
            Self::Branch {
                condition,
                true_target,
                false_target,
            } => write!(f, "branch {condition}, {true_target}, {false_target}"),
            Self::Switch {
                value,
                targets,
                default,
            } => {
                write!(f, "switch {value}, [")?;
                for (i, t) in targets.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, "], {default}")
            }
            Self::IndirectBr { address, targets } => {
                write!(f, "indirectbr {address}, [")?;
                for (i, t) in targets.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, "]")
            }
            Self::Return { value: Some(v) } => write!(f, "ret {v}"),
            Self::Return { value: None } => write!(f, "ret"),
        }
    }
}
