//! Convenience builder for constructing function bodies.
//!
//! The builder keeps a current block and appends instructions to it, handing
//! back the result values. It exists for tests, benches, and frontends that
//! produce this IR; the transformation itself only ever consumes a finished
//! [`Function`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use flatline::ir::FunctionBuilder;
//!
//! let mut b = FunctionBuilder::new("example");
//! let entry = b.block();
//! let exit = b.block();
//!
//! b.switch_to(entry);
//! let x = b.const_i32(7);
//! b.jump(exit);
//!
//! b.switch_to(exit);
//! b.ret(Some(x));
//!
//! let func = b.finish();
//! ```

use crate::ir::{BlockId, ConstValue, Function, Op, PhiNode, PhiOperand, ValueId};

/// Builds a [`Function`] block by block.
#[derive(Debug)]
pub struct FunctionBuilder {
    /// The function under construction.
    func: Function,

    /// Block new instructions are appended to.
    current: Option<BlockId>,
}

impl FunctionBuilder {
    /// Creates a builder for a new function.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            func: Function::new(name),
            current: None,
        }
    }

    /// Adds a new empty block and returns its identifier.
    ///
    /// The first block added becomes the entry block.
    pub fn block(&mut self) -> BlockId {
        self.func.add_block()
    }

    /// Makes `block` the target of subsequent instruction appends.
    pub fn switch_to(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    /// Returns the finished function.
    ///
    /// # Panics
    ///
    /// Panics if any block is missing a terminator; the builder refuses to
    /// hand out a malformed function.
    #[must_use]
    pub fn finish(self) -> Function {
        for block in self.func.blocks() {
            assert!(
                block.terminator().is_some(),
                "block {} has no terminator",
                block.id()
            );
        }
        self.func
    }

    fn current(&self) -> BlockId {
        self.current.expect("no current block; call switch_to first")
    }

    /// Appends a raw instruction to the current block.
    pub fn ins(&mut self, op: Op) {
        let block = self.current();
        self.func.block_mut(block).push(op);
    }

    /// Appends a constant load and returns its value.
    pub fn constant(&mut self, value: ConstValue) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Const { dest, value });
        dest
    }

    /// Appends a 32-bit integer constant.
    pub fn const_i32(&mut self, value: i32) -> ValueId {
        self.constant(ConstValue::I32(value))
    }

    /// Appends a boolean constant.
    pub fn const_bool(&mut self, value: bool) -> ValueId {
        self.constant(ConstValue::from_bool(value))
    }

    /// Appends an addition.
    pub fn add(&mut self, left: ValueId, right: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Add { dest, left, right });
        dest
    }

    /// Appends a subtraction.
    pub fn sub(&mut self, left: ValueId, right: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Sub { dest, left, right });
        dest
    }

    /// Appends a multiplication.
    pub fn mul(&mut self, left: ValueId, right: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Mul { dest, left, right });
        dest
    }

    /// Appends a bitwise/logical AND.
    pub fn and(&mut self, left: ValueId, right: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::And { dest, left, right });
        dest
    }

    /// Appends a bitwise/logical OR.
    pub fn or(&mut self, left: ValueId, right: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Or { dest, left, right });
        dest
    }

    /// Appends a left shift.
    pub fn shl(&mut self, value: ValueId, amount: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Shl {
            dest,
            value,
            amount,
        });
        dest
    }

    /// Appends a right shift.
    pub fn shr(&mut self, value: ValueId, amount: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Shr {
            dest,
            value,
            amount,
        });
        dest
    }

    /// Appends a bitwise XOR.
    pub fn xor(&mut self, left: ValueId, right: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Xor { dest, left, right });
        dest
    }

    /// Appends a bitwise/logical NOT.
    pub fn not(&mut self, operand: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Not { dest, operand });
        dest
    }

    /// Appends an equality comparison.
    pub fn ceq(&mut self, left: ValueId, right: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Ceq { dest, left, right });
        dest
    }

    /// Appends a less-than comparison.
    pub fn clt(&mut self, left: ValueId, right: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Clt { dest, left, right });
        dest
    }

    /// Appends a greater-than comparison.
    pub fn cgt(&mut self, left: ValueId, right: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Cgt { dest, left, right });
        dest
    }

    /// Appends a copy.
    pub fn copy(&mut self, src: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Copy { dest, src });
        dest
    }

    /// Appends an address-of-local.
    pub fn local_addr(&mut self, local: u16) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::LocalAddr { dest, local });
        dest
    }

    /// Appends a load through an address.
    pub fn load(&mut self, addr: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Load { dest, addr });
        dest
    }

    /// Appends a store through an address.
    pub fn store(&mut self, addr: ValueId, value: ValueId) {
        self.ins(Op::Store { addr, value });
    }

    /// Appends a secret-source annotation on `ptr`.
    pub fn annotate(&mut self, ptr: ValueId) {
        self.ins(Op::Annotate { ptr });
    }

    /// Appends a select.
    pub fn select(&mut self, condition: ValueId, if_true: ValueId, if_false: ValueId) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Select {
            dest,
            condition,
            if_true,
            if_false,
        });
        dest
    }

    /// Appends a call returning a value.
    pub fn call(&mut self, callee: impl Into<String>, args: Vec<ValueId>) -> ValueId {
        let dest = self.func.alloc_value();
        self.ins(Op::Call {
            dest: Some(dest),
            callee: callee.into(),
            args,
        });
        dest
    }

    /// Appends an unconditional jump terminator.
    pub fn jump(&mut self, target: BlockId) {
        self.ins(Op::Jump { target });
    }

    /// Appends a conditional branch terminator.
    pub fn branch(&mut self, condition: ValueId, true_target: BlockId, false_target: BlockId) {
        self.ins(Op::Branch {
            condition,
            true_target,
            false_target,
        });
    }

    /// Appends a switch terminator.
    pub fn switch(&mut self, value: ValueId, targets: Vec<BlockId>, default: BlockId) {
        self.ins(Op::Switch {
            value,
            targets,
            default,
        });
    }

    /// Appends an indirect-branch terminator.
    pub fn indirect_br(&mut self, address: ValueId, targets: Vec<BlockId>) {
        self.ins(Op::IndirectBr { address, targets });
    }

    /// Appends a return terminator.
    pub fn ret(&mut self, value: Option<ValueId>) {
        self.ins(Op::Return { value });
    }

    /// Adds a merge node to the current block and returns its result value.
    pub fn phi(&mut self, incoming: &[(ValueId, BlockId)]) -> ValueId {
        let result = self.func.alloc_value();
        let operands = incoming
            .iter()
            .map(|&(value, pred)| PhiOperand::new(value, pred))
            .collect();
        let block = self.current();
        self.func
            .block_mut(block)
            .add_phi(PhiNode::with_operands(result, operands));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_straight_line() {
        let mut b = FunctionBuilder::new("straight");
        let entry = b.block();
        b.switch_to(entry);
        let x = b.const_i32(2);
        let y = b.const_i32(3);
        let sum = b.add(x, y);
        b.ret(Some(sum));

        let func = b.finish();
        assert_eq!(func.block_count(), 1);
        assert_eq!(func.value_count(), 3);
        assert!(func.terminator(entry).is_some());
    }

    #[test]
    fn test_builder_diamond() {
        let mut b = FunctionBuilder::new("diamond");
        let entry = b.block();
        let then_b = b.block();
        let else_b = b.block();
        let join = b.block();

        b.switch_to(entry);
        let x = b.const_i32(1);
        let zero = b.const_i32(0);
        let cond = b.cgt(x, zero);
        b.branch(cond, then_b, else_b);

        b.switch_to(then_b);
        let t = b.const_i32(10);
        b.jump(join);

        b.switch_to(else_b);
        let e = b.const_i32(20);
        b.jump(join);

        b.switch_to(join);
        let merged = b.phi(&[(t, then_b), (e, else_b)]);
        b.ret(Some(merged));

        let func = b.finish();
        assert_eq!(func.block_count(), 4);
        assert_eq!(func.block(join).phi_count(), 1);
        let phi = func.block(join).find_phi(merged).unwrap();
        assert_eq!(phi.operand_from(then_b).unwrap().value(), t);
        assert_eq!(phi.operand_from(else_b).unwrap().value(), e);
    }

    #[test]
    #[should_panic(expected = "has no terminator")]
    fn test_builder_rejects_unterminated_block() {
        let mut b = FunctionBuilder::new("bad");
        let entry = b.block();
        b.switch_to(entry);
        b.const_i32(1);
        let _ = b.finish();
    }
}
