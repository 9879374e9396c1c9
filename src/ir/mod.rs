//! The intermediate representation the transformation operates on.
//!
//! This module provides a small SSA-style IR: functions own basic blocks,
//! blocks hold merge (phi) nodes and instructions, and all data flow is
//! expressed through value identifiers. The instruction set is a closed
//! tagged variant ([`Op`]) matched exhaustively by the analysis and rewrite
//! stages.
//!
//! # Architecture
//!
//! - [`value`] - Value identifiers, value metadata, constants
//! - [`ops`] - The instruction set
//! - [`phi`] - Merge nodes at control flow joins
//! - [`block`] - Basic blocks
//! - [`function`] - Function bodies and editing primitives
//! - [`builder`] - Convenience construction API
//! - [`module`] - Named function sets for the pass driver
//!
//! # Mutation Model
//!
//! The transformation mutates functions destructively and irreversibly:
//! erased instructions cannot be recovered. Callers that need rollback clone
//! the [`Function`] before running a pass over it.

mod block;
mod builder;
mod function;
mod module;
mod ops;
mod phi;
mod value;

pub use block::{Block, BlockId};
pub use builder::FunctionBuilder;
pub use function::Function;
pub use module::Module;
pub use ops::Op;
pub use phi::{PhiNode, PhiOperand};
pub use value::{ConstValue, ValueData, ValueId};
