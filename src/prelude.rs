//! # flatline Prelude
//!
//! Convenient re-exports of the most commonly used types. Import this module
//! to get everything needed to build a function, run the linearization pass,
//! and inspect its trace.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all flatline operations
pub use crate::Error;

/// The result type used throughout flatline
pub use crate::Result;

// ================================================================================================
// IR
// ================================================================================================

/// IR construction and editing
pub use crate::ir::{
    Block, BlockId, ConstValue, Function, FunctionBuilder, Module, Op, PhiNode, PhiOperand,
    ValueId,
};

// ================================================================================================
// Analyses
// ================================================================================================

/// CFG view and the post-dominance oracle
pub use crate::analysis::{FuncCfg, PostDominatorTree, TaintSet, UseIndex};

// ================================================================================================
// Passes
// ================================================================================================

/// The pass interface, the linearization pass, and the module driver
pub use crate::passes::{
    EventKind, EventLog, FunctionPass, LinearizeConfig, LinearizePass, ModuleReport, PassContext,
    PassManager,
};
