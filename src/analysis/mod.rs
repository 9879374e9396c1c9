//! Analyses consumed by the transformation.
//!
//! Everything in this module is read-only over the IR:
//!
//! - [`cfg`] - Control flow graph view with cached predecessors
//! - [`postdom`] - Post-dominator tree, the pipeline's one dominance oracle
//! - [`defuse`] - Value → use-site index
//! - [`taint`] - Secret-source seeding and forward taint closure
//!
//! The analyses are per-function and per-pass-invocation; none of them cache
//! across mutations.

pub mod cfg;
pub mod defuse;
pub mod postdom;
pub mod taint;

pub use cfg::FuncCfg;
pub use defuse::{UseIndex, UseSite};
pub use postdom::PostDominatorTree;
pub use taint::TaintSet;
