// Copyright 2026 flatline contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![allow(dead_code)]
#![allow(clippy::too_many_arguments)]

//! # flatline
//!
//! Secret-dependent control-flow linearization for constant-time code.
//!
//! `flatline` is a compiler transformation over a small SSA IR that removes
//! timing side channels caused by branching on secrets. Given a function
//! whose control flow branches on values derived from an annotated "secret"
//! input, the transformation:
//!
//! 1. computes the forward taint closure of the secret over the use-def graph,
//! 2. finds every branch whose outcome depends on it,
//! 3. linearizes the region those branches span into one straight-line path,
//!    driven by the post-dominator tree, and
//! 4. replaces the region's merge (phi) nodes with branchless select chains
//!    keyed by synthesized boolean path masks.
//!
//! The result executes identical instructions regardless of the secret's
//! value, eliminating branch-prediction and instruction-fetch timing channels
//! for the protected region. Data-dependent memory access patterns (cache
//! channels) and secret-dependent loop trip counts are out of scope.
//!
//! ## Quick Start
//!
//! ```rust
//! use flatline::ir::FunctionBuilder;
//! use flatline::passes::{FunctionPass, LinearizePass, PassContext};
//!
//! // if (secret > 0) { 10 } else { 20 }
//! let mut b = FunctionBuilder::new("example");
//! let entry = b.block();
//! let then_b = b.block();
//! let else_b = b.block();
//! let join = b.block();
//!
//! b.switch_to(entry);
//! let addr = b.local_addr(0);
//! let p = b.copy(addr);
//! b.annotate(p); // loc0 is secret
//! let secret = b.load(addr);
//! let zero = b.const_i32(0);
//! let cond = b.cgt(secret, zero);
//! b.branch(cond, then_b, else_b);
//!
//! b.switch_to(then_b);
//! let t = b.const_i32(10);
//! b.jump(join);
//!
//! b.switch_to(else_b);
//! let e = b.const_i32(20);
//! b.jump(join);
//!
//! b.switch_to(join);
//! let merged = b.phi(&[(t, then_b), (e, else_b)]);
//! b.ret(Some(merged));
//!
//! let mut func = b.finish();
//! let changed = LinearizePass::new().run(&mut func, &mut PassContext::new())?;
//! assert!(changed);
//! # Ok::<(), flatline::Error>(())
//! ```
//!
//! After the pass, every block of the region jumps unconditionally to the
//! next one and the merge at `join` is a `select` keyed by the branch
//! condition: both arms always execute.
//!
//! ## Architecture
//!
//! - [`ir`] - The SSA IR: values, instructions, merge nodes, blocks,
//!   functions, and the editing primitives the rewrite uses
//! - [`graph`] - Graph traits and the Lengauer-Tarjan dominator machinery
//! - [`analysis`] - CFG view, post-dominator tree, use index, taint closure
//! - [`passes`] - Pass infrastructure, the linearization pass, the module
//!   driver, and the diagnostic event log
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! The pass assumes a well-formed input function: malformed IR (a block
//! without a terminator, an annotation that does not reference an
//! instruction result) aborts the function with a diagnostic. The one
//! expected local failure, a merge fed by a path that never crossed a
//! secret-dependent branch, skips that merge and keeps going.
//!
//! ## Diagnostics
//!
//! Every pass invocation records a line-oriented trace (tainted branch
//! blocks, the linear block order, the synthesized masks) into its
//! [`passes::EventLog`]; the [`passes::PassManager`] collects the logs per
//! function. The format is for humans, not machines.

#[macro_use]
mod error;

pub mod analysis;
pub mod graph;
pub mod ir;
pub mod passes;
pub mod prelude;

pub use error::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
