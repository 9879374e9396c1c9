//! Pass infrastructure and the linearization pass.
//!
//! # Architecture
//!
//! ```text
//! PassManager                 Module driver
//!   ├─ runs each function through the pass stack (functions in parallel)
//!   └─ aggregates per-function event logs
//!
//! FunctionPass trait          Interface for all passes
//!   └─ run(&mut Function, &mut PassContext) -> Result<bool>
//!
//! PassContext                 Per-invocation state
//!   └─ events: EventLog       Diagnostics, discarded or collected by the driver
//!
//! LinearizePass               The transformation
//!   ├─ taint closure          (analysis::taint)
//!   ├─ critical branches
//!   ├─ region linear order    (linearize::region)
//!   ├─ mask synthesis         (linearize::masks)
//!   └─ CFG rewrite            (linearize::rewrite)
//! ```

pub mod config;
pub mod events;
pub mod linearize;
pub mod scheduler;

pub use config::LinearizeConfig;
pub use events::{DerivedStats, Event, EventKind, EventLog};
pub use linearize::LinearizePass;
pub use scheduler::{ModuleReport, PassManager};

use crate::ir::Function;
use crate::Result;

/// Per-invocation pass state.
///
/// A context is created for one function, handed through the pass stack, and
/// then discarded (or its event log collected by the driver). Nothing in it
/// outlives the run.
#[derive(Debug, Default)]
pub struct PassContext {
    /// Accumulated diagnostics.
    pub events: EventLog,
}

impl PassContext {
    /// Creates a fresh context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the context and returns its event log.
    #[must_use]
    pub fn into_events(self) -> EventLog {
        self.events
    }
}

/// A transformation over a single function.
///
/// Passes must be thread-safe: the driver runs them over different functions
/// from different threads concurrently. A pass never sees the same function
/// from two threads; per-function execution is serialized by construction.
pub trait FunctionPass: Send + Sync {
    /// Unique name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Runs the pass on one function.
    ///
    /// Returns `true` if the function was changed in any way; the driver uses
    /// the signal to decide whether cached analyses must be invalidated.
    ///
    /// # Errors
    ///
    /// Returns an error on fatal precondition violations in the input
    /// function; the function may have been partially mutated at that point.
    fn run(&self, func: &mut Function, ctx: &mut PassContext) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FunctionBuilder;

    struct CountingPass;

    impl FunctionPass for CountingPass {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn run(&self, _func: &mut Function, ctx: &mut PassContext) -> Result<bool> {
            ctx.events.record(EventKind::RegionOrdered);
            Ok(false)
        }
    }

    #[test]
    fn test_pass_context_collects_events() {
        let mut fb = FunctionBuilder::new("f");
        let entry = fb.block();
        fb.switch_to(entry);
        fb.ret(None);
        let mut func = fb.finish();

        let pass = CountingPass;
        let mut ctx = PassContext::new();
        let changed = pass.run(&mut func, &mut ctx).unwrap();

        assert!(!changed);
        assert_eq!(pass.name(), "counting");
        let events = ctx.into_events();
        assert_eq!(events.count_of(EventKind::RegionOrdered), 1);
    }
}
