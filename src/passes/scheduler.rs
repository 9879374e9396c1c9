//! Module-level pass driver.
//!
//! [`PassManager`] runs a stack of function passes over every function of a
//! module. Functions are independent, so they are processed in parallel;
//! each function gets its own [`PassContext`] and the per-function event
//! logs are collected into a concurrent report map.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use rayon::prelude::*;

use crate::ir::Module;
use crate::passes::{EventLog, FunctionPass, PassContext};
use crate::Result;

/// Outcome of a [`PassManager`] run over a module.
#[derive(Debug, Default)]
pub struct ModuleReport {
    /// Whether any function was changed.
    changed: bool,
    /// Per-function event logs, keyed by function name.
    events: DashMap<String, EventLog>,
}

impl ModuleReport {
    /// Returns `true` if any function was changed.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.changed
    }

    /// Returns the event log recorded for `function`, if it was processed.
    #[must_use]
    pub fn events_for(&self, function: &str) -> Option<EventLog> {
        self.events.get(function).map(|entry| entry.value().clone())
    }

    /// Returns the number of processed functions.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.events.len()
    }
}

/// Runs function passes over whole modules.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn FunctionPass>>,
}

impl PassManager {
    /// Creates an empty pass manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pass to the stack.
    pub fn add_pass(&mut self, pass: Box<dyn FunctionPass>) -> &mut Self {
        self.passes.push(pass);
        self
    }

    /// Returns the number of registered passes.
    #[must_use]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Runs the pass stack over every function of `module`, in parallel.
    ///
    /// # Errors
    ///
    /// Returns the first pass error encountered. Other functions may already
    /// have been transformed by then; the per-function mutation is not rolled
    /// back.
    pub fn run(&self, module: &mut Module) -> Result<ModuleReport> {
        let changed = AtomicBool::new(false);
        let events: DashMap<String, EventLog> = DashMap::new();

        module.functions_mut().par_iter_mut().try_for_each(|func| {
            let mut ctx = PassContext::new();
            for pass in &self.passes {
                if pass.run(func, &mut ctx)? {
                    changed.store(true, Ordering::Relaxed);
                }
            }
            events.insert(func.name().to_string(), ctx.into_events());
            Ok(())
        })?;

        Ok(ModuleReport {
            changed: changed.load(Ordering::Relaxed),
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ConstValue, Function, FunctionBuilder, Op};
    use crate::passes::EventKind;

    struct TouchPass;

    impl FunctionPass for TouchPass {
        fn name(&self) -> &'static str {
            "touch"
        }

        fn run(&self, func: &mut Function, ctx: &mut PassContext) -> Result<bool> {
            ctx.events.record_with(EventKind::RegionOrdered, func.name().to_string());
            let dest = func.alloc_value();
            let entry = func.entry();
            func.insert_at_top(
                entry,
                Op::Const {
                    dest,
                    value: ConstValue::True,
                },
            );
            Ok(true)
        }
    }

    struct NoopPass;

    impl FunctionPass for NoopPass {
        fn name(&self) -> &'static str {
            "noop"
        }

        fn run(&self, _func: &mut Function, _ctx: &mut PassContext) -> Result<bool> {
            Ok(false)
        }
    }

    fn trivial_function(name: &str) -> Function {
        let mut fb = FunctionBuilder::new(name);
        let entry = fb.block();
        fb.switch_to(entry);
        fb.ret(None);
        fb.finish()
    }

    #[test]
    fn test_pass_manager_runs_all_functions() {
        let mut module = Module::new("m");
        module.add_function(trivial_function("a"));
        module.add_function(trivial_function("b"));

        let mut pm = PassManager::new();
        pm.add_pass(Box::new(TouchPass));
        assert_eq!(pm.pass_count(), 1);

        let report = pm.run(&mut module).unwrap();
        assert!(report.changed());
        assert_eq!(report.function_count(), 2);
        assert!(report.events_for("a").is_some());
        assert!(report.events_for("b").is_some());
        assert!(report.events_for("c").is_none());

        // the mutation landed
        assert_eq!(module.function("a").unwrap().value_count(), 1);
    }

    #[test]
    fn test_pass_manager_reports_unchanged() {
        let mut module = Module::new("m");
        module.add_function(trivial_function("a"));

        let mut pm = PassManager::new();
        pm.add_pass(Box::new(NoopPass));

        let report = pm.run(&mut module).unwrap();
        assert!(!report.changed());
    }
}
