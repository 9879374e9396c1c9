//! The control-flow linearization pass.
//!
//! Removes secret-dependent control flow from a function: every branch whose
//! condition derives from an annotated secret is discarded, the region those
//! branches span is rewritten into one straight-line path, and the merges
//! that used to depend on which branch ran become select chains driven by
//! synthesized boolean path masks. The transformed region executes the same
//! instructions regardless of the secret's value, closing the
//! branch-predictor and instruction-fetch timing channels for that region.
//!
//! What this pass does **not** protect: data-dependent memory access
//! patterns (cache channels), secret dependence flowing in through anything
//! but the annotation, and loops whose trip count depends on the secret.
//!
//! # Pipeline
//!
//! 1. Seed and propagate taint from the secret-source annotations
//! 2. Collect the blocks whose terminators branch on tainted data
//! 3. Compute the region's linear block order (post-dominance driven)
//! 4. Synthesize edge and entry masks over the region
//! 5. Rewrite: flatten terminators along the order, fold merges into selects
//!
//! Stages 1–2 finding nothing is a clean no-op: the function is untouched
//! and the pass reports no change.

mod masks;
mod region;
mod rewrite;

use crate::analysis::{taint, FuncCfg, PostDominatorTree, UseIndex};
use crate::ir::{BlockId, Function, ValueId};
use crate::passes::linearize::masks::MaskBuilder;
use crate::passes::{EventKind, FunctionPass, LinearizeConfig, PassContext};
use crate::{Error, Result};

/// Secret-dependent control-flow linearization.
///
/// See the [module documentation](self) for the pipeline. The pass mutates
/// the function destructively; callers that need rollback must clone the
/// function first.
#[derive(Debug, Default)]
pub struct LinearizePass {
    config: LinearizeConfig,
}

impl LinearizePass {
    /// Creates the pass with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the pass with an explicit configuration.
    #[must_use]
    pub fn with_config(config: LinearizeConfig) -> Self {
        Self { config }
    }

    /// Returns the blocks whose terminator branches on tainted data, in
    /// block order.
    fn critical_branch_blocks(func: &Function, tainted: &taint::TaintSet) -> Vec<BlockId> {
        func.blocks()
            .iter()
            .filter(|block| {
                block
                    .terminator()
                    .filter(|term| term.is_branch())
                    .and_then(|term| term.branch_operand())
                    .is_some_and(|operand| tainted.contains(operand))
            })
            .map(|block| block.id())
            .collect()
    }

    /// Checks the invariants the pipeline relies on.
    fn validate(func: &Function) -> Result<()> {
        for block in func.blocks() {
            let Some(term) = block.terminator() else {
                return Err(malformed_error!("block {} has no terminator", block.id()));
            };
            for succ in term.successors() {
                if func.get_block(succ).is_none() {
                    return Err(malformed_error!(
                        "block {} branches to nonexistent {succ}",
                        block.id()
                    ));
                }
            }
        }
        Ok(())
    }
}

impl FunctionPass for LinearizePass {
    fn name(&self) -> &'static str {
        "linearize"
    }

    fn run(&self, func: &mut Function, ctx: &mut PassContext) -> Result<bool> {
        Self::validate(func)?;

        let seeds = taint::secret_seeds(func)?;
        for &seed in &seeds {
            ctx.events
                .record_with(EventKind::SecretSourceFound, func.describe(seed));
        }
        if seeds.is_empty() {
            return Ok(false);
        }

        let index = UseIndex::build(func);
        let tainted = taint::propagate(func, &index, &seeds);
        if self.config.trace_values {
            let mut values: Vec<ValueId> = tainted.iter().collect();
            values.sort();
            for value in values {
                ctx.events
                    .record_with(EventKind::ValueTainted, func.describe(value));
            }
        }

        let starts = Self::critical_branch_blocks(func, &tainted);
        for &block in &starts {
            ctx.events
                .record_with(EventKind::CriticalBranchFound, block.to_string());
        }
        if starts.is_empty() {
            return Ok(false);
        }

        let (order, postdom) = {
            let cfg = FuncCfg::from_function(func);
            let postdom = PostDominatorTree::compute(&cfg);
            (region::linear_order(&cfg, &postdom, &starts), postdom)
        };
        if order.len() > self.config.max_region_blocks {
            return Err(Error::RegionTooLarge {
                blocks: order.len(),
                limit: self.config.max_region_blocks,
            });
        }
        let order_line = order
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        ctx.events.record_with(EventKind::RegionOrdered, order_line);

        let (mask_table, inserted) = MaskBuilder::build(func, &postdom, &starts);
        let mut entries: Vec<_> = mask_table.iter().collect();
        entries.sort_by_key(|((from, to), _)| (*to, *from));
        for ((from, to), mask) in entries {
            let from = from.map_or_else(|| "entry".to_string(), |b| b.to_string());
            let mask = mask.map_or_else(|| "always".to_string(), |v| func.describe(v));
            ctx.events.record_with(
                EventKind::MaskSynthesized,
                format!("({from}, {to}): {mask}"),
            );
        }

        let rewritten = rewrite::flatten_branches(func, &order, ctx);
        let folded = rewrite::fold_merges(
            func,
            &order,
            &mask_table,
            self.config.strict_merge_rewrite,
            ctx,
        )?;

        Ok(inserted > 0 || rewritten > 0 || folded > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ConstValue, FunctionBuilder, Op};

    /// entry: secret-annotated local, loaded and compared; branch to two
    /// arms producing different constants; join merges and returns.
    fn secret_diamond() -> Function {
        let mut fb = FunctionBuilder::new("secret_diamond");
        let entry = fb.block();
        let then_b = fb.block();
        let else_b = fb.block();
        let join = fb.block();

        fb.switch_to(entry);
        let addr = fb.local_addr(0);
        let p = fb.copy(addr);
        fb.annotate(p);
        let secret = fb.load(addr);
        let zero = fb.const_i32(0);
        let cond = fb.cgt(secret, zero);
        fb.branch(cond, then_b, else_b);

        fb.switch_to(then_b);
        let t = fb.const_i32(10);
        fb.jump(join);

        fb.switch_to(else_b);
        let e = fb.const_i32(20);
        fb.jump(join);

        fb.switch_to(join);
        let merged = fb.phi(&[(t, then_b), (e, else_b)]);
        fb.ret(Some(merged));

        fb.finish()
    }

    #[test]
    fn test_pass_linearizes_secret_diamond() {
        let mut func = secret_diamond();
        let pass = LinearizePass::new();
        let mut ctx = PassContext::new();

        let changed = pass.run(&mut func, &mut ctx).unwrap();

        assert!(changed);
        // no conditional branches left
        for block in func.blocks() {
            assert!(
                !block.terminator().unwrap().is_branch(),
                "{} still branches",
                block.id()
            );
        }
        // the merge became a select
        let join = BlockId::new(3);
        assert_eq!(func.block(join).phi_count(), 0);
        assert!(func
            .block(join)
            .instructions()
            .iter()
            .any(|op| matches!(op, Op::Select { .. })));

        assert_eq!(ctx.events.count_of(EventKind::SecretSourceFound), 1);
        assert_eq!(ctx.events.count_of(EventKind::CriticalBranchFound), 1);
        assert_eq!(ctx.events.count_of(EventKind::MergeFolded), 1);
        assert_eq!(ctx.events.count_of(EventKind::MergeSkipped), 0);
    }

    #[test]
    fn test_pass_no_annotation_is_noop() {
        let mut fb = FunctionBuilder::new("clean");
        let entry = fb.block();
        let t = fb.block();
        let e = fb.block();

        fb.switch_to(entry);
        let c = fb.const_bool(true);
        fb.branch(c, t, e);
        fb.switch_to(t);
        fb.ret(None);
        fb.switch_to(e);
        fb.ret(None);
        let mut func = fb.finish();
        let before = format!("{func}");

        let pass = LinearizePass::new();
        let mut ctx = PassContext::new();
        let changed = pass.run(&mut func, &mut ctx).unwrap();

        assert!(!changed);
        assert_eq!(format!("{func}"), before, "no-op must not mutate");
    }

    #[test]
    fn test_pass_tainted_but_branchless_is_noop() {
        let mut fb = FunctionBuilder::new("straight");
        let entry = fb.block();
        fb.switch_to(entry);
        let addr = fb.local_addr(0);
        let p = fb.copy(addr);
        fb.annotate(p);
        let secret = fb.load(addr);
        let one = fb.const_i32(1);
        let sum = fb.add(secret, one);
        fb.ret(Some(sum));
        let mut func = fb.finish();
        let before = format!("{func}");

        let pass = LinearizePass::new();
        let mut ctx = PassContext::new();
        let changed = pass.run(&mut func, &mut ctx).unwrap();

        assert!(!changed);
        assert_eq!(format!("{func}"), before);
        assert_eq!(ctx.events.count_of(EventKind::SecretSourceFound), 1);
        assert_eq!(ctx.events.count_of(EventKind::CriticalBranchFound), 0);
    }

    #[test]
    fn test_pass_region_limit() {
        let mut func = secret_diamond();
        let pass = LinearizePass::with_config(LinearizeConfig {
            max_region_blocks: 2,
            ..LinearizeConfig::default()
        });
        let mut ctx = PassContext::new();

        let err = pass.run(&mut func, &mut ctx).unwrap_err();
        assert!(matches!(err, Error::RegionTooLarge { blocks: 4, limit: 2 }));
    }

    #[test]
    fn test_pass_rejects_missing_terminator() {
        let mut func = Function::new("broken");
        let entry = func.add_block();
        let dest = func.alloc_value();
        func.block_mut(entry).push(Op::Const {
            dest,
            value: ConstValue::True,
        });

        let pass = LinearizePass::new();
        let mut ctx = PassContext::new();
        let err = pass.run(&mut func, &mut ctx).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
    }

    #[test]
    fn test_pass_records_trace() {
        let mut func = secret_diamond();
        let pass = LinearizePass::with_config(LinearizeConfig {
            trace_values: true,
            ..LinearizeConfig::default()
        });
        let mut ctx = PassContext::new();
        pass.run(&mut func, &mut ctx).unwrap();

        assert!(ctx.events.count_of(EventKind::ValueTainted) >= 3);
        assert_eq!(ctx.events.count_of(EventKind::RegionOrdered), 1);
        assert!(ctx.events.count_of(EventKind::MaskSynthesized) >= 4);

        let trace = format!("{}", ctx.events);
        assert!(trace.contains("RegionOrdered: b0"));
        assert!(trace.contains("MaskSynthesized"));
    }
}
