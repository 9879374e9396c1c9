//! Configuration for the linearization pass.

/// Configuration for [`LinearizePass`](crate::passes::LinearizePass).
///
/// The defaults match the intended production behavior: merge nodes that
/// cannot be folded are left alone, value-level taint tracing is off, and the
/// region size limit is generous.
#[derive(Debug, Clone)]
pub struct LinearizeConfig {
    /// Escalate an unfoldable merge node into an error.
    ///
    /// By default a merge node whose incoming edge carries no mask (because
    /// that path never crossed a secret-dependent branch) is recorded and
    /// left in place, and the pass carries on. With this flag on, the pass
    /// aborts instead. Useful in builds that must guarantee every merge in a
    /// protected function became branchless (default: `false`).
    pub strict_merge_rewrite: bool,

    /// Upper bound on the number of blocks in the linearized region.
    ///
    /// A region larger than this aborts the pass with
    /// [`Error::RegionTooLarge`](crate::Error::RegionTooLarge). Linearization
    /// multiplies executed code by the number of paths it flattens, so a
    /// region this large is almost certainly an annotation mistake
    /// (default: `4096`).
    pub max_region_blocks: usize,

    /// Record a trace event for every value that joins the taint closure.
    ///
    /// Noisy; intended for debugging taint propagation (default: `false`).
    pub trace_values: bool,
}

impl Default for LinearizeConfig {
    fn default() -> Self {
        Self {
            strict_merge_rewrite: false,
            max_region_blocks: 4096,
            trace_values: false,
        }
    }
}
