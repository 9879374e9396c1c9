use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The transformation assumes a well-formed input function. Violations of that assumption
/// (a block without a terminator, a dangling block or value reference, a secret-source
/// annotation that does not point at an instruction result) are fatal and abort analysis of
/// the function with a diagnostic. The one expected, recoverable condition, a merge node
/// whose incoming edge carries no synthesized mask, is *not* an error: the merge is left
/// unconverted and the pass carries on. It only surfaces as [`Error::MergeMaskMissing`] when
/// strict merge rewriting is requested via configuration.
///
/// # Error Categories
///
/// ## Input Function Errors
/// - [`Error::Malformed`] - Broken IR invariant detected during analysis
/// - [`Error::SecretAnnotation`] - Secret-source annotation does not reference an instruction
///
/// ## Limit Errors
/// - [`Error::RegionTooLarge`] - The branch region exceeds the configured block limit
///
/// ## Strict-Mode Errors
/// - [`Error::MergeMaskMissing`] - A merge rewrite was aborted while strict mode was on
#[derive(Error, Debug)]
pub enum Error {
    /// The input function violates an IR invariant the transformation relies on.
    ///
    /// This covers blocks without terminators, branch targets that name no block,
    /// and operands that name no value. The error includes the source location where
    /// the violation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A secret-source annotation is malformed.
    ///
    /// The annotation marker must carry a pointer produced by an instruction whose
    /// operand names the annotated variable. When the marker's operand is not an
    /// instruction result (or that instruction has no value operand to recover),
    /// the taint seed cannot be established and the function cannot be analyzed.
    #[error("Malformed secret-source annotation: {0}")]
    SecretAnnotation(String),

    /// The region spanned by the secret-dependent branches exceeds the configured limit.
    ///
    /// This is a safety valve against runaway regions; see
    /// [`LinearizeConfig::max_region_blocks`](crate::passes::LinearizeConfig::max_region_blocks).
    #[error("Branch region spans {blocks} blocks, exceeding the limit of {limit}")]
    RegionTooLarge {
        /// Number of blocks in the computed linear order.
        blocks: usize,
        /// The configured block limit.
        limit: usize,
    },

    /// A merge rewrite was aborted because an incoming edge carries no mask, and strict
    /// merge rewriting is enabled.
    ///
    /// In the default configuration this condition is recorded as an event and the merge
    /// node is left in place.
    #[error("No mask for merge in {block}: {message}")]
    MergeMaskMissing {
        /// Display name of the block holding the merge node.
        block: String,
        /// Description of the missing edge.
        message: String,
    },
}
