//! Value identifiers and constants.
//!
//! Every computed quantity in a [`Function`](crate::ir::Function), whether a
//! constant, an instruction result, or a merge-node result, is a *value*,
//! identified by a lightweight [`ValueId`] handle into the function's value
//! table. Values are assigned exactly once; all data flow between
//! instructions is expressed through value identifiers.
//!
//! # Design Rationale
//!
//! Values are identified by a simple index to provide O(1) lookup and minimal
//! memory overhead. The ID encodes no semantic information - metadata such as the
//! optional display name lives in [`ValueData`].
//!
//! # Thread Safety
//!
//! All types in this module are `Send` and `Sync`.

use std::fmt;

/// Unique identifier for a value.
///
/// This is a lightweight handle into the value table of a
/// [`Function`](crate::ir::Function), providing O(1) access to value metadata.
/// The identifier is unique within a single function but not globally unique
/// across functions.
///
/// # Examples
///
/// ```rust,ignore
/// use flatline::ir::ValueId;
///
/// let id = ValueId::new(0);
/// assert_eq!(id.index(), 0);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(usize);

impl ValueId {
    /// Creates a new value identifier.
    ///
    /// # Arguments
    ///
    /// * `index` - The index into the value table
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the underlying index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Metadata for a single value.
///
/// The transformation gives synthesized boolean masks descriptive names
/// (`mask_b2`, `mask_not_v4`, ...) so the diagnostic trace stays readable;
/// ordinary values are unnamed and display as `vN`.
#[derive(Debug, Clone, Default)]
pub struct ValueData {
    /// Optional display name.
    name: Option<String>,
}

impl ValueData {
    /// Creates unnamed value metadata.
    #[must_use]
    pub const fn new() -> Self {
        Self { name: None }
    }

    /// Creates named value metadata.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Returns the display name, if one was assigned.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Assigns a display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }
}

/// Constant values that can appear as instruction operands.
///
/// The transformation only ever synthesizes boolean masks, so the constant
/// domain is small: booleans and integers. Integers are carried for the
/// surrounding program (branch conditions are usually comparisons over them).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstValue {
    /// Boolean true.
    True,

    /// Boolean false.
    False,

    /// 32-bit signed integer.
    I32(i32),

    /// 64-bit signed integer.
    I64(i64),
}

impl ConstValue {
    /// Returns `true` if this is a boolean constant.
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::True | Self::False)
    }

    /// Creates a boolean constant from a bool value.
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }

    /// Returns the constant as a bool if applicable.
    ///
    /// Integers follow the usual truthiness convention: zero is false,
    /// anything else is true.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::I32(v) => Some(*v != 0),
            Self::I64(v) => Some(*v != 0),
        }
    }

    /// Returns the constant as an i64 if applicable.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            Self::I32(v) => Some(*v as i64),
            Self::True => Some(1),
            Self::False => Some(0),
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}L"),
        }
    }
}
