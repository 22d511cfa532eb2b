//! The fatal invariant-violation error.
//!
//! User-level problems (type mismatches, ambiguous calls) are *diagnostics*,
//! collected by the semantic layer and never raised as errors. What remains
//! is the third failure class: a broken internal invariant about tree shape
//! or table consistency. Those are [`InternalError`] values; they abort the
//! compilation and always indicate a compiler bug, never a user mistake.
//!
//! # Example
//!
//! ```
//! use cinder_base::{InternalError, SourceLoc};
//!
//! let err = InternalError::at("orphaned scope close", SourceLoc::new(0, 4, 0));
//! assert!(err.to_string().contains("internal error"));
//! ```

use crate::loc::SourceLoc;
use std::fmt;

/// A broken compiler invariant, with the location being processed when it
/// was detected (if any).
#[derive(Debug, Clone)]
pub struct InternalError {
    /// What invariant was violated.
    pub message: String,
    /// Source position being analysed when the violation was found.
    pub loc: Option<SourceLoc>,
}

impl InternalError {
    /// Creates an error with no associated source position.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), loc: None }
    }

    /// Creates an error tagged with the position being analysed.
    pub fn at(message: impl Into<String>, loc: SourceLoc) -> Self {
        Self { message: message.into(), loc: Some(loc) }
    }
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.loc {
            Some(loc) => write!(f, "internal error: {} [{}]", self.message, loc),
            None => write!(f, "internal error: {}", self.message),
        }
    }
}

impl std::error::Error for InternalError {}

/// Alias for `std::result::Result<T, InternalError>`.
pub type Result<T> = std::result::Result<T, InternalError>;
