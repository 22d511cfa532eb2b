//! # cinder-base
//!
//! Structural atoms for the Cinder compiler.
//!
//! This crate provides the foundational types every other compiler crate
//! builds on:
//!
//! - [`IdentPool`]/[`Ident`] — identifier interning with a stable hash
//! - [`SourceLoc`] — file/line/column source positions
//! - [`InternalError`]/[`Result`] — the fatal invariant-violation error
//!
//! # Design Principles
//!
//! This crate has **no knowledge of the Cinder language or I/O**. It provides
//! only generic, reusable infrastructure that higher-level crates build upon.
//!
//! # Example
//!
//! ```
//! use cinder_base::{IdentPool, SourceLoc};
//!
//! let mut idents = IdentPool::new();
//! let foo = idents.intern("foo");
//!
//! assert_eq!(idents.resolve(foo), "foo");
//! assert_eq!(foo, idents.intern("foo"));
//!
//! let loc = SourceLoc::new(0, 3, 7);
//! assert_eq!(loc.line, 3);
//! ```

pub mod error;
pub mod intern;
pub mod loc;

pub use error::{InternalError, Result};
pub use intern::{ident_hash, Ident, IdentPool};
pub use loc::SourceLoc;
