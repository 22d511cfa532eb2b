//! # cinder-sema
//!
//! Semantic analysis for Cinder: the ranked type-compatibility relation,
//! call-site parameter matching, overload resolution and generic
//! instantiation.
//!
//! ## Architecture
//!
//! ```text
//! call node
//!     │
//!     ▼
//! ┌──────────────┐  per candidate   ┌──────────────┐
//! │ resolve_call │ ───────────────▶ │  match_call  │
//! │ best/runner- │                  │ arg fitting, │
//! │ up, ambiguity│ ◀─────────────── │ conversions  │
//! └──────┬───────┘   tallies        └──────┬───────┘
//!        │                                 │ per argument
//!        ▼                                 ▼
//!  instantiation                     ┌──────────┐
//!  (cached)                          │ type_rel │
//!                                    └──────────┘
//! ```
//!
//! All state lives in one [`SemCtx`] per compilation unit. Failures of
//! normal matching are candidate states, never errors; diagnostics are
//! structured records in the context's sink.
//!
//! ## Modules
//!
//! - [`ctx`]: the semantic context and declaration builders
//! - [`diag`]: structured diagnostics
//! - [`typerel`]: the ranked relation and generic bindings
//! - [`sigmatch`]: candidates and argument matching
//! - [`resolve`]: overload resolution and instantiation
//! - [`typestr`]: type and signature rendering for messages

pub mod ctx;
pub mod diag;
pub mod resolve;
pub mod sigmatch;
pub mod typerel;
pub mod typestr;

pub use ctx::{BasicTypes, SemCtx};
pub use diag::{DiagKind, Diagnostic, Diagnostics};
pub use resolve::{generate_instance, resolve_call};
pub use sigmatch::{cmp_candidates, match_call, Candidate, MatchState};
pub use typerel::{apply_bindings, is_generic_type, type_rel, Bindings, Rank};
pub use typestr::{sym_signature, type_to_string};
