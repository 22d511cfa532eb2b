//! # cinder-ast
//!
//! The typed tree of the Cinder compiler: AST nodes, symbols, type
//! descriptors, the per-unit arena that owns all three, and the lookup
//! structures built over them.
//!
//! ## Architecture
//!
//! ```text
//! parser (external)
//!        │
//!        ▼
//! ┌────────────┐   ids    ┌──────────────┐
//! │  AstArena  │ ◀──────▶ │  ScopeStack  │
//! │ nodes/syms │          │  SymTable    │
//! │ /types     │          │  IntSet      │
//! └────────────┘          └──────────────┘
//!        │
//!        ▼
//! semantic analysis (cinder-sema), rendering (cinder-render)
//! ```
//!
//! Everything cross-references through ids into the arena's slabs, which is
//! what makes the cyclic symbol↔type↔node graphs representable; see
//! [`arena`] for the ownership rules.
//!
//! ## Modules
//!
//! - [`node`]: tree nodes and their payloads
//! - [`sym`]: named program entities
//! - [`types`]: type descriptors and structural queries
//! - [`arena`]: the per-unit slabs
//! - [`tables`]: open-addressed tables and the integer bitset
//! - [`scope`]: the lexical scope stack
//! - [`dump`]: JSON debug dump

pub mod arena;
pub mod dump;
pub mod node;
pub mod scope;
pub mod sym;
pub mod tables;
pub mod types;

pub use arena::AstArena;
pub use node::{Node, NodeFlags, NodeId, NodeKind, Payload};
pub use scope::{AddOutcome, ScopeStack};
pub use sym::{Magic, SymFlags, SymId, SymKind, Symbol};
pub use tables::{IdTable, IntSet, SymTable};
pub use types::{CallConv, Type, TypeFlags, TypeId, TypeKind};
