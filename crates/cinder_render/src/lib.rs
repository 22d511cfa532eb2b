//! # cinder-render
//!
//! Canonical source rendering for Cinder ASTs.
//!
//! The renderer walks a tree and emits source text with indentation and
//! length-aware line breaking, preserving comments and the base a numeric
//! literal was written in. Output is exposed both as a `String` and as a
//! token stream whose literals concatenate to the same text.
//!
//! ```
//! use cinder_ast::{AstArena, NodeKind};
//! use cinder_base::{IdentPool, SourceLoc};
//! use cinder_render::{render_tree, RenderFlags};
//!
//! let mut arena = AstArena::new();
//! let mut pool = IdentPool::new();
//! let f = pool.intern("f");
//! let callee = arena.ident_node(SourceLoc::UNKNOWN, f);
//! let arg = arena.int_lit(SourceLoc::UNKNOWN, 3, None);
//! let call = arena.tree(NodeKind::Call, SourceLoc::UNKNOWN, vec![callee, arg]);
//!
//! assert_eq!(render_tree(&arena, &pool, call, RenderFlags::empty()), "f(3)");
//! ```

pub mod render;
pub mod token;

pub use render::{escape_str, render_tokens, render_tree, RenderFlags, TokenStream, MAX_LINE_LEN};
pub use token::{keyword, Kw, TokKind};
