//! Source location tracking for diagnostics and the renderer.
//!
//! A [`SourceLoc`] names a point in a source file by file index, line and
//! column. The file index is an opaque handle into the front-end's file
//! table; the semantic core never opens files itself, it only threads the
//! index through so diagnostics can be mapped back to a path by the caller.
//!
//! Lines are 1-based (line 0 means "unknown"), columns are 0-based, which
//! matches what the external parser delivers on every node.

#[cfg(feature = "serde")]
use serde::Serialize;

/// A file/line/column position in source text.
///
/// `SourceLoc` is `Copy` and cheap to store on every AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SourceLoc {
    /// Index into the front-end's file table.
    pub file: u32,
    /// 1-based source line; 0 when unknown.
    pub line: u32,
    /// 0-based column on the line.
    pub col: u32,
}

impl SourceLoc {
    /// An unknown position (file 0, line 0).
    pub const UNKNOWN: SourceLoc = SourceLoc { file: 0, line: 0, col: 0 };

    /// Creates a location from its parts.
    pub fn new(file: u32, line: u32, col: u32) -> Self {
        Self { file, line, col }
    }

    /// Returns `true` when the line is unknown.
    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl std::fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file {}({}, {})", self.file, self.line, self.col)
    }
}
