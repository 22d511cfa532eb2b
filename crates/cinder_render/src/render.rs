//! Canonical source emission with length-aware line breaking.
//!
//! Two passes drive the output. [`Renderer::lsub`] computes a cheap upper
//! bound on the one-line width a subtree would need; the sentinel value
//! means "cannot stay on one line". [`Renderer::gsub`] then writes tokens,
//! breaking lines when the running length plus the next subtree's estimate
//! would pass [`MAX_LINE_LEN`].
//!
//! Newlines are never written eagerly: [`Renderer::put_nl`] only records
//! the indent of the coming line in the pending-newline field, and the next
//! emitted token flushes it. That keeps trailing whitespace out of the
//! output and gives comment placement one spot to hook into.
//!
//! Hidden conversion nodes render as their operand, so a typechecked tree
//! prints back to the source form it came from.

use bitflags::bitflags;

use cinder_ast::types::type_size;
use cinder_ast::{AstArena, NodeFlags, NodeId, NodeKind};
use cinder_base::IdentPool;

use crate::token::{keyword, Kw, TokKind};

/// Soft upper bound on a rendered line.
pub const MAX_LINE_LEN: usize = 80;
/// One estimate above this means "must wrap".
const SENTINEL: usize = MAX_LINE_LEN + 1;
const INDENT_STEP: usize = 2;
/// Wrapping inside an argument list indents by this much extra.
const LONG_INDENT: usize = 4;
/// Trailing comments align to this column when they fit.
const COMMENT_COL: usize = 30;
/// String literals longer than this split into adjacent fragments.
const STR_SPLIT: usize = 64;

bitflags! {
    /// Renderer options.
    #[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
    pub struct RenderFlags: u8 {
        /// Omit routine bodies (signature listings).
        const NO_BODY = 1 << 0;
        const NO_COMMENTS = 1 << 1;
        /// Render only comments beginning with `##`.
        const DOC_COMMENTS_ONLY = 1 << 2;
        const NO_PRAGMAS = 1 << 3;
        /// Append `[id]` after each symbol, for debugging.
        const SHOW_IDS = 1 << 4;
    }
}

/// Renders a tree to its canonical source text.
pub fn render_tree(arena: &AstArena, pool: &IdentPool, n: NodeId, flags: RenderFlags) -> String {
    let mut r = Renderer::new(arena, pool, flags);
    r.gsub(n);
    r.flush_comment_for(n);
    r.buf
}

/// Renders a tree to its token stream.
pub fn render_tokens(
    arena: &AstArena,
    pool: &IdentPool,
    n: NodeId,
    flags: RenderFlags,
) -> TokenStream {
    let mut r = Renderer::new(arena, pool, flags);
    r.gsub(n);
    r.flush_comment_for(n);
    TokenStream { tokens: r.tokens, pos: 0 }
}

/// The rendered output as `(kind, literal)` pairs; the concatenation of all
/// literals equals the rendered source.
pub struct TokenStream {
    tokens: Vec<(TokKind, String)>,
    pos: usize,
}

impl TokenStream {
    /// The next token, or `None` at the end of the stream.
    pub fn next_token(&mut self) -> Option<(TokKind, &str)> {
        let (kind, text) = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some((*kind, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Iterator for TokenStream {
    type Item = (TokKind, String);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        item
    }
}

struct Renderer<'a> {
    arena: &'a AstArena,
    pool: &'a IdentPool,
    flags: RenderFlags,
    indent: usize,
    line_len: usize,
    /// -1 when no newline is pending, else the indent of the coming line.
    pending_nl: i32,
    tokens: Vec<(TokKind, String)>,
    buf: String,
}

impl<'a> Renderer<'a> {
    fn new(arena: &'a AstArena, pool: &'a IdentPool, flags: RenderFlags) -> Self {
        Renderer {
            arena,
            pool,
            flags,
            indent: 0,
            line_len: 0,
            pending_nl: -1,
            tokens: Vec::new(),
            buf: String::new(),
        }
    }

    // ------------------------------------------------------------------
    // Emission primitives
    // ------------------------------------------------------------------

    fn put(&mut self, kind: TokKind, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.pending_nl >= 0 {
            let indent = self.pending_nl as usize;
            let mut lead = String::with_capacity(indent + 1);
            lead.push('\n');
            for _ in 0..indent {
                lead.push(' ');
            }
            self.buf.push_str(&lead);
            self.tokens.push((TokKind::Indent, lead));
            self.line_len = indent;
            self.pending_nl = -1;
        }
        self.buf.push_str(text);
        self.line_len += text.chars().count();
        self.tokens.push((kind, text.to_string()));
    }

    fn put_kw(&mut self, kw: Kw) {
        self.put(TokKind::Keyword(kw), kw.text());
    }

    fn space(&mut self) {
        self.put(TokKind::Spaces, " ");
    }

    /// Defers a line break at the current indent.
    fn put_nl(&mut self) {
        self.pending_nl = self.indent as i32;
    }

    fn indent_more(&mut self) {
        self.indent += INDENT_STEP;
    }

    fn indent_less(&mut self) {
        self.indent = self.indent.saturating_sub(INDENT_STEP);
    }

    /// Breaks the line before `next` when it would not fit.
    fn optional_break(&mut self, next: NodeId) {
        if self.pending_nl < 0 && self.line_len + self.lsub(next) > MAX_LINE_LEN {
            self.pending_nl = (self.indent + LONG_INDENT) as i32;
        }
    }

    // ------------------------------------------------------------------
    // Length estimation
    // ------------------------------------------------------------------

    /// Upper bound on the one-line width of `n`; [`SENTINEL`] means the
    /// subtree must wrap.
    fn lsub(&self, n: NodeId) -> usize {
        if n.is_nil() {
            return 0;
        }
        let node = self.arena.node(n);
        if node.comment.is_some() && self.wants_comment(node.comment.as_deref().unwrap_or("")) {
            return SENTINEL;
        }
        let sons = node.sons();
        match node.kind {
            NodeKind::Empty => 0,
            NodeKind::Ident => self.ident_text(n).chars().count(),
            NodeKind::Sym => self.sym_text(n).chars().count(),
            NodeKind::CharLit => self.char_text(n).chars().count(),
            k if k.is_int_lit() => self.int_text(n).chars().count(),
            k if k.is_float_lit() => self.float_text(n).chars().count(),
            NodeKind::StrLit => {
                let escaped = escape_str(node.str_val().unwrap_or(""));
                if escaped.chars().count() > STR_SPLIT {
                    SENTINEL
                } else {
                    escaped.chars().count() + 2
                }
            }
            NodeKind::RStrLit => node.str_val().unwrap_or("").chars().count() + 3,
            NodeKind::TripleStrLit => SENTINEL,
            NodeKind::NilLit => 3,
            NodeKind::Call => {
                let callee = sons.first().copied().unwrap_or(NodeId::NIL);
                self.lsub(callee)
                    .saturating_add(self.len_comma(&sons[1.min(sons.len())..]))
                    .saturating_add(2)
            }
            NodeKind::HiddenCallConv => self.lsub(son(sons, 1)),
            NodeKind::Infix => self
                .lsub(son(sons, 1))
                .saturating_add(self.lsub(son(sons, 2)))
                .saturating_add(self.lsub(son(sons, 0)))
                .saturating_add(2),
            NodeKind::Prefix => {
                self.lsub(son(sons, 0)).saturating_add(self.lsub(son(sons, 1))).saturating_add(1)
            }
            NodeKind::Postfix => {
                self.lsub(son(sons, 0)).saturating_add(self.lsub(son(sons, 1)))
            }
            NodeKind::ExprEqExpr | NodeKind::Asgn => self
                .lsub(son(sons, 0))
                .saturating_add(self.lsub(son(sons, 1)))
                .saturating_add(3),
            NodeKind::ExprColonExpr => self
                .lsub(son(sons, 0))
                .saturating_add(self.lsub(son(sons, 1)))
                .saturating_add(2),
            NodeKind::DotExpr => {
                self.lsub(son(sons, 0)).saturating_add(self.lsub(son(sons, 1))).saturating_add(1)
            }
            NodeKind::BracketExpr => self
                .lsub(son(sons, 0))
                .saturating_add(self.len_comma(&sons[1.min(sons.len())..]))
                .saturating_add(2),
            NodeKind::Bracket | NodeKind::Curly => self.len_comma(sons).saturating_add(2),
            NodeKind::Par => self.len_comma(sons).saturating_add(2),
            NodeKind::Range => self
                .lsub(son(sons, 0))
                .saturating_add(self.lsub(son(sons, 1)))
                .saturating_add(2),
            NodeKind::Addr => self.lsub(son(sons, 0)).saturating_add(6),
            NodeKind::Deref => self.lsub(son(sons, 0)).saturating_add(2),
            NodeKind::TypeOf => self.lsub(son(sons, 0)).saturating_add(8),
            NodeKind::Pragma => {
                if self.flags.contains(RenderFlags::NO_PRAGMAS) {
                    0
                } else {
                    self.len_comma(sons).saturating_add(4)
                }
            }
            NodeKind::StmtList => match sons.len() {
                0 => 0,
                1 => self.lsub(sons[0]),
                _ => SENTINEL,
            },
            NodeKind::IfStmt | NodeKind::WhenStmt => {
                // One-line form only for a lone branch.
                if sons.len() == 1 {
                    self.lsub(sons[0]).saturating_add(4)
                } else {
                    SENTINEL
                }
            }
            NodeKind::ElifBranch => self
                .lsub(son(sons, 0))
                .saturating_add(self.lsub(son(sons, 1)))
                .saturating_add(2),
            NodeKind::ElseBranch => self.lsub(son(sons, 0)).saturating_add(6),
            NodeKind::WhileStmt => self
                .lsub(son(sons, 0))
                .saturating_add(self.lsub(son(sons, 1)))
                .saturating_add(8),
            NodeKind::ReturnStmt => self.lsub(son(sons, 0)).saturating_add(7),
            NodeKind::BreakStmt => self.lsub(son(sons, 0)).saturating_add(6),
            NodeKind::ContinueStmt => self.lsub(son(sons, 0)).saturating_add(9),
            NodeKind::DiscardStmt => self.lsub(son(sons, 0)).saturating_add(8),
            NodeKind::IdentDefs | NodeKind::ConstDef => {
                let mut total = 0usize;
                for &s in sons {
                    total = total.saturating_add(self.lsub(s)).saturating_add(2);
                }
                total
            }
            NodeKind::VarSection | NodeKind::ConstSection | NodeKind::TypeSection => {
                // More than one declarator always wraps.
                if sons.len() == 1 {
                    self.lsub(sons[0]).saturating_add(6)
                } else {
                    SENTINEL
                }
            }
            NodeKind::ImportStmt | NodeKind::FromStmt | NodeKind::IncludeStmt => {
                self.len_comma(sons).saturating_add(8)
            }
            k if k.is_routine_def() => SENTINEL,
            k if k.is_hidden_conversion() => self.lsub(son(sons, 0)),
            _ => SENTINEL,
        }
    }

    /// Width of a comma-separated list: the items plus `", "` between them.
    fn len_comma(&self, items: &[NodeId]) -> usize {
        let mut total = 0usize;
        for (i, &item) in items.iter().enumerate() {
            if i > 0 {
                total = total.saturating_add(2);
            }
            total = total.saturating_add(self.lsub(item));
        }
        total
    }

    fn fits(&self, n: NodeId) -> bool {
        self.line_len + self.lsub(n) <= MAX_LINE_LEN
    }

    // ------------------------------------------------------------------
    // Atom texts
    // ------------------------------------------------------------------

    fn ident_text(&self, n: NodeId) -> String {
        self.arena
            .node(n)
            .ident()
            .map(|id| self.pool.resolve(id).to_string())
            .unwrap_or_default()
    }

    fn sym_text(&self, n: NodeId) -> String {
        self.arena
            .node(n)
            .sym()
            .map(|s| self.pool.resolve(self.arena.sym(s).ident).to_string())
            .unwrap_or_default()
    }

    fn int_text(&self, n: NodeId) -> String {
        let node = self.arena.node(n);
        let value = node.int_val().unwrap_or(0);
        let size = node
            .typ
            .map(|t| type_size(self.arena, t))
            .filter(|&s| s > 0)
            .unwrap_or(8) as usize;
        let mut out = match literal_base(node.flags) {
            Some(2) => format!("0b{:0width$b}", masked(value, size), width = size * 8),
            Some(8) => format!("0o{:0width$o}", masked(value, size), width = size * 3),
            Some(16) => format!("0x{:0width$X}", masked(value, size), width = size * 2),
            _ => value.to_string(),
        };
        out.push_str(int_suffix(node.kind));
        out
    }

    fn float_text(&self, n: NodeId) -> String {
        let node = self.arena.node(n);
        let value = node.float_val().unwrap_or(0.0);
        let mut out = match literal_base(node.flags) {
            Some(base) => {
                // A based float is its bit pattern in that base.
                let (bits, size) = if node.kind == NodeKind::Float32Lit {
                    (u64::from((value as f32).to_bits()), 4usize)
                } else {
                    (value.to_bits(), 8usize)
                };
                match base {
                    2 => format!("0b{:0width$b}", bits, width = size * 8),
                    8 => format!("0o{:0width$o}", bits, width = size * 3),
                    _ => format!("0x{:0width$X}", bits, width = size * 2),
                }
            }
            None => format!("{value:?}"),
        };
        out.push_str(match node.kind {
            NodeKind::Float32Lit => "'f32",
            NodeKind::Float64Lit => "'f64",
            _ => "",
        });
        out
    }

    fn char_text(&self, n: NodeId) -> String {
        let value = self.arena.node(n).int_val().unwrap_or(0);
        let byte = (value & 0xff) as u8;
        if byte.is_ascii_graphic() && byte != b'\'' && byte != b'\\' {
            format!("'{}'", byte as char)
        } else {
            format!("'\\x{byte:02X}'")
        }
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    fn wants_comment(&self, text: &str) -> bool {
        if self.flags.contains(RenderFlags::NO_COMMENTS) {
            return false;
        }
        if self.flags.contains(RenderFlags::DOC_COMMENTS_ONLY) {
            return text.starts_with("##");
        }
        true
    }

    /// Emits the comment attached to `n`, if any: column-aligned on the
    /// current line when it fits, otherwise wrapped onto its own lines.
    fn flush_comment_for(&mut self, n: NodeId) {
        if n.is_nil() {
            return;
        }
        let Some(comment) = self.arena.node(n).comment.clone() else {
            return;
        };
        if !self.wants_comment(&comment) {
            return;
        }
        let one_line = !comment.contains('\n');
        let padded_start = self.line_len.max(COMMENT_COL - 1) + 1;
        if one_line && self.pending_nl < 0 && padded_start + comment.chars().count() <= MAX_LINE_LEN
        {
            let pad = padded_start - self.line_len;
            let spaces: String = std::iter::repeat(' ').take(pad).collect();
            self.put(TokKind::Spaces, &spaces);
            self.put(TokKind::Comment, &comment);
            return;
        }
        // Own lines, wrapped at the line limit with the original indent.
        let width = MAX_LINE_LEN.saturating_sub(self.indent + 2).max(16);
        for line in comment.split('\n') {
            let body = line.trim_start_matches('#').trim();
            let lead = if line.starts_with("##") { "## " } else { "# " };
            if body.is_empty() {
                self.put_nl();
                self.put(TokKind::Comment, lead.trim_end());
                continue;
            }
            let mut cur = String::new();
            for word in body.split_whitespace() {
                if !cur.is_empty() && cur.chars().count() + 1 + word.chars().count() > width {
                    self.put_nl();
                    let text = format!("{lead}{cur}");
                    self.put(TokKind::Comment, &text);
                    cur.clear();
                }
                if !cur.is_empty() {
                    cur.push(' ');
                }
                cur.push_str(word);
            }
            if !cur.is_empty() {
                self.put_nl();
                let text = format!("{lead}{cur}");
                self.put(TokKind::Comment, &text);
            }
        }
    }

    // ------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------

    fn gsub(&mut self, n: NodeId) {
        if n.is_nil() {
            return;
        }
        let kind = self.arena.node(n).kind;
        let sons = self.arena.node(n).sons().to_vec();
        match kind {
            NodeKind::Empty => {}
            NodeKind::Ident => {
                let text = self.ident_text(n);
                match keyword(&text) {
                    Some(kw) => self.put_kw(kw),
                    None => self.put(TokKind::Ident, &text),
                }
            }
            NodeKind::Sym => {
                let text = self.sym_text(n);
                self.put(TokKind::Ident, &text);
                if self.flags.contains(RenderFlags::SHOW_IDS) {
                    if let Some(sym) = self.arena.node(n).sym() {
                        let tag = format!("[{}]", sym.id());
                        self.put(TokKind::Comment, &tag);
                    }
                }
            }
            k if k.is_int_lit() => {
                let text = self.int_text(n);
                self.put(TokKind::IntLit, &text);
            }
            k if k.is_float_lit() => {
                let text = self.float_text(n);
                self.put(TokKind::FloatLit, &text);
            }
            NodeKind::CharLit => {
                let text = self.char_text(n);
                self.put(TokKind::CharLit, &text);
            }
            NodeKind::StrLit => self.put_string(n),
            NodeKind::RStrLit => {
                let raw = self.arena.node(n).str_val().unwrap_or("").replace('"', "\"\"");
                let text = format!("r\"{raw}\"");
                self.put(TokKind::StrLit, &text);
            }
            NodeKind::TripleStrLit => {
                let text =
                    format!("\"\"\"{}\"\"\"", self.arena.node(n).str_val().unwrap_or(""));
                self.put(TokKind::StrLit, &text);
            }
            NodeKind::NilLit => self.put_kw(Kw::Nil),
            NodeKind::Call => {
                self.gsub(son(&sons, 0));
                self.put(TokKind::ParLe, "(");
                self.put_comma_list(&sons[1.min(sons.len())..]);
                self.put(TokKind::ParRi, ")");
            }
            NodeKind::Infix => {
                self.gsub(son(&sons, 1));
                self.space();
                self.put_op(son(&sons, 0));
                self.space();
                self.optional_break(son(&sons, 2));
                self.gsub(son(&sons, 2));
            }
            NodeKind::Prefix => {
                let op_text = self.op_text(son(&sons, 0));
                self.put_op(son(&sons, 0));
                if op_text.chars().next().is_some_and(|c| c.is_alphabetic()) {
                    self.space();
                }
                self.gsub(son(&sons, 1));
            }
            NodeKind::Postfix => {
                self.gsub(son(&sons, 1));
                self.put_op(son(&sons, 0));
            }
            NodeKind::ExprEqExpr => {
                self.gsub(son(&sons, 0));
                self.space();
                self.put(TokKind::Equals, "=");
                self.space();
                self.gsub(son(&sons, 1));
            }
            NodeKind::ExprColonExpr => {
                self.gsub(son(&sons, 0));
                self.put(TokKind::Colon, ":");
                self.space();
                self.gsub(son(&sons, 1));
            }
            NodeKind::DotExpr => {
                self.gsub(son(&sons, 0));
                self.put(TokKind::Dot, ".");
                self.gsub(son(&sons, 1));
            }
            NodeKind::BracketExpr => {
                self.gsub(son(&sons, 0));
                self.put(TokKind::BracketLe, "[");
                self.put_comma_list(&sons[1.min(sons.len())..]);
                self.put(TokKind::BracketRi, "]");
            }
            NodeKind::Bracket => {
                self.put(TokKind::BracketLe, "[");
                self.put_comma_list(&sons);
                self.put(TokKind::BracketRi, "]");
            }
            NodeKind::Curly => {
                self.put(TokKind::CurlyLe, "{");
                self.put_comma_list(&sons);
                self.put(TokKind::CurlyRi, "}");
            }
            NodeKind::Par => {
                self.put(TokKind::ParLe, "(");
                self.put_comma_list(&sons);
                self.put(TokKind::ParRi, ")");
            }
            NodeKind::Range => {
                self.gsub(son(&sons, 0));
                self.put(TokKind::DotDot, "..");
                self.gsub(son(&sons, 1));
            }
            NodeKind::Addr => {
                self.put_kw(Kw::Addr);
                self.put(TokKind::ParLe, "(");
                self.gsub(son(&sons, 0));
                self.put(TokKind::ParRi, ")");
            }
            NodeKind::Deref => {
                self.gsub(son(&sons, 0));
                self.put(TokKind::Operator, "[]");
            }
            NodeKind::TypeOf => {
                self.put(TokKind::Ident, "typeof");
                self.put(TokKind::ParLe, "(");
                self.gsub(son(&sons, 0));
                self.put(TokKind::ParRi, ")");
            }
            NodeKind::Pragma => {
                if !self.flags.contains(RenderFlags::NO_PRAGMAS) {
                    self.put(TokKind::CurlyLe, "{.");
                    self.put_comma_list(&sons);
                    self.put(TokKind::CurlyRi, ".}");
                }
            }
            NodeKind::Asgn => {
                self.gsub(son(&sons, 0));
                self.space();
                self.put(TokKind::Equals, "=");
                self.space();
                self.optional_break(son(&sons, 1));
                self.gsub(son(&sons, 1));
            }
            NodeKind::StmtList => {
                for (i, &stmt) in sons.iter().enumerate() {
                    if stmt.is_nil() {
                        continue;
                    }
                    if i > 0 {
                        self.put_nl();
                    }
                    self.gsub(stmt);
                    self.flush_comment_for(stmt);
                }
            }
            NodeKind::IfStmt => self.put_if_like(Kw::If, &sons),
            NodeKind::WhenStmt => self.put_if_like(Kw::When, &sons),
            NodeKind::ElifBranch => {
                // Reached only for a branch outside an if; heads handle the
                // usual case.
                self.put_kw(Kw::Elif);
                self.space();
                self.gsub(son(&sons, 0));
                self.put_colon_body(son(&sons, 1));
            }
            NodeKind::ElseBranch => {
                self.put_kw(Kw::Else);
                self.put_colon_body(son(&sons, 0));
            }
            NodeKind::CaseStmt => {
                self.put_kw(Kw::Case);
                self.space();
                self.gsub(son(&sons, 0));
                for &branch in &sons[1.min(sons.len())..] {
                    self.put_nl();
                    match self.arena.node(branch).kind {
                        NodeKind::OfBranch => self.put_of_branch(branch),
                        _ => self.gsub(branch),
                    }
                }
            }
            NodeKind::OfBranch => self.put_of_branch(n),
            NodeKind::WhileStmt => {
                self.put_kw(Kw::While);
                self.space();
                self.gsub(son(&sons, 0));
                self.put_colon_body(son(&sons, 1));
            }
            NodeKind::ForStmt => {
                self.put_kw(Kw::For);
                self.space();
                let (vars, rest) = sons.split_at(sons.len().saturating_sub(2));
                self.put_comma_list(vars);
                self.space();
                self.put_kw(Kw::In);
                self.space();
                self.gsub(son(rest, 0));
                self.put_colon_body(son(rest, 1));
            }
            NodeKind::TryStmt => {
                self.put_kw(Kw::Try);
                self.put_colon_body(son(&sons, 0));
                for &handler in &sons[1.min(sons.len())..] {
                    self.put_nl();
                    self.gsub(handler);
                }
            }
            NodeKind::ExceptBranch => {
                self.put_kw(Kw::Except);
                let (excs, body) = sons.split_at(sons.len().saturating_sub(1));
                if !excs.is_empty() {
                    self.space();
                    self.put_comma_list(excs);
                }
                self.put_colon_body(son(body, 0));
            }
            NodeKind::Finally => {
                self.put_kw(Kw::Finally);
                self.put_colon_body(son(&sons, 0));
            }
            NodeKind::BlockStmt => {
                self.put_kw(Kw::Block);
                let label = son(&sons, 0);
                if !label.is_nil() {
                    self.space();
                    self.gsub(label);
                }
                self.put_colon_body(son(&sons, 1));
            }
            NodeKind::ReturnStmt => self.put_opt_expr_stmt(Kw::Return, son(&sons, 0)),
            NodeKind::BreakStmt => self.put_opt_expr_stmt(Kw::Break, son(&sons, 0)),
            NodeKind::ContinueStmt => self.put_opt_expr_stmt(Kw::Continue, son(&sons, 0)),
            NodeKind::DiscardStmt => self.put_opt_expr_stmt(Kw::Discard, son(&sons, 0)),
            k if k.is_routine_def() => self.put_routine(k, &sons),
            NodeKind::ConstDef => {
                self.gsub(son(&sons, 0));
                let typ = son(&sons, 1);
                if !typ.is_nil() {
                    self.put(TokKind::Colon, ":");
                    self.space();
                    self.gsub(typ);
                }
                self.space();
                self.put(TokKind::Equals, "=");
                self.space();
                self.gsub(son(&sons, 2));
            }
            NodeKind::IdentDefs => {
                let names = &sons[..sons.len().saturating_sub(2)];
                self.put_comma_list(names);
                let typ = sons.get(sons.len().wrapping_sub(2)).copied().unwrap_or(NodeId::NIL);
                if !typ.is_nil() {
                    self.put(TokKind::Colon, ":");
                    self.space();
                    self.gsub(typ);
                }
                let default = sons.last().copied().unwrap_or(NodeId::NIL);
                if !default.is_nil() {
                    self.space();
                    self.put(TokKind::Equals, "=");
                    self.space();
                    self.gsub(default);
                }
            }
            NodeKind::VarTuple => {
                let names = &sons[..sons.len().saturating_sub(2)];
                self.put(TokKind::ParLe, "(");
                self.put_comma_list(names);
                self.put(TokKind::ParRi, ")");
                self.space();
                self.put(TokKind::Equals, "=");
                self.space();
                self.gsub(sons.last().copied().unwrap_or(NodeId::NIL));
            }
            NodeKind::TypeDef => {
                self.gsub(son(&sons, 0));
                let gp = son(&sons, 1);
                if !gp.is_nil() {
                    self.gsub(gp);
                }
                self.space();
                self.put(TokKind::Equals, "=");
                self.space();
                self.gsub(son(&sons, 2));
            }
            NodeKind::GenericParams => {
                self.put(TokKind::BracketLe, "[");
                self.put_semi_list(&sons);
                self.put(TokKind::BracketRi, "]");
            }
            NodeKind::FormalParams => {
                self.put(TokKind::ParLe, "(");
                self.put_semi_list(&sons[1.min(sons.len())..]);
                self.put(TokKind::ParRi, ")");
                let ret = son(&sons, 0);
                if !ret.is_nil() {
                    self.put(TokKind::Colon, ":");
                    self.space();
                    self.gsub(ret);
                }
            }
            NodeKind::EnumFieldDef => {
                self.gsub(son(&sons, 0));
                self.space();
                self.put(TokKind::Equals, "=");
                self.space();
                self.gsub(son(&sons, 1));
            }
            NodeKind::EnumTy => {
                self.put_kw(Kw::Enum);
                self.indent_more();
                for &field in &sons {
                    self.put_nl();
                    self.gsub(field);
                    self.flush_comment_for(field);
                }
                self.indent_less();
            }
            NodeKind::ObjectTy => {
                self.put_kw(Kw::Object);
                let pragma = son(&sons, 0);
                if !pragma.is_nil() {
                    self.space();
                    self.gsub(pragma);
                }
                let inherit = son(&sons, 1);
                if !inherit.is_nil() {
                    self.space();
                    self.gsub(inherit);
                }
                self.indent_more();
                self.put_nl();
                self.gsub(son(&sons, 2));
                self.indent_less();
            }
            NodeKind::RecList => {
                for (i, &field) in sons.iter().enumerate() {
                    if field.is_nil() {
                        continue;
                    }
                    if i > 0 {
                        self.put_nl();
                    }
                    self.gsub(field);
                    self.flush_comment_for(field);
                }
            }
            NodeKind::RecCase => {
                self.put_kw(Kw::Case);
                self.space();
                self.gsub(son(&sons, 0));
                for &branch in &sons[1.min(sons.len())..] {
                    self.put_nl();
                    self.gsub(branch);
                }
            }
            NodeKind::RecWhen => self.put_if_like(Kw::When, &sons),
            NodeKind::OfInherit => {
                self.put_kw(Kw::Of);
                self.space();
                self.gsub(son(&sons, 0));
            }
            NodeKind::RefTy => self.put_ty_prefix(Kw::Ref, &sons),
            NodeKind::PtrTy => self.put_ty_prefix(Kw::Ptr, &sons),
            NodeKind::VarTy => self.put_ty_prefix(Kw::Var, &sons),
            NodeKind::DistinctTy => self.put_ty_prefix(Kw::Distinct, &sons),
            NodeKind::TupleTy => {
                self.put_kw(Kw::Tuple);
                self.put(TokKind::BracketLe, "[");
                self.put_semi_list(&sons);
                self.put(TokKind::BracketRi, "]");
            }
            NodeKind::ProcTy => {
                self.put_kw(Kw::Proc);
                self.gsub(son(&sons, 0));
                let pragma = son(&sons, 1);
                if !pragma.is_nil() {
                    self.space();
                    self.gsub(pragma);
                }
            }
            NodeKind::TypeSection => self.put_section(Kw::Type, &sons),
            NodeKind::ConstSection => self.put_section(Kw::Const, &sons),
            NodeKind::VarSection => self.put_section(Kw::Var, &sons),
            NodeKind::ImportStmt => {
                self.put_kw(Kw::Import);
                self.space();
                self.put_comma_list(&sons);
            }
            NodeKind::IncludeStmt => {
                self.put_kw(Kw::Include);
                self.space();
                self.put_comma_list(&sons);
            }
            NodeKind::FromStmt => {
                self.put_kw(Kw::From);
                self.space();
                self.gsub(son(&sons, 0));
                self.space();
                self.put_kw(Kw::Import);
                self.space();
                self.put_comma_list(&sons[1.min(sons.len())..]);
            }
            // Hidden conversions print as what the user wrote. A hidden
            // converter call keeps its argument at position 1.
            k if k.is_hidden_conversion() => {
                let idx = if k == NodeKind::HiddenCallConv { 1 } else { 0 };
                self.gsub(son(&sons, idx));
            }
            _ => {}
        }
    }

    fn put_string(&mut self, n: NodeId) {
        let escaped = escape_str(self.arena.node(n).str_val().unwrap_or(""));
        if escaped.chars().count() <= STR_SPLIT {
            let text = format!("\"{escaped}\"");
            self.put(TokKind::StrLit, &text);
            return;
        }
        // Long strings split into adjacent quoted fragments; the textual
        // meaning is the concatenation.
        let chars: Vec<char> = escaped.chars().collect();
        for (i, chunk) in chars.chunks(STR_SPLIT).enumerate() {
            if i > 0 {
                self.space();
            }
            let fragment: String = chunk.iter().collect();
            let text = format!("\"{fragment}\"");
            self.put(TokKind::StrLit, &text);
        }
    }

    fn op_text(&self, op: NodeId) -> String {
        if op.is_nil() {
            return String::new();
        }
        match self.arena.node(op).kind {
            NodeKind::Ident => self.ident_text(op),
            NodeKind::Sym => self.sym_text(op),
            _ => String::new(),
        }
    }

    fn put_op(&mut self, op: NodeId) {
        let text = self.op_text(op);
        self.put(TokKind::Operator, &text);
    }

    fn put_comma_list(&mut self, items: &[NodeId]) {
        self.put_list(items, TokKind::Comma, ",");
    }

    fn put_semi_list(&mut self, items: &[NodeId]) {
        self.put_list(items, TokKind::Semicolon, ";");
    }

    fn put_list(&mut self, items: &[NodeId], sep: TokKind, sep_text: &str) {
        for (i, &item) in items.iter().enumerate() {
            if i > 0 {
                self.put(sep, sep_text);
                self.space();
            }
            self.optional_break(item);
            self.gsub(item);
        }
    }

    /// `: body`, either on the same line when the whole statement fits or
    /// indented on fresh lines.
    fn put_colon_body(&mut self, body: NodeId) {
        self.put(TokKind::Colon, ":");
        if !body.is_nil() && self.lsub(body) < SENTINEL && self.fits(body) {
            self.space();
            self.gsub(body);
            return;
        }
        self.indent_more();
        self.put_nl();
        self.gsub(body);
        self.indent_less();
    }

    fn put_if_like(&mut self, head: Kw, branches: &[NodeId]) {
        for (i, &branch) in branches.iter().enumerate() {
            if branch.is_nil() {
                continue;
            }
            if i > 0 {
                self.put_nl();
            }
            let sons = self.arena.node(branch).sons().to_vec();
            match self.arena.node(branch).kind {
                NodeKind::ElifBranch => {
                    self.put_kw(if i == 0 { head } else { Kw::Elif });
                    self.space();
                    self.gsub(son(&sons, 0));
                    self.put_colon_body(son(&sons, 1));
                }
                NodeKind::ElseBranch => {
                    self.put_kw(Kw::Else);
                    self.put_colon_body(son(&sons, 0));
                }
                _ => self.gsub(branch),
            }
        }
    }

    fn put_of_branch(&mut self, branch: NodeId) {
        let sons = self.arena.node(branch).sons().to_vec();
        self.put_kw(Kw::Of);
        self.space();
        let (vals, body) = sons.split_at(sons.len().saturating_sub(1));
        self.put_comma_list(vals);
        self.put_colon_body(son(body, 0));
    }

    fn put_opt_expr_stmt(&mut self, kw: Kw, expr: NodeId) {
        self.put_kw(kw);
        if !expr.is_nil() {
            self.space();
            self.gsub(expr);
        }
    }

    fn put_section(&mut self, kw: Kw, defs: &[NodeId]) {
        self.put_kw(kw);
        if defs.len() == 1 && self.lsub(defs[0]) < SENTINEL && self.fits(defs[0]) {
            self.space();
            self.gsub(defs[0]);
            self.flush_comment_for(defs[0]);
            return;
        }
        self.indent_more();
        for &def in defs {
            if def.is_nil() {
                continue;
            }
            self.put_nl();
            self.gsub(def);
            self.flush_comment_for(def);
        }
        self.indent_less();
    }

    fn put_ty_prefix(&mut self, kw: Kw, sons: &[NodeId]) {
        self.put_kw(kw);
        let inner = son(sons, 0);
        if !inner.is_nil() {
            self.space();
            self.gsub(inner);
        }
    }

    fn put_routine(&mut self, kind: NodeKind, sons: &[NodeId]) {
        let kw = match kind {
            NodeKind::ProcDef => Kw::Proc,
            NodeKind::MethodDef => Kw::Method,
            NodeKind::IteratorDef => Kw::Iterator,
            NodeKind::MacroDef => Kw::Macro,
            NodeKind::TemplateDef => Kw::Template,
            _ => Kw::Converter,
        };
        self.put_kw(kw);
        self.space();
        self.gsub(son(sons, 0)); // name
        let gp = son(sons, 1);
        if !gp.is_nil() {
            self.gsub(gp);
        }
        self.gsub(son(sons, 2)); // formal params
        let pragma = son(sons, 3);
        if !pragma.is_nil() && !self.flags.contains(RenderFlags::NO_PRAGMAS) {
            self.space();
            self.gsub(pragma);
        }
        let body = son(sons, 4);
        if body.is_nil() || self.flags.contains(RenderFlags::NO_BODY) {
            return;
        }
        self.space();
        self.put(TokKind::Equals, "=");
        self.indent_more();
        self.put_nl();
        self.gsub(body);
        self.indent_less();
    }
}

fn son(sons: &[NodeId], i: usize) -> NodeId {
    sons.get(i).copied().unwrap_or(NodeId::NIL)
}

fn literal_base(flags: NodeFlags) -> Option<u32> {
    if flags.contains(NodeFlags::BASE2) {
        Some(2)
    } else if flags.contains(NodeFlags::BASE8) {
        Some(8)
    } else if flags.contains(NodeFlags::BASE16) {
        Some(16)
    } else {
        None
    }
}

fn int_suffix(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Int8Lit => "'i8",
        NodeKind::Int16Lit => "'i16",
        NodeKind::Int32Lit => "'i32",
        NodeKind::Int64Lit => "'i64",
        _ => "",
    }
}

fn masked(value: i64, size: usize) -> u64 {
    if size >= 8 {
        value as u64
    } else {
        (value as u64) & ((1u64 << (size * 8)) - 1)
    }
}

/// Escapes a string literal body: the metacharacters get backslashes,
/// control and non-ASCII bytes become `\xHH`, everything else passes
/// through.
pub fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'\'' => out.push_str("\\'"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02X}")),
        }
    }
    out
}
