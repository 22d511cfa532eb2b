//! The renderer's token vocabulary.
//!
//! The renderer does not write raw bytes: it emits a stream of
//! `(kind, literal)` tokens whose literals concatenate to the rendered
//! source. Tools that consume the stream (highlighters, signature
//! listers) get the same classification the parser's lexer would produce.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Reserved words, one variant per keyword.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Kw {
    Addr,
    Block,
    Break,
    Case,
    Const,
    Continue,
    Converter,
    Discard,
    Distinct,
    Elif,
    Else,
    Enum,
    Except,
    Finally,
    For,
    From,
    If,
    Import,
    In,
    Include,
    Iterator,
    Macro,
    Method,
    Nil,
    Object,
    Of,
    Proc,
    Ptr,
    Ref,
    Return,
    Template,
    Try,
    Tuple,
    Type,
    Var,
    When,
    While,
}

impl Kw {
    /// The keyword's spelling.
    pub fn text(self) -> &'static str {
        match self {
            Kw::Addr => "addr",
            Kw::Block => "block",
            Kw::Break => "break",
            Kw::Case => "case",
            Kw::Const => "const",
            Kw::Continue => "continue",
            Kw::Converter => "converter",
            Kw::Discard => "discard",
            Kw::Distinct => "distinct",
            Kw::Elif => "elif",
            Kw::Else => "else",
            Kw::Enum => "enum",
            Kw::Except => "except",
            Kw::Finally => "finally",
            Kw::For => "for",
            Kw::From => "from",
            Kw::If => "if",
            Kw::Import => "import",
            Kw::In => "in",
            Kw::Include => "include",
            Kw::Iterator => "iterator",
            Kw::Macro => "macro",
            Kw::Method => "method",
            Kw::Nil => "nil",
            Kw::Object => "object",
            Kw::Of => "of",
            Kw::Proc => "proc",
            Kw::Ptr => "ptr",
            Kw::Ref => "ref",
            Kw::Return => "return",
            Kw::Template => "template",
            Kw::Try => "try",
            Kw::Tuple => "tuple",
            Kw::Type => "type",
            Kw::Var => "var",
            Kw::When => "when",
            Kw::While => "while",
        }
    }
}

/// All keywords by spelling, for classifying identifiers.
static KEYWORDS: Lazy<FxHashMap<&'static str, Kw>> = Lazy::new(|| {
    use Kw::*;
    [
        Addr, Block, Break, Case, Const, Continue, Converter, Discard, Distinct, Elif, Else,
        Enum, Except, Finally, For, From, If, Import, In, Include, Iterator, Macro, Method, Nil,
        Object, Of, Proc, Ptr, Ref, Return, Template, Try, Tuple, Type, Var, When, While,
    ]
    .into_iter()
    .map(|kw| (kw.text(), kw))
    .collect()
});

/// Looks up a spelling in the keyword table.
pub fn keyword(s: &str) -> Option<Kw> {
    KEYWORDS.get(s).copied()
}

/// Token classification, mirroring the lexer's enumeration.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokKind {
    Invalid,
    Ident,
    Keyword(Kw),
    IntLit,
    FloatLit,
    StrLit,
    CharLit,
    Operator,
    Comment,
    /// A line break plus the indentation of the coming line.
    Indent,
    /// Horizontal space inside a line.
    Spaces,
    ParLe,
    ParRi,
    BracketLe,
    BracketRi,
    CurlyLe,
    CurlyRi,
    Comma,
    Semicolon,
    Colon,
    Equals,
    Dot,
    DotDot,
}
