//! Structured diagnostic records.
//!
//! The semantic core never prints: it produces [`Diagnostic`] values and
//! pushes them into the [`Diagnostics`] sink. The front-end decides how to
//! format and where to write them; the records serialize if it wants to
//! ship them as JSON.
//!
//! User errors are non-fatal: analysis continues on the next top-level
//! declaration. An [`DiagKind::InternalError`] is fatal and means a broken
//! compiler invariant, never a user mistake.

use cinder_base::SourceLoc;
use serde::Serialize;
use std::fmt;

/// What went wrong.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DiagKind {
    /// No overload accepted the arguments; lists what was tried.
    TypeMismatch { expected: String, got: String },
    /// Two overloads scored identically; both signatures are carried so
    /// the user can see the tie.
    AmbiguousCall { first: String, second: String },
    /// The left side of `name = value` in a call was not an identifier.
    NamedParamHasToBeIdent,
    /// The same parameter received two arguments.
    CannotBindTwice { name: String },
    UndeclaredIdentifier { name: String },
    /// A formatted message carrying a textual reason.
    Generated { message: String },
    /// Broken compiler invariant; fatal.
    InternalError { message: String },
}

impl DiagKind {
    pub fn is_fatal(&self) -> bool {
        matches!(self, DiagKind::InternalError { .. })
    }
}

impl fmt::Display for DiagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagKind::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: got {got}\nbut expected one of:\n{expected}")
            }
            DiagKind::AmbiguousCall { first, second } => {
                write!(f, "ambiguous call; both {first} and {second} match")
            }
            DiagKind::NamedParamHasToBeIdent => {
                write!(f, "named parameter has to be an identifier")
            }
            DiagKind::CannotBindTwice { name } => {
                write!(f, "cannot bind parameter '{name}' twice")
            }
            DiagKind::UndeclaredIdentifier { name } => {
                write!(f, "undeclared identifier: '{name}'")
            }
            DiagKind::Generated { message } => f.write_str(message),
            DiagKind::InternalError { message } => write!(f, "internal error: {message}"),
        }
    }
}

/// One reported problem, with the source position it refers to.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub loc: SourceLoc,
    #[serde(flatten)]
    pub kind: DiagKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.loc, self.kind)
    }
}

/// Collects diagnostics for the whole compilation unit.
#[derive(Default)]
pub struct Diagnostics {
    list: Vec<Diagnostic>,
    fatal: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, loc: SourceLoc, kind: DiagKind) {
        log::debug!("diagnostic at {loc}: {kind}");
        if kind.is_fatal() {
            self.fatal = true;
        }
        self.list.push(Diagnostic { loc, kind });
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.list.is_empty()
    }

    /// `true` once an internal error was reported; callers abort then.
    pub fn has_fatal(&self) -> bool {
        self.fatal
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.list.iter()
    }

    /// Hands the collected diagnostics to the caller, leaving the sink empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.list)
    }
}
