//!
//! Script Syntax Tree
//!
//! A script is a flat list of statements. There is no control flow: the
//! language exists to sequence calls into the bridge.
//!

use std::fmt;

/// Byte range in the script source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Table(Vec<Expr>),
    Var { name: String, span: Span },
    Call(Call),
    Concat { left: Box<Expr>, right: Box<Expr>, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign { name: String, value: Expr, span: Span },
    Call(Call),
}
