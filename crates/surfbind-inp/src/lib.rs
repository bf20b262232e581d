//! Parser for the ASCII list-in-parentheses mesh/field text format.
//!
//! Two grammars are supported:
//! - **count blocks**: `N ( e1 e2 ... )`, where each element is a bare scalar
//!   or a parenthesized tuple of scalars (optionally size-prefixed, `4(0 1 2 3)`)
//! - **dictionaries**: `name { key value; ... }`, as used by boundary files
//!
//! Comments (`//`, `/* */`) and a leading `FoamFile { ... }` header are ignored.

use std::fmt::{Display, Formatter};

mod block;
mod dict;
mod lexer;

pub use block::{CountBlock, Element};
pub use dict::{Dictionary, Entry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Grammar violation: missing count, parenthesis, brace or terminator.
    Syntax,
    /// A declared element count disagrees with the parsed elements.
    CountMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
    pub message: String,
}

impl ParseError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            kind: ParseErrorKind::Syntax,
            message: message.into(),
        }
    }

    pub(crate) fn count_mismatch(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            kind: ParseErrorKind::CountMismatch,
            message: message.into(),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}
