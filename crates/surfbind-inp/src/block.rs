use std::fmt::{Display, Formatter};

use crate::ParseError;
use crate::lexer::{Token, TokenKind, body_tokens, last_line};

/// One element of a count block.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Scalar(f64),
    Tuple(Vec<f64>),
}

impl Element {
    /// Components of the element; a scalar is a one-component slice.
    pub fn components(&self) -> &[f64] {
        match self {
            Element::Scalar(v) => std::slice::from_ref(v),
            Element::Tuple(values) => values,
        }
    }
}

/// A parsed `N ( ... )` block.
#[derive(Debug, Clone, PartialEq)]
pub struct CountBlock {
    pub elements: Vec<Element>,
    /// Line of the count token.
    pub line: usize,
}

impl CountBlock {
    /// Locate the count-prefixed block and parse its elements.
    ///
    /// When `token` is non-empty and appears as a word in `raw`, the search
    /// for the count starts right after its first occurrence. The token also
    /// names the block in error messages.
    pub fn parse(raw: &str, token: &str) -> Result<Self, ParseError> {
        let tokens = body_tokens(raw)?;
        let label = if token.is_empty() { "block" } else { token };

        let search_from = if token.is_empty() {
            0
        } else {
            tokens
                .iter()
                .position(|t| t.kind == TokenKind::Word(token))
                .map_or(0, |idx| idx + 1)
        };

        let (count_idx, count) = find_count(&tokens, search_from).ok_or_else(|| {
            ParseError::syntax(
                last_line(&tokens),
                format!("no count-prefixed list found for `{label}`"),
            )
        })?;
        let line = tokens[count_idx].line;

        // the declared count is untrusted; each element needs at least one token
        let mut elements = Vec::with_capacity(count.min(tokens.len() - count_idx));
        let mut i = count_idx + 2;
        loop {
            let Some(token) = tokens.get(i) else {
                return Err(ParseError::syntax(
                    last_line(&tokens),
                    format!("unterminated list for `{label}`: expected ')'"),
                ));
            };
            match token.kind {
                TokenKind::Close => break,
                TokenKind::Open => {
                    let (values, next) = parse_tuple(&tokens, i, label)?;
                    elements.push(Element::Tuple(values));
                    i = next;
                }
                TokenKind::Word(word) => {
                    if tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::Open) {
                        let prefix = word.parse::<usize>().map_err(|_| {
                            ParseError::syntax(
                                token.line,
                                format!("invalid tuple size `{word}` in `{label}`"),
                            )
                        })?;
                        let (values, next) = parse_tuple(&tokens, i + 1, label)?;
                        if values.len() != prefix {
                            return Err(ParseError::count_mismatch(
                                token.line,
                                format!(
                                    "tuple in `{label}` declares {prefix} values but contains {}",
                                    values.len()
                                ),
                            ));
                        }
                        elements.push(Element::Tuple(values));
                        i = next;
                    } else {
                        elements.push(Element::Scalar(parse_scalar(token, word, label)?));
                        i += 1;
                    }
                }
                _ => {
                    return Err(ParseError::syntax(
                        token.line,
                        format!("unexpected token in `{label}` list"),
                    ));
                }
            }
        }

        if elements.len() != count {
            return Err(ParseError::count_mismatch(
                line,
                format!(
                    "`{label}` declares {count} elements but contains {}",
                    elements.len()
                ),
            ));
        }

        Ok(Self { elements, line })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Display for CountBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.elements.len())?;
        writeln!(f, "(")?;
        for element in &self.elements {
            match element {
                Element::Scalar(v) => writeln!(f, "{v}")?,
                Element::Tuple(values) => {
                    let joined = values
                        .iter()
                        .map(f64::to_string)
                        .collect::<Vec<_>>()
                        .join(" ");
                    writeln!(f, "({joined})")?;
                }
            }
        }
        writeln!(f, ")")
    }
}

fn find_count(tokens: &[Token<'_>], from: usize) -> Option<(usize, usize)> {
    (from..tokens.len().saturating_sub(1)).find_map(|idx| {
        let count = tokens[idx].word()?.parse::<usize>().ok()?;
        (tokens[idx + 1].kind == TokenKind::Open).then_some((idx, count))
    })
}

/// Parse `( v1 v2 ... )` starting at the `(` at `open`; returns the values and
/// the index after the closing `)`.
fn parse_tuple(
    tokens: &[Token<'_>],
    open: usize,
    label: &str,
) -> Result<(Vec<f64>, usize), ParseError> {
    let mut values = Vec::new();
    let mut i = open + 1;
    loop {
        let Some(token) = tokens.get(i) else {
            return Err(ParseError::syntax(
                tokens[open].line,
                format!("unterminated tuple in `{label}`"),
            ));
        };
        match token.kind {
            TokenKind::Close => return Ok((values, i + 1)),
            TokenKind::Word(word) => values.push(parse_scalar(token, word, label)?),
            TokenKind::Open => {
                return Err(ParseError::syntax(
                    token.line,
                    format!("nested tuple in `{label}`"),
                ));
            }
            _ => {
                return Err(ParseError::syntax(
                    token.line,
                    format!("unexpected token in `{label}` tuple"),
                ));
            }
        }
        i += 1;
    }
}

fn parse_scalar(token: &Token<'_>, word: &str, label: &str) -> Result<f64, ParseError> {
    word.parse::<f64>().map_err(|_| {
        ParseError::syntax(token.line, format!("invalid scalar `{word}` in `{label}`"))
    })
}
