use crate::ParseError;
use crate::lexer::{Token, TokenKind, body_tokens, last_line, matching_brace};

/// A named `name { key value; ... }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    pub name: String,
    pub entries: Vec<Entry>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    /// Raw value text, e.g. `List<word> 1(wall)`.
    pub value: String,
    pub line: usize,
}

impl Dictionary {
    /// Parse every dictionary in `raw`, in declaration order.
    ///
    /// Dictionaries may sit at top level or inside an outer `N ( ... )` list;
    /// in the latter case `N` must equal the number of dictionaries found.
    pub fn parse_all(raw: &str) -> Result<Vec<Self>, ParseError> {
        let tokens = body_tokens(raw)?;
        let mut i = 0usize;

        let outer = match (tokens.first(), tokens.get(1)) {
            (Some(first), Some(second)) if second.kind == TokenKind::Open => first
                .word()
                .and_then(|w| w.parse::<usize>().ok())
                .map(|count| (count, first.line)),
            _ => None,
        };
        if outer.is_some() {
            i = 2;
        }

        let mut dicts = Vec::new();
        let mut closed = outer.is_none();
        while i < tokens.len() {
            let token = &tokens[i];
            match token.kind {
                TokenKind::Close if outer.is_some() && !closed => {
                    closed = true;
                    i += 1;
                }
                TokenKind::Word(name)
                    if tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::BraceOpen) =>
                {
                    let end = matching_brace(&tokens, i + 1).ok_or_else(|| {
                        ParseError::syntax(token.line, format!("unterminated dictionary `{name}`"))
                    })?;
                    dicts.push(Dictionary {
                        name: name.to_string(),
                        entries: parse_entries(&tokens[i + 2..end], name)?,
                        line: token.line,
                    });
                    i = end + 1;
                }
                TokenKind::Word(_) => {
                    // stray `key value;` entry outside any dictionary
                    i = skip_entry(&tokens, i)?;
                }
                _ => {
                    return Err(ParseError::syntax(
                        token.line,
                        "unexpected token outside dictionary",
                    ));
                }
            }
        }

        if let Some((count, line)) = outer {
            if !closed {
                return Err(ParseError::syntax(
                    last_line(&tokens),
                    "unterminated dictionary list: expected ')'",
                ));
            }
            if count != dicts.len() {
                return Err(ParseError::count_mismatch(
                    line,
                    format!(
                        "dictionary list declares {count} entries but contains {}",
                        dicts.len()
                    ),
                ));
            }
        }

        Ok(dicts)
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// First word of the value stored under `key`.
    pub fn word(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|e| e.value.split_whitespace().next())
    }

    /// Value under `key` as a non-negative integer; missing or malformed
    /// values are reported against the dictionary.
    pub fn require_usize(&self, key: &str) -> Result<usize, ParseError> {
        let entry = self.get(key).ok_or_else(|| {
            ParseError::syntax(
                self.line,
                format!("dictionary `{}` is missing required entry `{key}`", self.name),
            )
        })?;
        entry.value.trim().parse::<usize>().map_err(|_| {
            ParseError::syntax(
                entry.line,
                format!(
                    "entry `{key}` in `{}` is not a non-negative integer: `{}`",
                    self.name, entry.value
                ),
            )
        })
    }

    pub fn require_word(&self, key: &str) -> Result<&str, ParseError> {
        self.word(key).ok_or_else(|| {
            ParseError::syntax(
                self.line,
                format!("dictionary `{}` is missing required entry `{key}`", self.name),
            )
        })
    }
}

fn parse_entries(tokens: &[Token<'_>], dict_name: &str) -> Result<Vec<Entry>, ParseError> {
    let mut entries = Vec::new();
    let mut i = 0usize;
    while i < tokens.len() {
        let token = &tokens[i];
        let Some(key) = token.word() else {
            return Err(ParseError::syntax(
                token.line,
                format!("expected entry name in `{dict_name}`"),
            ));
        };

        if tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::BraceOpen) {
            // nested sub-dictionary; not needed by any consumer
            let end = matching_brace(tokens, i + 1).ok_or_else(|| {
                ParseError::syntax(token.line, format!("unterminated sub-dictionary `{key}`"))
            })?;
            i = end + 1;
            continue;
        }

        let mut value = String::new();
        let mut j = i + 1;
        loop {
            let Some(next) = tokens.get(j) else {
                return Err(ParseError::syntax(
                    token.line,
                    format!("entry `{key}` in `{dict_name}` is missing ';'"),
                ));
            };
            match next.kind {
                TokenKind::Semicolon => break,
                TokenKind::BraceOpen | TokenKind::BraceClose => {
                    return Err(ParseError::syntax(
                        token.line,
                        format!("entry `{key}` in `{dict_name}` is missing ';'"),
                    ));
                }
                TokenKind::Open => value.push('('),
                TokenKind::Close => value.push(')'),
                TokenKind::Word(word) => {
                    if !value.is_empty() && !value.ends_with('(') {
                        value.push(' ');
                    }
                    value.push_str(word);
                }
            }
            j += 1;
        }

        entries.push(Entry {
            key: key.to_string(),
            value,
            line: token.line,
        });
        i = j + 1;
    }
    Ok(entries)
}

fn skip_entry(tokens: &[Token<'_>], start: usize) -> Result<usize, ParseError> {
    tokens[start..]
        .iter()
        .position(|t| t.kind == TokenKind::Semicolon)
        .map(|offset| start + offset + 1)
        .ok_or_else(|| ParseError::syntax(tokens[start].line, "top-level entry is missing ';'"))
}
