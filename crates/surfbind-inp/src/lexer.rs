use crate::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind<'a> {
    Word(&'a str),
    Open,
    Close,
    BraceOpen,
    BraceClose,
    Semicolon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub line: usize,
}

impl<'a> Token<'a> {
    pub fn word(&self) -> Option<&'a str> {
        match self.kind {
            TokenKind::Word(w) => Some(w),
            _ => None,
        }
    }
}

/// Tokenize `src` and drop a leading `FoamFile { ... }` header.
pub(crate) fn body_tokens(src: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let mut tokens = tokenize(src)?;
    let has_header = matches!(
        tokens.as_slice(),
        [
            Token { kind: TokenKind::Word("FoamFile"), .. },
            Token { kind: TokenKind::BraceOpen, .. },
            ..
        ]
    );
    if has_header {
        let end = matching_brace(&tokens, 1).ok_or_else(|| {
            ParseError::syntax(tokens[0].line, "unterminated FoamFile header")
        })?;
        tokens.drain(..=end);
    }
    Ok(tokens)
}

/// Index of the `}` closing the `{` at `open`.
pub(crate) fn matching_brace(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::BraceOpen => depth += 1,
            TokenKind::BraceClose => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

pub(crate) fn last_line(tokens: &[Token<'_>]) -> usize {
    tokens.last().map(|t| t.line).unwrap_or(1)
}

fn tokenize(src: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut line = 1usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\n' => {
                line += 1;
                i += 1;
            }
            b if b.is_ascii_whitespace() => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let start_line = line;
                i += 2;
                loop {
                    if i + 1 >= bytes.len() {
                        return Err(ParseError::syntax(start_line, "unterminated block comment"));
                    }
                    if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                        i += 2;
                        break;
                    }
                    if bytes[i] == b'\n' {
                        line += 1;
                    }
                    i += 1;
                }
            }
            b'(' | b')' | b'{' | b'}' | b';' => {
                let kind = match b {
                    b'(' => TokenKind::Open,
                    b')' => TokenKind::Close,
                    b'{' => TokenKind::BraceOpen,
                    b'}' => TokenKind::BraceClose,
                    _ => TokenKind::Semicolon,
                };
                tokens.push(Token { kind, line });
                i += 1;
            }
            b'"' => {
                let start_line = line;
                let start = i + 1;
                i = start;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\n' {
                        line += 1;
                    }
                    i += 1;
                }
                if i >= bytes.len() {
                    return Err(ParseError::syntax(start_line, "unterminated string"));
                }
                tokens.push(Token {
                    kind: TokenKind::Word(&src[start..i]),
                    line: start_line,
                });
                i += 1;
            }
            _ => {
                let start = i;
                while i < bytes.len() && !ends_word(bytes, i) {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Word(&src[start..i]),
                    line,
                });
            }
        }
    }

    Ok(tokens)
}

fn ends_word(bytes: &[u8], i: usize) -> bool {
    match bytes[i] {
        b'(' | b')' | b'{' | b'}' | b';' | b'"' => true,
        b'/' => matches!(bytes.get(i + 1), Some(b'/') | Some(b'*')),
        b => b.is_ascii_whitespace(),
    }
}
