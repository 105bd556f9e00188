//! Tokens of the path-data mini-language.

use logos::Logos;
use std::fmt;

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\x0C,]+")]
pub enum PathToken {
    #[regex(r"[A-Za-z]", |lex| lex.slice().chars().next())]
    Command(char),
    #[regex(
        r"[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?",
        |lex| lex.slice().parse::<f64>().ok().filter(|v| v.is_finite())
    )]
    Number(f64),
}

impl PathToken {
    pub fn number(&self) -> Option<f64> {
        match self {
            PathToken::Number(v) => Some(*v),
            PathToken::Command(_) => None,
        }
    }
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathToken::Command(c) => write!(f, "{c}"),
            PathToken::Number(v) => write!(f, "{v}"),
        }
    }
}

/// Offending input that could not be tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub offset: usize,
    pub text: String,
}

/// Splits `d` into command letters and numbers.
///
/// The large-arc and sweep flags of `A`/`a` are single characters, so `a5 5 0 0010 0` carries the
/// flags `0`, `0` followed by `10 0`.
pub fn tokenize(d: &str) -> Result<Vec<PathToken>, LexError> {
    let mut lexer = PathToken::lexer(d);
    let mut base = 0;
    let mut arc_params: Option<usize> = None;
    let mut out = Vec::new();
    while let Some(token) = lexer.next() {
        match token {
            Ok(PathToken::Command(c)) => {
                arc_params = matches!(c, 'A' | 'a').then_some(0);
                out.push(PathToken::Command(c));
            }
            Ok(PathToken::Number(value)) => {
                let slice = lexer.slice();
                let flag = match arc_params.as_mut() {
                    Some(n) => {
                        let is_flag = matches!(*n % 7, 3 | 4);
                        *n += 1;
                        is_flag
                    }
                    None => false,
                };
                match slice.as_bytes() {
                    [digit @ (b'0' | b'1'), _, ..] if flag => {
                        out.push(PathToken::Number(f64::from(digit - b'0')));
                        base += lexer.span().start + 1;
                        lexer = PathToken::lexer(&d[base..]);
                    }
                    _ => out.push(PathToken::Number(value)),
                }
            }
            Err(()) => {
                return Err(LexError {
                    offset: base + lexer.span().start,
                    text: lexer.slice().to_string(),
                });
            }
        }
    }
    Ok(out)
}

/// Builds token arrays for synthesized path data (shape converters).
#[derive(Debug, Default, Clone)]
pub struct PathBuilder {
    tokens: Vec<PathToken>,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(mut self, c: char) -> Self {
        self.tokens.push(PathToken::Command(c));
        self
    }

    pub fn numbers(mut self, values: &[f64]) -> Self {
        self.tokens
            .extend(values.iter().copied().map(PathToken::Number));
        self
    }

    pub fn push(mut self, c: char, values: &[f64]) -> Self {
        self = self.command(c);
        self.numbers(values)
    }

    pub fn build(self) -> Vec<PathToken> {
        self.tokens
    }
}
