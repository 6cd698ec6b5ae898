//! Line lexer for the grammar notation.
//!
//! Each source line is scanned on its own. Offsets are character columns in
//! that line and point at the first character of a token, including its
//! opening delimiter, so errors can mark the exact spot.

use std::fmt;

use crate::utils::{LexError, LexErrorKind};

/// The kind of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `<name>`
    NonTerminal,
    /// `"text"`
    String,
    /// A run of decimal digits
    Digit,
    /// `::=`, `:=` or `=`
    Equals,
    /// `|` or `/`
    Choice,
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Asterisk,
}

/// A token with its text and starting column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token text; for literals and references the delimiters are stripped
    pub text: String,
    pub kind: TokenKind,
    pub offset: usize,
}

impl Token {
    pub fn new(text: &str, kind: TokenKind, offset: usize) -> Self {
        Token {
            text: text.to_string(),
            kind,
            offset,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Number of source characters the token spans
    pub fn width(&self) -> usize {
        let inner = self.text.chars().count();
        match self.kind {
            TokenKind::NonTerminal | TokenKind::String => inner + 2,
            _ => inner,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::NonTerminal => write!(f, "'<{}>'", self.text),
            TokenKind::String => write!(f, "'\"{}\"'", self.text),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

/// Operator spellings; a run of symbol characters must match one entry exactly.
const SYMBOLS: &[(&str, TokenKind)] = &[
    ("::=", TokenKind::Equals),
    (":=", TokenKind::Equals),
    ("=", TokenKind::Equals),
    ("|", TokenKind::Choice),
    ("/", TokenKind::Choice),
    ("(", TokenKind::OpenParen),
    (")", TokenKind::CloseParen),
    ("{", TokenKind::OpenBrace),
    ("}", TokenKind::CloseBrace),
    ("[", TokenKind::OpenBracket),
    ("]", TokenKind::CloseBracket),
    ("*", TokenKind::Asterisk),
];

fn is_symbol(c: char) -> bool {
    matches!(
        c,
        '|' | '/' | ':' | '=' | '(' | ')' | '{' | '}' | '[' | ']' | '*'
    )
}

/// Scanner over a single grammar line
pub struct Lexer<'a> {
    line: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(line: &'a str) -> Self {
        Lexer {
            line,
            chars: line.chars().collect(),
            pos: 0,
        }
    }

    /// Scan the whole line.
    ///
    /// An empty or blank line yields no tokens, which callers treat as "no rule
    /// here" rather than as an error.
    pub fn scan(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            match c {
                ' ' => self.pos += 1,
                '<' => tokens.push(self.delimited('>', TokenKind::NonTerminal)?),
                '"' => tokens.push(self.delimited('"', TokenKind::String)?),
                c if c.is_ascii_digit() => tokens.push(self.digits()),
                c if is_symbol(c) => tokens.push(self.symbol()?),
                c => {
                    return Err(self.error(self.pos, LexErrorKind::UnknownToken(c.to_string())));
                }
            }
        }

        Ok(tokens)
    }

    /// Current character, or `None` at a line terminator or end of input
    fn peek(&self) -> Option<char> {
        match self.chars.get(self.pos) {
            Some('\r') | Some('\n') | None => None,
            Some(&c) => Some(c),
        }
    }

    fn delimited(&mut self, close: char, kind: TokenKind) -> Result<Token, LexError> {
        let start = self.pos;
        self.pos += 1;

        while let Some(c) = self.peek() {
            if c == close {
                let text: String = self.chars[start + 1..self.pos].iter().collect();
                self.pos += 1;
                return Ok(Token {
                    text,
                    kind,
                    offset: start,
                });
            }
            self.pos += 1;
        }

        let error = match kind {
            TokenKind::NonTerminal => LexErrorKind::UnterminatedNonTerminal,
            _ => LexErrorKind::UnterminatedString,
        };
        Err(self.error(start, error))
    }

    fn digits(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        Token {
            text: self.chars[start..self.pos].iter().collect(),
            kind: TokenKind::Digit,
            offset: start,
        }
    }

    fn symbol(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        let run: String = self.chars[start..]
            .iter()
            .take_while(|&&c| is_symbol(c))
            .collect();

        match SYMBOLS.iter().find(|(spelling, _)| *spelling == run) {
            Some(&(_, kind)) => {
                self.pos += run.chars().count();
                Ok(Token::new(&run, kind, start))
            }
            None => Err(self.error(start, LexErrorKind::UnknownToken(run))),
        }
    }

    fn error(&self, offset: usize, kind: LexErrorKind) -> LexError {
        LexError {
            offset,
            kind,
            line: self.line.to_string(),
        }
    }
}

/// Convenience wrapper around [`Lexer::scan`]
pub fn scan(line: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(line).scan()
}
