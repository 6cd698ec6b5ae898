//! Recursive-descent parser for rule bodies.
//!
//! ```text
//! choice   := sequence ('|' sequence)*
//! sequence := primary+
//! primary  := <name> | "text" | '(' choice ')' | '[' choice ']' | '{' choice '}'
//!           | '*' [digit] primary | digit '*' [digit] primary | digit
//! ```

use crate::ast::Expr;
use crate::lexer::{Token, TokenKind};
use crate::utils::{ParseError, ParseErrorKind};

/// Upper bound used by `{}`, `*` and `n*` when no explicit max is given
pub const DEFAULT_MAX_REPETITIONS: u32 = 10;

/// Parser over the body tokens of one rule
pub struct Parser<'a> {
    tokens: &'a [Token],
    line: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    /// `tokens` is the rule body with head and assignment removed; `line` is the
    /// full source line, used for diagnostics.
    pub fn new(tokens: &'a [Token], line: &'a str) -> Self {
        Parser {
            tokens,
            line,
            pos: 0,
        }
    }

    /// Parse one choice expression.
    ///
    /// Tokens left after the expression are not an error; see [`Parser::remaining`].
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        self.parse_choice()
    }

    /// Tokens not consumed by the last call to [`Parser::parse`]
    pub fn remaining(&self) -> &'a [Token] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }

    fn parse_choice(&mut self) -> Result<Expr, ParseError> {
        let mut alternatives = vec![self.parse_sequence()?];

        while self.eat(TokenKind::Choice).is_some() {
            alternatives.push(self.parse_sequence()?);
        }

        if alternatives.len() == 1 {
            Ok(alternatives.remove(0))
        } else {
            Ok(Expr::Choice(alternatives))
        }
    }

    fn parse_sequence(&mut self) -> Result<Expr, ParseError> {
        let mut items = vec![self.parse_primary()?];

        while self.can_start_primary() {
            items.push(self.parse_primary()?);
        }

        Ok(Expr::Sequence(items))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.advance() else {
            return Err(self.expected_expression(None));
        };

        match token.kind {
            TokenKind::NonTerminal => Ok(Expr::NonTerminal(token.text.clone())),
            TokenKind::String => Ok(Expr::String(token.text.clone())),
            TokenKind::OpenParen => self.parse_group(token, '(', ')', TokenKind::CloseParen),
            TokenKind::OpenBracket => {
                let inner = self.parse_group(token, '[', ']', TokenKind::CloseBracket)?;
                Ok(Expr::optional(inner))
            }
            TokenKind::OpenBrace => {
                let inner = self.parse_group(token, '{', '}', TokenKind::CloseBrace)?;
                Ok(Expr::repetition(0, DEFAULT_MAX_REPETITIONS, inner))
            }
            TokenKind::Asterisk => {
                let max = match self.eat(TokenKind::Digit) {
                    Some(digit) => self.count(digit)?,
                    None => DEFAULT_MAX_REPETITIONS,
                };
                let inner = self.parse_primary()?;
                Ok(Expr::repetition(0, max, inner))
            }
            TokenKind::Digit => {
                if self.eat(TokenKind::Asterisk).is_none() {
                    return Ok(Expr::Digit(token.text.clone()));
                }
                let min = self.count(token)?;
                let max = match self.eat(TokenKind::Digit) {
                    Some(digit) => Some(self.count(digit)?),
                    None => None,
                };
                let inner = self.parse_primary()?;
                let max = match max {
                    Some(max) if max < min => {
                        return Err(self.error(token, ParseErrorKind::BoundViolation { min, max }));
                    }
                    Some(max) => max,
                    None => min.saturating_add(DEFAULT_MAX_REPETITIONS),
                };
                Ok(Expr::repetition(min, max, inner))
            }
            TokenKind::Equals
            | TokenKind::Choice
            | TokenKind::CloseParen
            | TokenKind::CloseBrace
            | TokenKind::CloseBracket => Err(self.expected_expression(Some(token))),
        }
    }

    fn parse_group(
        &mut self,
        opener: &Token,
        open: char,
        expected: char,
        close: TokenKind,
    ) -> Result<Expr, ParseError> {
        let inner = self.parse_choice()?;
        if self.eat(close).is_some() {
            return Ok(inner);
        }
        let found = describe(self.peek());
        Err(self.error(
            opener,
            ParseErrorKind::UnmatchedDelimiter {
                open,
                expected,
                found,
            },
        ))
    }

    fn can_start_primary(&self) -> bool {
        self.peek().is_some_and(|t| {
            matches!(
                t.kind,
                TokenKind::NonTerminal
                    | TokenKind::String
                    | TokenKind::OpenParen
                    | TokenKind::OpenBrace
                    | TokenKind::OpenBracket
                    | TokenKind::Asterisk
                    | TokenKind::Digit
            )
        })
    }

    fn count(&self, token: &Token) -> Result<u32, ParseError> {
        token
            .text
            .parse()
            .map_err(|_| self.error(token, ParseErrorKind::InvalidCount(token.text.clone())))
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn eat(&mut self, kind: TokenKind) -> Option<&'a Token> {
        match self.peek() {
            Some(token) if token.is(kind) => self.advance(),
            _ => None,
        }
    }

    fn expected_expression(&self, token: Option<&Token>) -> ParseError {
        let found = describe(token);
        match token {
            Some(token) => self.error(token, ParseErrorKind::ExpectedExpression { found }),
            None => self.at_end(ParseErrorKind::ExpectedExpression { found }),
        }
    }

    fn error(&self, token: &Token, kind: ParseErrorKind) -> ParseError {
        ParseError {
            offset: token.offset,
            width: token.width(),
            kind,
            line: self.line.to_string(),
        }
    }

    fn at_end(&self, kind: ParseErrorKind) -> ParseError {
        let offset = self
            .line
            .trim_end_matches(['\r', '\n'])
            .trim_end()
            .chars()
            .count();
        ParseError {
            offset,
            width: 1,
            kind,
            line: self.line.to_string(),
        }
    }
}

fn describe(token: Option<&Token>) -> String {
    match token {
        Some(token) => token.to_string(),
        None => "end of line".to_string(),
    }
}
