//! Arithmetic grammar for calculator input.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+')* postfix
//! postfix := primary '%'*
//! primary := number | '(' expr ')'
//! ```
//!
//! `x`, `X` and `×` are accepted for multiplication, `÷` for division, and a
//! comma may be used as the decimal separator. Input without any operator is
//! not a calculation, and neither are hyphenated digit groups with a
//! zero-padded group (`2024-03-12`, `06-12-34-56-78`), which read as dates or
//! phone numbers.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

/// Results are rounded to this many decimal places
const ROUNDING_DIGITS: i32 = 10;

/// Longer input is never evaluated
const MAX_EXPRESSION_CHARS: usize = 256;

/// Deepest parenthesis nesting the evaluator follows
const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("not an arithmetic expression")]
    Syntax,
    #[error("expression has no operator")]
    NoOperator,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NotFinite,
    #[error("expression is too long or too deeply nested")]
    TooDeep,
    #[error("hyphenated digit groups are not a calculation")]
    DigitGroups,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
}

impl Token {
    fn is_operator(self) -> bool {
        matches!(self, Token::Plus | Token::Minus | Token::Star | Token::Slash | Token::Percent)
    }
}

/// Evaluate `input` as an arithmetic expression
pub fn evaluate(input: &str) -> Result<f64, CalcError> {
    if input.chars().count() > MAX_EXPRESSION_CHARS {
        return Err(CalcError::TooDeep);
    }
    if is_digit_groups(input) {
        return Err(CalcError::DigitGroups);
    }

    let tokens = tokenize(input)?;
    if !tokens.iter().any(|token| token.is_operator()) {
        return Err(CalcError::NoOperator);
    }

    let mut parser = Parser { tokens: &tokens, pos: 0, depth: 0 };
    let value = parser.expr()?;
    if parser.pos != tokens.len() {
        return Err(CalcError::Syntax);
    }

    if !value.is_finite() {
        return Err(CalcError::NotFinite);
    }
    Ok(round(value))
}

/// `2024-03-12` or `06-12-34-56-78`: only digits and hyphens, at least one
/// group zero-padded
fn is_digit_groups(input: &str) -> bool {
    let groups: Vec<&str> = input.trim().split('-').map(str::trim).collect();
    groups.len() > 1
        && groups.iter().all(|group| !group.is_empty() && group.chars().all(|ch| ch.is_ascii_digit()))
        && groups.iter().any(|group| group.len() > 1 && group.starts_with('0'))
}

fn round(value: f64) -> f64 {
    let factor = 10f64.powi(ROUNDING_DIGITS);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round() / factor;
    // Avoid printing -0
    if rounded == 0.0 { 0.0 } else { rounded }
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let token = match ch {
            '0'..='9' | '.' | ',' => Token::Number(read_number(&mut chars)?),
            '+' => Token::Plus,
            '-' | '−' => Token::Minus,
            '*' | 'x' | 'X' | '×' => Token::Star,
            '/' | '÷' => Token::Slash,
            '%' => Token::Percent,
            '(' => Token::LParen,
            ')' => Token::RParen,
            _ => return Err(CalcError::Syntax),
        };

        if !matches!(token, Token::Number(_)) {
            chars.next();
        }
        tokens.push(token);
    }

    if tokens.is_empty() {
        return Err(CalcError::Syntax);
    }
    Ok(tokens)
}

fn read_number(chars: &mut Peekable<Chars>) -> Result<f64, CalcError> {
    let mut literal = String::new();
    let mut seen_separator = false;

    while let Some(&ch) = chars.peek() {
        match ch {
            '0'..='9' => literal.push(ch),
            '.' | ',' if !seen_separator => {
                seen_separator = true;
                literal.push('.');
            }
            _ => break,
        }
        chars.next();
    }

    if literal == "." {
        return Err(CalcError::Syntax);
    }
    literal.parse::<f64>().map_err(|_| CalcError::Syntax)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(token) = self.peek() {
            match token {
                Token::Plus => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Token::Minus => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(token) = self.peek() {
            match token {
                Token::Star => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Token::Slash => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        let mut negative = false;
        while let Some(sign @ (Token::Minus | Token::Plus)) = self.peek() {
            self.pos += 1;
            negative ^= sign == Token::Minus;
        }
        let value = self.postfix()?;
        Ok(if negative { -value } else { value })
    }

    fn postfix(&mut self) -> Result<f64, CalcError> {
        let mut value = self.primary()?;
        while self.peek() == Some(Token::Percent) {
            self.pos += 1;
            value /= 100.0;
        }
        Ok(value)
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                if self.depth >= MAX_NESTING {
                    return Err(CalcError::TooDeep);
                }
                self.depth += 1;
                let value = self.expr()?;
                self.depth -= 1;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(CalcError::Syntax),
                }
            }
            _ => Err(CalcError::Syntax),
        }
    }
}
