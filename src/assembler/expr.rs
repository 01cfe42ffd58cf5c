use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExprError {
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown symbol `{0}`")]
    UnknownSymbol(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("trailing input after expression")]
    TrailingInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(i64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Not,
    And,
    Or,
    LeftParen,
    RightParen,
}

fn lex(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '0'..='9' => {
                let mut number = 0i64;
                while let Some(&d) = chars.peek() {
                    let Some(digit) = d.to_digit(10) else { break };
                    number = number
                        .checked_mul(10)
                        .and_then(|n| n.checked_add(digit as i64))
                        .ok_or(ExprError::Overflow)?;
                    chars.next();
                }
                tokens.push(Token::Number(number));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if !(d.is_ascii_alphanumeric() || d == '_') {
                        break;
                    }
                    name.push(d);
                    chars.next();
                }
                tokens.push(Token::Identifier(name));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '!' => {
                chars.next();
                tokens.push(Token::Not);
            }
            '&' => {
                chars.next();
                if chars.next() != Some('&') {
                    return Err(ExprError::UnexpectedChar('&'));
                }
                tokens.push(Token::And);
            }
            '|' => {
                chars.next();
                if chars.next() != Some('|') {
                    return Err(ExprError::UnexpectedChar('|'));
                }
                tokens.push(Token::Or);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LeftParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RightParen);
            }
            other => return Err(ExprError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

struct Parser<'a, F> {
    tokens: Vec<Token>,
    position: usize,
    resolve: &'a F,
}

/// Evaluates an integer expression over `+ - * / && || !` with parentheses
/// and unary minus. `resolve` supplies symbol values; boolean operators
/// treat nonzero as true and yield 0 or 1.
pub fn evaluate<F>(input: &str, resolve: &F) -> Result<i64, ExprError>
where
    F: Fn(&str) -> Option<i64>,
{
    let mut parser = Parser {
        tokens: lex(input)?,
        position: 0,
        resolve,
    };
    let value = parser.or_expr()?;
    if parser.position != parser.tokens.len() {
        return Err(ExprError::TrailingInput);
    }
    Ok(value)
}

impl<F> Parser<'_, F>
where
    F: Fn(&str) -> Option<i64>,
{
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn or_expr(&mut self) -> Result<i64, ExprError> {
        let mut left = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let right = self.and_expr()?;
            left = i64::from(left != 0 || right != 0);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<i64, ExprError> {
        let mut left = self.sum()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let right = self.sum()?;
            left = i64::from(left != 0 && right != 0);
        }
        Ok(left)
    }

    fn sum(&mut self) -> Result<i64, ExprError> {
        let mut left = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    let right = self.term()?;
                    left = left.checked_add(right).ok_or(ExprError::Overflow)?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    let right = self.term()?;
                    left = left.checked_sub(right).ok_or(ExprError::Overflow)?;
                }
                _ => return Ok(left),
            }
        }
    }

    fn term(&mut self) -> Result<i64, ExprError> {
        let mut left = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    let right = self.unary()?;
                    left = left.checked_mul(right).ok_or(ExprError::Overflow)?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    let right = self.unary()?;
                    if right == 0 {
                        return Err(ExprError::DivisionByZero);
                    }
                    left = left.checked_div(right).ok_or(ExprError::Overflow)?;
                }
                _ => return Ok(left),
            }
        }
    }

    fn unary(&mut self) -> Result<i64, ExprError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                self.unary()?.checked_neg().ok_or(ExprError::Overflow)
            }
            Some(Token::Not) => {
                self.advance();
                Ok(i64::from(self.unary()? == 0))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<i64, ExprError> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Identifier(name)) => {
                (self.resolve)(&name).ok_or(ExprError::UnknownSymbol(name))
            }
            Some(Token::LeftParen) => {
                let value = self.or_expr()?;
                if self.advance() != Some(Token::RightParen) {
                    return Err(ExprError::UnexpectedEnd);
                }
                Ok(value)
            }
            Some(Token::RightParen) => Err(ExprError::UnexpectedChar(')')),
            Some(_) | None => Err(ExprError::UnexpectedEnd),
        }
    }
}
