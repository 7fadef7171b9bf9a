//! Minimal C-like condition language for tests.
//!
//! Supports identifiers, `'single'`/`"double"` quoted strings, integers and
//! decimals, `true`, `false`, `null`, parentheses, `!`, `==`, `!=`, `&&` and
//! `||`. Expressions are parsed fully before evaluation, so syntax errors are
//! reported even on branches that short-circuiting would skip. Reading an
//! undefined variable yields null.

use serde_json::{Number, Value};

use crate::expression::{EvaluatorError, ExpressionEvaluator, VariableScope, truthiness};

/// Reference evaluator for the resolver's tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleConditionEvaluator;

impl ExpressionEvaluator for SimpleConditionEvaluator {
    fn evaluate(
        &self,
        expression: &str,
        scope: &dyn VariableScope,
    ) -> Result<Value, EvaluatorError> {
        let tokens = tokenize(expression)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
        };
        let ast = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(EvaluatorError::new(format!(
                "unexpected token {:?} in '{expression}'",
                parser.tokens[parser.pos]
            )));
        }
        Ok(eval(&ast, scope))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Literal(Value),
    Not,
    Eq,
    Ne,
    And,
    Or,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvaluatorError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Ne);
                i += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '=' if next == Some('=') => {
                tokens.push(Token::Eq);
                i += 2;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|ch| *ch == c)
                    .ok_or_else(|| EvaluatorError::new("unterminated string literal"))?;
                let text: String = chars[i + 1..i + 1 + end].iter().collect();
                tokens.push(Token::Literal(Value::String(text)));
                i += end + 2;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = if text.contains('.') {
                    text.parse::<f64>().ok().and_then(Number::from_f64)
                } else {
                    text.parse::<i64>().ok().map(Number::from)
                }
                .ok_or_else(|| EvaluatorError::new(format!("invalid number '{text}'")))?;
                tokens.push(Token::Literal(Value::Number(number)));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "true" => Token::Literal(Value::Bool(true)),
                    "false" => Token::Literal(Value::Bool(false)),
                    "null" => Token::Literal(Value::Null),
                    _ => Token::Ident(word),
                });
            }
            other => {
                return Err(EvaluatorError::new(format!("unexpected character '{other}'")));
            }
        }
    }

    Ok(tokens)
}

#[derive(Debug)]
enum Expr {
    Var(String),
    Literal(Value),
    Not(Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_or(&mut self) -> Result<Expr, EvaluatorError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, EvaluatorError> {
        let mut left = self.parse_equality()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_equality()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, EvaluatorError> {
        let left = self.parse_unary()?;
        match self.peek() {
            Some(Token::Eq) => {
                self.pos += 1;
                Ok(Expr::Eq(Box::new(left), Box::new(self.parse_unary()?)))
            }
            Some(Token::Ne) => {
                self.pos += 1;
                Ok(Expr::Ne(Box::new(left), Box::new(self.parse_unary()?)))
            }
            _ => Ok(left),
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, EvaluatorError> {
        match self.next() {
            Some(Token::Not) => Ok(Expr::Not(Box::new(self.parse_unary()?))),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(EvaluatorError::new("expected ')'")),
                }
            }
            Some(Token::Ident(name)) => Ok(Expr::Var(name)),
            Some(Token::Literal(value)) => Ok(Expr::Literal(value)),
            Some(other) => Err(EvaluatorError::new(format!("unexpected token {other:?}"))),
            None => Err(EvaluatorError::new("unexpected end of expression")),
        }
    }
}

fn is_true(value: &Value) -> bool {
    truthiness(value).unwrap_or(match value {
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(s), Value::Bool(b)) | (Value::Bool(b), Value::String(s)) => {
            s.eq_ignore_ascii_case(if *b {
                "true"
            } else {
                "false"
            })
        }
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            *s == n.to_string()
        }
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn eval(expr: &Expr, scope: &dyn VariableScope) -> Value {
    match expr {
        Expr::Var(name) => scope.lookup(name).cloned().unwrap_or(Value::Null),
        Expr::Literal(value) => value.clone(),
        Expr::Not(inner) => Value::Bool(!is_true(&eval(inner, scope))),
        Expr::Eq(l, r) => Value::Bool(loosely_equal(&eval(l, scope), &eval(r, scope))),
        Expr::Ne(l, r) => Value::Bool(!loosely_equal(&eval(l, scope), &eval(r, scope))),
        Expr::And(l, r) => Value::Bool(is_true(&eval(l, scope)) && is_true(&eval(r, scope))),
        Expr::Or(l, r) => Value::Bool(is_true(&eval(l, scope)) || is_true(&eval(r, scope))),
    }
}
