//! Statement processor: turns one non-branching statement's tokens into a
//! leaf instruction, and parses parenthesized condition spans into boolean
//! expression trees.
//!
//! Statement forms:
//!
//! ```text
//!     "text"              narrator line
//!     speaker "text"      spoken line
//!     name = value        assignment
//!     jump name           transfer to a goto label
//!     call name           enter a call label
//!     return              leave a call label
//! ```
//!
//! A token that starts none of these consumes nothing; the parser driver
//! decides whether to skip it or fail.

use super::ast::{Block, BoolExpr, Instruction, Node, Value};
use super::error::SyntaxError;
use super::parser::skip;
use crate::model::{Token, TokenKind, unquote};

/// Parse exactly one non-branching statement starting at `i`, append its
/// leaf to `block`, and return the position after it. Returns `i` unchanged
/// when no statement starts here.
pub fn parse_one(tokens: &[Token], i: usize, block: &mut Block) -> Result<usize, SyntaxError> {
    if i >= tokens.len() {
        return Ok(i);
    }
    match tokens[i].kind {
        TokenKind::StringFull => {
            block.children.push(Node::Statement(Instruction::Say {
                speaker: None,
                text: unquote(&tokens[i].text).to_string(),
            }));
            Ok(i + 1)
        }
        TokenKind::Name => parse_name_statement(tokens, i, block),
        _ => Ok(i),
    }
}

fn parse_name_statement(
    tokens: &[Token],
    i: usize,
    block: &mut Block,
) -> Result<usize, SyntaxError> {
    let word = tokens[i].text.as_str();
    match word {
        "jump" => {
            let (label, next) = label_target(tokens, i + 1, "jump")?;
            block
                .children
                .push(Node::Statement(Instruction::Jump { label }));
            Ok(next)
        }
        "call" => {
            let (label, next) = label_target(tokens, i + 1, "call")?;
            block
                .children
                .push(Node::Statement(Instruction::Call { label }));
            Ok(next)
        }
        "return" => {
            block.children.push(Node::Statement(Instruction::Return));
            Ok(i + 1)
        }
        _ => {
            // a speaker line or an assignment, decided by the next token
            let j = skip(tokens, i + 1);
            if j >= tokens.len() {
                return Ok(i);
            }
            match tokens[j].kind {
                TokenKind::StringFull => {
                    block.children.push(Node::Statement(Instruction::Say {
                        speaker: Some(word.to_string()),
                        text: unquote(&tokens[j].text).to_string(),
                    }));
                    Ok(j + 1)
                }
                TokenKind::Assign => {
                    let k = skip(tokens, j + 1);
                    if k >= tokens.len() {
                        return Err(SyntaxError::new(format!(
                            "Assignment to {word} is missing a value, got end of stream"
                        )));
                    }
                    let value = parse_value(&tokens[k])?;
                    block.children.push(Node::Statement(Instruction::Set {
                        name: word.to_string(),
                        value,
                    }));
                    Ok(k + 1)
                }
                _ => Ok(i),
            }
        }
    }
}

fn label_target(
    tokens: &[Token],
    i: usize,
    keyword: &str,
) -> Result<(String, usize), SyntaxError> {
    let i = skip(tokens, i);
    if i >= tokens.len() {
        return Err(SyntaxError::new(format!(
            "{keyword} must be followed by a label name, got end of stream"
        )));
    }
    let token = &tokens[i];
    if token.kind != TokenKind::Name {
        return Err(SyntaxError::new(format!(
            "{keyword} must be followed by a label name, got {} of type {}",
            token.text, token.kind
        )));
    }
    Ok((token.text.clone(), i + 1))
}

fn parse_value(token: &Token) -> Result<Value, SyntaxError> {
    match token.kind {
        TokenKind::Name => Ok(Value::Name(token.text.clone())),
        TokenKind::Number => token
            .text
            .parse::<i64>()
            .map(Value::Number)
            .map_err(|_| SyntaxError::new(format!("Invalid number literal: {}", token.text))),
        TokenKind::StringFull => Ok(Value::Str(unquote(&token.text).to_string())),
        _ => Err(SyntaxError::new(format!(
            "Invalid assignment value: {} of type {}",
            token.text, token.kind
        ))),
    }
}

/// Parse a parenthesized condition span (delimiters included) into a
/// boolean expression tree.
///
/// Grammar, loosest binding first:
///
/// ```text
///     expr   ::= term ( "or" term )*
///     term   ::= factor ( "and" factor )*
///     factor ::= "not" factor | "(" expr ")" | NAME
/// ```
pub fn parse_boolean(span: &[Token]) -> Result<BoolExpr, SyntaxError> {
    let mut cursor = Cursor {
        tokens: span,
        pos: 0,
    };
    let expr = cursor.parse_or()?;
    if let Some(token) = cursor.peek() {
        return Err(SyntaxError::new(format!(
            "Unexpected token in condition: {} of type {}",
            token.text, token.kind
        )));
    }
    Ok(expr)
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&mut self) -> Option<&'a Token> {
        self.pos = skip(self.tokens, self.pos);
        self.tokens.get(self.pos)
    }

    fn word(&mut self, text: &str) -> bool {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Name && token.text == text => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn parse_or(&mut self) -> Result<BoolExpr, SyntaxError> {
        let mut expr = self.parse_and()?;
        while self.word("or") {
            let rhs = self.parse_and()?;
            expr = BoolExpr::Or(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<BoolExpr, SyntaxError> {
        let mut expr = self.parse_factor()?;
        while self.word("and") {
            let rhs = self.parse_factor()?;
            expr = BoolExpr::And(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<BoolExpr, SyntaxError> {
        if self.word("not") {
            return Ok(BoolExpr::Not(Box::new(self.parse_factor()?)));
        }
        let Some(token) = self.peek() else {
            return Err(SyntaxError::new(
                "Condition ended unexpectedly, expected a term",
            ));
        };
        match token.kind {
            TokenKind::Name => {
                self.pos += 1;
                Ok(BoolExpr::Access(token.text.clone()))
            }
            TokenKind::ParenOpen => {
                self.pos += 1;
                let inner = self.parse_or()?;
                match self.peek() {
                    Some(close) if close.kind == TokenKind::ParenClose => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    Some(other) => Err(SyntaxError::new(format!(
                        "Expected closing parenthesis in condition, got {} of type {}",
                        other.text, other.kind
                    ))),
                    None => Err(SyntaxError::new(
                        "Expected closing parenthesis in condition, got end of stream",
                    )),
                }
            }
            _ => Err(SyntaxError::new(format!(
                "Invalid condition term: {} of type {}",
                token.text, token.kind
            ))),
        }
    }
}
