//! Shared data model: the token stream coming in from the lexer and the
//! compiled program going out to the runtime.

use crate::compiler::ast::{Block, Instruction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Lexical classes the lexer tags tokens with. Closed set; the compiler
/// never invents new kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Character,
    Label,
    Name,
    Number,
    StringFull,
    Assign,
    BrackOpen,
    BrackClose,
    ParenOpen,
    ParenClose,
    If,
    Else,
    Menu,
    Whitespace,
    Comment,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One token as dumped by the lexer: a kind tag plus the raw text.
/// Read-only to the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }
}

/// Strip the surrounding quote characters off a full-string token's text.
pub fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    Goto,
    Call,
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelKind::Goto => write!(f, "goto"),
            LabelKind::Call => write!(f, "call"),
        }
    }
}

/// A declared character. Mutated only while its declaration block is being
/// parsed, frozen afterward.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterDefinition {
    pub id: String,
    pub name: String,
    pub side: Side,
}

impl CharacterDefinition {
    /// The display name defaults to the id and the side to the right.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            side: Side::Right,
        }
    }
}

impl fmt::Display for CharacterDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "character {}: name = {:?}, side = {}",
            self.id, self.name, self.side
        )
    }
}

/// A declared label. Goto labels are bare jump targets the runtime
/// resolves; call labels carry a body whose entry location is resolved
/// during flattening.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelDefinition {
    pub id: String,
    pub kind: LabelKind,
    #[serde(skip)]
    pub body: Block,
    pub location: Option<usize>,
}

impl LabelDefinition {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: LabelKind::Goto,
            body: Block::new(),
            location: None,
        }
    }
}

impl fmt::Display for LabelDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "label {}: {} at {}", self.id, self.kind, location),
            None => write!(f, "label {}: {} unresolved", self.id, self.kind),
        }
    }
}

/// The compiled program: one flat instruction list plus the character and
/// label tables. Built once per parse, immutable afterward.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramTree {
    pub instructions: Vec<Instruction>,
    pub characters: HashMap<String, CharacterDefinition>,
    pub labels: HashMap<String, LabelDefinition>,
}
