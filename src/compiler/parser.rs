//! Recursive-descent parser: token stream in, `ProgramTree` out.
//!
//! The driver scans the whole stream, trying character declarations, label
//! declarations, and statements at each position, in that order. Branching
//! constructs (conditionals, menus) are recognised ahead of plain statements
//! at every nesting level. Once the scan finishes, the nested block tree is
//! flattened into the final linear instruction list and every call label
//! gets its entry location resolved; goto labels stay unresolved for the
//! runtime.

use std::collections::HashMap;

use super::ast::{Block, BoolExpr, IfNode, MenuEntry, MenuNode, Node};
use super::error::SyntaxError;
use super::statement;
use crate::model::{
    CharacterDefinition, LabelDefinition, LabelKind, ProgramTree, Side, Token, TokenKind, unquote,
};

/// Parse a whole token stream into a `ProgramTree`.
///
/// With `strict` set, a token that no parser recognises is a hard error
/// instead of being skipped.
pub fn parse_program(tokens: &[Token], strict: bool) -> Result<ProgramTree, SyntaxError> {
    Parser::new(strict).parse(tokens)
}

struct Parser {
    strict: bool,
    characters: HashMap<String, CharacterDefinition>,
    labels: Vec<LabelDefinition>,
}

impl Parser {
    fn new(strict: bool) -> Self {
        Self {
            strict,
            characters: HashMap::new(),
            labels: Vec::new(),
        }
    }

    fn parse(mut self, tokens: &[Token]) -> Result<ProgramTree, SyntaxError> {
        let mut root = Block::new();
        let mut i = 0;
        while i < tokens.len() {
            let start = i;

            i = self.parse_character(tokens, i)?;
            if i >= tokens.len() {
                break;
            }
            i = self.parse_label(tokens, i)?;
            if i >= tokens.len() {
                break;
            }
            i = self.parse_statement(tokens, i, &mut root)?;

            // guarantee forward progress
            if start == i {
                i = self.skip_unrecognized(tokens, i)?;
            }
        }

        let mut instructions = Vec::new();
        for instruction in root.leaves() {
            instructions.push(instruction.clone());
        }

        // call-label bodies go at the bottom, each entry location recorded
        // before its leaves are appended; registration order
        for label in &mut self.labels {
            if label.kind != LabelKind::Call {
                continue;
            }
            label.location = Some(instructions.len());
            for instruction in label.body.leaves() {
                instructions.push(instruction.clone());
            }
        }

        let labels = self
            .labels
            .into_iter()
            .map(|label| (label.id.clone(), label))
            .collect();
        Ok(ProgramTree {
            instructions,
            characters: self.characters,
            labels,
        })
    }

    fn skip_unrecognized(&self, tokens: &[Token], i: usize) -> Result<usize, SyntaxError> {
        if self.strict {
            let token = &tokens[i];
            return Err(SyntaxError::new(format!(
                "Unexpected token {} of type {}",
                token.text, token.kind
            )));
        }
        Ok(i + 1)
    }

    /// Parse one statement into `block`: a conditional chain, a menu, or a
    /// single non-branching statement via the statement processor.
    fn parse_statement(
        &mut self,
        tokens: &[Token],
        i: usize,
        block: &mut Block,
    ) -> Result<usize, SyntaxError> {
        let i = skip(tokens, i);
        if declaration_finished(tokens, i) {
            return Ok(tokens.len());
        }

        let next = self.parse_if(tokens, i, block)?;
        if next != i {
            return Ok(next);
        }
        let next = self.parse_menu(tokens, i, block)?;
        if next != i {
            return Ok(next);
        }

        statement::parse_one(tokens, i, block)
    }

    /// Parse a character declaration, if one starts at `i`.
    fn parse_character(&mut self, tokens: &[Token], i: usize) -> Result<usize, SyntaxError> {
        if tokens[i].kind != TokenKind::Character {
            return Ok(i);
        }

        let i = skip(tokens, i + 1);
        if i >= tokens.len() {
            return Err(SyntaxError::new(
                "Character definition must be followed by a name token, not by end of file",
            ));
        }
        if tokens[i].kind != TokenKind::Name {
            return Err(SyntaxError::new(format!(
                "Character definition must be followed by a name token, not by {} which has type {}",
                tokens[i].text, tokens[i].kind
            )));
        }
        let mut character = CharacterDefinition::new(&tokens[i].text);
        if self.characters.contains_key(&character.id) {
            return Err(SyntaxError::new(format!(
                "Character {} is defined twice.",
                character.id
            )));
        }

        let i = skip(tokens, i + 1);
        // no more tokens: a one-liner at the end of the stream
        if i >= tokens.len() {
            self.characters.insert(character.id.clone(), character);
            return Ok(tokens.len());
        }
        // a brace block carries field assignments
        if tokens[i].kind == TokenKind::BrackOpen {
            let span = bracket_span(tokens, i)?;
            parse_character_fields(span, &mut character)?;
            self.characters.insert(character.id.clone(), character);
            return Ok(i + span.len());
        }
        self.characters.insert(character.id.clone(), character);
        Ok(i)
    }

    /// Parse a label declaration, if one starts at `i`. A bare label is a
    /// goto target; a brace block makes it a call label and the block's
    /// statements become its body.
    fn parse_label(&mut self, tokens: &[Token], i: usize) -> Result<usize, SyntaxError> {
        if tokens[i].kind != TokenKind::Label {
            return Ok(i);
        }

        let i = skip(tokens, i + 1);
        expect_kind(
            tokens,
            i,
            TokenKind::Name,
            "Label definition must be followed by a name token.",
        )?;
        let mut label = LabelDefinition::new(&tokens[i].text);
        if self.labels.iter().any(|l| l.id == label.id) {
            return Err(SyntaxError::new(format!(
                "Label {} is defined twice.",
                label.id
            )));
        }

        let i = skip(tokens, i + 1);
        if i >= tokens.len() {
            self.labels.push(label);
            return Ok(tokens.len());
        }
        if tokens[i].kind == TokenKind::BrackOpen {
            label.kind = LabelKind::Call;
            let span = bracket_span(tokens, i)?;
            self.parse_span_statements(span, &mut label.body)?;
            self.labels.push(label);
            return Ok(i + span.len());
        }
        self.labels.push(label);
        Ok(i)
    }

    /// Parse the statements inside a delimited span (delimiters included)
    /// into `block`.
    fn parse_span_statements(
        &mut self,
        span: &[Token],
        block: &mut Block,
    ) -> Result<(), SyntaxError> {
        let mut j = 1;
        while j + 1 < span.len() {
            let start = j;
            j = self.parse_statement(span, j, block)?;
            if start == j {
                j = self.skip_unrecognized(span, j)?;
            }
        }
        Ok(())
    }

    /// Parse an if/else-if/else chain, if one starts at `i`.
    fn parse_if(
        &mut self,
        tokens: &[Token],
        i: usize,
        block: &mut Block,
    ) -> Result<usize, SyntaxError> {
        if tokens[i].kind != TokenKind::If {
            return Ok(i);
        }

        let mut conditions = Vec::new();
        let mut contents = Vec::new();
        let mut i = i;
        let mut finished = false;
        while !finished {
            // the chain continues only on an immediate if or else
            if i >= tokens.len()
                || (tokens[i].kind != TokenKind::Else && tokens[i].kind != TokenKind::If)
            {
                break;
            }
            // a bare else ends the chain after this branch, an `else if`
            // keeps it going
            if tokens[i].kind == TokenKind::Else {
                finished = true;
            }
            i = skip(tokens, i + 1);
            if i < tokens.len() && tokens[i].kind == TokenKind::If {
                finished = false;
                i = skip(tokens, i + 1);
            }

            if !finished {
                if i >= tokens.len() || tokens[i].kind != TokenKind::ParenOpen {
                    return Err(SyntaxError::new(
                        "Conditional statement must be followed by an open parentheses",
                    ));
                }
                let span = paren_span(tokens, i)?;
                i += span.len();
                conditions.push(statement::parse_boolean(span)?);
            } else {
                // a bare else always runs
                conditions.push(BoolExpr::Access("true".to_string()));
            }

            if i >= tokens.len() || tokens[i].kind != TokenKind::BrackOpen {
                return Err(SyntaxError::new(
                    "Conditional statement conditions must be followed by an open bracket",
                ));
            }
            let span = bracket_span(tokens, i)?;
            i += span.len();
            let mut content = Block::new();
            self.parse_span_statements(span, &mut content)?;
            contents.push(content);
        }

        if conditions.is_empty() || contents.is_empty() || conditions.len() != contents.len() {
            return Err(SyntaxError::new("Invalid conditional structure."));
        }
        block.children.push(Node::If(IfNode {
            conditions,
            contents,
        }));
        Ok(i)
    }

    /// Parse a menu and its option blocks, if one starts at `i`.
    fn parse_menu(
        &mut self,
        tokens: &[Token],
        i: usize,
        block: &mut Block,
    ) -> Result<usize, SyntaxError> {
        if tokens[i].kind != TokenKind::Menu {
            return Ok(i);
        }

        let mut entries = Vec::new();
        let mut contents = Vec::new();
        let mut i = skip(tokens, i + 1);
        while i < tokens.len() {
            match tokens[i].kind {
                // the body's own delimiter, or a stray nested block
                TokenKind::BrackOpen => i = skip(tokens, i + 1),
                // end of the menu body
                TokenKind::BrackClose => {
                    i += 1;
                    break;
                }
                TokenKind::StringFull => {
                    let option = unquote(&tokens[i].text).to_string();
                    i = skip(tokens, i + 1);
                    if i >= tokens.len() || tokens[i].kind != TokenKind::BrackOpen {
                        return Err(SyntaxError::new(
                            "Menu options must be followed by open brace",
                        ));
                    }
                    let span = bracket_span(tokens, i)?;
                    let mut content = Block::new();
                    self.parse_span_statements(span, &mut content)?;
                    i = skip(tokens, i + span.len());
                    entries.push(MenuEntry { option });
                    contents.push(content);
                }
                _ => i = skip(tokens, i + 1),
            }
        }

        block.children.push(Node::Menu(MenuNode { entries, contents }));
        Ok(i)
    }
}

/// Allowed value kinds per character field, so the wrong-kind message is
/// built in one place.
const CHARACTER_FIELDS: &[(&str, &[TokenKind])] = &[
    (
        "name",
        &[TokenKind::Name, TokenKind::Number, TokenKind::StringFull],
    ),
    ("side", &[TokenKind::Name, TokenKind::StringFull]),
];

/// Parse the `field = value` assignments of a character block span.
fn parse_character_fields(
    span: &[Token],
    character: &mut CharacterDefinition,
) -> Result<(), SyntaxError> {
    let mut j = 0;
    while j + 1 < span.len() {
        j = skip(span, j + 1);
        if declaration_finished(span, j + 1) {
            break;
        }
        expect_kind(
            span,
            j,
            TokenKind::Name,
            "Character definition must contain assignments.",
        )?;
        let field = &span[j];

        j = skip(span, j + 1);
        expect_kind(
            span,
            j,
            TokenKind::Assign,
            "Character definition must contain assignments.",
        )?;

        j = skip(span, j + 1);
        expect_value(span, j, "Character definition must contain assignments.")?;
        apply_character_field(character, field, &span[j])?;
        j += 1;
    }
    Ok(())
}

fn apply_character_field(
    character: &mut CharacterDefinition,
    field: &Token,
    value: &Token,
) -> Result<(), SyntaxError> {
    let Some((_, allowed)) = CHARACTER_FIELDS
        .iter()
        .find(|(name, _)| *name == field.text)
    else {
        return Err(SyntaxError::new(format!(
            "Unrecognized character field: {}",
            field.text
        )));
    };
    if !allowed.contains(&value.kind) {
        return Err(SyntaxError::new(format!(
            "Invalid character {}: {} of type {}",
            field.text, value.text, value.kind
        )));
    }
    match field.text.as_str() {
        "name" => character.name = unquote(&value.text).to_string(),
        "side" => match unquote(&value.text) {
            // TODO: "right" also lands on Side::Left today; the runtime
            // relies on the current mapping, fix both together
            "left" => character.side = Side::Left,
            "right" => character.side = Side::Left,
            other => {
                return Err(SyntaxError::new(format!(
                    "Invalid character side: {other}. Must be right or left."
                )));
            }
        },
        _ => unreachable!(),
    }
    Ok(())
}

/// True once a statement span has nothing left but its own closing brace.
fn declaration_finished(tokens: &[Token], i: usize) -> bool {
    i >= tokens.len() || (i == tokens.len() - 1 && tokens[i].kind == TokenKind::BrackClose)
}

fn expect_kind(
    tokens: &[Token],
    i: usize,
    kind: TokenKind,
    message: &str,
) -> Result<(), SyntaxError> {
    if i >= tokens.len() {
        return Err(SyntaxError::new(format!(
            "{message} Expected a {kind} token, got end of stream"
        )));
    }
    if tokens[i].kind != kind {
        return Err(SyntaxError::new(format!(
            "{message} Expected a {kind} token, got {} of type {}",
            tokens[i].text, tokens[i].kind
        )));
    }
    Ok(())
}

/// A value slot accepts several kinds; the per-field table narrows them.
fn expect_value(tokens: &[Token], i: usize, message: &str) -> Result<(), SyntaxError> {
    if i >= tokens.len() {
        return Err(SyntaxError::new(format!(
            "{message} Expected a value token, got end of stream"
        )));
    }
    Ok(())
}

/// Advance past contiguous whitespace and comment tokens. Positions at or
/// past the end clamp to the sequence length; a position on anything else
/// is returned unchanged.
pub(crate) fn skip(tokens: &[Token], mut i: usize) -> usize {
    while i < tokens.len() && tokens[i].is_whitespace() {
        i += 1;
    }
    i.min(tokens.len())
}

/// The inclusive sub-span from the opening brace at `start` through its
/// matching closing brace.
pub(crate) fn bracket_span(tokens: &[Token], start: usize) -> Result<&[Token], SyntaxError> {
    delimited_span(
        tokens,
        start,
        TokenKind::BrackOpen,
        TokenKind::BrackClose,
        "brackets",
    )
}

/// The inclusive sub-span from the opening parenthesis at `start` through
/// its matching closing parenthesis.
pub(crate) fn paren_span(tokens: &[Token], start: usize) -> Result<&[Token], SyntaxError> {
    delimited_span(
        tokens,
        start,
        TokenKind::ParenOpen,
        TokenKind::ParenClose,
        "parentheses",
    )
}

fn delimited_span<'a>(
    tokens: &'a [Token],
    start: usize,
    open: TokenKind,
    close: TokenKind,
    what: &str,
) -> Result<&'a [Token], SyntaxError> {
    let mut depth = 0i32;
    for (offset, token) in tokens[start..].iter().enumerate() {
        if token.kind == open {
            depth += 1;
        }
        if token.kind == close {
            depth -= 1;
            if depth == 0 {
                return Ok(&tokens[start..=start + offset]);
            }
        }
    }
    Err(SyntaxError::new(format!("Mismatched {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ast::Instruction;

    fn tok(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text)
    }

    fn ws() -> Token {
        tok(TokenKind::Whitespace, " ")
    }

    fn name(text: &str) -> Token {
        tok(TokenKind::Name, text)
    }

    fn string(text: &str) -> Token {
        Token::new(TokenKind::StringFull, format!("\"{text}\""))
    }

    fn say(speaker: Option<&str>, text: &str) -> Instruction {
        Instruction::Say {
            speaker: speaker.map(|s| s.to_string()),
            text: text.into(),
        }
    }

    /// `char <id> { <field> = <value> }`
    fn char_decl(id: &str, field: &str, value: Token) -> Vec<Token> {
        vec![
            tok(TokenKind::Character, "char"),
            ws(),
            name(id),
            ws(),
            tok(TokenKind::BrackOpen, "{"),
            ws(),
            name(field),
            ws(),
            tok(TokenKind::Assign, "="),
            ws(),
            value,
            ws(),
            tok(TokenKind::BrackClose, "}"),
        ]
    }

    #[test]
    fn test_empty_input() {
        let tree = parse_program(&[], false).unwrap();
        assert!(tree.instructions.is_empty());
        assert!(tree.characters.is_empty());
        assert!(tree.labels.is_empty());
    }

    #[test]
    fn test_whitespace_only_input() {
        let tokens = vec![ws(), tok(TokenKind::Comment, "# nothing"), ws()];
        let tree = parse_program(&tokens, true).unwrap();
        assert!(tree.instructions.is_empty());
    }

    #[test]
    fn test_character_declaration_with_name_field() {
        let tokens = char_decl("Alice", "name", string("Alicia"));
        let tree = parse_program(&tokens, true).unwrap();

        let alice = &tree.characters["Alice"];
        assert_eq!(alice.name, "Alicia");
        assert_eq!(alice.side, Side::Right);
    }

    #[test]
    fn test_character_one_liner_defaults() {
        let tokens = vec![tok(TokenKind::Character, "char"), ws(), name("Bob")];
        let tree = parse_program(&tokens, true).unwrap();

        let bob = &tree.characters["Bob"];
        assert_eq!(bob.name, "Bob");
        assert_eq!(bob.side, Side::Right);
    }

    #[test]
    fn test_character_side_words_all_map_left() {
        // both words, bare and quoted, land on the left
        let test_cases = vec![
            name("left"),
            name("right"),
            string("left"),
            string("right"),
        ];
        for value in test_cases {
            let tokens = char_decl("A", "side", value.clone());
            let tree = parse_program(&tokens, true).unwrap();
            assert_eq!(tree.characters["A"].side, Side::Left, "value {value:?}");
        }
    }

    #[test]
    fn test_character_invalid_side_word() {
        let tokens = char_decl("A", "side", name("middle"));
        let err = parse_program(&tokens, true).unwrap_err();
        assert!(err.to_string().contains("Invalid character side"), "{err}");
    }

    #[test]
    fn test_character_unrecognized_field() {
        let tokens = char_decl("A", "voice", name("low"));
        let err = parse_program(&tokens, true).unwrap_err();
        assert!(
            err.to_string().contains("Unrecognized character field"),
            "{err}"
        );
    }

    #[test]
    fn test_character_field_value_wrong_kind() {
        let tokens = char_decl("A", "name", tok(TokenKind::ParenOpen, "("));
        let err = parse_program(&tokens, true).unwrap_err();
        assert!(err.to_string().contains("Invalid character name"), "{err}");
        assert!(err.to_string().contains("ParenOpen"), "{err}");
    }

    #[test]
    fn test_character_keyword_at_end_of_file() {
        let tokens = vec![tok(TokenKind::Character, "char"), ws()];
        let err = parse_program(&tokens, true).unwrap_err();
        assert!(err.to_string().contains("end of file"), "{err}");
    }

    #[test]
    fn test_character_keyword_followed_by_wrong_kind() {
        let tokens = vec![
            tok(TokenKind::Character, "char"),
            ws(),
            tok(TokenKind::Number, "7"),
        ];
        let err = parse_program(&tokens, true).unwrap_err();
        assert!(err.to_string().contains("which has type Number"), "{err}");
    }

    #[test]
    fn test_character_unclosed_block() {
        let tokens = vec![
            tok(TokenKind::Character, "char"),
            ws(),
            name("A"),
            ws(),
            tok(TokenKind::BrackOpen, "{"),
            ws(),
            name("name"),
            ws(),
            tok(TokenKind::Assign, "="),
            ws(),
            string("x"),
        ];
        let err = parse_program(&tokens, true).unwrap_err();
        assert!(err.to_string().contains("Mismatched brackets"), "{err}");
    }

    #[test]
    fn test_duplicate_character() {
        let mut tokens = vec![tok(TokenKind::Character, "char"), ws(), name("A"), ws()];
        tokens.extend(vec![tok(TokenKind::Character, "char"), ws(), name("A")]);
        let err = parse_program(&tokens, true).unwrap_err();
        assert!(err.to_string().contains("defined twice"), "{err}");
    }

    #[test]
    fn test_goto_label_stays_unresolved() {
        let tokens = vec![tok(TokenKind::Label, "label"), ws(), name("Bar")];
        let tree = parse_program(&tokens, true).unwrap();

        let bar = &tree.labels["Bar"];
        assert_eq!(bar.kind, LabelKind::Goto);
        assert_eq!(bar.location, None);
        assert!(bar.body.children.is_empty());
    }

    #[test]
    fn test_call_label_location_and_body() {
        // "hi" then `label Work { Alice "a" "b" }`
        let tokens = vec![
            string("hi"),
            ws(),
            tok(TokenKind::Label, "label"),
            ws(),
            name("Work"),
            ws(),
            tok(TokenKind::BrackOpen, "{"),
            ws(),
            name("Alice"),
            ws(),
            string("a"),
            ws(),
            string("b"),
            ws(),
            tok(TokenKind::BrackClose, "}"),
        ];
        let tree = parse_program(&tokens, true).unwrap();

        let work = &tree.labels["Work"];
        assert_eq!(work.kind, LabelKind::Call);
        assert_eq!(work.location, Some(1));
        assert_eq!(
            tree.instructions,
            vec![
                say(None, "hi"),
                say(Some("Alice"), "a"),
                say(None, "b"),
            ]
        );
        // the body's leaves are exactly the appended tail
        let body: Vec<_> = work.body.leaves().cloned().collect();
        assert_eq!(body, tree.instructions[1..]);
    }

    #[test]
    fn test_label_missing_name() {
        let tokens = vec![tok(TokenKind::Label, "label"), ws()];
        let err = parse_program(&tokens, true).unwrap_err();
        assert!(err.to_string().contains("end of stream"), "{err}");
    }

    #[test]
    fn test_duplicate_label() {
        let tokens = vec![
            tok(TokenKind::Label, "label"),
            ws(),
            name("Foo"),
            ws(),
            tok(TokenKind::Label, "label"),
            ws(),
            name("Foo"),
        ];
        let err = parse_program(&tokens, true).unwrap_err();
        assert!(err.to_string().contains("defined twice"), "{err}");
    }

    #[test]
    fn test_if_else_if_else_chain() {
        // if (a) { "x" } else if (b) { "y" } else { "z" }
        let tokens = vec![
            tok(TokenKind::If, "if"),
            ws(),
            tok(TokenKind::ParenOpen, "("),
            name("a"),
            tok(TokenKind::ParenClose, ")"),
            tok(TokenKind::BrackOpen, "{"),
            ws(),
            string("x"),
            ws(),
            tok(TokenKind::BrackClose, "}"),
            tok(TokenKind::Else, "else"),
            ws(),
            tok(TokenKind::If, "if"),
            ws(),
            tok(TokenKind::ParenOpen, "("),
            name("b"),
            tok(TokenKind::ParenClose, ")"),
            tok(TokenKind::BrackOpen, "{"),
            ws(),
            string("y"),
            ws(),
            tok(TokenKind::BrackClose, "}"),
            tok(TokenKind::Else, "else"),
            ws(),
            tok(TokenKind::BrackOpen, "{"),
            ws(),
            string("z"),
            ws(),
            tok(TokenKind::BrackClose, "}"),
        ];

        let mut parser = Parser::new(true);
        let mut block = Block::new();
        let end = parser.parse_if(&tokens, 0, &mut block).unwrap();
        assert_eq!(end, tokens.len());

        let Node::If(node) = &block.children[0] else {
            panic!("expected a conditional node");
        };
        assert_eq!(node.conditions.len(), 3);
        assert_eq!(node.contents.len(), 3);
        // the trailing else got the synthetic always-true condition
        assert!(node.conditions[2].evaluate(&|_| false));
        assert!(!node.conditions[0].evaluate(&|_| false));

        // flattening interleaves all branch leaves in source order
        let tree = parse_program(&tokens, true).unwrap();
        assert_eq!(
            tree.instructions,
            vec![say(None, "x"), say(None, "y"), say(None, "z")]
        );
    }

    #[test]
    fn test_if_missing_parens() {
        let tokens = vec![
            tok(TokenKind::If, "if"),
            ws(),
            tok(TokenKind::BrackOpen, "{"),
            ws(),
            tok(TokenKind::BrackClose, "}"),
        ];
        let err = parse_program(&tokens, true).unwrap_err();
        assert!(err.to_string().contains("open parentheses"), "{err}");
    }

    #[test]
    fn test_if_missing_block() {
        let tokens = vec![
            tok(TokenKind::If, "if"),
            ws(),
            tok(TokenKind::ParenOpen, "("),
            name("a"),
            tok(TokenKind::ParenClose, ")"),
            ws(),
            string("x"),
        ];
        let err = parse_program(&tokens, false).unwrap_err();
        assert!(err.to_string().contains("open bracket"), "{err}");
    }

    #[test]
    fn test_menu_two_options() {
        // menu { "A" { "a1" } "B" { "b1" } }
        let tokens = vec![
            tok(TokenKind::Menu, "menu"),
            ws(),
            tok(TokenKind::BrackOpen, "{"),
            ws(),
            string("A"),
            ws(),
            tok(TokenKind::BrackOpen, "{"),
            ws(),
            string("a1"),
            ws(),
            tok(TokenKind::BrackClose, "}"),
            ws(),
            string("B"),
            ws(),
            tok(TokenKind::BrackOpen, "{"),
            ws(),
            string("b1"),
            ws(),
            tok(TokenKind::BrackClose, "}"),
            ws(),
            tok(TokenKind::BrackClose, "}"),
        ];

        let mut parser = Parser::new(true);
        let mut block = Block::new();
        let end = parser.parse_menu(&tokens, 0, &mut block).unwrap();
        assert_eq!(end, tokens.len());

        let Node::Menu(node) = &block.children[0] else {
            panic!("expected a menu node");
        };
        let options: Vec<_> = node.entries.iter().map(|e| e.option.as_str()).collect();
        assert_eq!(options, vec!["A", "B"]);
        assert_eq!(node.contents.len(), 2);

        let first: Vec<_> = node.contents[0].leaves().cloned().collect();
        assert_eq!(first, vec![say(None, "a1")]);
    }

    #[test]
    fn test_menu_option_without_block() {
        let tokens = vec![
            tok(TokenKind::Menu, "menu"),
            ws(),
            tok(TokenKind::BrackOpen, "{"),
            ws(),
            string("A"),
            ws(),
            tok(TokenKind::BrackClose, "}"),
        ];
        let err = parse_program(&tokens, true).unwrap_err();
        assert!(
            err.to_string().contains("must be followed by open brace"),
            "{err}"
        );
    }

    #[test]
    fn test_strict_mode_rejects_stray_token() {
        let tokens = vec![tok(TokenKind::Else, "else")];
        let err = parse_program(&tokens, true).unwrap_err();
        assert!(err.to_string().contains("Unexpected token"), "{err}");
    }

    #[test]
    fn test_lenient_mode_skips_stray_token() {
        let tokens = vec![tok(TokenKind::Assign, "="), ws(), string("hi")];
        let tree = parse_program(&tokens, false).unwrap();
        assert_eq!(tree.instructions, vec![say(None, "hi")]);
    }

    #[test]
    fn test_bracket_span_tracks_nesting() {
        let tokens = vec![
            tok(TokenKind::BrackOpen, "{"),
            name("a"),
            tok(TokenKind::BrackOpen, "{"),
            name("b"),
            tok(TokenKind::BrackClose, "}"),
            name("c"),
            tok(TokenKind::BrackClose, "}"),
            name("after"),
        ];
        let span = bracket_span(&tokens, 0).unwrap();
        assert_eq!(span.len(), 7);
        assert_eq!(span.last().unwrap().kind, TokenKind::BrackClose);
    }

    #[test]
    fn test_paren_span_mismatched() {
        let tokens = vec![tok(TokenKind::ParenOpen, "("), name("a")];
        let err = paren_span(&tokens, 0).unwrap_err();
        assert!(err.to_string().contains("Mismatched parentheses"), "{err}");
    }

    #[test]
    fn test_skip_is_idempotent() {
        let tokens = vec![ws(), ws(), name("a")];
        assert_eq!(skip(&tokens, 0), 2);
        assert_eq!(skip(&tokens, 2), 2);
        assert_eq!(skip(&tokens, 3), 3);
    }
}
