//! Block tree for a script *before* it is flattened into the linear
//! instruction list.
//!
//! A `Block` holds an ordered mix of leaf statements and composite nodes
//! (conditionals, menus). `Block::leaves` walks the tree depth-first and
//! yields only the leaf instructions, in program order; the same traversal
//! fills the main instruction list and every call-label body.

use serde::Serialize;
use std::fmt;

/// A single executable leaf statement, as produced by the statement
/// processor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// `"text"` or `speaker "text"` – one spoken line.
    Say {
        speaker: Option<String>,
        text: String,
    },

    /// `name = value`.
    Set { name: String, value: Value },

    /// `jump name` – transfer to a goto label, resolved by the runtime.
    Jump { label: String },

    /// `call name` – enter a call label's body.
    Call { label: String },

    /// `return` – leave a call label's body.
    Return,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Name(String),
    Number(i64),
    Str(String),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Say {
                speaker: Some(who),
                text,
            } => write!(f, "say {who} {text:?}"),
            Instruction::Say {
                speaker: None,
                text,
            } => write!(f, "say {text:?}"),
            Instruction::Set { name, value } => write!(f, "set {name} = {value}"),
            Instruction::Jump { label } => write!(f, "jump {label}"),
            Instruction::Call { label } => write!(f, "call {label}"),
            Instruction::Return => write!(f, "return"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Name(name) => write!(f, "{name}"),
            Value::Number(number) => write!(f, "{number}"),
            Value::Str(text) => write!(f, "{text:?}"),
        }
    }
}

/// Boolean condition tree. The parser only stores these and threads them
/// through to the compiled program; it never evaluates them itself.
#[derive(Debug, Clone, PartialEq)]
pub enum BoolExpr {
    /// A named boolean value; the words `true` and `false` are literals.
    Access(String),
    Not(Box<BoolExpr>),
    And(Box<BoolExpr>, Box<BoolExpr>),
    Or(Box<BoolExpr>, Box<BoolExpr>),
}

impl BoolExpr {
    pub fn evaluate(&self, lookup: &dyn Fn(&str) -> bool) -> bool {
        match self {
            BoolExpr::Access(name) => match name.as_str() {
                "true" => true,
                "false" => false,
                other => lookup(other),
            },
            BoolExpr::Not(inner) => !inner.evaluate(lookup),
            BoolExpr::And(lhs, rhs) => lhs.evaluate(lookup) && rhs.evaluate(lookup),
            BoolExpr::Or(lhs, rhs) => lhs.evaluate(lookup) || rhs.evaluate(lookup),
        }
    }
}

impl fmt::Display for BoolExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolExpr::Access(name) => write!(f, "{name}"),
            BoolExpr::Not(inner) => write!(f, "not {inner}"),
            BoolExpr::And(lhs, rhs) => write!(f, "({lhs} and {rhs})"),
            BoolExpr::Or(lhs, rhs) => write!(f, "({lhs} or {rhs})"),
        }
    }
}

/// One child of a block: either a leaf statement or a composite node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Statement(Instruction),
    If(IfNode),
    Menu(MenuNode),
}

/// An if/else-if/else chain. `conditions` and `contents` are parallel and
/// always the same, nonzero length.
#[derive(Debug, Clone, PartialEq)]
pub struct IfNode {
    pub conditions: Vec<BoolExpr>,
    pub contents: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub option: String,
}

/// A player-choice construct; one content block per option, parallel.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuNode {
    pub entries: Vec<MenuEntry>,
    pub contents: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub children: Vec<Node>,
}

impl Block {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
        }
    }

    /// Depth-first traversal over the leaf instructions of this block.
    ///
    /// Composite nodes are expanded in place, branch by branch, so the
    /// leaves come out in program order. The traversal borrows the block
    /// without mutating it; calling `leaves` again restarts from the top.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            stack: vec![self.children.iter()],
        }
    }
}

pub struct Leaves<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a Instruction;

    fn next(&mut self) -> Option<&'a Instruction> {
        loop {
            let node = match self.stack.last_mut() {
                Some(iter) => iter.next(),
                None => return None,
            };
            match node {
                Some(Node::Statement(instruction)) => return Some(instruction),
                Some(Node::If(node)) => {
                    for content in node.contents.iter().rev() {
                        self.stack.push(content.children.iter());
                    }
                }
                Some(Node::Menu(node)) => {
                    for content in node.contents.iter().rev() {
                        self.stack.push(content.children.iter());
                    }
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn say(text: &str) -> Instruction {
        Instruction::Say {
            speaker: None,
            text: text.into(),
        }
    }

    fn leaf(text: &str) -> Node {
        Node::Statement(say(text))
    }

    fn block(children: Vec<Node>) -> Block {
        Block { children }
    }

    #[test]
    fn test_leaves_depth_first_order() {
        // a, if { b, menu { c } }, d  →  a b c d
        let menu = Node::Menu(MenuNode {
            entries: vec![MenuEntry { option: "x".into() }],
            contents: vec![block(vec![leaf("c")])],
        });
        let cond = Node::If(IfNode {
            conditions: vec![BoolExpr::Access("true".into())],
            contents: vec![block(vec![leaf("b"), menu])],
        });
        let root = block(vec![leaf("a"), cond, leaf("d")]);

        let texts: Vec<_> = root
            .leaves()
            .map(|instr| match instr {
                Instruction::Say { text, .. } => text.clone(),
                other => panic!("unexpected leaf {other:?}"),
            })
            .collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_leaves_multiple_branches() {
        let cond = Node::If(IfNode {
            conditions: vec![
                BoolExpr::Access("a".into()),
                BoolExpr::Access("true".into()),
            ],
            contents: vec![block(vec![leaf("x")]), block(vec![leaf("y")])],
        });
        let root = block(vec![cond]);

        let leaves: Vec<_> = root.leaves().cloned().collect();
        assert_eq!(leaves, vec![say("x"), say("y")]);
    }

    #[test]
    fn test_leaves_restartable() {
        let cond = Node::If(IfNode {
            conditions: vec![BoolExpr::Access("true".into())],
            contents: vec![block(vec![leaf("b")])],
        });
        let root = block(vec![leaf("a"), cond]);

        let first: Vec<_> = root.leaves().cloned().collect();
        let second: Vec<_> = root.leaves().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_empty_block_has_no_leaves() {
        assert_eq!(Block::new().leaves().count(), 0);
    }

    #[test]
    fn test_evaluate_and_describe() {
        // (ready and not done)
        let expr = BoolExpr::And(
            Box::new(BoolExpr::Access("ready".into())),
            Box::new(BoolExpr::Not(Box::new(BoolExpr::Access("done".into())))),
        );
        assert!(expr.evaluate(&|name| name == "ready"));
        assert!(!expr.evaluate(&|_| true));
        assert_eq!(expr.to_string(), "(ready and not done)");

        let always = BoolExpr::Access("true".into());
        assert!(always.evaluate(&|_| false));
    }
}
