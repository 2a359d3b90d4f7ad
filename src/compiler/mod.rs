//! The compiler stage: token stream in, resolved linear program out.

pub mod ast;
pub mod error;
pub mod parser;
pub mod statement;

pub use error::SyntaxError;

use crate::model::{ProgramTree, Token};
use anyhow::Result;

/// Runs the parse and surfaces the registered characters and labels.
pub fn run(tokens: &[Token], strict: bool) -> Result<ProgramTree> {
    let tree = parser::parse_program(tokens, strict)?;

    for character in tree.characters.values() {
        println!("{character}");
    }
    for label in tree.labels.values() {
        println!("{label}");
    }
    println!("{} instructions", tree.instructions.len());

    Ok(tree)
}
