//! Loads the token dump the lexer writes out as JSON.

use crate::model::Token;
use anyhow::{Context, Result};

/// Parse a token-dump JSON string into the token sequence.
///
/// The lexer writes a flat array of `{ "kind": ..., "text": ... }` objects;
/// kinds use snake_case names (`"name"`, `"string_full"`, `"brack_open"`, …).
pub fn load_tokens(json: &str) -> Result<Vec<Token>> {
    let tokens: Vec<Token> =
        serde_json::from_str(json).context("token dump is not a valid token array")?;
    println!("Loaded {} tokens", tokens.len());
    Ok(tokens)
}
