//! Emit the compiled program as a JSON artifact for the runtime.

use crate::model::ProgramTree;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn emit(tree: &ProgramTree, out_dir: &Path) -> Result<()> {
    let path = out_dir.join("program.json");
    let json = serde_json::to_string_pretty(tree).context("serializing program")?;
    fs::write(&path, json).with_context(|| format!("Writing {}", path.display()))?;
    Ok(())
}
