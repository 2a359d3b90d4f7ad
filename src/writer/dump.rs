//! Emit a human-readable listing of the compiled program.

use crate::model::ProgramTree;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

pub fn emit(tree: &ProgramTree, out_dir: &Path) -> io::Result<()> {
    let mut out = File::create(out_dir.join("program.txt"))?;

    writeln!(out, "; {} instructions", tree.instructions.len())?;
    for (index, instruction) in tree.instructions.iter().enumerate() {
        writeln!(out, "{index:4}  {instruction}")?;
    }

    writeln!(out)?;
    for character in tree.characters.values() {
        writeln!(out, "{character}")?;
    }
    for label in tree.labels.values() {
        writeln!(out, "{label}")?;
    }
    Ok(())
}
