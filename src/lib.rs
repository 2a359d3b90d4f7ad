pub mod cli;
pub mod compiler;
pub mod loader;
pub mod model;
pub mod writer;

use anyhow::Context;
use clap::Parser;

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // 1. ── Load ───────────────────────────────────────────────────────
    let json = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Reading {}", args.input.display()))?;
    let tokens = loader::load_tokens(&json).with_context(|| "Parsing token dump")?;

    // 2. ── Compile ────────────────────────────────────────────────────
    let tree = compiler::run(&tokens, args.strict).with_context(|| "Compiling script")?;

    // 3. ── Write outputs ──────────────────────────────────────────────
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Creating {}", args.output.display()))?;

    writer::json::emit(&tree, &args.output).with_context(|| "Writing JSON artifact")?;
    writer::dump::emit(&tree, &args.output).with_context(|| "Writing program listing")?;

    Ok(())
}
