use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Input token-dump .json file produced by the lexer
    pub input: PathBuf,
    /// Output directory
    pub output: PathBuf,
    /// Fail on tokens no parser recognises instead of skipping them
    #[arg(long)]
    pub strict: bool,
}
