use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "flexcode", about = "FLEX code editor with a remote interpreter", version)]
pub struct Cli {
    /// File to open in the editor.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Interpreter gateway host (overrides FLEXCODE_GATEWAY_HOST).
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Interpreter gateway port (overrides FLEXCODE_GATEWAY_PORT).
    #[arg(long, global = true, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a program once without the editor and print the result.
    Run {
        /// Program file; reads stdin when omitted or "-".
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Print the interpreter reply as-is, without splitting on commas.
        #[arg(long)]
        raw: bool,
    },
    /// Print the effective configuration.
    Config,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
