use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Guided tour demo - step through a highlighted tour in the terminal
#[derive(Parser, Debug)]
#[command(name = "guided-tour")]
#[command(about = "Run multi-step guided tours in the terminal")]
#[command(version)]
pub struct Cli {
    /// Tour definition (JSON). The built-in demo tour is used when omitted.
    #[arg(short, long, global = true)]
    pub tour: Option<PathBuf>,

    /// File remembering which tours have been seen
    #[arg(long, global = true, default_value = "guided-tour-state.json")]
    pub state_file: PathBuf,

    /// Write logs to this file (RUST_LOG controls the level)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the tour interactively
    Run {
        /// Start even if the tour has been seen before
        #[arg(short, long)]
        force: bool,
    },
    /// Print the buttons and markers computed for each step
    Plan,
    /// Forget that the tour has been seen
    Reset,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
