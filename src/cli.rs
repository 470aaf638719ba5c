use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "artdraw", about = "Timed drawing rounds scored by a remote art-style classifier")]
pub struct Cli {
    /// JSON settings file; defaults apply when omitted or missing.
    #[arg(long)]
    pub settings: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play automated rounds with random scribbles.
    Play {
        #[arg(long, default_value_t = 1)]
        rounds: u32,
        #[arg(long, default_value_t = 6)]
        strokes: u32,
        /// Directory the final drawing is saved to.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the prompt catalog.
    Prompts,
    /// Write the effective settings to the settings file.
    InitSettings,
}
