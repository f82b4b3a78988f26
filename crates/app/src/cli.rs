use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "threadscribe", author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render comments as budgeted text for model input.
    Prepare {
        #[command(flatten)]
        input: InputArgs,
        /// Maximum comment blocks to emit across all threads.
        #[arg(long)]
        max_comments: Option<usize>,
        /// Omit author, date, source and url lines, comment timestamps and scores.
        #[arg(long, default_value_t = false)]
        slim: bool,
    },
    /// Print canonical threads as JSON.
    Convert {
        #[command(flatten)]
        input: InputArgs,
        /// Leave platform metadata out of the threads.
        #[arg(long, default_value_t = false)]
        for_analysis: bool,
    },
    /// Print minified threads, as text or JSON.
    Minify {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

impl Command {
    pub fn input(&self) -> &InputArgs {
        match self {
            Command::Prepare { input, .. }
            | Command::Convert { input, .. }
            | Command::Minify { input, .. } => input,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Prepare { .. } => "prepare",
            Command::Convert { .. } => "convert",
            Command::Minify { .. } => "minify",
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// youtube, reddit, github, hackernews, twitter, blog or auto.
    #[arg(long)]
    pub source: Option<String>,
    /// JSON file to read, `-` for stdin.
    #[arg(long, default_value = "-")]
    pub input: PathBuf,
}
