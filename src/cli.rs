use std::path::PathBuf;

use clap::Parser;

/// Command-line flags for the prompt testing utility.
#[derive(Debug, Parser)]
#[command(name = "promptlab", about = "Interactive utility for testing bot prompts and conversations")]
pub struct CliArgs {
    /// Path to the configuration YAML file
    #[arg(long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// File that finished conversations are appended to
    #[arg(long, default_value = "test_conversations.txt")]
    pub output: PathBuf,

    /// Logging level (e.g. debug, info, warn)
    #[arg(long, default_value = "info")]
    pub log: String,
}
