//! CLI command definitions

use clap::{Parser, ValueEnum};
use conclave_domain::ChatMode;
use std::path::PathBuf;

/// How events are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable rendering
    Text,
    /// One JSON object per event (NDJSON)
    Json,
}

/// Response-production mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// One provider answers
    Normal,
    /// Several providers answer in turn
    Mix,
    /// Four providers debate, one synthesizes
    A2a,
}

impl From<ModeArg> for ChatMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Normal => ChatMode::Normal,
            ModeArg::Mix => ChatMode::Mix,
            ModeArg::A2a => ChatMode::A2a,
        }
    }
}

/// CLI arguments for conclave
#[derive(Parser, Debug)]
#[command(name = "conclave")]
#[command(author, version, about = "Route prompts across several LLM providers")]
#[command(long_about = r#"
Conclave sends a prompt to one or more LLM providers and streams the answer.

Modes:
  normal   One provider answers, chosen by weighted random selection
           (biased toward providers suited to the prompt's intent)
  mix      Each configured mix provider answers in turn
  a2a      Four providers collaborate and debate over two rounds each,
           then a synthesizer writes the final answer

Configuration files are loaded from (in priority order):
1. CONCLAVE_* environment variables (nested keys use __)
2. --config <path>     Explicit config file
3. ./conclave.toml     Project-level config
4. ~/.config/conclave/config.toml   Global config

Example:
  conclave "Explain Rust lifetimes"
  conclave --mode mix "Best practices for error handling?"
  conclave --mode a2a --session design-review "Monolith or microservices?"
"#)]
pub struct Cli {
    /// The prompt to answer (read from stdin when omitted)
    pub prompt: Option<String>,

    /// Response mode
    #[arg(short, long, value_enum, default_value = "normal")]
    pub mode: ModeArg,

    /// Skip selection and ask this provider (normal mode)
    #[arg(short, long, value_name = "ID")]
    pub provider: Option<String>,

    /// Session id for a2a mode (generated when omitted)
    #[arg(short, long, value_name = "ID")]
    pub session: Option<String>,

    /// Conversation to store the exchange under (generated when omitted)
    #[arg(long, value_name = "ID")]
    pub conversation: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Append messages to this JSONL history file
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
