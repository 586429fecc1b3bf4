//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Inspect NAS search spaces, replay training metrics, dispatch payloads
#[derive(Parser, Debug)]
#[command(name = "nasutil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log level (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: $XDG_CONFIG_HOME/nasutil/nasutil.toml)
    #[arg(long, global = true, env = "NASUTIL_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show search space as tree
    Tree {
        /// Search space description (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// List mutables in traversal order
    Traverse {
        /// Search space description (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// "pre" or "post" (default from config)
        #[arg(short, long)]
        order: Option<String>,
        /// Keep repeated keys
        #[arg(long)]
        no_dedup: bool,
    },

    /// Replay a JSON-lines metrics log through running averages
    Meter {
        /// Metrics log, one JSON object per line
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Value format, e.g. ":4f" or ":.3f" (default from config)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Move a JSON-described payload to a device
    Dispatch {
        /// Payload description (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Target device: cpu, cuda, cuda:<n> (default from config)
        #[arg(long)]
        device: Option<String>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
