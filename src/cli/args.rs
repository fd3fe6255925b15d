//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand, ValueHint};

/// Formatting precheck for Praat TextGrid collections
#[derive(Parser, Debug)]
#[command(name = "gridcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Raise log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Extra config file applied over the global one
    #[arg(short, long, global = true, env = "GRIDCHECK_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Precheck a submitted collection against its reference
    #[command(group(ArgGroup::new("answer").required(true).args(["lab", "reference"])))]
    Check {
        /// Student id; the file must be named <id>_<reference file name>
        #[arg(short, long)]
        student_id: String,

        /// Submitted collection file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Lab number; reference is <answers_dir>/Lab<n>.<ext>
        #[arg(short, long)]
        lab: Option<u32>,

        /// Reference collection file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        reference: Option<PathBuf>,
    },

    /// Parse a collection and show its structure
    Parse {
        /// Collection file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Dump the parsed tree as TOML
        #[arg(long)]
        toml: bool,
    },

    /// Group one tier of many submissions next to the reference
    Review {
        /// TextGrid name inside the collections
        #[arg(long)]
        textgrid: String,

        /// Tier name inside the TextGrid
        #[arg(long)]
        tier: String,

        /// Reference collection file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        reference: PathBuf,

        /// Submitted tiers per group (default from settings)
        #[arg(long)]
        max_group: Option<usize>,

        /// Submitted collection files
        #[arg(value_hint = ValueHint::FilePath)]
        submissions: Vec<PathBuf>,
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
        /// Create global config (default: ./gridcheck.toml)
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
