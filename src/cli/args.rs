//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::ScanStrategy;

/// Bounded-value binary trees: generate, build, render and search for blocked-free subtrees
#[derive(Parser, Debug)]
#[command(name = "btsearch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Config file (default: ./.btsearch.toml if present)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Without a subcommand the interactive menu starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a random tree
    Generate {
        /// Number of level-order slots to draw
        nodes: usize,
        /// Probability of an empty slot (default from config)
        #[arg(short = 'p', long)]
        none_probability: Option<f64>,
        /// Seed for reproducible trees
        #[arg(long)]
        seed: Option<u64>,
        /// Also save the tree here
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Build a tree from a level-order list, e.g. "1, 2, None, 3, 4"
    Build {
        /// Comma-separated values, None for gaps
        values: String,
        /// Save the tree here
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Render a tree file
    Show {
        /// Tree file (pre-order, one token per line)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Find the subtree rooted at a value
    Find {
        /// Tree file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Root value of the wanted subtree
        #[arg(short, long, allow_negative_numbers = true)]
        root: i64,
        /// Blocked values
        #[arg(short, long, num_args = 1.., allow_negative_numbers = true)]
        blocked: Vec<i64>,
        /// Save the found subtree here
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Find the first valid subtree in level order
    First {
        /// Tree file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Blocked values
        #[arg(short, long, num_args = 1.., allow_negative_numbers = true)]
        blocked: Vec<i64>,
        /// Scan strategy: rescan or memoized (default from config)
        #[arg(short, long)]
        strategy: Option<ScanStrategy>,
        /// Save the found subtree here
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Interactive menu
    Menu,

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
        /// Create global config instead of ./.btsearch.toml
        #[arg(short, long)]
        global: bool,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
