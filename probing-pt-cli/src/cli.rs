use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "probing-pt",
    about = "Inspect memory-mapped probing phrase tables",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the store config and hash table statistics
    Info {
        /// Store directory
        #[arg(env = "PROBING_PT_STORE")]
        store: PathBuf,

        /// Output format
        #[arg(long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Look up one source phrase
    Query {
        /// Store directory
        #[arg(env = "PROBING_PT_STORE")]
        store: PathBuf,

        #[command(flatten)]
        phrase: PhraseArgs,

        /// Output format
        #[arg(long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Print every stored key with its candidates
    Dump {
        /// Store directory
        #[arg(env = "PROBING_PT_STORE")]
        store: PathBuf,

        /// Stop after this many keys
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Check every slot and record in the store
    Verify {
        /// Store directory
        #[arg(env = "PROBING_PT_STORE")]
        store: PathBuf,

        /// Output format
        #[arg(long, default_value = "table", value_enum)]
        format: OutputFormat,
    },
}

/// Exactly one way of naming the source phrase.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct PhraseArgs {
    /// Source-vocabulary token IDs
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub ids: Option<Vec<u64>>,

    /// Source phrase as words, resolved through `source_vocabids`
    #[arg(long)]
    pub words: Option<String>,

    /// Precomputed 64-bit key
    #[arg(long)]
    pub key: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// Pretty-printed JSON
    Json,
}
