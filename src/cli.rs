use clap::{Parser, Subcommand};
use reelmatch_common::MediaType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelmatch")]
#[command(author, version, about = "Resolve catalog entries to external metadata records")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve every entry of a catalog JSON file
    Resolve {
        /// JSON array of catalog entries
        #[arg(required = true)]
        catalog: PathBuf,

        /// Write results here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the configured worker count
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Resolve a single title given on the command line
    Lookup {
        #[arg(long)]
        title: String,

        #[arg(long)]
        original_title: Option<String>,

        #[arg(long)]
        year: Option<u16>,

        /// Director name (repeat for several)
        #[arg(long = "director")]
        directors: Vec<String>,

        /// Runtime in minutes
        #[arg(long)]
        runtime: Option<u32>,

        #[arg(long, default_value = "movie")]
        media_type: MediaType,

        /// Known TMDB id (tries the fast path first)
        #[arg(long, conflicts_with = "imdb_id")]
        tmdb_id: Option<u64>,

        /// Known IMDb id, e.g. tt0133093
        #[arg(long)]
        imdb_id: Option<String>,
    },

    /// Inspect or maintain the result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Check that the configured provider is reachable and accepts its key
    CheckProviders,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show entry counts
    Stats,
    /// Remove every entry
    Clear,
    /// Remove expired entries
    Prune,
}
