use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use reelcache_model::QueryKey;

#[derive(Debug, Parser)]
#[command(
    name = "reelcachectl",
    version,
    about = "Look up movie metadata and posters, cache first"
)]
pub struct Cli {
    /// Dotenv file read before the process environment
    #[arg(long, global = true, default_value = ".env")]
    pub env_file: PathBuf,

    /// Maximum concurrent requests per stage (overrides FETCH_CONCURRENCY)
    #[arg(long, global = true, value_name = "N")]
    pub concurrency: Option<NonZeroUsize>,

    /// Debug-level logging unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve metadata for the given titles and IDs
    Search {
        #[command(flatten)]
        keys: KeyArgs,

        /// Print records as JSON instead of field blocks
        #[arg(long)]
        json: bool,
    },
    /// Download posters for the given titles and IDs
    Poster {
        #[command(flatten)]
        keys: KeyArgs,

        /// Output directory (overrides POSTER_DIR)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = true)]
pub struct KeyArgs {
    /// Movie titles (one or more)
    #[arg(long = "title", value_name = "TITLE", num_args = 1..)]
    pub titles: Vec<QueryKey>,

    /// IMDb IDs such as tt0111161 (one or more)
    #[arg(long = "id", value_name = "ID", num_args = 1..)]
    pub ids: Vec<QueryKey>,
}

impl KeyArgs {
    /// Titles first, then IDs, each in the order given.
    pub fn into_keys(self) -> Vec<QueryKey> {
        let mut keys = self.titles;
        keys.extend(self.ids);
        keys
    }
}
