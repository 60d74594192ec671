use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vigil",
    version,
    about = "Vigil - observe directories and stream normalized change events"
)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List a directory with resolved metadata
    #[command(about = "List a directory, one JSON snapshot per entry")]
    List(ListArgs),

    /// Watch one or more paths and print change events
    #[command(about = "Watch paths and print change events as JSON lines")]
    Watch(WatchArgs),
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Directory to list; may start with ~ or %HOME%
    pub path: PathBuf,
}

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Paths to watch; a trailing /* segment watches a directory's
    /// immediate contents
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Quiet period before a write burst is reported once
    #[arg(long, default_value_t = 400)]
    pub debounce_ms: u64,
}
