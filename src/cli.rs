use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "invsnap")]
#[command(about = "Inspect and maintain inventory snapshot history")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the snapshot database
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the snapshot database if it does not exist yet
    Init,

    /// Show one snapshot by id, or the recent history of an owner id
    Lookup(LookupArgs),

    /// Print a snapshot as JSON
    Export(ExportArgs),

    /// Delete snapshots older than the retention window
    Prune(PruneArgs),
}

#[derive(Parser)]
pub struct LookupArgs {
    /// Snapshot id, or owner UUID for a history listing
    pub subject: String,
}

#[derive(Parser)]
pub struct ExportArgs {
    /// Snapshot id
    pub id: i64,

    /// Write to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct PruneArgs {
    /// Retention window such as "30d" (overrides the config file)
    #[arg(long)]
    pub older_than: Option<String>,
}
