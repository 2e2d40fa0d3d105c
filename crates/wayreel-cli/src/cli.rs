//! The CLI surface (spec §6): one subcommand per worker, plus enqueue,
//! save, delete, stats, and graph.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wayreel", about = "Discover, record, and publish web-archive snapshots")]
pub struct Cli {
    /// Path to the JSON configuration document.
    #[arg(long, env = "WAYREEL_CONFIG", default_value = "wayreel.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the Scout: discover and score snapshots.
    Scout {
        /// Run at most N iterations, then exit. Omit to run the cron scheduler.
        iterations: Option<usize>,
    },
    /// Run the Recorder: capture scouted snapshots to video.
    Record {
        iterations: Option<usize>,
    },
    /// Run the Approver: review recorded captures.
    Approve {
        iterations: Option<usize>,
        /// Synthesize a narration track while presenting each capture.
        #[arg(long)]
        tts: bool,
    },
    /// Run the Publisher: post approved recordings to social backends.
    Publish {
        iterations: Option<usize>,
    },
    /// Compile recordings into a single output with a sidecar transcript.
    Compile {
        #[command(flatten)]
        selection: CompileSelectionArgs,
        #[arg(long)]
        tts: bool,
        #[arg(long, default_value = "black")]
        color: String,
        #[arg(long, default_value_t = 2)]
        duration: u64,
        #[arg(long)]
        sfx: Option<PathBuf>,
    },
    /// Insert a seed Snapshot directly, bypassing discovery.
    Enqueue {
        #[arg(value_enum)]
        stage: EnqueueStage,
        url: String,
        timestamp: Option<String>,
    },
    /// Force an immediate archive save of one URL.
    Save {
        url: String,
    },
    /// Remove audit waste: rejected recordings, already-compiled files, orphaned temp files.
    Delete {
        #[arg(long)]
        unapproved: bool,
        #[arg(long)]
        compiled: bool,
        #[arg(long)]
        temporary: bool,
        #[arg(long)]
        registry: bool,
    },
    /// Print snapshot/recording/compilation counts.
    Stats,
    /// Inspect the observed link graph.
    Graph {
        #[command(flatten)]
        query: GraphQueryArgs,
    },
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
pub struct CompileSelectionArgs {
    /// Select every recording published within [begin, end).
    #[arg(long, num_args = 2, value_names = ["BEGIN", "END"])]
    pub published: Option<Vec<String>>,
    /// Select an explicit id list, e.g. "1-20,!13".
    #[arg(long, value_names = ["KIND", "IDLIST"], num_args = 2)]
    pub any: Option<Vec<String>>,
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
pub struct GraphQueryArgs {
    #[arg(long)]
    pub trace: Option<i64>,
    #[arg(long)]
    pub next: Option<i64>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum EnqueueStage {
    Scout,
    Record,
    Publish,
}
