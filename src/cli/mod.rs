//! CLI surface for spiralmem.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// spiralmem - local-first video ingestion, transcription, and hybrid search.
#[derive(Parser, Debug)]
#[command(name = "spiralmem")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the store and ensure the default space exists
    Init {
        /// Skip tool checks and use an in-memory store (for smoke-testing the CLI itself)
        #[arg(long)]
        test_mode: bool,

        /// Re-run setup even if already initialized
        #[arg(long)]
        force: bool,
    },

    /// Run a local file or platform URL through the ingestion pipeline
    AddVideo {
        /// Local file path or platform URL
        input: String,

        /// Space to store the memory in (defaults to "default")
        #[arg(short = 's', long)]
        space: Option<String>,

        /// Override the memory's title
        #[arg(short = 't', long)]
        title: Option<String>,

        /// Embedding model to use
        #[arg(long)]
        model: Option<String>,

        /// Skip transcription (content-processing still runs on an empty transcript)
        #[arg(long)]
        no_transcription: bool,

        /// Keep the source video file after processing (skips cleanup)
        #[arg(long)]
        keep_video: bool,

        /// Delete the extracted audio file after processing
        #[arg(long)]
        no_keep_audio: bool,
    },

    /// Keyword search over indexed memories and chunks
    Search {
        query: String,
        #[arg(short = 's', long)]
        space: Option<String>,
        #[arg(short = 'l', long)]
        limit: Option<usize>,
        /// Attach millisecond ranges and word-level matches to chunk results
        #[arg(long)]
        timestamps: bool,
        #[arg(long)]
        json: bool,
    },

    /// Vector search via the configured embedder, falling back to keyword on failure
    SemanticSearch {
        query: String,
        #[arg(short = 's', long)]
        space: Option<String>,
        #[arg(short = 'l', long)]
        limit: Option<usize>,
        /// Minimum cosine similarity to keep a result
        #[arg(long)]
        threshold: Option<f32>,
        #[arg(long)]
        timestamps: bool,
        #[arg(long)]
        json: bool,
    },

    /// Extract matched segments as compilation-ready rows
    ExtractSegments {
        query: String,
        #[arg(short = 's', long)]
        space: Option<String>,
        #[arg(short = 'l', long)]
        limit: Option<usize>,
        #[arg(long)]
        min_duration: Option<i64>,
        #[arg(long)]
        max_duration: Option<i64>,
        /// Print as CSV instead of a table
        #[arg(long)]
        csv: bool,
    },

    /// Download the platform segments matched by a query, one file per range
    DownloadSegments {
        query: String,
        #[arg(short = 's', long)]
        space: Option<String>,
        #[arg(short = 'l', long)]
        limit: Option<usize>,
        #[arg(long)]
        min_duration: Option<i64>,
        #[arg(long)]
        max_duration: Option<i64>,
        #[arg(short = 'q', long, default_value = "720")]
        quality: String,
        #[arg(short = 'o', long)]
        output_dir: Option<String>,
    },

    /// Batch-embed chunks that don't yet have an embedding for the configured model
    GenerateEmbeddings {
        /// Restrict to these memory ids (all memories if omitted)
        #[arg(long, value_delimiter = ',')]
        memory_ids: Option<Vec<String>>,
        /// Re-embed chunks that already have an embedding for this model
        #[arg(long)]
        force: bool,
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Embedding counts by content type and model, with average dimensions
    VectorStats {
        #[arg(long)]
        json: bool,
    },

    /// Discover and process a channel's videos
    AddChannel {
        url: String,
        #[arg(short = 'm', long)]
        max_videos: Option<usize>,
        #[arg(short = 's', long)]
        space: Option<String>,
        #[arg(long)]
        min_duration: Option<f64>,
        #[arg(long)]
        max_duration: Option<f64>,
        #[arg(long)]
        include_shorts: bool,
        #[arg(long, value_delimiter = ',')]
        exclude_keywords: Option<Vec<String>>,
        #[arg(long, value_delimiter = ',')]
        include_keywords: Option<Vec<String>>,
        #[arg(long, default_value = "newest-first")]
        priority: String,
        /// List matched videos without processing them
        #[arg(long)]
        dry_run: bool,
    },

    /// List spaces
    Spaces,

    /// Create a new space
    CreateSpace {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Summary counts: memories, chunks, embeddings, jobs by status
    Stats,

    /// Export a memory's transcript
    Export {
        memory_id: String,
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Verify required tools and configuration
    Check,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run the MCP server as a child process (stdio JSON-RPC)
    ServeMcp,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "search.vector_weight")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
