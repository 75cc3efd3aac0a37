//! spiralmem - local-first video memory
//!
//! A local-first system for ingesting video (local files or platform URLs),
//! transcribing and chunking their content, embedding it for semantic
//! recall, and searching across everything ingested — by keyword, by
//! meaning, or both at once.
//!
//! # Architecture
//!
//! - `store` - SQLite-backed persistence for spaces, memories, chunks,
//!   embeddings, jobs, and platform metadata
//! - `media` - audio extraction and probing via ffmpeg/ffprobe
//! - `platform` - platform URL parsing, channel discovery, and video/segment
//!   download via an external downloader binary
//! - `transcription` - speech-to-text transcription and export formatting
//! - `chunking` - content chunking strategies
//! - `embedding` - embedding generation for semantic search
//! - `pipeline` - the video-ingestion job state machine tying the above
//!   together
//! - `search` - keyword, vector, and hybrid search over ingested content
//! - `channel` - discover/filter/sort/dispatch orchestration for a whole
//!   platform channel
//! - `config` - configuration management
//! - `cli` - command-line interface
//! - `mcp` - Model Context Protocol server
//!
//! # Example
//!
//! ```rust,no_run
//! use spiralmem::config::Settings;
//! use spiralmem::store::Store;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let store = Store::open(&settings.db_path().to_string_lossy())?;
//!     let space = store.spaces.default_space()?;
//!     println!("default space: {}", space.id);
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod mcp;
pub mod media;
pub mod openai;
pub mod pipeline;
pub mod platform;
pub mod search;
pub mod store;
pub mod transcription;

pub use error::{Result, SpiralmemError};
