//! Configuration module for spiralmem.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    ChannelSettings, ChunkingSettings, EmbeddingSettings, GeneralSettings, MediaSettings,
    PipelineSettings, PlatformSettings, SearchSettings, Settings, StoreSettings,
    TranscriptionSettings,
};
