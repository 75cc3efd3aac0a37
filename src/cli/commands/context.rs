//! Shared construction of the store/media/transcription/embedding/pipeline
//! stack from loaded [`Settings`], so every command builds the same objects
//! the same way instead of duplicating wiring.

use std::sync::Arc;

use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::media::MediaAdapter;
use crate::pipeline::Pipeline;
use crate::search::SearchService;
use crate::store::Store;
use crate::transcription::{LocalTranscriber, Transcriber};

pub fn open_store(settings: &Settings) -> Result<Store> {
    Store::open(&settings.db_path().to_string_lossy())
}

pub fn build_embedder(settings: &Settings) -> Option<Arc<dyn Embedder>> {
    if std::env::var("OPENAI_API_KEY").is_err() {
        return None;
    }
    Some(Arc::new(OpenAIEmbedder::with_config(&settings.embedding.model, settings.embedding.dimensions as usize)))
}

pub fn build_transcriber(settings: &Settings) -> Arc<dyn Transcriber> {
    Arc::new(LocalTranscriber::new(&settings.transcription, &settings.media))
}

pub fn build_pipeline(settings: &Settings, store: Store) -> Pipeline {
    let media = MediaAdapter::new(&settings.media);
    let transcriber = build_transcriber(settings);
    let embedder = build_embedder(settings);
    Pipeline::new(store, media, transcriber, embedder, settings.pipeline.clone(), settings.embedding.clone())
}

pub fn build_search_service(settings: &Settings, store: Store) -> SearchService {
    let embedder = build_embedder(settings);
    SearchService::new(store, embedder, settings.search.clone(), settings.embedding.model.clone())
}

/// Resolves a `--space` flag to an id, defaulting to the store's default space.
pub fn resolve_space_id(store: &Store, space: Option<&str>) -> Result<String> {
    match space {
        Some(name) => match store.spaces.get_by_name(name)? {
            Some(space) => Ok(space.id),
            None => Ok(store.spaces.create(name, None)?.id),
        },
        None => Ok(store.spaces.default_space()?.id),
    }
}
