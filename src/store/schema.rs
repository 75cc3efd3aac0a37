//! SQL schema for the eleven tables backing the store.

/// Executed once at startup inside a single transaction.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS spaces (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    description TEXT,
    settings    TEXT NOT NULL DEFAULT '{}',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS memories (
    id           TEXT PRIMARY KEY,
    space_id     TEXT NOT NULL REFERENCES spaces(id) ON DELETE CASCADE,
    content_type TEXT NOT NULL,
    title        TEXT,
    content      TEXT NOT NULL,
    source       TEXT NOT NULL,
    file_path    TEXT,
    metadata     TEXT NOT NULL DEFAULT '{}',
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_memories_space_created
    ON memories(space_id, created_at DESC);

CREATE TABLE IF NOT EXISTS chunks (
    id              TEXT PRIMARY KEY,
    memory_id       TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    chunk_text      TEXT NOT NULL,
    chunk_order     INTEGER NOT NULL,
    start_offset_ms INTEGER,
    end_offset_ms   INTEGER,
    metadata        TEXT NOT NULL DEFAULT '{}',
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chunks_memory_order
    ON chunks(memory_id, chunk_order);

CREATE TABLE IF NOT EXISTS vector_embeddings (
    id           TEXT PRIMARY KEY,
    content_id   TEXT NOT NULL,
    content_type TEXT NOT NULL,
    model        TEXT NOT NULL,
    dimensions   INTEGER NOT NULL,
    vector       BLOB NOT NULL,
    created_at   TEXT NOT NULL,
    UNIQUE(content_id, content_type, model)
);
CREATE INDEX IF NOT EXISTS idx_vector_embeddings_model
    ON vector_embeddings(model);

CREATE TABLE IF NOT EXISTS video_processing_jobs (
    id                TEXT PRIMARY KEY,
    source_id         TEXT NOT NULL,
    source_type       TEXT NOT NULL,
    status            TEXT NOT NULL,
    progress          INTEGER NOT NULL DEFAULT 0,
    video_path        TEXT,
    audio_path        TEXT,
    transcript_path   TEXT,
    processing_steps  TEXT NOT NULL DEFAULT '[]',
    metadata          TEXT NOT NULL DEFAULT '{}',
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    completed_at      TEXT
);
CREATE INDEX IF NOT EXISTS idx_jobs_status
    ON video_processing_jobs(status);

CREATE TABLE IF NOT EXISTS processed_video_content (
    id          TEXT PRIMARY KEY,
    job_id      TEXT NOT NULL REFERENCES video_processing_jobs(id) ON DELETE CASCADE,
    memory_id   TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    chunks      TEXT NOT NULL DEFAULT '[]',
    embeddings  TEXT,
    transcript  TEXT,
    frames      TEXT,
    thumbnails  TEXT,
    metadata    TEXT NOT NULL DEFAULT '{}',
    created_at  TEXT NOT NULL,
    UNIQUE(job_id)
);

CREATE TABLE IF NOT EXISTS platform_videos (
    id                  TEXT PRIMARY KEY,
    memory_id           TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    platform            TEXT NOT NULL,
    platform_video_id   TEXT NOT NULL,
    video_url           TEXT NOT NULL,
    thumbnail_url       TEXT,
    duration            REAL,
    upload_date         TEXT,
    channel_info        TEXT,
    playlist_info       TEXT,
    platform_metadata   TEXT NOT NULL DEFAULT '{}',
    last_indexed        TEXT NOT NULL,
    accessibility_data  TEXT,
    UNIQUE(platform, platform_video_id)
);

CREATE TABLE IF NOT EXISTS platform_transcripts (
    id                  TEXT PRIMARY KEY,
    platform_video_id   TEXT NOT NULL REFERENCES platform_videos(id) ON DELETE CASCADE,
    full_text           TEXT NOT NULL,
    segments            TEXT NOT NULL DEFAULT '[]',
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS video_deeplinks (
    id                   TEXT PRIMARY KEY,
    video_id             TEXT NOT NULL,
    video_type           TEXT NOT NULL,
    timestamp_start_sec  REAL NOT NULL,
    timestamp_end_sec    REAL,
    deeplink_url         TEXT NOT NULL,
    context_summary      TEXT,
    search_keywords      TEXT,
    confidence_score     REAL NOT NULL DEFAULT 0,
    created_at           TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_deeplinks_video
    ON video_deeplinks(video_id, video_type);

CREATE TABLE IF NOT EXISTS tags (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS memory_tags (
    memory_id   TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    tag_id      TEXT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (memory_id, tag_id)
);
"#;
