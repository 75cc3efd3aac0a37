//! Shared OpenAI client construction, used by the embedder.

use async_openai::config::OpenAIConfig;
use async_openai::Client;

/// Build an OpenAI client from the `OPENAI_API_KEY` environment variable.
///
/// Construction never fails: a missing key simply produces a client whose calls
/// will fail at request time, which the embedder surfaces as a soft failure
/// (absence of the embedding tool) rather than a panic at startup.
pub fn create_client() -> Client<OpenAIConfig> {
    Client::new()
}

/// Whether an `OPENAI_API_KEY` is configured in the environment.
pub fn is_api_key_configured() -> bool {
    std::env::var("OPENAI_API_KEY")
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}
