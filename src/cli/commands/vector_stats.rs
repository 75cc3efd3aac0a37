//! `vector-stats` command: embedding counts by content type and model.

use anyhow::Result;
use serde::Serialize;

use crate::cli::Output;
use crate::config::Settings;

use super::context;

#[derive(Serialize)]
struct VectorStats {
    total: i64,
    by_model: Vec<(String, i64)>,
}

pub fn run_vector_stats(json: bool, settings: Settings) -> Result<()> {
    let store = context::open_store(&settings)?;
    let total = store.embeddings.count()?;
    let by_model = store.embeddings.count_by_model()?;

    if json {
        let stats = VectorStats { total, by_model };
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    Output::header("Vector Store Stats");
    Output::kv("total embeddings", &total.to_string());
    for (model, count) in &by_model {
        Output::kv(model, &count.to_string());
    }

    Ok(())
}
