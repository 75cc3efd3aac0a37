//! `spaces` and `create-space` commands.

use anyhow::Result;

use crate::cli::Output;
use crate::config::Settings;

use super::context;

pub fn run_spaces(settings: Settings) -> Result<()> {
    let store = context::open_store(&settings)?;
    let spaces = store.spaces.list()?;

    if spaces.is_empty() {
        Output::info("No spaces yet. Run `spiralmem init` to create the default space.");
        return Ok(());
    }

    Output::header("Spaces");
    for space in &spaces {
        Output::list_item(&format!(
            "{} ({}){}",
            space.name,
            space.id,
            space.description.as_deref().map(|d| format!(" - {d}")).unwrap_or_default()
        ));
    }

    Ok(())
}

pub fn run_create_space(name: &str, description: Option<String>, settings: Settings) -> Result<()> {
    let store = context::open_store(&settings)?;
    let space = store.spaces.create(name, description.as_deref())?;
    Output::success(&format!("Created space '{}' ({})", space.name, space.id));
    Ok(())
}
