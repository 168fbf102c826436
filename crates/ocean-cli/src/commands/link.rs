//! Link command handlers

use anyhow::{Context, Result};

use ocean_core::Store;

use super::parse_value;
use crate::output::Output;

/// Link two items
pub fn create(
    store: &mut Store,
    source: String,
    target: String,
    name: Option<String>,
    path: Option<String>,
    value: Option<String>,
    output: &Output,
) -> Result<()> {
    store
        .add_link(
            &source,
            &target,
            name.as_deref(),
            path.as_deref(),
            value.as_deref().map(parse_value),
        )
        .with_context(|| format!("Failed to link {} -> {}", source, target))?;

    output.success(&format!("Linked {} -> {}", source, target));
    Ok(())
}

/// Remove a link and its annotation
pub fn remove(store: &mut Store, source: String, target: String, output: &Output) -> Result<()> {
    let removed = store
        .unlink(&source, &target)
        .with_context(|| format!("Failed to unlink {} -> {}", source, target))?;

    if removed {
        output.success(&format!("Unlinked {} -> {}", source, target));
    } else {
        output.message(&format!("{} does not link to {}", source, target));
    }
    Ok(())
}

/// Rebuild the link index from item annotations
pub fn rebuild(store: &mut Store, output: &Output) -> Result<()> {
    let count = store.rebuild_links();
    output.success(&format!("Rebuilt link index: {} link(s)", count));
    Ok(())
}
