//! Index command handlers

use anyhow::{Context, Result};

use ocean_core::Store;

use crate::output::Output;

/// Index an item under a value
pub fn index(store: &mut Store, value: String, id: String, output: &Output) -> Result<()> {
    if store.index(&value, &id)? {
        output.success(&format!("Indexed {} under '{}'", id, value));
    } else {
        output.message(&format!("{} is already indexed under '{}'", id, value));
    }
    Ok(())
}

/// List the items indexed under a value
pub fn find(
    store: &Store,
    value: String,
    model: Option<String>,
    max: Option<usize>,
    output: &Output,
) -> Result<()> {
    let ids = store
        .from_index(&value, model.as_deref(), max)
        .with_context(|| format!("Lookup of '{}' failed", value))?;

    let items: Vec<_> = ids.iter().filter_map(|id| store.get(id)).collect();
    output.print_items(&items);
    Ok(())
}

/// Get or create the item of a model indexed under a value
pub fn fetch(store: &mut Store, value: String, model: String, output: &Output) -> Result<()> {
    let id = store.fetch(&value, &model)?;
    output.created(&model, &id);
    Ok(())
}
