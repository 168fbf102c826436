//! Item command handlers

use anyhow::{Context, Result};

use ocean_core::Store;

use super::parse_value;
use crate::output::Output;

/// Create an item, or reuse the one with the given id
pub fn new(store: &mut Store, model: String, id: Option<String>, output: &Output) -> Result<()> {
    let id = store
        .new_item(&model, id.as_deref())
        .context("Failed to create item")?;
    output.created(&model, &id);
    Ok(())
}

/// Show an item, or one of its properties
pub fn get(store: &Store, id: String, path: Option<String>, output: &Output) -> Result<()> {
    match path {
        Some(path) => {
            let value = store.get_path(&id, path.as_str())?;
            output.print_value(value);
        }
        None => {
            let item = store
                .get(&id)
                .ok_or_else(|| anyhow::anyhow!("Item not found: {}", id))?;
            output.print_item(item);
        }
    }
    Ok(())
}

/// Write a property
pub fn set(store: &mut Store, id: String, path: String, value: String, output: &Output) -> Result<()> {
    let position = store
        .set(&id, path.as_str(), parse_value(&value))
        .with_context(|| format!("Failed to set {} on {}", path, id))?;

    match position {
        Some(position) => output.success(&format!("Set {}.{} at position {}", id, path, position)),
        None => output.success(&format!("Set {}.{}", id, path)),
    }
    Ok(())
}

/// Compute and store an item's fingerprint
pub fn hash(store: &mut Store, id: String, separator: String, output: &Output) -> Result<()> {
    let hash = store.hash(&id, &separator)?;
    output.print_value(Some(&serde_json::Value::String(hash)));
    Ok(())
}

/// Delete an item and every reference to it
pub fn remove(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let item = store
        .remove(&id)
        .with_context(|| format!("Failed to remove {}", id))?;
    output.success(&format!("Removed {} ({})", item.id(), item.model()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use ocean_core::models;
    use serde_json::json;

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_new_set_and_remove() {
        let mut store = Store::memory();
        new(&mut store, "Asset".into(), Some("AS-1".into()), &quiet()).unwrap();
        set(&mut store, "AS-1".into(), "tags.*".into(), "sea".into(), &quiet()).unwrap();
        set(&mut store, "AS-1".into(), "pages".into(), "635".into(), &quiet()).unwrap();

        assert_eq!(store.get("AS-1").unwrap().model(), models::ASSET);
        assert_eq!(store.get_path("AS-1", "tags").unwrap(), Some(&json!(["sea"])));
        assert_eq!(store.get_path("AS-1", "pages").unwrap(), Some(&json!(635)));

        hash(&mut store, "AS-1".into(), "-".into(), &quiet()).unwrap();
        assert!(store.get("AS-1").unwrap().hash().is_some());

        remove(&mut store, "AS-1".into(), &quiet()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_missing_item_fails() {
        let store = Store::memory();
        assert!(get(&store, "nope".into(), None, &quiet()).is_err());
        assert!(get(&store, "nope".into(), Some("a".into()), &quiet()).is_err());
    }
}
