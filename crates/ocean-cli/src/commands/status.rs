//! Status command handler

use anyhow::Result;

use ocean_core::{models, Store};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(store: &Store, output: &Output) -> Result<()> {
    let stats = store.stats();
    let options = store.options();
    let files: Vec<String> = store
        .layout()
        .files()
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    let last_update = stats
        .last_update
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "(never)".to_string());

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "name": options.name,
                    "kind": options.kind.to_string(),
                    "files": files,
                    "last_update": stats.last_update,
                    "counts": {
                        "items": stats.items,
                        "identities": store.items_of_model(models::IDENTITY).len(),
                        "assets": store.items_of_model(models::ASSET).len(),
                        "references": store.items_of_model(models::REFERENCE).len(),
                        "index_values": stats.index_values,
                        "link_entries": stats.link_entries
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", stats.items);
        }
        OutputFormat::Human => {
            println!("Ocean Status");
            println!("============");
            println!();
            println!("Store:");
            println!("  Name: {}", options.name);
            println!("  Kind: {}", options.kind);
            for file in &files {
                println!("  File: {}", file);
            }
            println!("  Last update: {}", last_update);
            println!();
            println!("Contents:");
            println!("  Items:        {}", stats.items);
            println!("    Identities: {}", store.items_of_model(models::IDENTITY).len());
            println!("    Assets:     {}", store.items_of_model(models::ASSET).len());
            println!("    References: {}", store.items_of_model(models::REFERENCE).len());
            println!("  Index values: {}", stats.index_values);
            println!("  Link entries: {}", stats.link_entries);
        }
    }

    Ok(())
}
