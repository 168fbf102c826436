//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use ocean_core::Item;
use serde::Serialize;
use serde_json::Value;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single item
    pub fn print_item(&self, item: &Item) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:    {}", item.id());
                println!("Model: {}", item.model());
                if let Some(hash) = item.hash() {
                    println!("Hash:  {}", hash);
                }
                if !item.properties().is_empty() {
                    println!();
                    println!("{}", pretty(item.properties()));
                }
            }
            OutputFormat::Json => println!("{}", pretty(item)),
            OutputFormat::Quiet => println!("{}", item.id()),
        }
    }

    /// Print a list of items, one line each
    pub fn print_items(&self, items: &[&Item]) {
        match self.format {
            OutputFormat::Human => {
                if items.is_empty() {
                    println!("No items found.");
                    return;
                }
                for item in items {
                    println!(
                        "{} | {:<10} | {}",
                        item.id(),
                        truncate(item.model(), 10),
                        truncate(&label(item), 50)
                    );
                }
                println!("\n{} item(s)", items.len());
            }
            OutputFormat::Json => println!("{}", pretty(&items)),
            OutputFormat::Quiet => {
                for item in items {
                    println!("{}", item.id());
                }
            }
        }
    }

    /// Print a property value; absent values print nothing in quiet mode
    pub fn print_value(&self, value: Option<&Value>) {
        match (self.format, value) {
            (OutputFormat::Human, None) => println!("(not set)"),
            (OutputFormat::Json, None) => println!("null"),
            (OutputFormat::Quiet, None) => {}
            (OutputFormat::Quiet, Some(Value::String(s))) => println!("{}", s),
            (OutputFormat::Quiet, Some(value)) => println!("{}", value),
            (_, Some(value)) => println!("{}", pretty(value)),
        }
    }

    /// Report a created (or reused) item
    pub fn created(&self, kind: &str, id: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}: {}", kind, id),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "kind": kind, "id": id})
                );
            }
            OutputFormat::Quiet => println!("{}", id),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({ "message": msg }));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// First name or title of an item, if it has one
fn label(item: &Item) -> String {
    ["names", "titles"]
        .iter()
        .filter_map(|key| item.properties().get(*key))
        .filter_map(Value::as_object)
        .flat_map(|types| types.values())
        .filter_map(Value::as_array)
        .flat_map(|values| values.iter())
        .find_map(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
