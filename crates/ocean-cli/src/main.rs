//! Ocean CLI
//!
//! Command-line interface for the Ocean document store.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ocean_core::{Config, StorageError, Store, StoreError};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "ocean")]
#[command(about = "Ocean - Embedded document store for items, indexes and links")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long = "config", global = true, value_name = "PATH")]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an item (or reuse the one with --id)
    New {
        /// Model tag
        model: String,
        #[arg(long)]
        id: Option<String>,
    },
    /// Show an item or one of its properties
    Get {
        id: String,
        /// Dotted property path
        path: Option<String>,
    },
    /// Write a property (the value is parsed as JSON, else taken as text)
    Set {
        id: String,
        /// Dotted property path; `*` appends
        path: String,
        value: String,
    },
    /// Index an item under a value
    Index { value: String, id: String },
    /// List the items indexed under a value
    Find {
        value: String,
        #[arg(short, long)]
        model: Option<String>,
        /// Fail when more than this many items match
        #[arg(long)]
        max: Option<usize>,
    },
    /// Get or create the item of a model indexed under a value
    Fetch { value: String, model: String },
    /// Link a source item to a target item
    Link {
        source: String,
        target: String,
        /// Key inside the annotation, for named relations
        #[arg(long)]
        name: Option<String>,
        /// Sub-path inside the annotation (below --name when given)
        #[arg(long)]
        path: Option<String>,
        /// Annotation value
        #[arg(long)]
        value: Option<String>,
    },
    /// Remove a link between two items
    Unlink { source: String, target: String },
    /// Create a named identity
    Identity {
        name: String,
        /// Name type (default: short)
        #[arg(short = 't', long = "type")]
        nametype: Option<String>,
        #[arg(long)]
        id: Option<String>,
    },
    /// Create a titled asset
    Asset {
        title: String,
        /// Title type (default: original)
        #[arg(short = 't', long = "type")]
        titletype: Option<String>,
        #[arg(long)]
        id: Option<String>,
    },
    /// Create a namespace:code reference, optionally pointing at a target
    Reference {
        namespace: String,
        code: String,
        #[arg(long)]
        target: Option<String>,
    },
    /// Compute and store an item's fingerprint
    Hash {
        id: String,
        #[arg(long, default_value = " ")]
        separator: String,
    },
    /// Delete an item and every reference to it
    #[command(alias = "rm")]
    Remove { id: String },
    /// Rebuild the link index from item annotations
    RebuildLinks,
    /// Show store status
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

impl Commands {
    /// Whether the command can change the store
    fn is_write(&self) -> bool {
        !matches!(
            self,
            Commands::Get { .. }
                | Commands::Find { .. }
                | Commands::Status
                | Commands::Config { .. }
        )
    }
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, name, kind, link_property, log_level)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:?}", err);
            if let Some(hint) = recovery_hint(&err) {
                eprintln!("\nHint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    let config_path = cli.config_file.clone().unwrap_or_else(Config::config_file_path);
    let config = Config::load_from_path(&config_path).context("Failed to load configuration")?;
    init_logging(&config);

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return match command {
            Some(ConfigCommands::Show) | None => {
                commands::config::show(&config, &config_path, &output)
            }
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key.clone(), value.clone(), &config_path, &output)
            }
        };
    }

    let mut store = Store::open(config.store_options()).context("Failed to open store")?;
    let is_write = cli.command.is_write();

    run(cli.command, &mut store, &output)?;

    if is_write {
        store.save().context("Failed to save store")?;
        debug!("Store saved");
    }
    Ok(())
}

fn run(command: Commands, store: &mut Store, output: &Output) -> Result<()> {
    match command {
        Commands::New { model, id } => commands::item::new(store, model, id, output),
        Commands::Get { id, path } => commands::item::get(store, id, path, output),
        Commands::Set { id, path, value } => commands::item::set(store, id, path, value, output),
        Commands::Index { value, id } => commands::index::index(store, value, id, output),
        Commands::Find { value, model, max } => {
            commands::index::find(store, value, model, max, output)
        }
        Commands::Fetch { value, model } => commands::index::fetch(store, value, model, output),
        Commands::Link {
            source,
            target,
            name,
            path,
            value,
        } => commands::link::create(store, source, target, name, path, value, output),
        Commands::Unlink { source, target } => {
            commands::link::remove(store, source, target, output)
        }
        Commands::Identity { name, nametype, id } => {
            commands::model::identity(store, name, nametype, id, output)
        }
        Commands::Asset {
            title,
            titletype,
            id,
        } => commands::model::asset(store, title, titletype, id, output),
        Commands::Reference {
            namespace,
            code,
            target,
        } => commands::model::reference(store, namespace, code, target, output),
        Commands::Hash { id, separator } => commands::item::hash(store, id, separator, output),
        Commands::Remove { id } => commands::item::remove(store, id, output),
        Commands::RebuildLinks => commands::link::rebuild(store, output),
        Commands::Status => commands::status::show(store, output),
        Commands::Config { .. } => Ok(()), // Handled in main
    }
}

/// Recovery advice for the storage failure behind `err`, if any
fn recovery_hint(err: &anyhow::Error) -> Option<String> {
    err.chain().find_map(|cause| {
        let storage = match cause.downcast_ref::<StoreError>() {
            Some(StoreError::Storage(storage)) => storage,
            _ => cause.downcast_ref::<StorageError>()?,
        };
        let suggestion = storage.recovery_suggestion()?;
        Some(if storage.is_recoverable() {
            format!("{} The command can be rerun once this is fixed.", suggestion)
        } else {
            suggestion.to_string()
        })
    })
}

/// Log to stderr, filtered by RUST_LOG or the configured level
fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "ocean_core={},ocean_cli={}",
            config.log_level, config.log_level
        ))
    });

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_link_with_options() {
        let cli = Cli::try_parse_from([
            "ocean", "--json", "link", "A", "B", "--path", "role", "--value", "author",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Link {
                source,
                target,
                path,
                value,
                name,
            } => {
                assert_eq!((source.as_str(), target.as_str()), ("A", "B"));
                assert_eq!(path.as_deref(), Some("role"));
                assert_eq!(value.as_deref(), Some("author"));
                assert!(name.is_none());
            }
            _ => panic!("expected link command"),
        }
    }

    #[test]
    fn test_recovery_hint_for_storage_errors() {
        let denied = StorageError::from_io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            PathBuf::from("/data/ocean.json"),
        );
        let err = Err::<(), _>(StoreError::Storage(denied))
            .context("Failed to save store")
            .unwrap_err();
        let hint = recovery_hint(&err).unwrap();
        assert!(hint.contains("permissions"));
        assert!(hint.contains("rerun"));

        let invalid = StorageError::InvalidJson {
            path: PathBuf::from("/data/ocean.json"),
            details: "eof".into(),
        };
        let err = anyhow::Error::new(invalid).context("Failed to open store");
        let hint = recovery_hint(&err).unwrap();
        assert!(hint.contains("Restore"));
        assert!(!hint.contains("rerun"));

        let err = Err::<(), _>(StoreError::MissingId)
            .context("Failed to create item")
            .unwrap_err();
        assert!(recovery_hint(&err).is_none());
    }

    #[test]
    fn test_read_commands_do_not_save() {
        let get = Cli::try_parse_from(["ocean", "get", "A"]).unwrap();
        let find = Cli::try_parse_from(["ocean", "find", "Ocean", "-m", "Identity"]).unwrap();
        let set = Cli::try_parse_from(["ocean", "set", "A", "x", "1"]).unwrap();
        let rebuild = Cli::try_parse_from(["ocean", "rebuild-links"]).unwrap();
        let unlink = Cli::try_parse_from(["ocean", "unlink", "A", "B"]).unwrap();

        assert!(!get.command.is_write());
        assert!(!find.command.is_write());
        assert!(set.command.is_write());
        assert!(rebuild.command.is_write());
        assert!(unlink.command.is_write());
    }

    #[test]
    fn test_run_against_memory_store() {
        let output = Output::new(OutputFormat::Quiet);
        let mut store = Store::memory();

        for args in [
            vec!["ocean", "identity", "Ocean", "--id", "ID-1"],
            vec!["ocean", "asset", "Sea", "--id", "AS-1"],
            vec!["ocean", "link", "AS-1", "ID-1"],
            vec!["ocean", "reference", "isbn", "1", "--target", "AS-1"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            run(cli.command, &mut store, &output).unwrap();
        }

        assert_eq!(store.len(), 3);
        assert_eq!(store.outgoing("AS-1"), &["ID-1".to_string()]);
    }
}
