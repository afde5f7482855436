//! Command-line interface for folio.

/// Clap argument definitions
mod args;

/// Book command handlers
mod book;

/// Chapter command handlers
mod chapter;

/// History command handlers
mod history;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use folio_core::config::Config;
use folio_core::library::Library;
use folio_core::store::FsStore;

pub use args::Cli;
use args::Commands;

/// Main entry point for the CLI
pub fn run_cli() {
    env_logger::init();

    let cli = Cli::parse();

    // `init` only touches the config file; everything else needs a store.
    if let Commands::Init { data_dir } = &cli.command {
        if !handle_init(data_dir.clone().or(cli.data_dir)) {
            std::process::exit(1);
        }
        return;
    }

    let data_dir = match resolve_data_dir(cli.data_dir) {
        Some(dir) => dir,
        None => std::process::exit(1),
    };
    let store = match FsStore::open(&data_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("✗ Could not open store at {}: {}", data_dir.display(), e);
            std::process::exit(1);
        }
    };
    let library = Library::new(store);

    // Execute commands and track success
    let success = match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Book { command } => book::handle_book_command(&library, command),
        Commands::Chapter { command } => chapter::handle_chapter_command(&library, command),
        Commands::History { command } => history::handle_history_command(&library, command),
    };

    if !success {
        std::process::exit(1);
    }
}

/// The `--data-dir` flag wins; otherwise the config file; otherwise the
/// platform default.
fn resolve_data_dir(flag: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(dir) = flag {
        return Some(dir);
    }
    match Config::load_or_default() {
        Ok(config) => Some(config.data_dir),
        Err(e) => {
            eprintln!("✗ Error loading config: {}", e);
            None
        }
    }
}

/// Handle the init command
/// Returns true on success, false on error
fn handle_init(data_dir: Option<PathBuf>) -> bool {
    let dir = data_dir.unwrap_or_else(Config::default_data_dir);
    let config = Config::new(dir.clone());

    match config.save() {
        Ok(()) => {
            println!("✓ Initialized folio configuration");
            println!("  Data directory: {}", dir.display());
            if let Some(config_path) = Config::config_path() {
                println!("  Config file: {}", config_path.display());
            }
            true
        }
        Err(e) => {
            eprintln!("✗ Error initializing config: {}", e);
            false
        }
    }
}
