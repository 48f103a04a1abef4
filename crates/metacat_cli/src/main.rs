//! Catalog inspection entry point.
//!
//! Without arguments prints the core ping and version. With `--config` or
//! `--db` opens the catalog and prints one record count per entity kind.

use clap::Parser;
use log::error;
use metacat_core::{Catalog, CatalogConfig, CatalogResult};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "metacat", about = "Metadata catalog inspection")]
#[command(version)]
struct Cli {
    /// JSON catalog configuration file.
    #[arg(long, conflicts_with = "db")]
    config: Option<PathBuf>,

    /// SQLite catalog file, opened with default settings.
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    println!("metacat_core ping={}", metacat_core::ping());
    println!("metacat_core version={}", metacat_core::core_version());

    let config = match (cli.config, cli.db) {
        (Some(path), _) => match CatalogConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::FAILURE;
            }
        },
        (None, Some(db)) => CatalogConfig::new(db),
        (None, None) => return ExitCode::SUCCESS,
    };

    match print_counts(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_counts module=cli status=error error={}", err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_counts(config: &CatalogConfig) -> CatalogResult<()> {
    let catalog = Catalog::open(config)?;
    match &config.db_path {
        Some(path) => println!("catalog={}", path.display()),
        None => println!("catalog=memory"),
    }
    for (kind, count) in catalog.counts()? {
        println!("{kind}={count}");
    }
    Ok(())
}
