//! The `ferry` command line.
//!
//! Exit codes: `0` on success, `1` when at least one file failed to migrate,
//! `2` on setup errors (bad config, missing paths).

mod migrate;
mod view_mapping;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ferry_config::FerryConfig;

#[derive(Parser, Debug)]
#[command(name = "ferry", version, about = "Ferry (Magento 1 to Magento 2 code migration)")]
pub struct Cli {
    /// Path to a `ferry.toml` (defaults to one in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rewrite `Mage::` calls and inject the collaborators they need
    Migrate(MigrateArgs),
    /// Map M1 layout handles onto M2 layout handles
    ViewMapping(ViewMappingArgs),
    /// Print the JSON schema of `ferry.toml`
    ConfigSchema,
}

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// File or directory to migrate
    pub path: PathBuf,
    /// Report what would change without writing files
    #[arg(long)]
    pub dry_run: bool,
    /// Emit JSON suitable for CI
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ViewMappingArgs {
    /// Base directory of the M1 installation
    pub m1: PathBuf,
    /// Base directory of the M2 installation
    pub m2: PathBuf,
    /// Directory receiving `view_mapping_<area>.json`
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

pub fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::ConfigSchema => {
            let out = serde_json::to_string_pretty(&ferry_config::json_schema())?;
            println!("{out}");
            Ok(0)
        }
        Command::Migrate(args) => {
            let config = setup(cli.config.as_deref())?;
            migrate::run(&config, &args)
        }
        Command::ViewMapping(args) => {
            let config = setup(cli.config.as_deref())?;
            view_mapping::run(&config, &args)
        }
    }
}

/// Load the config and install logging.
fn setup(explicit: Option<&Path>) -> Result<FerryConfig> {
    let (config, path) = match explicit {
        Some(path) => {
            let config = FerryConfig::load_from_path(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            (config, Some(path.to_path_buf()))
        }
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            ferry_config::load_for_root(&cwd)
                .with_context(|| format!("failed to load config from {}", cwd.display()))?
        }
    };
    ferry_config::init_tracing(&config.logging);
    match path {
        Some(path) => tracing::debug!(target: "ferry.cli", path = %path.display(), "loaded config"),
        None => tracing::debug!(target: "ferry.cli", "no config file, using defaults"),
    }
    Ok(config)
}
