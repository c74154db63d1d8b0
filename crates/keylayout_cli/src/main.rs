#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod commands;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use flexi_logger::Logger;
use keylayout_edit::EditorOptions;
use semver::Version;

lazy_static::lazy_static! {
    pub static ref VERSION: Version = Version::parse(env!("CARGO_PKG_VERSION")).unwrap();
}

#[derive(Parser, Debug)]
#[command(version, about = "Key layout configuration tool", long_about = None)]
pub struct Cli {
    #[arg(help = "Editor options file (TOML)", long, value_name = "FILE")]
    options: Option<PathBuf>,

    #[arg(help = "Write the result to this file instead of stdout", short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Prints the position of every key of a configuration")]
    Points {
        config: PathBuf,

        #[arg(help = "Print the flat JSON export instead of a table", long, default_value_t = false)]
        json: bool,
    },

    #[command(about = "Parses a configuration and writes it back in canonical form")]
    Normalize { config: PathBuf },

    #[command(about = "Builds a zone configuration from a flat key list")]
    Infer { keys: PathBuf },
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let _logger = Logger::try_with_env_or_str("info")?.log_to_stderr().start()?;
    let args = Cli::parse();
    log::info!("keylayout {}", *VERSION);

    let options = match &args.options {
        Some(path) => EditorOptions::from_toml_str(&read(path)?).with_context(|| format!("Invalid options in {}", path.display()))?,
        None => EditorOptions::default(),
    };

    let result = match &args.command {
        Commands::Points { config, json } => commands::points(&read(config)?, &options, *json)?,
        Commands::Normalize { config } => commands::normalize(&read(config)?, &options)?,
        Commands::Infer { keys } => commands::infer(&read(keys)?)?,
    };

    match &args.output {
        Some(path) => {
            fs::write(path, result).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
        None => print!("{result}"),
    }
    Ok(())
}
