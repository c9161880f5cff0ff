//! Command-line arguments.

use clap::{Parser, Subcommand};
use longbox_catalog::Kind;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "longbox", version, about = "Comic archive ingestion and library synchronization")]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short, global = true, env = "LONGBOX_CONFIG")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import every comic archive in the comics directory
    Import,
    /// Refresh one library record from the catalog
    Refresh {
        /// publisher, series, issue, creator or arc
        #[arg(value_parser = parse_kind)]
        kind: Kind,
        /// Catalog id of the record
        id: u64,
    },
    /// List the pages of an archive in reading order
    Pages {
        file: PathBuf,
        /// Read every page to report its size
        #[arg(long)]
        sizes: bool,
    },
}

fn parse_kind(value: &str) -> Result<Kind, String> {
    value.parse().map_err(|err: longbox_catalog::error::Error| (*err).to_string())
}
