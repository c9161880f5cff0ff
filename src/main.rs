mod cli;
mod error;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use longbox_archive::ComicArchive;
use longbox_catalog::CatalogHandle;
use longbox_catalog::provider::{DirectoryCatalog, OfflineCatalog, TimeoutCatalog};
use longbox_config::Config;
use longbox_library::{ImportOptions, Library, PageReport};
use longbox_storage::backend::LocalBackend;
use longbox_store::{Database, Repository};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = ?err, "Command failed");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match cli.command {
        Command::Import => {
            let library = open_library(&config).await?;
            let summary = library.run_full_import().await.or_raise(|| ErrorKind::Import)?;
            println!("{summary}");
            for (path, reason) in &summary.skips {
                println!("skipped {}: {reason}", path.display());
            }
            for failure in &summary.failures {
                let retry = if failure.retryable { " (will retry)" } else { "" };
                println!("failed {}: {}{retry}", failure.path.display(), failure.reason);
            }
            Ok(if summary.failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        },
        Command::Refresh { kind, id } => {
            let library = open_library(&config).await?;
            let refreshed = library.refresh(kind, id).await.or_raise(|| ErrorKind::Refresh)?;
            println!("{kind} {id}: {}", if refreshed { "refreshed" } else { "not refreshed" });
            Ok(ExitCode::SUCCESS)
        },
        Command::Pages { file, sizes } => {
            let mut archive = ComicArchive::open(&file).or_raise(|| ErrorKind::Read(file.display().to_string()))?;
            if !archive.is_archive() {
                println!("{}: not a zip archive", file.display());
                return Ok(ExitCode::FAILURE);
            }
            let report = PageReport::from_archive(&mut archive, sizes || config.import.calculate_page_sizes);
            print!("{report}");
            Ok(ExitCode::SUCCESS)
        },
    }
}

async fn open_library(config: &Config) -> Result<Library> {
    if let Some(parent) = config.library.database.parent() {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Setup)?;
    }
    let database = Database::connect(&config.library.database).await.or_raise(|| ErrorKind::Setup)?;
    let comics = LocalBackend::new("comics", &config.library.comics_directory).or_raise(|| ErrorKind::Setup)?;
    let media = LocalBackend::new("media", &config.library.media_directory).or_raise(|| ErrorKind::Setup)?;

    let inner: CatalogHandle = match &config.catalog.directory {
        Some(directory) => Arc::new(DirectoryCatalog::new(directory)),
        None => {
            tracing::info!("No catalog configured; importing from local metadata only");
            Arc::new(OfflineCatalog)
        },
    };
    let catalog = Arc::new(TimeoutCatalog::new(inner, config.catalog.timeout()));

    let fallback_page = match &config.import.default_page_image {
        Some(path) => {
            let image = tokio::fs::read(path).await.or_raise(|| ErrorKind::Read(path.display().to_string()))?;
            Some(Arc::from(image))
        },
        None => None,
    };
    let options = ImportOptions {
        retain_scan_info: config.import.retain_scan_info,
        calculate_page_sizes: config.import.calculate_page_sizes,
        fallback_page,
    };
    Ok(Library::new(Arc::new(comics), Arc::new(media), Repository::from(&database), catalog).with_options(options))
}
