use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uscis_forms::utils::SETTINGS_FILE;
use uscis_forms::{
    default_data_dir, diff_entries, read_config, write_config, AppConfig, CatalogService,
    CatalogStore, Downloader, HeuristicExtractor, HttpClient, HttpListingSource, RetentionPolicy,
    SyncOrchestrator, Theme, VersionArchive,
};

/// USCIS Forms - keep a local catalog of USCIS forms in sync and download them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the catalog, settings and version history
    #[arg(long, env = "USCIS_FORMS_HOME", global = true)]
    data_dir: Option<PathBuf>,

    /// Override the live forms listing URL
    #[arg(long, env = "USCIS_FORMS_INDEX_URL", global = true)]
    index_url: Option<String>,

    /// Keep forms you added by hand when a sync does not find them
    #[arg(long, global = true)]
    preserve_custom: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the live listing for new or changed forms
    Sync,
    /// Show catalog size, theme and last check time
    Status,
    /// List forms in the catalog
    List {
        /// Only forms whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add a form by name and URL
    Add { name: String, url: String },
    /// Change the name or URL of a form
    Edit {
        name: String,
        #[arg(long)]
        rename: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
    /// Delete a form from the catalog
    Remove { name: String },
    /// Set the preferred appearance (light or dark)
    Theme { theme: Theme },
    /// List archived snapshots, newest first
    History,
    /// Print one snapshot, or its differences from another
    Show {
        /// File name or sequence number
        snapshot: String,
        /// Compare against this older snapshot
        #[arg(long)]
        against: Option<String>,
    },
    /// Download forms (all forms when none are named)
    Download {
        forms: Vec<String>,
        /// Target folder (defaults to the last folder used)
        #[arg(short, long)]
        folder: Option<PathBuf>,
    },
    /// Print the effective settings
    Settings {
        /// Also write them, command-line overrides included, to settings.json
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let data_dir = match args.data_dir.clone() {
        Some(dir) => dir,
        None => default_data_dir().context("pass --data-dir or set USCIS_FORMS_HOME")?,
    };

    let mut config = match read_config(&data_dir).await {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable settings file");
            AppConfig::default()
        }
    };
    if let Some(url) = args.index_url.clone() {
        config.forms_index_url = url;
    }
    if args.preserve_custom {
        config.preserve_custom_forms = true;
    }

    let catalog = CatalogService::open(CatalogStore::in_data_dir(&data_dir)).await;
    let archive = VersionArchive::in_data_dir(&data_dir);

    match args.command {
        Command::Sync => {
            let source = HttpListingSource::new(
                HttpClient::new(config.fetch_timeout()),
                config.forms_index_url.clone(),
            );
            let orchestrator = Arc::new(SyncOrchestrator::new(
                Arc::new(source),
                Arc::new(HeuristicExtractor::new(config.base_origin.clone())),
                catalog.clone(),
                archive,
                RetentionPolicy::from_preserve_flag(config.preserve_custom_forms),
            ));

            let result = orchestrator.spawn().await.context("sync task panicked")?;
            println!("{}", result.summary());
            if let Some(snapshot) = &result.snapshot {
                println!("Saved snapshot {}", snapshot.file_name);
            }
            for warning in &result.warnings {
                println!("Warning: {warning}");
            }
            if let Some(e) = result.error {
                bail!(e);
            }
        }
        Command::Status => {
            let current = catalog.get().await;
            println!("Forms loaded: {}", current.len());
            println!("Last checked: {}", current.last_checked);
            println!("Theme: {}", current.theme);
            if !current.last_folder.is_empty() {
                println!("Download folder: {}", current.last_folder);
            }
        }
        Command::List { search } => {
            let current = catalog.get().await;
            for entry in current.search(search.as_deref().unwrap_or("")) {
                let marker = if current.custom_forms.contains(&entry.identifier) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {:<10} {}", entry.identifier, entry.url);
            }
        }
        Command::Add { name, url } => {
            catalog.add_form(&name, &url).await?;
            println!("Added {}", name.trim());
        }
        Command::Edit { name, rename, url } => {
            if rename.is_none() && url.is_none() {
                bail!("Nothing to change; pass --rename and/or --url");
            }
            catalog
                .edit_form(&name, rename.as_deref(), url.as_deref())
                .await?;
            println!("Updated {}", name.trim());
        }
        Command::Remove { name } => {
            catalog.remove_form(&name).await?;
            println!("Deleted {}", name.trim());
        }
        Command::Theme { theme } => {
            catalog.set_theme(theme).await?;
            println!("Theme set to {theme}");
        }
        Command::History => {
            let snapshots = archive.list()?;
            if snapshots.is_empty() {
                println!("No snapshots yet.");
            }
            for handle in snapshots {
                println!("{}", handle.file_name);
            }
        }
        Command::Show { snapshot, against } => {
            let newer = archive.read(&archive.find(&snapshot)?).await?;
            match against {
                None => {
                    for (identifier, url) in &newer.entries {
                        println!("{identifier}: {url}");
                    }
                }
                Some(older) => {
                    let older = archive.read(&archive.find(&older)?).await?;
                    let diff = diff_entries(&older.entries, &newer.entries);
                    if diff.is_empty() {
                        println!("No differences.");
                    }
                    for (identifier, url) in &diff.added {
                        println!("+ {identifier}: {url}");
                    }
                    for (identifier, url) in &diff.removed {
                        println!("- {identifier}: {url}");
                    }
                    for change in &diff.changed {
                        println!(
                            "~ {}: {} -> {}",
                            change.identifier, change.old_url, change.new_url
                        );
                    }
                }
            }
        }
        Command::Download { forms, folder } => {
            let current = catalog.get().await;
            let folder = folder.unwrap_or_else(|| PathBuf::from(&current.last_folder));
            let selection: Vec<String> = if forms.is_empty() {
                current.forms.keys().cloned().collect()
            } else {
                forms
            };

            let downloader = Downloader::new(
                HttpClient::new(config.download_timeout()),
                config.download_delay(),
            );

            let handle = {
                let folder = folder.clone();
                tokio::spawn(async move { downloader.download(&selection, &current, &folder).await })
            };
            let report = handle.await.context("download task panicked")??;

            for failure in &report.failed {
                println!("{}", failure.message);
            }
            println!("{}", report.summary());

            if let Err(e) = catalog.set_last_folder(&folder.to_string_lossy()).await {
                warn!(error = %e, "Could not remember download folder");
            }
            info!(
                succeeded = report.succeeded.len(),
                failed = report.failed.len(),
                "Download finished"
            );
        }
        Command::Settings { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                write_config(&data_dir, &config).await?;
                println!("Saved {}", data_dir.join(SETTINGS_FILE).display());
            }
        }
    }

    Ok(())
}
