pub mod core;
pub mod tui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::core::downloader::Downloader;
use crate::core::error::{BrowserError, BrowserResult};
use crate::core::http::build_http_client;
use crate::core::pipeline::Pipeline;
use crate::core::version::VersionManifest;
use crate::tui::prompt::confirm;
use crate::tui::{browse, open_keys, Outcome, SelectionState};

const ASSETS_QUESTION: &str = "Also download hashed resources (sounds, languages, icons)?";

/// Browse a version manifest and download the selected version.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Version id to download directly, skipping the browser
    version: Option<String>,
}

pub async fn run() -> BrowserResult<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never land inside the drawn list
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    let downloader = Downloader::new(build_http_client()?);
    let manifest = VersionManifest::fetch(&downloader, &config.manifest_url).await?;

    let id = match cli.version {
        Some(id) => id,
        None => {
            let state = SelectionState::new(manifest.ids());
            let window_size = config.window_size;
            let outcome = tokio::task::spawn_blocking(move || {
                let mut keys = open_keys()?;
                browse(state, keys.as_mut(), &mut std::io::stdout(), window_size)
            })
            .await??;

            match outcome {
                Outcome::Confirmed(id) => id,
                Outcome::Cancelled => {
                    println!("Exiting...");
                    return Ok(());
                }
            }
        }
    };

    let sync_assets = tokio::task::spawn_blocking(|| {
        let mut keys = open_keys()?;
        confirm(keys.as_mut(), &mut std::io::stdout(), ASSETS_QUESTION)
    })
    .await??;

    let pipeline = Pipeline::new(&config, &manifest, &downloader);
    // Dropping the pipeline future on Ctrl-C also drops its temporary archive
    let report = tokio::select! {
        result = pipeline.download(&id, sync_assets) => result?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            return Err(BrowserError::Interrupted);
        }
    };

    if let Some(assets) = &report.assets {
        println!(
            "Hashed resources: {} downloaded, {} already present",
            assets.downloaded, assets.skipped
        );
    }
    println!(
        "Done! {} ready in {:?} ({:.2}s)",
        id,
        report.version_dir,
        report.elapsed.as_secs_f64()
    );
    Ok(())
}
