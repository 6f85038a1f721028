//! Reads a chat page's HTML from stdin and prints the JSON response a
//! `getPageContent` request would get.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use rs_chatscrape::message::{handle_request, PageRequest, PageResponse};
use rs_chatscrape::selectors::{RefreshSettings, Refresher, SelectorStore};
use rs_chatscrape::{DynamicSelectorConfig, Error, Options};

#[derive(Parser)]
#[command(name = "scrape_stdin", about = "Extract a chat conversation from HTML on stdin")]
struct Cli {
    /// URL the page was captured from (drives platform detection)
    #[arg(long)]
    url: Option<String>,

    /// Add image placeholders and collect image URLs
    #[arg(long)]
    include_images: bool,

    /// Download collected images and inline them as data: URIs
    #[arg(long, requires = "include_images")]
    inline_images: bool,

    /// Dynamic selector JSON file (host -> entry)
    #[arg(long, conflicts_with = "fetch_selectors")]
    selectors: Option<PathBuf>,

    /// Load selectors from the backend (CHATSCRAPE_BACKEND_URL), using the
    /// local cache when it is fresh
    #[arg(long)]
    fetch_selectors: bool,
}

async fn load_selectors(cli: &Cli) -> DynamicSelectorConfig {
    if let Some(path) = &cli.selectors {
        return match std::fs::read_to_string(path) {
            Ok(raw) => DynamicSelectorConfig::from_json_lenient(&raw),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot read selectors");
                DynamicSelectorConfig::empty()
            }
        };
    }

    if !cli.fetch_selectors {
        return DynamicSelectorConfig::empty();
    }

    let store = Arc::new(SelectorStore::default());
    match Refresher::new(RefreshSettings::from_env(), Arc::clone(&store)) {
        Ok(refresher) => {
            if refresher.load_cache() {
                if let Err(err) = refresher.refresh_once().await {
                    tracing::warn!(error = %err, "selector fetch failed; using built-in selectors");
                }
            }
        }
        Err(err) => tracing::warn!(error = %err, "selector client unavailable"),
    }
    store.snapshot().as_ref().clone()
}

fn print(response: &PageResponse) -> ExitCode {
    match serde_json::to_string(response) {
        Ok(json) => {
            println!("{json}");
            match response {
                PageResponse::Content(_) => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            }
        }
        Err(err) => {
            eprintln!("failed to serialize response: {err}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut html = String::new();
    if let Err(err) = io::stdin().read_to_string(&mut html) {
        return print(&PageResponse::fault(&Error::InvalidRequest(format!(
            "failed to read stdin: {err}"
        ))));
    }

    let dynamic = load_selectors(&cli).await;
    let opts = Options {
        url: cli.url.clone(),
        ..Options::default()
    };
    let request = PageRequest::GetPageContent {
        include_images: cli.include_images,
    };
    let request = match serde_json::to_string(&request) {
        Ok(json) => json,
        Err(err) => return print(&PageResponse::fault(&err.into())),
    };

    let response = handle_request(&request, &html, &opts, &dynamic);
    if !cli.inline_images {
        return print(&response);
    }

    let client = reqwest::Client::new();
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    match response.inline_images(&client, &opts, &cancel).await {
        Ok(response) => print(&response),
        Err(err) => print(&PageResponse::fault(&err)),
    }
}
