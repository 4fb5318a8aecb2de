//! Extraction run: listing page → question pages → `data.json`.

use clap::Parser;
use feud_answers::cli::ParseCli;
use feud_answers::crawl::Crawler;
use feud_answers::outputs::store::Store;
use feud_answers::scrapers::fetch::{HttpFetcher, fetch_document};
use feud_answers::scrapers::links::discover_links;
use feud_answers::utils::{ensure_writable_parent, init_tracing};
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let start_time = std::time::Instant::now();
    info!("feud_parse starting up");

    let args = ParseCli::parse();
    debug!(?args, "Parsed CLI arguments");

    let base_url = Url::parse(&args.base_url)?;
    if let Err(e) = ensure_writable_parent(&args.data_file).await {
        error!(
            path = %args.data_file.display(),
            error = %e,
            "Data file location is not writable"
        );
        return Err(e);
    }

    let fetcher = HttpFetcher::new()?;

    info!(%base_url, "Loading listing page");
    let links = match fetch_document(&fetcher, base_url.as_str()).await {
        Some(listing) => discover_links(&listing, &base_url),
        None => Vec::new(),
    };
    if links.is_empty() {
        warn!("No question links found; nothing to do");
        return Ok(());
    }

    let store = Store::load(&args.data_file).await?;
    let crawler = Crawler::new(fetcher);
    let summary = crawler.run(&links, &store).await;

    let elapsed = start_time.elapsed();
    info!(
        discovered = summary.discovered,
        already_known = summary.already_known,
        processed = summary.processed,
        queued = summary.queued,
        failed = summary.failed,
        total_stored = summary.total_stored,
        path = %store.path().display(),
        secs = elapsed.as_secs(),
        "Parsing complete"
    );

    Ok(())
}
