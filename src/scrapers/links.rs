//! Question link discovery on the listing page.
//!
//! The listing page keeps every question link inside a `.blog-post`
//! container as a nested `ul > li > a` list. Relative links are resolved
//! against the listing URL.

use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

const LINK_SELECTOR: &str = ".blog-post ul li a[href]";

/// Collect absolute question URLs from the listing `document`, in document order.
///
/// Returns an empty list when the page has no `.blog-post` container.
/// Hrefs that cannot be resolved are logged and skipped.
#[instrument(level = "info", skip_all, fields(%base_url))]
pub fn discover_links(document: &Html, base_url: &Url) -> Vec<String> {
    let link_selector = Selector::parse(LINK_SELECTOR).unwrap();
    let mut links = Vec::new();
    for element in document.select(&link_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        match base_url.join(href.trim()) {
            Ok(resolved) => links.push(resolved.to_string()),
            Err(e) => warn!(%href, error = %e, "Skipping unresolvable link"),
        }
    }

    info!(count = links.len(), "Discovered question links");
    debug!(urls = ?links, "Question links");
    links
}
