//! Link extraction: from a results page to a capped list of candidate URLs.
//!
//! Stage A finds the link labelled "All sizes" on the results page and
//! renders its target. Stage B scans the scripts of that page for image
//! URLs. A missing label, a malformed link or an unreachable page all end
//! in an empty candidate list, which is how "no larger copies" shows up.

mod tokenizer;

pub use tokenizer::{extract_image_urls, is_clean_image_url, REJECTED};

use log::{debug, warn};
use scraper::{ElementRef, Html, Node};
use url::Url;

use crate::session::SearchSession;

/// Entity residue left in hrefs scraped from the results page
const ENTITY_ARTIFACT: &str = "amp;";

/// Where to look and what to look for on the search site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSite {
    pub upload_endpoint: String,
    pub site_base: String,
    pub anchor_label: String,
}

/// The href of the nearest link enclosing the first text node equal to `label`
pub fn find_anchor_href(html: &str, label: &str) -> Option<String> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }

    let document = Html::parse_document(html);
    let text_node = document
        .tree
        .root()
        .descendants()
        .find(|node| matches!(node.value(), Node::Text(text) if text.trim() == label))?;

    text_node
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "a")
        .and_then(|anchor| anchor.value().attr("href"))
        .map(str::to_string)
}

/// Qualify a scraped href against the site base, dropping entity residue.
/// Returns `None` for empty, unparsable or non-http links.
pub fn normalize_href(site_base: &str, href: &str) -> Option<String> {
    let cleaned = href.trim().replace(ENTITY_ARTIFACT, "");
    if cleaned.is_empty() {
        return None;
    }

    let url = Url::parse(site_base).ok()?.join(&cleaned).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url.into()),
        _ => None,
    }
}

/// Stage A: render the page behind the "All sizes" link of a results page.
pub fn locate_all_sizes<S: SearchSession + ?Sized>(
    session: &S,
    results_html: &str,
    site: &SearchSite,
) -> Option<String> {
    let Some(href) = find_anchor_href(results_html, &site.anchor_label) else {
        debug!("No '{}' link on results page", site.anchor_label);
        return None;
    };

    let Some(url) = normalize_href(&site.site_base, &href) else {
        debug!("Malformed '{}' link: {}", site.anchor_label, href);
        return None;
    };

    match session.render(&url) {
        Ok(html) => Some(html),
        Err(e) => {
            warn!("Could not load {}: {}", url, e);
            None
        }
    }
}

/// Stage B: image URLs found in the page's scripts, in document order,
/// at most `cap` of them.
pub fn candidate_links(html: &str, cap: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for script in document
        .tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "script")
    {
        if links.len() >= cap {
            break;
        }
        let body: String = script.text().collect();
        let remaining = cap - links.len();
        links.extend(extract_image_urls(&body, remaining));
    }

    links
}

/// Run both stages for one results page
pub fn extract_candidates<S: SearchSession + ?Sized>(
    session: &S,
    results_url: &str,
    site: &SearchSite,
    cap: usize,
) -> Vec<String> {
    let results_html = match session.render(results_url) {
        Ok(html) => html,
        Err(e) => {
            warn!("Could not load results page {}: {}", results_url, e);
            return Vec::new();
        }
    };

    match locate_all_sizes(session, &results_html, site) {
        Some(all_sizes_html) => {
            let links = candidate_links(&all_sizes_html, cap);
            debug!("Found {} candidate links", links.len());
            links
        }
        None => Vec::new(),
    }
}
