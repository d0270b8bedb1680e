//! HTML parsing utilities for extracting image and link targets.

use scraper::{Html, Selector};
use tracing::debug;

/// Extract all non-empty `<img src>` values in document order.
pub fn extract_image_sources(html: &str) -> Vec<String> {
    select_attribute(html, "img[src]", "src")
}

/// Extract all non-empty `<a href>` values in document order.
///
/// Duplicates are kept; the media extractor dedups across all
/// candidate sources at once.
pub fn extract_link_targets(html: &str) -> Vec<String> {
    select_attribute(html, "a[href]", "href")
}

/// Extract media candidates from an HTML blob: every image source
/// followed by every link target.
pub fn extract_urls(html: &str) -> Vec<String> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let mut urls = extract_image_sources(html);
    urls.extend(extract_link_targets(html));

    debug!(count = urls.len(), html_length = html.len(), "candidate_urls_extracted");
    urls
}

fn select_attribute(html: &str, css: &str, attr: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    let selector = Selector::parse(css).expect("Invalid selector");

    fragment
        .select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}
