//! Image media extraction from feed entries.
//!
//! Candidates are gathered in a fixed priority order:
//! 1. `media:content` URLs
//! 2. image sources and link targets inside `content` HTML blobs
//! 3. the same inside the `summary` HTML
//! 4. the entry link itself
//!
//! The first candidate with an image extension wins.

use std::collections::HashSet;

use tracing::debug;

use crate::feed::FeedEntry;
use crate::html::extract_urls;

/// File extensions accepted as embeddable images.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Pick the first image URL of an entry, if any.
pub fn pick_media(entry: &FeedEntry) -> Option<String> {
    let candidates = collect_candidates(entry);
    let mut seen = HashSet::new();

    for raw in &candidates {
        let url = normalize_url(raw);
        if !seen.insert(url.clone()) {
            continue;
        }
        if is_image_url(&url) {
            return Some(url);
        }
    }

    debug!(
        identifier = %entry.identifier(),
        candidates = candidates.len(),
        "media_not_found"
    );
    None
}

/// All media candidates of an entry in priority order, unnormalised.
pub fn collect_candidates(entry: &FeedEntry) -> Vec<String> {
    let mut candidates: Vec<String> = entry
        .media_content
        .iter()
        .filter_map(|m| m.url.as_deref())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect();

    for blob in &entry.content {
        candidates.extend(extract_urls(blob));
    }

    if let Some(summary) = entry.summary.as_deref() {
        candidates.extend(extract_urls(summary));
    }

    if let Some(link) = entry.link.as_deref().filter(|l| !l.is_empty()) {
        candidates.push(link.to_string());
    }

    candidates
}

/// Decode the HTML ampersand entity left in feed URLs.
pub fn normalize_url(url: &str) -> String {
    url.replace("&amp;", "&")
}

/// Lowercased extension of the last path segment, including the dot.
///
/// Query and fragment are ignored. A segment whose only dot is leading
/// (`/.hidden`) has no extension.
pub fn guess_extension(url: &str) -> Option<String> {
    let path = url.split('?').next().unwrap_or(url);
    let path = path.split('#').next().unwrap_or(path);
    let segment = path.rsplit('/').next().unwrap_or(path);

    let stem_start = segment.len() - segment.trim_start_matches('.').len();
    let dot = segment.rfind('.')?;
    if dot < stem_start || dot + 1 == segment.len() {
        return None;
    }

    Some(segment[dot..].to_lowercase())
}

pub fn is_image_url(url: &str) -> bool {
    guess_extension(url)
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
