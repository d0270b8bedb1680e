//! Content-safety blocklist.
//!
//! Matching is plain lowercase substring containment, not word
//! boundaries, so "Kidney" is blocked by "kid". Over-blocking is
//! accepted.

use tracing::debug;

use crate::feed::FeedEntry;

/// Terms that exclude an entry when found in its title or tags.
pub const BLOCKLIST_TERMS: &[&str] = &[
    "loli",
    "lolicon",
    "shota",
    "shotacon",
    "underage",
    "minor",
    "kid",
    "child",
    "middle school",
    "elementary",
];

/// Returns true when the entry's title, tags or keywords hit the blocklist.
pub fn is_blocked(entry: &FeedEntry) -> bool {
    let title = entry
        .title
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    if let Some(term) = matching_term(&title) {
        debug!(title = %title, term = term, "entry_blocked_by_title");
        return true;
    }

    for tag in entry_tags(entry) {
        if let Some(term) = matching_term(&tag) {
            debug!(tag = %tag, term = term, "entry_blocked_by_tag");
            return true;
        }
    }

    false
}

/// Lowercased tags, or comma-split keywords when the entry has no tags.
fn entry_tags(entry: &FeedEntry) -> Vec<String> {
    if !entry.tags.is_empty() {
        return entry.tags.iter().map(|t| t.to_lowercase()).collect();
    }

    entry
        .keywords
        .as_deref()
        .map(|raw| raw.split(',').map(|k| k.trim().to_lowercase()).collect())
        .unwrap_or_default()
}

fn matching_term(text: &str) -> Option<&'static str> {
    BLOCKLIST_TERMS.iter().copied().find(|term| text.contains(term))
}
