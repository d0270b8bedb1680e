//! HTML scraping for media candidates.

pub mod parser;

pub use parser::{extract_image_sources, extract_link_targets, extract_urls};
