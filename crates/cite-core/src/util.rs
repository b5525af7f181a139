//! Small helpers shared by the formatter and the registry.

use sha2::{Digest, Sha256};

/// Escape text for inclusion in HTML content or a double-quoted attribute.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Cache key for an assembled reference list on a given page.
///
/// SHA-256 of the assembled block, hex encoded, followed by the page id.
pub(crate) fn reference_cache_key(block: &str, page_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(block.as_bytes());
    format!("citeref:{}:{page_id}", hex::encode(hasher.finalize()))
}
