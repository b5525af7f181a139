//! Placeholders for engine output that must survive Markdown rendering.
//!
//! Engine HTML is kept out of the Markdown pass: each piece is stored here
//! and replaced by a placeholder element, which [`StripState::unstrip`]
//! swaps back after rendering. Reference lists cached by the engine are
//! half-parsed text that still contains placeholders, so a cached fragment
//! carries the items it refers to.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Format version of serialized fragments.
const FRAGMENT_VERSION: u32 = 1;

/// Upper bound on unstrip passes; items nest at most this deep.
const MAX_UNSTRIP_PASSES: usize = 32;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<cite-strip data-id="(\d+)"></cite-strip>|<div class="cite-strip" data-id="(\d+)"></div>"#)
        .unwrap()
});

/// Stored engine output, indexed by placeholder id.
#[derive(Debug, Default)]
pub struct StripState {
    items: Vec<String>,
}

/// Serialized half-parsed fragment.
#[derive(Debug, Serialize, Deserialize)]
struct Fragment {
    version: u32,
    text: String,
    items: BTreeMap<usize, String>,
}

impl StripState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Store inline HTML and return its placeholder.
    pub fn insert_inline(&mut self, html: String) -> String {
        let id = self.push(html);
        format!(r#"<cite-strip data-id="{id}"></cite-strip>"#)
    }

    /// Store block HTML and return its placeholder line.
    ///
    /// The placeholder is followed by a blank line so the Markdown
    /// renderer ends the HTML block there.
    pub fn insert_block(&mut self, html: String) -> String {
        let id = self.push(html);
        format!("<div class=\"cite-strip\" data-id=\"{id}\"></div>\n\n")
    }

    fn push(&mut self, html: String) -> usize {
        self.items.push(html);
        self.items.len() - 1
    }

    /// Replace every placeholder with its stored HTML, including
    /// placeholders inside stored items.
    ///
    /// Unknown ids are left in place.
    #[must_use]
    pub fn unstrip(&self, text: &str) -> String {
        let mut current = text.to_owned();

        for _ in 0..MAX_UNSTRIP_PASSES {
            if !PLACEHOLDER_RE.is_match(&current) {
                break;
            }
            let next = PLACEHOLDER_RE
                .replace_all(&current, |caps: &regex::Captures<'_>| {
                    placeholder_id(caps)
                        .and_then(|id| self.items.get(id))
                        .map_or_else(|| caps[0].to_owned(), |html| strip_block_padding(html))
                })
                .into_owned();
            if next == current {
                break;
            }
            current = next;
        }

        current
    }

    /// Encode `text` and every item it references, transitively.
    #[must_use]
    pub fn serialize(&self, text: &str) -> Vec<u8> {
        let mut items = BTreeMap::new();
        let mut pending = referenced_ids(text);

        while let Some(id) = pending.pop() {
            if items.contains_key(&id) {
                continue;
            }
            if let Some(html) = self.items.get(id) {
                pending.extend(referenced_ids(html));
                items.insert(id, html.clone());
            }
        }

        let fragment = Fragment {
            version: FRAGMENT_VERSION,
            text: text.to_owned(),
            items,
        };
        serde_json::to_vec(&fragment).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to serialize fragment");
            Vec::new()
        })
    }

    /// Whether `blob` is a fragment this state can re-register.
    #[must_use]
    pub fn is_valid(blob: &[u8]) -> bool {
        let Ok(fragment) = serde_json::from_slice::<Fragment>(blob) else {
            return false;
        };
        fragment.version == FRAGMENT_VERSION
            && std::iter::once(&fragment.text)
                .chain(fragment.items.values())
                .flat_map(|text| referenced_ids(text))
                .all(|id| fragment.items.contains_key(&id))
    }

    /// Decode a fragment, storing its items under fresh ids.
    ///
    /// Returns the fragment text with placeholders renumbered.
    pub fn deserialize(&mut self, blob: &[u8]) -> Option<String> {
        if !Self::is_valid(blob) {
            return None;
        }
        let fragment: Fragment = serde_json::from_slice(blob).ok()?;

        let base = self.items.len();
        let fresh: BTreeMap<usize, usize> = fragment
            .items
            .keys()
            .enumerate()
            .map(|(i, &old)| (old, base + i))
            .collect();

        for html in fragment.items.values() {
            self.items.push(renumber(html, &fresh));
        }
        Some(renumber(&fragment.text, &fresh))
    }
}

fn placeholder_id(caps: &regex::Captures<'_>) -> Option<usize> {
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

fn referenced_ids(text: &str) -> Vec<usize> {
    PLACEHOLDER_RE
        .captures_iter(text)
        .filter_map(|caps| placeholder_id(&caps))
        .collect()
}

/// Block items keep their trailing blank line out of the final HTML.
fn strip_block_padding(html: &str) -> String {
    html.trim_end_matches('\n').to_owned()
}

fn renumber(text: &str, fresh: &BTreeMap<usize, usize>) -> String {
    PLACEHOLDER_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let Some(id) = placeholder_id(caps).and_then(|old| fresh.get(&old)) else {
                return caps[0].to_owned();
            };
            if caps.get(1).is_some() {
                format!(r#"<cite-strip data-id="{id}"></cite-strip>"#)
            } else {
                format!(r#"<div class="cite-strip" data-id="{id}"></div>"#)
            }
        })
        .into_owned()
}
