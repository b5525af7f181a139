//! Interface to the host markup parser.
//!
//! The registry never parses markup itself. It calls back into the host
//! to re-parse fragments (which may contain further markers), to echo a
//! marker literally, and to turn rendered fragments into cache blobs.

use std::collections::BTreeMap;

use crate::Cite;

/// Marker attributes as written by the author, keyed by name.
pub type Attributes = BTreeMap<String, String>;

/// Which of the two markup elements a call is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    /// Inline citation marker.
    Citation,
    /// Reference list region.
    References,
}

/// Host markup parser.
///
/// `reparse` receives the registry so that markers found while
/// re-parsing call back into the same state.
pub trait Parser {
    /// Parse a markup fragment to HTML.
    fn reparse(&mut self, text: &str, cite: &mut Cite) -> String;

    /// Page identifier mixed into reference list cache keys.
    fn page_id(&self) -> &str;

    /// Whether only one section of the page is being previewed.
    fn is_section_preview(&self) -> bool {
        false
    }

    /// Reconstruct the source markup of a marker. The registry escapes it.
    fn literal(&self, kind: MarkerKind, content: Option<&str>, attrs: &Attributes) -> String;

    /// Whether `text` contains the opening of a citation marker.
    fn contains_marker_opening(&self, text: &str) -> bool;

    /// Encode a rendered fragment for the reference list cache.
    fn serialize_fragment(&self, text: &str) -> Vec<u8> {
        text.as_bytes().to_vec()
    }

    /// Decode a cached fragment, re-registering anything it depends on.
    fn deserialize_fragment(&mut self, blob: &[u8]) -> Option<String> {
        String::from_utf8(blob.to_vec()).ok()
    }

    /// Whether a cached blob can be decoded by this parser.
    fn is_valid_fragment(&self, blob: &[u8]) -> bool {
        std::str::from_utf8(blob).is_ok()
    }
}
