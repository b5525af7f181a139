//! Citation registry and reference list rendering.
//!
//! A host markup parser hands this crate two kinds of calls in document
//! order: inline citation markers and reference list regions. The
//! [`Cite`] registry records each marker under its group, returns the
//! inline link, and renders a group's collected entries as an ordered
//! list when its region is reached.
//!
//! # Example
//!
//! ```ignore
//! use cite_core::{Attributes, Cite, CiteOptions};
//!
//! let mut cite = Cite::new(CiteOptions::default());
//! let mut attrs = Attributes::new();
//! attrs.insert("name".to_owned(), "smith".to_owned());
//!
//! // `parser` implements `cite_core::Parser`.
//! let link = cite.cite(Some("Smith, 2001."), &attrs, &mut parser)?;
//! let list = cite.references(None, &Attributes::new(), &mut parser);
//! ```
//!
//! # Collaborators
//!
//! - [`Parser`]: re-parses fragments and echoes markers literally
//! - [`Messages`]: every visible string, including label tables
//! - [`IdSanitizer`]: turns keys into ids and fragments
//! - [`cite_cache::Cache`]: optional store for rendered lists

mod cite;
mod error;
mod formatter;
mod host;
mod keys;
mod labels;
mod messages;
mod options;
mod sanitize;
mod stack;
mod util;

#[cfg(test)]
mod testing;

pub use cite::{CACHE_BUCKET, Cite, DEFAULT_GROUP, RegionState};
pub use error::{CiteError, CiteErrorKind, Error, RenderMode, format_error};
pub use host::{Attributes, MarkerKind, Parser};
pub use keys::{
    MARKER_ATTRIBUTES, MarkerKeys, REGION_ATTRIBUTES, RegionKeys, is_numeric_key,
    resolve_marker_attributes, resolve_region_attributes, strip_balanced_spans,
};
pub use labels::{numeric_backlink_label, split_labels};
pub use messages::{EnglishMessages, Messages, substitute};
pub use options::CiteOptions;
pub use sanitize::{Html5IdSanitizer, IdMode, IdSanitizer};
pub use stack::{Entry, NamedEntry, Recorded, ReferenceStack};
pub use util::escape_html;
