//! Markdown host for the citation engine.
//!
//! Citations are written as directives:
//!
//! ```text
//! A claim.:ref[Smith, 2001.]{name="smith"} Another.:ref{name="smith"}
//!
//! ::references
//! ```
//!
//! A region may also be a container whose body defines citation text:
//!
//! ```text
//! :::references{group="notes"}
//! :ref[Defined here.]{name="later" group="notes"}
//! :::
//! ```
//!
//! [`CiteParser`] implements [`cite_core::Parser`]; [`CiteRenderer`] runs a
//! whole document through it and pulldown-cmark.

mod args;
mod fence;
mod parser;
mod processor;
mod renderer;
mod strip;

pub use args::DirectiveArgs;
pub use processor::{CiteParser, DEFAULT_MARKER, DEFAULT_REGION};
pub use renderer::{CiteRenderer, RenderedDocument};
pub use strip::StripState;
