//! Markdown host parser for the citation engine.
//!
//! Scans Markdown for citation markers and reference list regions, calls
//! into [`Cite`], and stores the engine's HTML behind strip placeholders so
//! the Markdown pass leaves it alone.

use cite_core::{Attributes, Cite, MarkerKind, Parser, escape_html};
use pulldown_cmark::Parser as MarkdownParser;

use crate::args::DirectiveArgs;
use crate::fence::FenceTracker;
use crate::parser::{BlockDirective, has_inline_opening, next_inline, parse_block_line};
use crate::strip::StripState;

/// Re-parse nesting above which text is emitted escaped.
const MAX_REPARSE_DEPTH: usize = 16;

/// Default marker directive name.
pub const DEFAULT_MARKER: &str = "ref";

/// Default region directive name.
pub const DEFAULT_REGION: &str = "references";

/// Region container whose body is still being collected.
struct OpenRegion {
    args: DirectiveArgs,
    colon_count: usize,
    nested: usize,
    body: String,
}

/// Host parser for one document.
///
/// # Example
///
/// ```ignore
/// use cite_core::{Cite, CiteOptions, Parser};
/// use cite_markup::CiteParser;
///
/// let mut cite = Cite::new(CiteOptions::default());
/// let mut parser = CiteParser::new("page");
/// let text = parser.reparse("Fact.:ref[Source.]\n\n::references\n", &mut cite);
/// let html = parser.unstrip(&text);
/// ```
pub struct CiteParser {
    marker: String,
    region: String,
    page_id: String,
    preview: bool,
    strip: StripState,
    warnings: Vec<String>,
    depth: usize,
}

impl CiteParser {
    /// Parser for `page_id` with the default directive names.
    #[must_use]
    pub fn new(page_id: impl Into<String>) -> Self {
        Self {
            marker: DEFAULT_MARKER.to_owned(),
            region: DEFAULT_REGION.to_owned(),
            page_id: page_id.into(),
            preview: false,
            strip: StripState::new(),
            warnings: Vec::new(),
            depth: 0,
        }
    }

    /// Use other directive names for markers and regions.
    #[must_use]
    pub fn with_directive_names(mut self, marker: &str, region: &str) -> Self {
        marker.clone_into(&mut self.marker);
        region.clone_into(&mut self.region);
        self
    }

    /// Render as a section preview.
    #[must_use]
    pub fn with_section_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    /// Warnings collected so far.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Take all collected warnings.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Store block HTML and return its placeholder.
    pub fn strip_block(&mut self, html: String) -> String {
        self.strip.insert_block(html)
    }

    /// Replace placeholders with the stored engine output.
    #[must_use]
    pub fn unstrip(&self, html: &str) -> String {
        self.strip.unstrip(html)
    }

    fn warn(&mut self, message: String) {
        tracing::warn!(page = %self.page_id, "{message}");
        self.warnings.push(message);
    }

    fn process(&mut self, text: &str, cite: &mut Cite) -> String {
        let mut fence = FenceTracker::new();
        let mut output = String::with_capacity(text.len());
        let mut open: Option<OpenRegion> = None;

        for line in text.lines() {
            if let Some(region) = open.as_mut() {
                if fence.update(line) || fence.in_fence() {
                    push_line(&mut region.body, line);
                    continue;
                }
                match parse_block_line(line) {
                    Some(BlockDirective::ContainerEnd { colon_count })
                        if region.nested == 0 && colon_count >= region.colon_count =>
                    {
                        if let Some(region) = open.take() {
                            self.close_region(&region, cite, &mut output);
                        }
                        continue;
                    }
                    Some(BlockDirective::ContainerStart { .. }) => region.nested += 1,
                    Some(BlockDirective::ContainerEnd { .. }) => {
                        region.nested = region.nested.saturating_sub(1);
                    }
                    _ => {}
                }
                push_line(&mut region.body, line);
                continue;
            }

            if fence.update(line) || fence.in_fence() {
                push_line(&mut output, line);
                continue;
            }

            match parse_block_line(line) {
                Some(BlockDirective::Leaf { name, args }) if name == self.region => {
                    let html = cite.references(args.content.as_deref(), &args.attrs, self);
                    self.push_block(html, &mut output);
                }
                Some(BlockDirective::ContainerStart {
                    name,
                    args,
                    colon_count,
                }) if name == self.region => {
                    open = Some(OpenRegion {
                        args,
                        colon_count,
                        nested: 0,
                        body: String::new(),
                    });
                }
                _ => {
                    let line = self.process_inline(line, cite);
                    push_line(&mut output, &line);
                }
            }
        }

        if let Some(region) = open {
            self.warn(format!(
                "unclosed container directive :::{} (missing closing :::)",
                self.region
            ));
            self.close_region(&region, cite, &mut output);
        }

        if !text.ends_with('\n') && output.ends_with('\n') {
            output.pop();
        }
        output
    }

    fn close_region(&mut self, region: &OpenRegion, cite: &mut Cite, output: &mut String) {
        let body = region.body.trim_end_matches('\n');
        let html = cite.references(Some(body), &region.args.attrs, self);
        self.push_block(html, output);
    }

    fn push_block(&mut self, html: String, output: &mut String) {
        if html.is_empty() {
            output.push('\n');
        } else {
            output.push_str(&self.strip.insert_block(html));
        }
    }

    fn process_inline(&mut self, line: &str, cite: &mut Cite) -> String {
        let mut result = String::with_capacity(line.len());
        let mut pos = 0;

        while let Some(directive) = next_inline(line, pos) {
            result.push_str(&line[pos..directive.start]);
            pos = directive.end;

            if directive.name != self.marker {
                result.push_str(&line[directive.start..directive.end]);
                continue;
            }

            let content = directive.args.content.as_deref().map(render_inline);
            let html = match cite.cite(content.as_deref(), &directive.args.attrs, self) {
                Ok(html) => html,
                Err(e) => {
                    tracing::error!(page = %self.page_id, error = %e, "Citation marker aborted");
                    self.warnings.push(e.to_string());
                    escape_html(&self.literal(
                        MarkerKind::Citation,
                        content.as_deref(),
                        &directive.args.attrs,
                    ))
                }
            };
            if !html.is_empty() {
                result.push_str(&self.strip.insert_inline(html));
            }
        }

        result.push_str(&line[pos..]);
        result
    }
}

impl Parser for CiteParser {
    fn reparse(&mut self, text: &str, cite: &mut Cite) -> String {
        if self.depth >= MAX_REPARSE_DEPTH {
            self.warn(format!(
                "citation markup nested deeper than {MAX_REPARSE_DEPTH} levels"
            ));
            return escape_html(text);
        }
        self.depth += 1;
        let output = self.process(text, cite);
        self.depth -= 1;
        output
    }

    fn page_id(&self) -> &str {
        &self.page_id
    }

    fn is_section_preview(&self) -> bool {
        self.preview
    }

    fn literal(&self, kind: MarkerKind, content: Option<&str>, attrs: &Attributes) -> String {
        match (kind, content) {
            (MarkerKind::Citation, _) => {
                let args = DirectiveArgs {
                    content: content.map(str::to_owned),
                    attrs: attrs.clone(),
                };
                format!(":{}{}", self.marker, args.to_syntax())
            }
            (MarkerKind::References, Some(body)) => {
                let args = DirectiveArgs {
                    content: None,
                    attrs: attrs.clone(),
                };
                format!(":::{}{}\n{body}\n:::", self.region, args.to_syntax())
            }
            (MarkerKind::References, None) => {
                let args = DirectiveArgs {
                    content: None,
                    attrs: attrs.clone(),
                };
                format!("::{}{}", self.region, args.to_syntax())
            }
        }
    }

    fn contains_marker_opening(&self, text: &str) -> bool {
        has_inline_opening(text, &self.marker)
    }

    fn serialize_fragment(&self, text: &str) -> Vec<u8> {
        self.strip.serialize(text)
    }

    fn deserialize_fragment(&mut self, blob: &[u8]) -> Option<String> {
        self.strip.deserialize(blob)
    }

    fn is_valid_fragment(&self, blob: &[u8]) -> bool {
        StripState::is_valid(blob)
    }
}

fn push_line(output: &mut String, line: &str) {
    output.push_str(line);
    output.push('\n');
}

/// Render marker content as inline Markdown.
///
/// A single paragraph loses its `<p>` wrapper.
fn render_inline(markdown: &str) -> String {
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, MarkdownParser::new(markdown));
    let trimmed = html.trim_end();

    match trimmed
        .strip_prefix("<p>")
        .and_then(|inner| inner.strip_suffix("</p>"))
    {
        Some(inner) if !inner.contains("<p>") => inner.to_owned(),
        _ => trimmed.to_owned(),
    }
}
