//! Whole-document rendering.

use std::sync::Arc;

use cite_cache::{Cache, FileCache, MemoryCache, NullCache};
use cite_config::Config;
use cite_core::{Cite, CiteOptions, EnglishMessages, Parser};
use pulldown_cmark::{Options, Parser as MarkdownParser};
use rayon::prelude::*;

use crate::processor::{CiteParser, DEFAULT_MARKER, DEFAULT_REGION};

/// Rendered HTML plus the warnings raised while rendering it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    pub html: String,
    pub warnings: Vec<String>,
}

/// Markdown to HTML renderer with citation support.
///
/// Holds a configured registry that is forked for every document, so one
/// renderer can serve many documents, in parallel if needed.
///
/// # Example
///
/// ```ignore
/// use cite_core::{Cite, CiteOptions};
/// use cite_markup::CiteRenderer;
///
/// let renderer = CiteRenderer::new(Cite::new(CiteOptions::default()));
/// let doc = renderer.render_document("page", "Fact.:ref[Source.]\n\n::references\n");
/// assert!(doc.html.contains("reference-text"));
/// ```
#[derive(Debug)]
pub struct CiteRenderer {
    template: Cite,
    marker: String,
    region: String,
    gfm: bool,
}

impl Default for CiteRenderer {
    fn default() -> Self {
        Self::new(Cite::default())
    }
}

impl CiteRenderer {
    #[must_use]
    pub fn new(template: Cite) -> Self {
        Self {
            template,
            marker: DEFAULT_MARKER.to_owned(),
            region: DEFAULT_REGION.to_owned(),
            gfm: true,
        }
    }

    /// Build a renderer from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let cite_config = &config.cite;
        let cache_config = &config.cache_resolved;

        let options = CiteOptions::default()
            .with_groups(cite_config.groups_enabled)
            .with_responsive(cite_config.responsive)
            .with_responsive_columns(cite_config.responsive_columns)
            .with_auto_references(cite_config.auto_references)
            .with_cache(cache_config.enabled, cache_config.ttl);

        let cache: Box<dyn Cache> = match (&cache_config.dir, cache_config.enabled) {
            (Some(dir), true) => {
                tracing::info!(dir = %dir.display(), "Using file cache for reference lists");
                Box::new(FileCache::new(dir.clone(), &cache_config.version))
            }
            (None, true) => Box::new(MemoryCache::new()),
            (_, false) => Box::new(NullCache),
        };

        let messages = EnglishMessages::new().with_overrides(config.messages.clone());
        let template = Cite::new(options)
            .with_messages(Arc::new(messages))
            .with_cache(cache.as_ref());

        Self::new(template).with_directive_names(&cite_config.marker, &cite_config.region)
    }

    /// Use other directive names for markers and regions.
    #[must_use]
    pub fn with_directive_names(mut self, marker: &str, region: &str) -> Self {
        marker.clone_into(&mut self.marker);
        region.clone_into(&mut self.region);
        self
    }

    /// Enable or disable GitHub Flavored Markdown extensions.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }

    /// Render a full document.
    pub fn render_document(&self, page_id: &str, markdown: &str) -> RenderedDocument {
        self.render(page_id, markdown, false)
    }

    /// Render one section of a document for preview.
    ///
    /// Reference lists missing from the section are rendered at the end
    /// instead of being reported.
    pub fn render_section_preview(&self, page_id: &str, markdown: &str) -> RenderedDocument {
        self.render(page_id, markdown, true)
    }

    /// Render independent documents in parallel, in input order.
    pub fn render_many<P, M>(&self, documents: &[(P, M)]) -> Vec<RenderedDocument>
    where
        P: AsRef<str> + Sync,
        M: AsRef<str> + Sync,
    {
        documents
            .par_iter()
            .map(|(page_id, markdown)| self.render_document(page_id.as_ref(), markdown.as_ref()))
            .collect()
    }

    fn render(&self, page_id: &str, markdown: &str, preview: bool) -> RenderedDocument {
        let mut cite = self.template.fork();
        let mut parser = CiteParser::new(page_id)
            .with_directive_names(&self.marker, &self.region)
            .with_section_preview(preview);

        let mut text = parser.reparse(markdown, &mut cite);

        let tail = cite.check_unclosed_groups("", &mut parser);
        let tail = tail.trim_start_matches('\n');
        if !tail.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push('\n');
            text.push_str(&parser.strip_block(tail.to_owned()));
        }

        let mut html = String::with_capacity(text.len() * 3 / 2);
        pulldown_cmark::html::push_html(
            &mut html,
            MarkdownParser::new_ext(&text, self.parser_options()),
        );

        tracing::debug!(page = %page_id, calls = cite.call_count(), "Rendered document");

        RenderedDocument {
            html: parser.unstrip(&html),
            warnings: parser.take_warnings(),
        }
    }
}
