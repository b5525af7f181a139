//! The per-document citation registry.
//!
//! A [`Cite`] receives marker and region calls from the host parser in
//! document order. Markers are recorded and replaced by links; regions
//! render the collected entries of their group and clear it. A region's
//! body is re-parsed in a definition state where markers attach text to
//! keys instead of producing output.

use std::fmt;
use std::sync::Arc;

use cite_cache::{Cache, CacheBucket, NullCacheBucket};

use crate::error::{CiteError, CiteErrorKind, Error, RenderMode, format_error};
use crate::formatter::{Formatter, responsive_wrapper};
use crate::host::{Attributes, MarkerKind, Parser};
use crate::keys::{
    MarkerKeys, is_numeric_key, resolve_marker_attributes, resolve_region_attributes,
    strip_balanced_spans,
};
use crate::labels::LabelTables;
use crate::messages::{EnglishMessages, Messages};
use crate::options::CiteOptions;
use crate::sanitize::{Html5IdSanitizer, IdSanitizer};
use crate::stack::{Entry, ReferenceStack};
use crate::util::{escape_html, reference_cache_key};

/// Name of the default group.
pub const DEFAULT_GROUP: &str = "";

/// Cache bucket holding rendered reference lists.
pub const CACHE_BUCKET: &str = "citeref";

/// What the registry is doing with respect to reference list regions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RegionState {
    /// No region call in progress.
    #[default]
    Idle,
    /// A region call is validating or rendering its list.
    Running,
    /// A region call is re-parsing its body for definitions of `group`.
    Defining { group: String },
}

/// Citation registry for one document.
#[derive(Clone)]
pub struct Cite {
    options: CiteOptions,
    messages: Arc<dyn Messages>,
    sanitizer: Arc<dyn IdSanitizer>,
    cache: Arc<dyn CacheBucket>,
    stack: ReferenceStack,
    labels: LabelTables,
    region: RegionState,
    in_marker: bool,
    call_count: usize,
    /// Rendered errors from the current region body, in call order.
    region_errors: Vec<String>,
}

impl fmt::Debug for Cite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cite")
            .field("options", &self.options)
            .field("stack", &self.stack)
            .field("region", &self.region)
            .field("in_marker", &self.in_marker)
            .field("call_count", &self.call_count)
            .field("region_errors", &self.region_errors.len())
            .finish_non_exhaustive()
    }
}

impl Default for Cite {
    fn default() -> Self {
        Self::new(CiteOptions::default())
    }
}

impl Cite {
    /// Registry with English messages, HTML5 ids and no cache.
    #[must_use]
    pub fn new(options: CiteOptions) -> Self {
        Self {
            options,
            messages: Arc::new(EnglishMessages::new()),
            sanitizer: Arc::new(Html5IdSanitizer),
            cache: Arc::new(NullCacheBucket),
            stack: ReferenceStack::default(),
            labels: LabelTables::default(),
            region: RegionState::Idle,
            in_marker: false,
            call_count: 0,
            region_errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Arc<dyn Messages>) -> Self {
        self.messages = messages;
        self.labels = LabelTables::default();
        self
    }

    #[must_use]
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn IdSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Store rendered reference lists in `cache`.
    ///
    /// Only used when [`CiteOptions::cache_references`] is set.
    #[must_use]
    pub fn with_cache(mut self, cache: &dyn Cache) -> Self {
        self.cache = Arc::from(cache.bucket(CACHE_BUCKET));
        self
    }

    #[must_use]
    pub fn options(&self) -> &CiteOptions {
        &self.options
    }

    #[must_use]
    pub fn messages(&self) -> &dyn Messages {
        self.messages.as_ref()
    }

    #[must_use]
    pub fn region_state(&self) -> &RegionState {
        &self.region
    }

    /// Marker and region calls processed since the last clear.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_count
    }

    /// Entries currently pending in `group`.
    #[must_use]
    pub fn entries(&self, group: &str) -> &[Entry] {
        self.stack.entries(group)
    }

    /// Groups holding entries that no region has rendered yet.
    #[must_use]
    pub fn pending_groups(&self) -> Vec<String> {
        self.stack.pending_groups()
    }

    /// Handle one citation marker.
    ///
    /// `content` is `None` for the self-closing form. Author mistakes
    /// render inline; `Err` means a broken internal invariant and the
    /// caller should fall back to the literal markup.
    pub fn cite(
        &mut self,
        content: Option<&str>,
        attrs: &Attributes,
        parser: &mut dyn Parser,
    ) -> Result<String, Error> {
        if self.in_marker {
            tracing::debug!("Citation marker inside another marker, echoing literally");
            return Ok(escape_html(&parser.literal(MarkerKind::Citation, content, attrs)));
        }

        self.call_count += 1;
        self.in_marker = true;
        let result = self.guarded_cite(content.unwrap_or_default(), attrs, parser);
        self.in_marker = false;
        result
    }

    fn guarded_cite(
        &mut self,
        text: &str,
        attrs: &Attributes,
        parser: &mut dyn Parser,
    ) -> Result<String, Error> {
        let keys = match resolve_marker_attributes(
            attrs,
            self.options.groups_enabled,
            self.sanitizer.as_ref(),
        ) {
            Ok(keys) => keys,
            Err(error) => return Ok(self.report(error, parser)),
        };

        if keys.key.as_deref().is_some_and(is_numeric_key)
            || keys.follow.as_deref().is_some_and(is_numeric_key)
        {
            return Ok(self.report(CiteError::new(CiteErrorKind::NumericKeyForbidden), parser));
        }

        if let RegionState::Defining { group } = &self.region {
            let region_group = group.clone();
            self.define_in_region(text, &keys, &region_group, parser);
            return Ok(String::new());
        }

        let group = keys.group.as_deref().unwrap_or(DEFAULT_GROUP);

        if text.is_empty() && keys.key.is_none() {
            return Ok(self.report(CiteError::new(CiteErrorKind::EmptyContentNoKey), parser));
        }
        if !text.is_empty() && parser.contains_marker_opening(&strip_balanced_spans(text)) {
            return Ok(self.report(
                CiteError::new(CiteErrorKind::UnterminatedNestedMarker),
                parser,
            ));
        }

        let text = (!text.is_empty()).then_some(text);
        let recorded = self
            .stack
            .record(text, keys.key.as_deref(), group, keys.follow.as_deref())?;

        let preview = parser.is_section_preview();
        let mut formatter = Formatter::new(
            self.messages.as_ref(),
            self.sanitizer.as_ref(),
            &mut self.labels,
            preview,
        );
        Ok(formatter.marker_link(group, &recorded))
    }

    /// A marker met while re-parsing a region body.
    fn define_in_region(
        &mut self,
        text: &str,
        keys: &MarkerKeys,
        region_group: &str,
        parser: &mut dyn Parser,
    ) {
        let group = keys.group.as_deref().unwrap_or(region_group);
        let key = keys.key.as_deref();

        let error = if group != region_group {
            Some(CiteError::new(CiteErrorKind::GroupMismatch).with_param(group))
        } else if text.is_empty() {
            match key {
                Some(key) if self.stack.is_registered(group, key) => None,
                _ => Some(
                    CiteError::new(CiteErrorKind::MissingKeyInRegion)
                        .with_param(key.unwrap_or_default()),
                ),
            }
        } else if let Some(key) = key {
            self.stack.define(group, key, text).err()
        } else {
            Some(CiteError::new(CiteErrorKind::UnnamedInRegion))
        };

        if let Some(error) = error {
            tracing::debug!(kind = ?error.kind, group, "Buffered region definition error");
            self.report(error, parser);
        }
    }

    /// Render an error, or buffer it while a region body is being read.
    fn report(&mut self, error: CiteError, parser: &mut dyn Parser) -> String {
        let html = self.render_error(&error, parser);
        if matches!(self.region, RegionState::Defining { .. }) {
            self.region_errors.push(html);
            return String::new();
        }
        html
    }

    fn render_error(&mut self, error: &CiteError, parser: &mut dyn Parser) -> String {
        let html = format_error(self.messages.as_ref(), error);
        match error.mode {
            RenderMode::Raw => html,
            RenderMode::Parse => parser.reparse(&html, self),
        }
    }

    /// Handle one reference list region.
    ///
    /// `content` is the region body, if any. A region met while another
    /// marker or region call is in progress is echoed literally.
    pub fn references(
        &mut self,
        content: Option<&str>,
        attrs: &Attributes,
        parser: &mut dyn Parser,
    ) -> String {
        if self.in_marker || self.region != RegionState::Idle {
            tracing::debug!(state = ?self.region, "Nested reference list, echoing literally");
            return escape_html(&parser.literal(MarkerKind::References, content, attrs));
        }

        self.call_count += 1;
        self.region = RegionState::Running;
        let output = self.guarded_references(content, attrs, parser);
        self.region = RegionState::Idle;
        self.region_errors.clear();
        output
    }

    fn guarded_references(
        &mut self,
        content: Option<&str>,
        attrs: &Attributes,
        parser: &mut dyn Parser,
    ) -> String {
        let region = match resolve_region_attributes(attrs, self.options.groups_enabled) {
            Ok(region) => region,
            Err(error) => return self.render_error(&error, parser),
        };
        let group = region.group.unwrap_or_default();

        if let Some(body) = content.filter(|body| !body.trim().is_empty()) {
            tracing::debug!(group = %group, "Reading reference list definitions");
            self.region = RegionState::Defining {
                group: group.clone(),
            };
            // Definitions produce no visible output.
            let _ = parser.reparse(body, self);
            self.region = RegionState::Running;
        }

        let responsive = region.responsive.unwrap_or(self.options.responsive);
        let mut output = self.render_group(&group, responsive, parser);

        if !self.region_errors.is_empty() {
            let errors = std::mem::take(&mut self.region_errors);
            if parser.is_section_preview() {
                tracing::debug!(count = errors.len(), "Dropping region errors in preview");
            } else {
                output.push('\n');
                output.push_str(&errors.join("<br />\n"));
            }
        }
        output
    }

    /// Render and clear one group. Empty groups render as nothing.
    fn render_group(&mut self, group: &str, responsive: bool, parser: &mut dyn Parser) -> String {
        let Some(entries) = self.stack.take_group(group) else {
            return String::new();
        };

        let block = Formatter::new(
            self.messages.as_ref(),
            self.sanitizer.as_ref(),
            &mut self.labels,
            parser.is_section_preview(),
        )
        .reference_list(&entries);

        let list = self.reparse_cached(&block, parser);
        if responsive {
            responsive_wrapper(&list, entries.len(), self.options.responsive_columns)
        } else {
            list
        }
    }

    /// Re-parse an assembled list, going through the cache when enabled.
    fn reparse_cached(&mut self, block: &str, parser: &mut dyn Parser) -> String {
        let key = self
            .options
            .cache_references
            .then(|| reference_cache_key(block, parser.page_id()));

        if let Some(key) = &key
            && let Some(blob) = self.cache.get(key)
        {
            if parser.is_valid_fragment(&blob)
                && let Some(text) = parser.deserialize_fragment(&blob)
            {
                tracing::debug!(key = %key, "Reference list cache hit");
                return text;
            }
            tracing::debug!(key = %key, "Discarding unusable cached reference list");
        }

        let rendered = parser.reparse(block, self);
        let rendered = rendered.trim_end_matches('\n').to_owned();

        if let Some(key) = key {
            tracing::debug!(key = %key, "Reference list cache miss");
            let blob = parser.serialize_fragment(&rendered);
            self.cache.set(&key, &blob, self.options.cache_ttl);
        }
        rendered
    }

    /// End-of-document check for groups that were never rendered.
    ///
    /// In section preview, and for the default group with automatic
    /// references, pending groups are rendered. Otherwise each one adds a
    /// missing-region error after `text`.
    pub fn check_unclosed_groups(&mut self, text: &str, parser: &mut dyn Parser) -> String {
        let mut output = text.to_owned();

        for group in self.stack.pending_groups() {
            let render = parser.is_section_preview()
                || (group == DEFAULT_GROUP && self.options.auto_references);

            if render {
                tracing::debug!(group = %group, "Rendering pending group at end of document");
                self.region = RegionState::Running;
                let list = self.render_group(&group, self.options.responsive, parser);
                self.region = RegionState::Idle;
                output.push('\n');
                output.push_str(&list);
            } else {
                let error = CiteError::new(CiteErrorKind::MissingReferenceRegion).with_param(group);
                output.push_str("\n<br />");
                output.push_str(&self.render_error(&error, parser));
            }
        }
        output
    }

    /// Forget all entries so the registry can serve a new document.
    ///
    /// Returns `false` and does nothing while a marker or region call is
    /// in progress; the caller should retry once it has returned.
    pub fn clear_state(&mut self) -> bool {
        if self.in_marker || self.region != RegionState::Idle {
            tracing::debug!(state = ?self.region, "Deferring clear while a call is in flight");
            return false;
        }
        self.stack.clear();
        self.call_count = 0;
        self.region_errors.clear();
        true
    }

    /// Independent, cleared copy for a concurrent render.
    ///
    /// In-flight flags are reset even if `self` is mid-call.
    #[must_use]
    pub fn fork(&self) -> Self {
        let mut fork = self.clone();
        fork.in_marker = false;
        fork.region = RegionState::Idle;
        fork.clear_state();
        fork
    }
}
