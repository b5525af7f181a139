//! Error kinds reported to authors and the internal contract error.
//!
//! Author-facing problems are never Rust errors: they render as inline
//! HTML using the localized message table. [`Error`] is reserved for
//! states the registry's own validation should have made impossible.

use crate::messages::Messages;
use crate::util::escape_html;

/// Author-facing error and warning kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CiteErrorKind {
    /// Marker with empty content and no key.
    EmptyContentNoKey,
    /// Marker carries both `name` and `follow`.
    ConflictingKeyAndFollow,
    /// Key or follow value is a plain integer.
    NumericKeyForbidden,
    /// Marker content contains an unbalanced marker opening.
    UnterminatedNestedMarker,
    /// Definition inside a region names a different group.
    GroupMismatch,
    /// Empty definition inside a region for an unregistered key.
    MissingKeyInRegion,
    /// Definition inside a region without a key.
    UnnamedInRegion,
    /// Definition inside a region for a key never used in the text.
    UnknownKeyInRegion,
    /// Definition inside a region for a group with no citations.
    UnknownGroupInRegion,
    /// `group` attribute used while groups are disabled.
    GroupsDisabled,
    /// Marker attribute outside `name`, `group` and `follow`.
    UnrecognizedAttribute,
    /// Entry reached the list without any text.
    MissingReferenceText,
    /// Entry without text during a section preview.
    MissingReferenceTextPreview,
    /// More back-references than custom back-link labels.
    BacklinkLabelExhausted,
    /// More citations than custom link labels for the group.
    LinkLabelExhausted,
    /// Citations exist for a group that never got a reference list.
    MissingReferenceRegion,
    /// Region attribute outside `group` and `responsive`.
    InvalidRegionAttributes,
}

impl CiteErrorKind {
    /// Message table key for this kind.
    #[must_use]
    pub fn message_key(self) -> &'static str {
        match self {
            Self::EmptyContentNoKey => "cite_error_ref_no_input",
            Self::ConflictingKeyAndFollow => "cite_error_ref_too_many_keys",
            Self::NumericKeyForbidden => "cite_error_ref_numeric_key",
            Self::UnterminatedNestedMarker => "cite_error_included_ref",
            Self::GroupMismatch => "cite_error_references_group_mismatch",
            Self::MissingKeyInRegion => "cite_error_empty_references_define",
            Self::UnnamedInRegion => "cite_error_references_no_key",
            Self::UnknownKeyInRegion => "cite_error_references_missing_key",
            Self::UnknownGroupInRegion => "cite_error_references_missing_group",
            Self::GroupsDisabled => "cite_error_groups_disabled",
            Self::UnrecognizedAttribute => "cite_error_ref_invalid_attribute",
            Self::MissingReferenceText => "cite_error_references_no_text",
            Self::MissingReferenceTextPreview => "cite_warning_sectionpreview_no_text",
            Self::BacklinkLabelExhausted => "cite_error_references_no_backlink_label",
            Self::LinkLabelExhausted => "cite_error_no_link_label_group",
            Self::MissingReferenceRegion => "cite_error_group_refs_without_references",
            Self::InvalidRegionAttributes => "cite_error_references_invalid_parameters",
        }
    }

    /// Warnings render with the warning wrapper instead of the error one.
    #[must_use]
    pub fn is_warning(self) -> bool {
        matches!(self, Self::MissingReferenceTextPreview)
    }
}

/// How a formatted error is inserted into the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Passed back through the host parser before insertion.
    #[default]
    Parse,
    /// Inserted verbatim.
    Raw,
}

/// An author-facing error with its message parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CiteError {
    pub kind: CiteErrorKind,
    pub params: Vec<String>,
    pub mode: RenderMode,
}

impl CiteError {
    #[must_use]
    pub fn new(kind: CiteErrorKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
            mode: RenderMode::Parse,
        }
    }

    /// Append a message parameter (`$1`, `$2`, ... in order).
    #[must_use]
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Insert the rendered error verbatim rather than re-parsing it.
    #[must_use]
    pub fn raw(mut self) -> Self {
        self.mode = RenderMode::Raw;
        self
    }

    /// Message key, accounting for the default group's own wording.
    #[must_use]
    pub fn message_key(&self) -> &'static str {
        if self.kind == CiteErrorKind::MissingReferenceRegion
            && self.params.first().is_none_or(String::is_empty)
        {
            return "cite_error_refs_without_references";
        }
        self.kind.message_key()
    }
}

/// Render an author-facing error to HTML.
///
/// Parameters are HTML-escaped before substitution.
#[must_use]
pub fn format_error(messages: &dyn Messages, error: &CiteError) -> String {
    let params: Vec<String> = error.params.iter().map(|p| escape_html(p)).collect();
    let params: Vec<&str> = params.iter().map(String::as_str).collect();
    let detail = messages.message(error.message_key(), &params);

    if error.kind.is_warning() {
        format!(
            r#"<span class="warning cite-warning">{}</span>"#,
            messages.message("cite_warning", &[&detail])
        )
    } else {
        format!(
            r#"<strong class="error cite-error">{}</strong>"#,
            messages.message("cite_error", &[&detail])
        )
    }
}

/// Broken internal invariant.
///
/// Returned from the marker operation when validation let through a
/// state the stack cannot record. Hosts should log it and fall back to
/// the literal markup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A marker reached the stack with neither text nor a key.
    #[error("citation in group {group:?} reached the stack with neither text nor a key")]
    MissingTextAndKey { group: String },
}
