//! Turning author-supplied keys into HTML id and fragment values.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters percent-encoded in URL fragments.
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Where a sanitized id will be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdMode {
    /// Value of an `id` attribute.
    Attribute,
    /// Fragment of an `href="#..."` link.
    Fragment,
}

/// Normalizes author keys and anchor names into safe identifiers.
///
/// `normalize_id(x, IdMode::Attribute)` must be idempotent: keys are
/// normalized once when a marker is read and again when anchors are
/// built from them.
pub trait IdSanitizer: Send + Sync {
    fn normalize_id(&self, raw: &str, mode: IdMode) -> String;
}

/// HTML5 id rules: whitespace runs become `_`, markup-significant
/// characters are dropped, everything else is kept.
#[derive(Clone, Copy, Debug, Default)]
pub struct Html5IdSanitizer;

impl IdSanitizer for Html5IdSanitizer {
    fn normalize_id(&self, raw: &str, mode: IdMode) -> String {
        let mut id = String::with_capacity(raw.len());
        let mut in_space = false;

        for c in raw.trim().chars() {
            if c.is_whitespace() {
                in_space = true;
                continue;
            }
            if c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '&') {
                continue;
            }
            if in_space {
                id.push('_');
                in_space = false;
            }
            id.push(c);
        }

        match mode {
            IdMode::Attribute => id,
            IdMode::Fragment => utf8_percent_encode(&id, FRAGMENT).to_string(),
        }
    }
}
