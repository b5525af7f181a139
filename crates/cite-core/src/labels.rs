//! Visible labels for markers and back-links.

use std::collections::HashMap;

use crate::error::{CiteError, CiteErrorKind};
use crate::messages::Messages;

pub(crate) const BACKLINK_LABELS_KEY: &str = "cite_references_link_many_format_backlink_labels";

const LINK_LABEL_PREFIX: &str = "cite_link_label_group-";

/// Split a label table on spaces, tabs and newlines.
#[must_use]
pub fn split_labels(template: &str) -> Vec<String> {
    template
        .split([' ', '\t', '\n'])
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// `base.offset`, with `offset` zero-padded to the digit count of `max`.
#[must_use]
pub fn numeric_backlink_label(messages: &dyn Messages, base: usize, offset: usize, max: usize) -> String {
    let width = max.to_string().len();
    messages.format_number(&format!("{base}.{offset:0width$}"))
}

/// Label tables parsed on first use and kept for the document.
#[derive(Clone, Debug, Default)]
pub(crate) struct LabelTables {
    backlink: Option<Vec<String>>,
    link: HashMap<String, Option<Vec<String>>>,
}

impl LabelTables {
    /// Custom back-link label for occurrence `offset` (0-based).
    pub fn backlink_label(&mut self, messages: &dyn Messages, offset: usize) -> Result<String, CiteError> {
        let labels = self
            .backlink
            .get_or_insert_with(|| split_labels(&messages.message(BACKLINK_LABELS_KEY, &[])));
        labels
            .get(offset)
            .cloned()
            .ok_or_else(|| CiteError::new(CiteErrorKind::BacklinkLabelExhausted).raw())
    }

    /// Marker label for display number `number` (1-based) in `group`.
    ///
    /// Without a `cite_link_label_group-<group>` message the label is the
    /// localized number, prefixed by the group name outside the default
    /// group.
    pub fn link_label(
        &mut self,
        messages: &dyn Messages,
        group: &str,
        number: usize,
    ) -> Result<String, CiteError> {
        let key = format!("{LINK_LABEL_PREFIX}{group}");
        let table = self.link.entry(group.to_owned()).or_insert_with(|| {
            messages
                .exists(&key)
                .then(|| split_labels(&messages.message(&key, &[])))
        });

        let Some(labels) = table else {
            let number = messages.format_number(&number.to_string());
            return Ok(if group.is_empty() {
                number
            } else {
                format!("{group} {number}")
            });
        };

        number
            .checked_sub(1)
            .and_then(|index| labels.get(index))
            .cloned()
            .ok_or_else(|| {
                CiteError::new(CiteErrorKind::LinkLabelExhausted)
                    .with_param(group)
                    .with_param(key)
                    .raw()
            })
    }
}
